//! クラス式合成
//!
//! 出力変数を根とする深さ優先探索で、接続インデックスから Manchester 構文の
//! クラス式を組み立てる。訪問集合は探索経路ごとに持ち、経路上のノードへの
//! 再訪は循環として失敗させる。到着に使った辺だけは戻りとして読み飛ばすため、
//! 同じ二変数間の平行辺 (`?obj :owner ?p . ?obj :breeder ?p`) や、二つの経路から
//! 共有される葉変数 (菱形) も `CycleDetected` になる。

use crate::graph::{GraphEdge, GraphNode, IncidenceIndex};
use crate::CheckError;
use std::collections::HashSet;
use tracing::debug;

const THING: &str = "owl:Thing";

const KEYWORDS: [&str; 10] = ["and", "or", "not", "some", "only", "value", "inverse", "min", "max", "exactly"];

pub struct ClassExpressionSynthesizer<'i> {
    index: &'i IncidenceIndex,
}

impl<'i> ClassExpressionSynthesizer<'i> {
    pub fn new(index: &'i IncidenceIndex) -> Self {
        Self { index }
    }

    pub fn synthesize(&self, root: &GraphNode) -> Result<String, CheckError> {
        let mut path = HashSet::new();
        let expression = self.visit(root, None, &mut path)?;
        debug!(root = %root, expression = %expression, "class expression synthesized");
        Ok(expression)
    }

    fn visit(
        &self,
        node: &GraphNode,
        arrival: Option<&GraphEdge>,
        path: &mut HashSet<GraphNode>,
    ) -> Result<String, CheckError> {
        if !node.is_variable {
            return Ok(render_constant(&node.label));
        }
        if !path.insert(node.clone()) {
            return Err(CheckError::CycleDetected(node.to_string()));
        }

        let mut contributions = Vec::new();
        for edge in self.index.edges(node) {
            if Some(edge) == arrival {
                continue;
            }
            let contribution = if edge.is_instance_of() {
                format!("<{}>", edge.to.label)
            } else if edge.from == *node {
                let target = self.visit(&edge.to, Some(edge), path)?;
                if edge.to.is_variable {
                    format!("(<{}> SOME {})", edge.relation, target)
                } else {
                    format!("(<{}> VALUE {})", edge.relation, target)
                }
            } else {
                let source = self.visit(&edge.from, Some(edge), path)?;
                if edge.from.is_variable {
                    format!("(inverse(<{}>) SOME {})", edge.relation, source)
                } else {
                    format!("(inverse(<{}>) VALUE {})", edge.relation, source)
                }
            };
            if !contribution.is_empty() {
                contributions.push(contribution);
            }
        }
        path.remove(node);

        if contributions.is_empty() {
            Ok(THING.to_string())
        } else {
            Ok(contributions.join(" AND "))
        }
    }
}

/// Bare form of a constant label for use after `VALUE`
///
/// Literals lose their quotes and `^^`/`@` suffix; anything that would not
/// lex as one word or number is quoted again. IRIs are bracketed.
fn render_constant(label: &str) -> String {
    let Some(body) = label.strip_prefix('"') else {
        return format!("<{}>", label);
    };

    let mut end = body.len();
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    let lexical = &body[..end];

    if is_bare_word(lexical) || is_number(lexical) {
        lexical.to_string()
    } else {
        format!("\"{}\"", lexical)
    }
}

fn is_bare_word(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !KEYWORDS.contains(&s.to_ascii_lowercase().as_str())
}

fn is_number(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    match frac {
        None => !int.is_empty() && all_digits(int),
        Some(frac) => !frac.is_empty() && all_digits(int) && all_digits(frac),
    }
}
