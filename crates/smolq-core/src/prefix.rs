//! 既知プレフィックス表
//!
//! `owl:Thing` のような短縮名を完全な IRI に展開する。

use crate::vocabulary::{OWL_NS, RDFS_NS, RDF_NS, XSD_NS};
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from short prefix names to IRI namespaces.
///
/// The empty string is a valid prefix and stands for `:local` names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixTable {
    entries: BTreeMap<String, String>,
}

impl PrefixTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding only the W3C vocabularies (`owl`, `rdf`, `rdfs`, `xsd`)
    pub fn with_standard() -> Self {
        let mut table = Self::new();
        table.insert("owl", OWL_NS);
        table.insert("rdf", RDF_NS);
        table.insert("rdfs", RDFS_NS);
        table.insert("xsd", XSD_NS);
        table
    }

    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.entries.insert(prefix.into(), namespace.into());
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    pub fn contains(&self, prefix: &str) -> bool {
        self.entries.contains_key(prefix)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    /// Expand a `prefix:local` name into a full IRI (without angle brackets)
    pub fn expand(&self, prefixed: &str) -> Result<String, CoreError> {
        let (prefix, local) = prefixed
            .split_once(':')
            .ok_or_else(|| CoreError::InvalidPrefixedName(prefixed.to_string()))?;
        let namespace = self
            .namespace(prefix)
            .ok_or_else(|| CoreError::UnknownPrefix(prefix.to_string()))?;
        Ok(format!("{}{}", namespace, local))
    }

    /// Rewrite every `prefix:local` occurrence with a recognized prefix into `<namespace+local>`.
    ///
    /// Text inside `<...>` and `"..."` is copied untouched, as are names whose
    /// prefix is not in the table.
    pub fn replace_known_prefixes(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == '<' || c == '"' {
                let end = closing_delimiter(&chars, i).map_or(chars.len(), |p| p + 1);
                out.extend(&chars[i..end]);
                i = end;
            } else if is_name_start(c) || c == ':' {
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                if i < chars.len() && chars[i] == ':' {
                    let prefix: String = chars[start..i].iter().collect();
                    let local_start = i + 1;
                    let mut end = local_start;
                    while end < chars.len() && is_name_char(chars[end]) {
                        end += 1;
                    }
                    match self.namespace(&prefix) {
                        Some(namespace) if end > local_start => {
                            out.push('<');
                            out.push_str(namespace);
                            out.extend(&chars[local_start..end]);
                            out.push('>');
                            i = end;
                        }
                        _ => {
                            out.extend(&chars[start..local_start]);
                            i = local_start;
                        }
                    }
                } else {
                    out.extend(&chars[start..i]);
                }
            } else {
                out.push(c);
                i += 1;
            }
        }

        out
    }
}

/// Position of the `>` or `"` closing the delimiter at `open`
///
/// Inside strings a backslash escapes the next character.
fn closing_delimiter(chars: &[char], open: usize) -> Option<usize> {
    if chars[open] == '<' {
        return chars[open + 1..].iter().position(|&x| x == '>').map(|p| open + 1 + p);
    }
    let mut escaped = false;
    for (p, &c) in chars.iter().enumerate().skip(open + 1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(p),
            _ => {}
        }
    }
    None
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
