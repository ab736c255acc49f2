//! パターングラフ構築
//!
//! SELECT クエリの単一 BGP を、論理変数と定数をノードとする
//! 有向ラベル付きグラフ (接続インデックス) に変換する。

use crate::config::Settings;
use crate::CheckError;
use smolq_core::vocabulary::RDF_TYPE;
use smolq_sparql::{DefaultSparqlParser, GraphPattern, SparqlError, SparqlParser, Term, TriplePattern};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Relation of `?x a <C>` edges
pub const IS_INSTANCE_OF: &str = "a";

/// Output variable name reserved for single-object access queries
pub const ACCESS_VARIABLE: &str = "obj";

const PLACEHOLDER_UNSUPPORTED: &str = "placeholder constants are not supported yet";
const SHAPE_UNSUPPORTED: &str = "this kind of query is not supported";

/// A logical variable or a constant of the query
///
/// Constant labels are full IRIs (without brackets) or literals in N-Triples form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphNode {
    pub label: String,
    pub is_variable: bool,
}

impl GraphNode {
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            label: name.into(),
            is_variable: true,
        }
    }

    pub fn constant(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            is_variable: false,
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_variable {
            write!(f, "?{}", self.label)
        } else {
            write!(f, "{}", self.label)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphEdge {
    pub from: GraphNode,
    pub relation: String,
    pub to: GraphNode,
}

impl GraphEdge {
    pub fn new(from: GraphNode, relation: impl Into<String>, to: GraphNode) -> Self {
        Self {
            from,
            relation: relation.into(),
            to,
        }
    }

    pub fn is_instance_of(&self) -> bool {
        self.relation == IS_INSTANCE_OF
    }
}

/// Edges touching each variable node, in first-insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidenceIndex {
    entries: HashMap<GraphNode, Vec<GraphEdge>>,
    edge_count: usize,
}

impl IncidenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `edge` under each variable endpoint; duplicates are folded
    pub fn insert(&mut self, edge: GraphEdge) {
        let mut added = false;
        for endpoint in [&edge.from, &edge.to] {
            if !endpoint.is_variable {
                continue;
            }
            let edges = self.entries.entry(endpoint.clone()).or_default();
            if !edges.contains(&edge) {
                edges.push(edge.clone());
                added = true;
            }
        }
        if added {
            self.edge_count += 1;
        }
    }

    pub fn edges(&self, node: &GraphNode) -> &[GraphEdge] {
        self.entries.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.entries.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

/// Turns an access query into an [`IncidenceIndex`]
pub struct PatternGraphBuilder<'s> {
    settings: &'s Settings,
}

impl<'s> PatternGraphBuilder<'s> {
    pub fn new(settings: &'s Settings) -> Self {
        Self { settings }
    }

    pub fn build(&self, query: &str, output_var: &str) -> Result<IncidenceIndex, CheckError> {
        if query.contains('%') {
            return Err(CheckError::UnsupportedQueryShape(PLACEHOLDER_UNSUPPORTED.to_string()));
        }

        let parsed = DefaultSparqlParser::with_prefixes(self.settings.prefix_table())
            .parse(query)
            .map_err(|e| match e {
                SparqlError::ParseError(message) => CheckError::QuerySyntax(message),
                SparqlError::UnsupportedFeature(feature) => {
                    debug!(feature = %feature, "query uses an unsupported feature");
                    CheckError::UnsupportedQueryShape(SHAPE_UNSUPPORTED.to_string())
                }
            })?;

        if !parsed.is_select() {
            return Err(CheckError::NonSelectQuery);
        }

        let projected = parsed.projected_variables();
        if output_var == ACCESS_VARIABLE {
            if projected.len() != 1 || projected[0].name() != ACCESS_VARIABLE {
                return Err(CheckError::ProjectionMismatch(
                    "access-queries must have a single extracted variable called ?obj".to_string(),
                ));
            }
        } else if !projected.iter().any(|v| v.name() == output_var) {
            return Err(CheckError::ProjectionMismatch(format!(
                "variable ?{} not found in query",
                output_var
            )));
        }

        let triples = match &parsed.where_clause {
            GraphPattern::Group(elements) => match elements.as_slice() {
                [GraphPattern::Bgp(triples)] => triples,
                _ => return Err(CheckError::UnsupportedQueryShape(SHAPE_UNSUPPORTED.to_string())),
            },
            _ => return Err(CheckError::UnsupportedQueryShape(SHAPE_UNSUPPORTED.to_string())),
        };

        let mut index = IncidenceIndex::new();
        for triple in triples {
            index.insert(edge_for(triple)?);
        }

        debug!(
            nodes = index.node_count(),
            edges = index.edge_count(),
            "pattern graph built"
        );
        Ok(index)
    }
}

/// Accepted shapes: `?s rdf:type <C>` and `?s <p> (?o | literal)`
fn edge_for(triple: &TriplePattern) -> Result<GraphEdge, CheckError> {
    let unsupported = || CheckError::UnsupportedTriple(triple.to_string());

    let subject = match &triple.subject {
        Term::Variable(v) => GraphNode::variable(v.name()),
        _ => return Err(unsupported()),
    };
    let predicate = match &triple.predicate {
        Term::Iri(iri) => iri.as_str(),
        _ => return Err(unsupported()),
    };

    if predicate == RDF_TYPE {
        return match &triple.object {
            Term::Iri(class) => Ok(GraphEdge::new(subject, IS_INSTANCE_OF, GraphNode::constant(class.as_str()))),
            _ => Err(unsupported()),
        };
    }

    let object = match &triple.object {
        Term::Variable(v) => GraphNode::variable(v.name()),
        Term::Literal(literal) => GraphNode::constant(literal.to_string()),
        Term::Iri(_) | Term::BlankNode(_) => return Err(unsupported()),
    };
    Ok(GraphEdge::new(subject, predicate, object))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(query: &str, var: &str) -> Result<IncidenceIndex, CheckError> {
        let settings = Settings::default();
        PatternGraphBuilder::new(&settings).build(query, var)
    }

    #[test]
    fn test_type_edge() {
        let index = build("SELECT ?obj WHERE { ?obj a :Dog }", "obj").unwrap();
        let obj = GraphNode::variable("obj");
        let edges = index.edges(&obj);
        assert_eq!(edges.len(), 1);
        assert!(edges[0].is_instance_of());
        assert_eq!(edges[0].to, GraphNode::constant("https://smolq.example/prog#Dog"));
        // constants are not indexed as roots
        assert_eq!(index.node_count(), 1);
    }

    #[test]
    fn test_variable_edge_registered_both_ways() {
        let index = build("SELECT ?obj WHERE { ?obj prog:owner ?p . ?p a prog:Person }", "obj").unwrap();
        let p = GraphNode::variable("p");
        assert_eq!(index.edges(&GraphNode::variable("obj")).len(), 1);
        assert_eq!(index.edges(&p).len(), 2);
        assert_eq!(index.edges(&p)[0].relation, "https://smolq.example/prog#owner");
        assert_eq!(index.edge_count(), 2);
    }

    #[test]
    fn test_literal_object_label() {
        let index = build("SELECT ?obj WHERE { ?obj :age 5 }", "obj").unwrap();
        let edge = &index.edges(&GraphNode::variable("obj"))[0];
        assert_eq!(edge.to, GraphNode::constant("\"5\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
    }

    #[test]
    fn test_signed_literal_labels() {
        let index = build("SELECT ?obj WHERE { ?obj :n -3 . ?obj :w +2.5 }", "obj").unwrap();
        let edges = index.edges(&GraphNode::variable("obj"));
        assert_eq!(edges[0].to, GraphNode::constant("\"-3\"^^<http://www.w3.org/2001/XMLSchema#integer>"));
        assert_eq!(edges[1].to, GraphNode::constant("\"+2.5\"^^<http://www.w3.org/2001/XMLSchema#decimal>"));
    }

    #[test]
    fn test_duplicate_triples_folded() {
        let index = build("SELECT ?obj WHERE { ?obj a :Dog . ?obj a :Dog }", "obj").unwrap();
        assert_eq!(index.edges(&GraphNode::variable("obj")).len(), 1);
        assert_eq!(index.edge_count(), 1);
    }

    #[test]
    fn test_placeholder_warning() {
        let err = build("SELECT ?obj WHERE { ?obj :age %1 }", "obj").unwrap_err();
        assert_eq!(err.to_string(), "placeholder constants are not supported yet");
        assert_eq!(err.severity(), crate::Severity::Warning);
    }

    #[test]
    fn test_rejected_shapes() {
        for query in [
            "SELECT ?obj WHERE { { ?obj a :Dog } UNION { ?obj a :Cat } }",
            "SELECT ?obj WHERE { ?obj a :Dog OPTIONAL { ?obj :age ?a } }",
            "SELECT ?obj WHERE { ?obj a :Dog FILTER(?obj != :rex) }",
            "SELECT ?obj WHERE { { ?obj a :Dog } }",
            "SELECT ?obj WHERE { }",
            "SELECT ?obj WHERE { ?obj :owner/:name ?n }",
        ] {
            let err = build(query, "obj").unwrap_err();
            assert_eq!(
                err,
                CheckError::UnsupportedQueryShape("this kind of query is not supported".to_string()),
                "query: {}",
                query
            );
        }
    }

    #[test]
    fn test_projection_errors() {
        let err = build("SELECT ?obj ?x WHERE { ?obj :owner ?x }", "obj").unwrap_err();
        assert_eq!(err.to_string(), "access-queries must have a single extracted variable called ?obj");

        let err = build("SELECT ?x WHERE { ?x a :Dog }", "y").unwrap_err();
        assert_eq!(err.to_string(), "variable ?y not found in query");

        assert!(build("SELECT * WHERE { ?y a :Dog }", "y").is_ok());
    }

    #[test]
    fn test_non_select_and_syntax() {
        assert_eq!(build("ASK { ?obj a :Dog }", "obj").unwrap_err(), CheckError::NonSelectQuery);
        assert!(matches!(build("SELECT ?obj WHERE { ?obj a", "obj"), Err(CheckError::QuerySyntax(_))));
    }

    #[test]
    fn test_unsupported_triples() {
        for query in [
            "SELECT ?obj WHERE { ?obj a ?c }",
            "SELECT ?obj WHERE { :rex :owner ?obj }",
            "SELECT ?obj WHERE { ?obj ?p ?o }",
            "SELECT ?obj WHERE { ?obj :owner :alice }",
            "SELECT ?obj WHERE { ?obj a \"Dog\" }",
        ] {
            let err = build(query, "obj").unwrap_err();
            assert!(matches!(err, CheckError::UnsupportedTriple(_)), "query: {}", query);
            assert_eq!(err.severity(), crate::Severity::Error);
        }
    }
}
