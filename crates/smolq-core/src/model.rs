//! RDF data model shared by the loader and the checker

use serde::{Deserialize, Serialize};
use std::fmt;

/// RDF Triple representation
///
/// Subjects and predicates are full IRIs. Objects are either full IRIs or
/// literals in N-Triples form (`"5"^^<http://www.w3.org/2001/XMLSchema#integer>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Whether the object position holds a literal rather than an IRI
    pub fn has_literal_object(&self) -> bool {
        self.object.starts_with('"')
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_literal_object() {
            write!(f, "<{}> <{}> {} .", self.subject, self.predicate, self.object)
        } else {
            write!(f, "<{}> <{}> <{}> .", self.subject, self.predicate, self.object)
        }
    }
}

/// Named graph of triples, used to ship ontology fragments around as one unit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedGraph {
    pub name: String,
    pub triples: Vec<Triple>,
}

impl NamedGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            triples: Vec::new(),
        }
    }

    pub fn push(&mut self, triple: Triple) {
        if !self.triples.contains(&triple) {
            self.triples.push(triple);
        }
    }

    /// Parse a JSON array of `{subject, predicate, object}` objects
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let triples: Vec<Triple> = serde_json::from_str(json)?;
        Ok(Self {
            name: name.into(),
            triples,
        })
    }
}
