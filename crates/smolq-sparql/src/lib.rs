//! SPARQL エンジン (検査器向け)
//!
//! このクレートは型検査に必要な範囲の SPARQL を提供します:
//! - 字句解析 (Lexer)
//! - 構文解析 (Parser)

pub mod lexer;
pub mod parser;

// Re-exports
pub use lexer::Token;
pub use parser::{
    DefaultSparqlParser, GraphPattern, Iri, Literal, QueryType, SparqlParser, SparqlQuery, Term,
    TriplePattern, Variable,
};

// Error types
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SparqlError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
}
