//! # smolq 型検査器
//!
//! アクセス文の SPARQL クエリを DL クラス式へ変換し、宣言型に対する
//! 包摂をオントロジー上で検証する:
//! - パターングラフ構築 ([`graph`])
//! - クラス式合成 ([`synth`])
//! - 包摂オラクル ([`oracle`])
//! - 診断ログ ([`diagnostics`])

pub mod checker;
pub mod config;
pub mod diagnostics;
pub mod graph;
pub mod oracle;
pub mod program;
pub mod synth;
pub mod types;

pub use checker::QueryChecker;
pub use config::Settings;
pub use diagnostics::{Diagnostic, DiagnosticsLog, Severity};
pub use graph::{GraphEdge, GraphNode, IncidenceIndex, PatternGraphBuilder};
pub use oracle::{OntologySource, SubsumptionOracleClient};
pub use program::{FieldInfo, StaticOntology, StaticTable};
pub use synth::ClassExpressionSynthesizer;
pub use types::Type;

use thiserror::Error;

/// Failure kinds of one query check
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    /// The query is outside the accepted single-BGP subset
    #[error("{0}")]
    UnsupportedQueryShape(String),

    #[error("failed to parse query: {0}")]
    QuerySyntax(String),

    #[error("non-select queries are not supported yet")]
    NonSelectQuery,

    #[error("{0}")]
    ProjectionMismatch(String),

    #[error("this kind of triple pattern is not supported: {0}")]
    UnsupportedTriple(String),

    #[error("cycle through {0} in the query pattern")]
    CycleDetected(String),

    #[error("access statements are only allowed to target List type variables with concrete parameter type")]
    TargetTypeShapeInvalid(String),

    #[error("failed to parse class expression {expression}: {message}")]
    ExpressionParseFailure { expression: String, message: String },

    #[error("failed to typecheck query (exception: {0})")]
    ReasonerFailure(String),

    #[error("could not check query {query}: specified type is {declared}, but inferred supertypes are {supertypes}")]
    SubsumptionFailed {
        query: String,
        declared: String,
        supertypes: String,
    },
}

impl CheckError {
    pub fn severity(&self) -> Severity {
        match self {
            CheckError::UnsupportedQueryShape(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}
