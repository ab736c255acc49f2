//! OWL DL 推論エンジン
//!
//! このクレートは型検査に必要な OWL DL の部分集合を提供します:
//! - クラス式モデル (intersection, union, 存在制限, hasValue, inverse)
//! - RDF トリプルからのオントロジー読み込み
//! - Manchester 構文パーサー
//! - 構造的包摂による上位クラス計算

pub mod loader;
pub mod manchester;
pub mod model;
pub mod reasoner;

pub use loader::{DefaultOntologyLoader, OntologyLoader};
pub use manchester::ManchesterParser;
pub use model::{Axiom, ClassExpression, Individual, OwlDlOntology, OwlIri, PropertyExpression, Value};
pub use reasoner::{Classifier, OwlDlReasoner, SuperClasses};

// Error types
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OwlDlError {
    #[error("Loader error: {0}")]
    LoaderError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Reasoning error: {0}")]
    ReasoningError(String),

    #[error("Consistency error: {0}")]
    ConsistencyError(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
}
