//! # smolq コア
//!
//! クエリ検査器の各クレートが共有する基本データモデル:
//! - RDF トリプル
//! - OWL/RDF/XSD 語彙の IRI
//! - 既知プレフィックス表 (展開とマクロ置換)

pub mod model;
pub mod prefix;
pub mod vocabulary;

pub use model::{NamedGraph, Triple};
pub use prefix::PrefixTable;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    #[error("Invalid prefixed name: {0}")]
    InvalidPrefixedName(String),
}
