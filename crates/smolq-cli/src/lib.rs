//! # smolq CLI ライブラリ
//!
//! アクセス文クエリの型検査をコマンドラインから実行する

pub mod commands;

pub use commands::*;
