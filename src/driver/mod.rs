//! # Driver Layer (Presentation)
//!
//! CLIやその他の外部インターフェースを提供
//!
//! ## 特徴
//!
//! - Use Caseを呼び出してビジネスフローを起動
//! - 依存性注入（DI）を行い、全てを組み立てる
//! - ユーザーとのインターフェース（認証の案内・進捗表示）
//!
//! ## 構成要素
//!
//! - **cli**: CLI引数のパース
//! - **console**: 端末への表示
//! - **workflow**: コマンドごとのオーケストレーション

pub mod cli;
pub mod console;
pub mod workflow;

pub use cli::{Args, Command};
pub use workflow::UploaderWorkflow;
