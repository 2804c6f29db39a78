//! Adapter Layer
//!
//! 外部システム（Microsoft Graph, identity platform, ファイルシステム）との統合

pub mod auth;
pub mod config;
pub mod graph;
pub mod logging;
pub mod repositories;
