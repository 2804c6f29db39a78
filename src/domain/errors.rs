//! # Uploader Errors
//!
//! アップローダー全体で共有するエラー分類

use std::path::PathBuf;
use thiserror::Error;

/// アップローダーのエラー
///
/// リトライ可否は [`UploaderError::is_transient`] で判定する。
/// HTTP レイヤーの失敗（`Transfer` / `Network`）のみが一時的なエラーとして扱われる。
#[derive(Debug, Error)]
pub enum UploaderError {
    /// 必須設定の欠落や不正な設定値
    #[error("configuration error: {0}")]
    Configuration(String),

    /// IDプロバイダーがフローを拒否した、またはエラーを返した
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// バックエンドが成功以外のステータスを返した
    #[error("transfer failed with HTTP {status}: {message}")]
    Transfer { status: u16, message: String },

    /// ステータスを受信する前にリクエストが失敗した
    #[error("network error: {0}")]
    Network(String),

    /// ローカルファイルが存在しない
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// リモートパスが不正
    #[error("invalid remote path: {0:?}")]
    InvalidPath(String),

    /// バックエンドの応答を解釈できない
    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),

    /// トークンキャッシュの読み書きに失敗した
    #[error("token cache error: {0}")]
    TokenCache(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl UploaderError {
    /// 一時的な（リトライ可能な）エラーかどうか
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transfer { .. } | Self::Network(_))
    }

    /// HTTPステータスコード（`Transfer` の場合のみ）
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transfer { status, .. } => Some(*status),
            _ => None,
        }
    }
}
