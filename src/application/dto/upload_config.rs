//! # Upload Configuration DTO
//!
//! アップロード設定のData Transfer Object

use crate::domain::entities::upload_session::{DEFAULT_CHUNK_SIZE, SIMPLE_UPLOAD_LIMIT};

/// アップロード設定
///
/// チャンク転送エンジンが使うサイズ設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadConfig {
    /// チャンクサイズ（バイト）
    pub chunk_size: u64,
    /// これ未満のファイルは単一PUTでアップロードする
    pub simple_upload_limit: u64,
}

impl UploadConfig {
    /// 新しいアップロード設定を作成します。
    ///
    /// # 例
    ///
    /// ```
    /// use onedrive_uploader::application::dto::upload_config::UploadConfig;
    ///
    /// let config = UploadConfig::new(5 * 1024 * 1024, 4 * 1024 * 1024);
    ///
    /// assert_eq!(config.chunk_size, 5242880);
    /// assert_eq!(config.simple_upload_limit, 4194304);
    /// ```
    pub fn new(chunk_size: u64, simple_upload_limit: u64) -> Self {
        Self {
            chunk_size,
            simple_upload_limit,
        }
    }

    /// チャンクサイズだけを指定し、しきい値は既定の 4 MiB を使う
    pub fn with_chunk_size(chunk_size: u64) -> Self {
        Self::new(chunk_size, SIMPLE_UPLOAD_LIMIT)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, SIMPLE_UPLOAD_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_config_default() {
        let config = UploadConfig::default();

        assert_eq!(config.chunk_size, 10 * 1024 * 1024);
        assert_eq!(config.simple_upload_limit, 4 * 1024 * 1024);
    }

    #[test]
    fn test_upload_config_with_chunk_size() {
        let config = UploadConfig::with_chunk_size(327680);

        assert_eq!(config.chunk_size, 327680);
        assert_eq!(config.simple_upload_limit, SIMPLE_UPLOAD_LIMIT);
    }
}
