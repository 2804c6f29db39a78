//! JSON Token Cache Repository Implementation
//!
//! TokenCacheRepositoryのJSON実装（認証情報をJSONファイルで永続化）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::domain::entities::credential::Credential;
use crate::domain::errors::UploaderError;
use crate::domain::repositories::token_cache_repository::TokenCacheRepository;

/// JSONファイルベースのトークンキャッシュ
pub struct JsonTokenCacheRepository {
    path: PathBuf,
}

/// 認証情報（JSON永続化用の内部表現）
#[derive(Debug, Deserialize, Serialize)]
struct CachedTokenJson {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    scopes: Vec<String>,
}

impl JsonTokenCacheRepository {
    /// 新しいリポジトリを作成
    ///
    /// # Arguments
    ///
    /// * `path` - キャッシュファイルのパス（`~` は展開済みであること）
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ファイルから認証情報を読み込む（同期処理）
    fn load_sync(path: &Path) -> Result<Option<CachedTokenJson>, UploaderError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No token cache found at {}", path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(UploaderError::TokenCache(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let cached: CachedTokenJson = serde_json::from_str(&content).map_err(|e| {
            UploaderError::TokenCache(format!("failed to parse {}: {}", path.display(), e))
        })?;

        debug!("Loaded token cache from {}", path.display());
        Ok(Some(cached))
    }

    /// ファイルに認証情報を保存する（同期処理）
    ///
    /// Unixではファイルの権限を 0600 にする
    fn save_sync(path: &Path, cached: &CachedTokenJson) -> Result<(), UploaderError> {
        let to_cache_error =
            |e: std::io::Error| UploaderError::TokenCache(format!("{}: {}", path.display(), e));

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(to_cache_error)?;
            }
        }

        let json = serde_json::to_string_pretty(cached)
            .map_err(|e| UploaderError::TokenCache(format!("failed to serialize: {}", e)))?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path).map_err(to_cache_error)?;
        file.write_all(json.as_bytes()).map_err(to_cache_error)?;

        // 既存ファイルは作成時のモードが適用されないため明示的に設定する
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .map_err(to_cache_error)?;
        }

        info!("Saved token cache to {}", path.display());
        Ok(())
    }

    /// キャッシュファイルを削除する（同期処理）
    fn clear_sync(path: &Path) -> Result<bool, UploaderError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(UploaderError::TokenCache(format!(
                "failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// JSON形式からDomain形式に変換
    fn to_domain(cached: CachedTokenJson) -> Credential {
        Credential {
            access_token: cached.access_token,
            refresh_token: cached.refresh_token,
            expires_at: cached.expires_at,
            scopes: cached.scopes,
        }
    }

    /// Domain形式からJSON形式に変換
    fn from_domain(credential: &Credential) -> CachedTokenJson {
        CachedTokenJson {
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            expires_at: credential.expires_at,
            scopes: credential.scopes.clone(),
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> UploaderError {
    UploaderError::TokenCache(format!("failed to spawn blocking task: {}", e))
}

#[async_trait]
impl TokenCacheRepository for JsonTokenCacheRepository {
    async fn load(&self) -> Result<Option<Credential>, UploaderError> {
        let path = self.path.clone();
        let cached = tokio::task::spawn_blocking(move || Self::load_sync(&path))
            .await
            .map_err(join_error)??;

        Ok(cached.map(Self::to_domain))
    }

    async fn save(&self, credential: &Credential) -> Result<(), UploaderError> {
        let path = self.path.clone();
        let cached = Self::from_domain(credential);
        tokio::task::spawn_blocking(move || Self::save_sync(&path, &cached))
            .await
            .map_err(join_error)?
    }

    async fn clear(&self) -> Result<bool, UploaderError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Self::clear_sync(&path))
            .await
            .map_err(join_error)?
    }
}
