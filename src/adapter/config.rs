//! Configuration
//!
//! 設定の読み込み（JSON設定ファイル → 環境変数の順に上書き）

use log::LevelFilter;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::application::dto::upload_config::UploadConfig;
use crate::domain::entities::upload_session::{
    CHUNK_ALIGNMENT, DEFAULT_CHUNK_SIZE, SIMPLE_UPLOAD_LIMIT,
};
use crate::domain::errors::UploaderError;
use crate::domain::services::activity_log::ActivityLog;
use crate::domain::services::retry_policy::{
    RetryPolicy, BACKOFF_FACTOR, INITIAL_RETRY_DELAY_MS, MAX_RETRIES,
};

pub const DEFAULT_TENANT_ID: &str = "consumers";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8000";
pub const DEFAULT_SCOPES: &str = "Files.ReadWrite.All offline_access";
pub const DEFAULT_GRAPH_API_ENDPOINT: &str = "https://graph.microsoft.com/v1.0/me";
pub const DEFAULT_TOKEN_CACHE_FILE: &str = "token_cache.json";
pub const DEFAULT_LOG_FILE: &str = "logs/onedrive_uploader.log";

/// 設定値の入力（設定ファイル・環境変数の共通形）
///
/// 環境変数名はフィールド名の大文字（`CLIENT_ID` など）
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigSource {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tenant_id: Option<String>,
    pub authority_host: Option<String>,
    pub redirect_uri: Option<String>,
    pub scopes: Option<String>,
    pub graph_api_endpoint: Option<String>,
    pub token_cache_file: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub chunk_size: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub retry_backoff: Option<f64>,
}

impl ConfigSource {
    /// `other` に値があればそちらを優先して合成する
    fn overridden_by(self, other: ConfigSource) -> ConfigSource {
        ConfigSource {
            client_id: other.client_id.or(self.client_id),
            client_secret: other.client_secret.or(self.client_secret),
            tenant_id: other.tenant_id.or(self.tenant_id),
            authority_host: other.authority_host.or(self.authority_host),
            redirect_uri: other.redirect_uri.or(self.redirect_uri),
            scopes: other.scopes.or(self.scopes),
            graph_api_endpoint: other.graph_api_endpoint.or(self.graph_api_endpoint),
            token_cache_file: other.token_cache_file.or(self.token_cache_file),
            log_level: other.log_level.or(self.log_level),
            log_file: other.log_file.or(self.log_file),
            chunk_size: other.chunk_size.or(self.chunk_size),
            max_retries: other.max_retries.or(self.max_retries),
            retry_delay_ms: other.retry_delay_ms.or(self.retry_delay_ms),
            retry_backoff: other.retry_backoff.or(self.retry_backoff),
        }
    }
}

/// 検証済みの設定
#[derive(Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub tenant_id: String,
    pub authority_host: Url,
    pub redirect_uri: Url,
    pub scopes: Vec<String>,
    pub graph_api_endpoint: Url,
    pub token_cache_file: PathBuf,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
    pub chunk_size: u64,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub retry_backoff: f64,
}

impl Config {
    /// 設定を読み込む
    ///
    /// `.env` を読み込んだ後、設定ファイル（指定時）を環境変数で上書きする。
    ///
    /// # Arguments
    ///
    /// * `config_path` - JSON設定ファイルのパス（任意、`~` 展開あり）
    ///
    /// # Errors
    ///
    /// 設定ファイルが読めない、値が解釈できない、必須項目が欠けている場合は `Configuration`
    pub fn load(config_path: Option<&str>) -> Result<Self, UploaderError> {
        let _ = dotenvy::dotenv();

        let file = match config_path {
            Some(path) => Self::read_file(&expand_path(path))?,
            None => ConfigSource::default(),
        };

        let env = envy::from_env::<ConfigSource>()
            .map_err(|e| UploaderError::Configuration(format!("environment: {}", e)))?;

        Self::from_sources(file, env)
    }

    /// JSON設定ファイルを読み込む
    pub fn read_file(path: &Path) -> Result<ConfigSource, UploaderError> {
        let content = fs::read_to_string(path).map_err(|e| {
            UploaderError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            UploaderError::Configuration(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// 設定ファイルと環境変数を合成して検証する
    pub fn from_sources(file: ConfigSource, env: ConfigSource) -> Result<Self, UploaderError> {
        let merged = file.overridden_by(env);

        let client_id = merged
            .client_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| UploaderError::Configuration("CLIENT_ID is not set".to_string()))?;

        let chunk_size = merged.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 || chunk_size % CHUNK_ALIGNMENT != 0 {
            return Err(UploaderError::Configuration(format!(
                "CHUNK_SIZE must be a positive multiple of {} bytes, got {}",
                CHUNK_ALIGNMENT, chunk_size
            )));
        }

        let retry_backoff = merged.retry_backoff.unwrap_or(BACKOFF_FACTOR);
        if !retry_backoff.is_finite() || retry_backoff < 1.0 {
            return Err(UploaderError::Configuration(format!(
                "RETRY_BACKOFF must be at least 1.0, got {}",
                retry_backoff
            )));
        }

        let scopes = parse_scopes(merged.scopes.as_deref().unwrap_or(DEFAULT_SCOPES));
        if scopes.is_empty() {
            return Err(UploaderError::Configuration("SCOPES is empty".to_string()));
        }

        Ok(Self {
            client_id,
            client_secret: merged.client_secret.filter(|s| !s.is_empty()),
            tenant_id: merged
                .tenant_id
                .unwrap_or_else(|| DEFAULT_TENANT_ID.to_string()),
            authority_host: parse_url(
                "AUTHORITY_HOST",
                merged.authority_host.as_deref().unwrap_or(DEFAULT_AUTHORITY_HOST),
            )?,
            redirect_uri: parse_url(
                "REDIRECT_URI",
                merged.redirect_uri.as_deref().unwrap_or(DEFAULT_REDIRECT_URI),
            )?,
            scopes,
            graph_api_endpoint: parse_url(
                "GRAPH_API_ENDPOINT",
                merged
                    .graph_api_endpoint
                    .as_deref()
                    .unwrap_or(DEFAULT_GRAPH_API_ENDPOINT),
            )?,
            token_cache_file: expand_path(
                merged
                    .token_cache_file
                    .as_deref()
                    .unwrap_or(DEFAULT_TOKEN_CACHE_FILE),
            ),
            log_level: parse_log_level(merged.log_level.as_deref().unwrap_or("INFO"))?,
            log_file: expand_path(merged.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE)),
            chunk_size,
            max_retries: merged.max_retries.unwrap_or(MAX_RETRIES),
            retry_delay: Duration::from_millis(
                merged.retry_delay_ms.unwrap_or(INITIAL_RETRY_DELAY_MS),
            ),
            retry_backoff,
        })
    }

    /// `{authority_host}/{tenant_id}`
    pub fn authority(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.as_str().trim_end_matches('/'),
            self.tenant_id
        )
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority())
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority())
    }

    pub fn device_code_url(&self) -> String {
        format!("{}/oauth2/v2.0/devicecode", self.authority())
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig::new(self.chunk_size, SIMPLE_UPLOAD_LIMIT)
    }

    pub fn retry_policy(&self, log: ActivityLog) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay, self.retry_backoff).with_log(log)
    }
}

/// `~` と環境変数を展開する。展開できない場合は元の文字列をそのまま使う
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// ログレベル名を解釈する（`WARNING` と `CRITICAL` も受け付ける）
pub fn parse_log_level(level: &str) -> Result<LevelFilter, UploaderError> {
    match level.trim().to_ascii_uppercase().as_str() {
        "OFF" => Ok(LevelFilter::Off),
        "ERROR" | "CRITICAL" => Ok(LevelFilter::Error),
        "WARN" | "WARNING" => Ok(LevelFilter::Warn),
        "INFO" => Ok(LevelFilter::Info),
        "DEBUG" => Ok(LevelFilter::Debug),
        "TRACE" => Ok(LevelFilter::Trace),
        other => Err(UploaderError::Configuration(format!(
            "unknown LOG_LEVEL: {}",
            other
        ))),
    }
}

/// スコープ文字列（カンマまたは空白区切り）を分割する
pub fn parse_scopes(scopes: &str) -> Vec<String> {
    scopes
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_url(name: &str, value: &str) -> Result<Url, UploaderError> {
    Url::parse(value)
        .map_err(|e| UploaderError::Configuration(format!("{} is not a valid URL ({}): {}", name, e, value)))
}
