//! # Identity Provider Trait
//!
//! OAuth2 IDプロバイダーとのやり取りを抽象化

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
use mockall::automock;

use crate::domain::entities::credential::Credential;
use crate::domain::errors::UploaderError;

/// 対話的な認証フロー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFlow {
    /// デバイスコードフロー（ブラウザのないサーバー向け）
    #[default]
    DeviceCode,
    /// 認可コードフロー（PKCE付き）
    AuthorizationCode,
}

impl fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceCode => write!(f, "device"),
            Self::AuthorizationCode => write!(f, "browser"),
        }
    }
}

impl FromStr for AuthFlow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "device" | "device-code" => Ok(Self::DeviceCode),
            "browser" | "auth-code" | "authorization-code" => Ok(Self::AuthorizationCode),
            other => Err(format!("unknown auth flow: {}", other)),
        }
    }
}

/// IDプロバイダー
///
/// 対話フローでユーザーに表示する内容（URL・デバイスコード）は実装側が扱う
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// リフレッシュトークンで新しい認証情報を取得する（サイレント）
    async fn refresh(&self, refresh_token: &str) -> Result<Credential, UploaderError>;

    /// デバイスコードフローを実行する
    async fn device_code_flow(&self) -> Result<Credential, UploaderError>;

    /// 認可コードフローを実行する
    async fn authorization_code_flow(&self) -> Result<Credential, UploaderError>;
}
