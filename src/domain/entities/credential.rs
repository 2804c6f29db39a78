//! # Credential Entity
//!
//! アクセストークンと有効期限

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 期限切れの何分前からリフレッシュ対象とするか
pub const REFRESH_MARGIN_MINUTES: i64 = 5;

/// 認証情報
///
/// IDプロバイダーから取得し、ローカルキャッシュに永続化される
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// アクセストークン
    pub access_token: String,
    /// リフレッシュトークン（`offline_access` スコープ要求時のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// 有効期限（UTC）
    pub expires_at: DateTime<Utc>,
    /// 付与されたスコープ
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    /// 有効期限切れかどうか
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// まもなく期限切れ（5分以内）かどうか
    pub fn needs_refresh(&self) -> bool {
        Utc::now() + Duration::minutes(REFRESH_MARGIN_MINUTES) >= self.expires_at
    }

    /// リフレッシュ応答に新しいリフレッシュトークンが含まれない場合、以前のものを引き継ぐ
    pub fn inherit_refresh_token(mut self, previous: &Credential) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = previous.refresh_token.clone();
        }
        self
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[redacted]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(expires_at: DateTime<Utc>, refresh: Option<&str>) -> Credential {
        Credential {
            access_token: "access-123".to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_at,
            scopes: vec!["Files.ReadWrite.All".to_string()],
        }
    }

    #[test]
    fn test_expiration() {
        let expired = credential(Utc::now() - Duration::hours(1), None);
        assert!(expired.is_expired());
        assert!(expired.needs_refresh());

        let valid = credential(Utc::now() + Duration::hours(1), None);
        assert!(!valid.is_expired());
        assert!(!valid.needs_refresh());
    }

    #[test]
    fn test_needs_refresh_within_margin() {
        let soon = credential(Utc::now() + Duration::minutes(2), None);
        assert!(!soon.is_expired());
        assert!(soon.needs_refresh());
    }

    #[test]
    fn test_inherit_refresh_token() {
        let previous = credential(Utc::now(), Some("refresh-old"));

        let without = credential(Utc::now() + Duration::hours(1), None);
        assert_eq!(
            without.inherit_refresh_token(&previous).refresh_token.as_deref(),
            Some("refresh-old")
        );

        let with = credential(Utc::now() + Duration::hours(1), Some("refresh-new"));
        assert_eq!(
            with.inherit_refresh_token(&previous).refresh_token.as_deref(),
            Some("refresh-new")
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let cred = credential(Utc::now(), Some("refresh-456"));
        let debug = format!("{:?}", cred);

        assert!(!debug.contains("access-123"));
        assert!(!debug.contains("refresh-456"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn test_json_without_refresh_token() {
        let json = r#"{
            "access_token": "a",
            "expires_at": "2025-01-01T00:00:00Z"
        }"#;
        let cred: Credential = serde_json::from_str(json).unwrap();

        assert_eq!(cred.access_token, "a");
        assert!(cred.refresh_token.is_none());
        assert!(cred.scopes.is_empty());
    }
}
