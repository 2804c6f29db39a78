//! # Authenticate Use Case
//!
//! アクセストークンの取得（キャッシュ → サイレント更新 → 対話フロー）

use std::sync::Arc;

use crate::domain::entities::credential::Credential;
use crate::domain::errors::UploaderError;
use crate::domain::repositories::identity_provider::{AuthFlow, IdentityProvider};
use crate::domain::repositories::token_cache_repository::TokenCacheRepository;
use crate::domain::services::activity_log::ActivityLog;

/// 認証ユースケース
///
/// キャッシュ済みの認証情報が新しければそのまま返し、期限が近ければ
/// リフレッシュトークンで更新する。更新に失敗した場合は理由を問わず
/// 対話フローにフォールバックする。
pub struct AuthenticateUseCase<P: IdentityProvider, C: TokenCacheRepository> {
    provider: Arc<P>,
    cache: Arc<C>,
    log: ActivityLog,
}

impl<P: IdentityProvider, C: TokenCacheRepository> AuthenticateUseCase<P, C> {
    /// 新しいユースケースを作成
    ///
    /// # Arguments
    ///
    /// * `provider` - IDプロバイダー
    /// * `cache` - トークンキャッシュ
    /// * `log` - アクティビティログ
    pub fn new(provider: Arc<P>, cache: Arc<C>, log: ActivityLog) -> Self {
        Self {
            provider,
            cache,
            log,
        }
    }

    /// 有効なアクセストークンを取得する
    ///
    /// # Arguments
    ///
    /// * `flow` - 対話が必要になった場合に使うフロー
    ///
    /// # Errors
    ///
    /// 対話フローが失敗した場合は `Authentication`、
    /// 新しい認証情報を保存できない場合は `TokenCache`
    pub async fn acquire_token(&self, flow: AuthFlow) -> Result<Credential, UploaderError> {
        let cached = match self.cache.load().await {
            Ok(cached) => cached,
            Err(e) => {
                self.log
                    .warn(format!("トークンキャッシュを読み込めません: {}", e));
                None
            }
        };

        if let Some(cached) = cached {
            if !cached.needs_refresh() {
                self.log.debug("キャッシュ済みのトークンを使用します");
                return Ok(cached);
            }

            if let Some(refresh_token) = cached.refresh_token.as_deref() {
                match self.provider.refresh(refresh_token).await {
                    Ok(credential) => {
                        let credential = credential.inherit_refresh_token(&cached);
                        self.log.auth("トークン更新", true);
                        self.cache.save(&credential).await?;
                        return Ok(credential);
                    }
                    Err(e) => {
                        self.log.warn(format!("トークンの更新に失敗しました: {}", e));
                        self.log.auth("トークン更新", false);
                    }
                }
            }
        }

        self.interactive(flow).await
    }

    /// キャッシュを無視して対話フローでサインインする
    pub async fn login(&self, flow: AuthFlow) -> Result<Credential, UploaderError> {
        self.interactive(flow).await
    }

    /// キャッシュ済みの認証情報を削除する
    ///
    /// # Returns
    ///
    /// キャッシュが存在していた場合は `true`
    pub async fn logout(&self) -> Result<bool, UploaderError> {
        let removed = self.cache.clear().await?;
        if removed {
            self.log.info("トークンキャッシュを削除しました");
        } else {
            self.log.info("トークンキャッシュは存在しません");
        }
        Ok(removed)
    }

    async fn interactive(&self, flow: AuthFlow) -> Result<Credential, UploaderError> {
        self.log.info(format!("対話型認証を開始します ({})", flow));

        let result = match flow {
            AuthFlow::DeviceCode => self.provider.device_code_flow().await,
            AuthFlow::AuthorizationCode => self.provider.authorization_code_flow().await,
        };

        let action = match flow {
            AuthFlow::DeviceCode => "デバイスコードフロー",
            AuthFlow::AuthorizationCode => "認可コードフロー",
        };
        self.log.auth(action, result.is_ok());

        let credential = result?;
        self.cache.save(&credential).await?;
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::identity_provider::MockIdentityProvider;
    use crate::domain::repositories::token_cache_repository::MockTokenCacheRepository;
    use chrono::{Duration, Utc};
    use mockall::predicate::eq;

    fn credential(access: &str, refresh: Option<&str>, minutes_left: i64) -> Credential {
        Credential {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_at: Utc::now() + Duration::minutes(minutes_left),
            scopes: vec!["Files.ReadWrite.All".to_string()],
        }
    }

    fn use_case(
        provider: MockIdentityProvider,
        cache: MockTokenCacheRepository,
    ) -> AuthenticateUseCase<MockIdentityProvider, MockTokenCacheRepository> {
        AuthenticateUseCase::new(Arc::new(provider), Arc::new(cache), ActivityLog::default())
    }

    #[tokio::test]
    async fn test_fresh_cache_is_returned_without_writing() {
        let mut cache = MockTokenCacheRepository::new();
        cache
            .expect_load()
            .times(1)
            .returning(|| Ok(Some(credential("cached", Some("r1"), 60))));
        cache.expect_save().never();

        let mut provider = MockIdentityProvider::new();
        provider.expect_refresh().never();
        provider.expect_device_code_flow().never();

        let credential = use_case(provider, cache)
            .acquire_token(AuthFlow::DeviceCode)
            .await
            .unwrap();

        assert_eq!(credential.access_token, "cached");
    }

    #[tokio::test]
    async fn test_expiring_cache_is_refreshed_silently() {
        let mut cache = MockTokenCacheRepository::new();
        cache
            .expect_load()
            .returning(|| Ok(Some(credential("old", Some("r1"), 2))));
        cache
            .expect_save()
            .withf(|c: &Credential| c.access_token == "new" && c.refresh_token.as_deref() == Some("r1"))
            .times(1)
            .returning(|_| Ok(()));

        let mut provider = MockIdentityProvider::new();
        // 新しいリフレッシュトークンを返さない応答
        provider
            .expect_refresh()
            .with(eq("r1"))
            .times(1)
            .returning(|_| Ok(credential("new", None, 60)));
        provider.expect_device_code_flow().never();

        let credential = use_case(provider, cache)
            .acquire_token(AuthFlow::DeviceCode)
            .await
            .unwrap();

        assert_eq!(credential.access_token, "new");
        assert_eq!(credential.refresh_token.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_refresh_failure_falls_back_to_interactive_flow() {
        let mut cache = MockTokenCacheRepository::new();
        cache
            .expect_load()
            .returning(|| Ok(Some(credential("old", Some("revoked"), -10))));
        cache
            .expect_save()
            .withf(|c: &Credential| c.access_token == "interactive")
            .times(1)
            .returning(|_| Ok(()));

        let mut provider = MockIdentityProvider::new();
        provider.expect_refresh().times(1).returning(|_| {
            Err(UploaderError::Authentication("invalid_grant".to_string()))
        });
        provider
            .expect_authorization_code_flow()
            .times(1)
            .returning(|| Ok(credential("interactive", Some("r2"), 60)));

        let credential = use_case(provider, cache)
            .acquire_token(AuthFlow::AuthorizationCode)
            .await
            .unwrap();

        assert_eq!(credential.access_token, "interactive");
    }

    #[tokio::test]
    async fn test_no_cache_runs_device_flow() {
        let mut cache = MockTokenCacheRepository::new();
        cache.expect_load().returning(|| Ok(None));
        cache.expect_save().times(1).returning(|_| Ok(()));

        let mut provider = MockIdentityProvider::new();
        provider.expect_refresh().never();
        provider
            .expect_device_code_flow()
            .times(1)
            .returning(|| Ok(credential("device", Some("r1"), 60)));

        let credential = use_case(provider, cache)
            .acquire_token(AuthFlow::DeviceCode)
            .await
            .unwrap();

        assert_eq!(credential.access_token, "device");
    }

    #[tokio::test]
    async fn test_expired_cache_without_refresh_token_goes_interactive() {
        let mut cache = MockTokenCacheRepository::new();
        cache
            .expect_load()
            .returning(|| Ok(Some(credential("old", None, -1))));
        cache.expect_save().times(1).returning(|_| Ok(()));

        let mut provider = MockIdentityProvider::new();
        provider.expect_refresh().never();
        provider
            .expect_device_code_flow()
            .times(1)
            .returning(|| Ok(credential("device", None, 60)));

        let result = use_case(provider, cache)
            .acquire_token(AuthFlow::DeviceCode)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_treated_as_missing() {
        let mut cache = MockTokenCacheRepository::new();
        cache
            .expect_load()
            .returning(|| Err(UploaderError::TokenCache("expected value at line 1".to_string())));
        cache.expect_save().times(1).returning(|_| Ok(()));

        let mut provider = MockIdentityProvider::new();
        provider
            .expect_device_code_flow()
            .times(1)
            .returning(|| Ok(credential("device", None, 60)));

        assert!(use_case(provider, cache)
            .acquire_token(AuthFlow::DeviceCode)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_interactive_failure_is_not_cached() {
        let mut cache = MockTokenCacheRepository::new();
        cache.expect_load().returning(|| Ok(None));
        cache.expect_save().never();

        let mut provider = MockIdentityProvider::new();
        provider.expect_device_code_flow().times(1).returning(|| {
            Err(UploaderError::Authentication("authorization_declined".to_string()))
        });

        let result = use_case(provider, cache)
            .acquire_token(AuthFlow::DeviceCode)
            .await;

        assert!(matches!(result, Err(UploaderError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_login_ignores_cache() {
        let mut cache = MockTokenCacheRepository::new();
        cache.expect_load().never();
        cache.expect_save().times(1).returning(|_| Ok(()));

        let mut provider = MockIdentityProvider::new();
        provider
            .expect_device_code_flow()
            .times(1)
            .returning(|| Ok(credential("device", None, 60)));

        let credential = use_case(provider, cache)
            .login(AuthFlow::DeviceCode)
            .await
            .unwrap();
        assert_eq!(credential.access_token, "device");
    }

    #[tokio::test]
    async fn test_logout() {
        let mut cache = MockTokenCacheRepository::new();
        cache.expect_clear().times(1).returning(|| Ok(true));

        let use_case = use_case(MockIdentityProvider::new(), cache);

        assert!(use_case.logout().await.unwrap());
    }
}
