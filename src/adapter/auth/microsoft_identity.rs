//! Microsoft Identity Provider
//!
//! IdentityProviderのMicrosoft identity platform実装（oauth2クレート）

use async_trait::async_trait;
use chrono::Utc;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    DeviceAuthorizationUrl, ErrorResponse, PkceCodeChallenge, RedirectUrl, RefreshToken,
    RequestTokenError, Scope, StandardDeviceAuthorizationResponse, TokenResponse, TokenUrl,
};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use super::code_receiver::CodeReceiver;
use crate::adapter::config::Config;
use crate::domain::entities::credential::Credential;
use crate::domain::errors::UploaderError;
use crate::domain::repositories::identity_provider::IdentityProvider;

/// `expires_in` が返されなかった場合の有効期間
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// 対話フローでユーザーに見せる情報の表示先
pub trait AuthPrompt: Send + Sync {
    /// デバイスコードフローの案内を表示する
    fn show_device_code(&self, verification_uri: &str, user_code: &str, expires_in: Duration);

    /// 認可コードフローのURLを表示する
    fn show_authorization_url(&self, url: &str);
}

/// Microsoft identity platform（v2.0 エンドポイント）
pub struct MicrosoftIdentityProvider {
    client: BasicClient,
    scopes: Vec<String>,
    prompt: Arc<dyn AuthPrompt>,
    receiver: Arc<dyn CodeReceiver>,
}

impl MicrosoftIdentityProvider {
    /// 設定からプロバイダーを作成
    ///
    /// # Arguments
    ///
    /// * `config` - 検証済みの設定（クライアントID、エンドポイント、スコープ）
    /// * `prompt` - デバイスコードや認可URLの表示先
    /// * `receiver` - 認可コードの受け取り方
    ///
    /// # Errors
    ///
    /// エンドポイントURLが不正な場合は `Configuration`
    pub fn new(
        config: &Config,
        prompt: Arc<dyn AuthPrompt>,
        receiver: Arc<dyn CodeReceiver>,
    ) -> Result<Self, UploaderError> {
        let invalid = |name: &str, e: url::ParseError| {
            UploaderError::Configuration(format!("invalid {} URL: {}", name, e))
        };

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            config.client_secret.clone().map(ClientSecret::new),
            AuthUrl::new(config.authorize_url()).map_err(|e| invalid("authorize", e))?,
            Some(TokenUrl::new(config.token_url()).map_err(|e| invalid("token", e))?),
        )
        .set_auth_type(AuthType::RequestBody)
        .set_redirect_uri(RedirectUrl::from_url(config.redirect_uri.clone()))
        .set_device_authorization_url(
            DeviceAuthorizationUrl::new(config.device_code_url())
                .map_err(|e| invalid("device code", e))?,
        );

        Ok(Self {
            client,
            scopes: config.scopes.clone(),
            prompt,
            receiver,
        })
    }

    fn scopes(&self) -> impl Iterator<Item = Scope> + '_ {
        self.scopes.iter().cloned().map(Scope::new)
    }

    /// トークンレスポンスを認証情報に変換する
    fn to_credential(&self, token: &BasicTokenResponse) -> Credential {
        let lifetime = token.expires_in().unwrap_or(DEFAULT_TOKEN_LIFETIME);
        let lifetime =
            chrono::Duration::from_std(lifetime).unwrap_or_else(|_| chrono::Duration::hours(1));

        Credential {
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            expires_at: Utc::now() + lifetime,
            scopes: token
                .scopes()
                .map(|scopes| scopes.iter().map(|s| s.as_str().to_string()).collect())
                .unwrap_or_else(|| self.scopes.clone()),
        }
    }
}

/// oauth2 のエラーを分類する
///
/// 通信エラーは `Network`、それ以外（IDプロバイダーの拒否など）は `Authentication`
fn token_error<RE, TE>(context: &str, error: RequestTokenError<RE, TE>) -> UploaderError
where
    RE: std::error::Error + 'static,
    TE: ErrorResponse + Display + 'static,
{
    match error {
        RequestTokenError::ServerResponse(response) => {
            UploaderError::Authentication(format!("{}: {}", context, response))
        }
        RequestTokenError::Request(e) => UploaderError::Network(format!("{}: {}", context, e)),
        RequestTokenError::Parse(e, _) => UploaderError::Authentication(format!(
            "{}: failed to parse response: {}",
            context, e
        )),
        RequestTokenError::Other(message) => {
            UploaderError::Authentication(format!("{}: {}", context, message))
        }
    }
}

#[async_trait]
impl IdentityProvider for MicrosoftIdentityProvider {
    async fn refresh(&self, refresh_token: &str) -> Result<Credential, UploaderError> {
        let refresh_token = RefreshToken::new(refresh_token.to_string());
        let token = self
            .client
            .exchange_refresh_token(&refresh_token)
            .add_scopes(self.scopes())
            .request_async(async_http_client)
            .await
            .map_err(|e| token_error("token refresh", e))?;

        Ok(self.to_credential(&token))
    }

    async fn device_code_flow(&self) -> Result<Credential, UploaderError> {
        let details: StandardDeviceAuthorizationResponse = self
            .client
            .exchange_device_code()
            .map_err(|e| UploaderError::Configuration(e.to_string()))?
            .add_scopes(self.scopes())
            .request_async(async_http_client)
            .await
            .map_err(|e| token_error("device code request", e))?;

        self.prompt.show_device_code(
            details.verification_uri().as_str(),
            details.user_code().secret(),
            details.expires_in(),
        );

        let token = self
            .client
            .exchange_device_access_token(&details)
            .request_async(async_http_client, tokio::time::sleep, None)
            .await
            .map_err(|e| token_error("device code sign-in", e))?;

        Ok(self.to_credential(&token))
    }

    async fn authorization_code_flow(&self) -> Result<Credential, UploaderError> {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (authorize_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(self.scopes())
            .set_pkce_challenge(challenge)
            .url();

        self.prompt.show_authorization_url(authorize_url.as_str());

        let code = self.receiver.receive_code(csrf_state.secret()).await?;

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(verifier)
            .request_async(async_http_client)
            .await
            .map_err(|e| token_error("authorization code exchange", e))?;

        Ok(self.to_credential(&token))
    }
}
