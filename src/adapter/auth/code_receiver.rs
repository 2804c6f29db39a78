//! Authorization Code Receivers
//!
//! 認可コードの受け取り（ループバックHTTPリスナー / 手動入力）

use async_trait::async_trait;
use log::{debug, warn};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

use crate::domain::errors::UploaderError;

/// ループバックリスナーの既定の待ち時間
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const MAX_REQUEST_HEAD: usize = 8 * 1024;

const SUCCESS_PAGE: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>認証完了</title></head>\
<body><h1>認証が完了しました</h1><p>このウィンドウを閉じてターミナルに戻ってください。</p></body></html>";

const FAILURE_PAGE: &str = "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>認証失敗</title></head>\
<body><h1>認証に失敗しました</h1><p>ターミナルのメッセージを確認してください。</p></body></html>";

/// 認可コードの受け取り方
#[async_trait]
pub trait CodeReceiver: Send + Sync {
    /// リダイレクトで渡された認可コードを受け取る
    ///
    /// # Arguments
    ///
    /// * `expected_state` - 認可リクエストに付けたCSRFトークン
    async fn receive_code(&self, expected_state: &str) -> Result<String, UploaderError>;
}

/// リダイレクトのクエリパラメータ
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AuthorizationCallback {
    pub path: String,
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl AuthorizationCallback {
    /// リクエストターゲット（`/?code=...`）またはURL全体を解釈する
    pub fn parse(target: &str) -> Option<Self> {
        let target = target.trim();
        let url = if target.starts_with('/') {
            Url::parse(&format!("http://localhost{}", target)).ok()?
        } else {
            Url::parse(target).ok()?
        };

        let mut callback = Self {
            path: url.path().to_string(),
            ..Default::default()
        };

        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.as_ref() {
                "code" => callback.code = Some(value),
                "state" => callback.state = Some(value),
                "error" => callback.error = Some(value),
                "error_description" => callback.error_description = Some(value),
                _ => {}
            }
        }

        Some(callback)
    }

    /// 認可コードを取り出す
    ///
    /// # Errors
    ///
    /// - IDプロバイダーがエラーを返した場合
    /// - `state` が一致しない場合（`state` がない場合は検証しない）
    /// - コードが含まれていない場合
    pub fn into_code(self, expected_state: &str) -> Result<String, UploaderError> {
        if let Some(error) = self.error {
            let description = self.error_description.unwrap_or_default();
            return Err(UploaderError::Authentication(if description.is_empty() {
                error
            } else {
                format!("{}: {}", error, description)
            }));
        }

        if let Some(state) = &self.state {
            if state != expected_state {
                return Err(UploaderError::Authentication(
                    "state mismatch in authorization response".to_string(),
                ));
            }
        }

        self.code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| {
                UploaderError::Authentication("no authorization code in response".to_string())
            })
    }
}

/// ループバックHTTPリスナーで認可コードを受け取る
pub struct LoopbackCodeReceiver {
    redirect_uri: Url,
    timeout: Duration,
}

impl LoopbackCodeReceiver {
    pub fn new(redirect_uri: Url) -> Self {
        Self {
            redirect_uri,
            timeout: DEFAULT_CALLBACK_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// リダイレクトURIから待ち受けアドレスを決める
    pub fn bind_address(&self) -> Result<String, UploaderError> {
        let host = match self.redirect_uri.host_str() {
            Some("localhost") | None => "127.0.0.1",
            Some(host) => host,
        };
        let port = self.redirect_uri.port_or_known_default().ok_or_else(|| {
            UploaderError::Configuration(format!(
                "REDIRECT_URI has no port: {}",
                self.redirect_uri
            ))
        })?;

        Ok(format!("{}:{}", host, port))
    }

    async fn accept_until_callback(
        &self,
        listener: TcpListener,
        expected_state: &str,
    ) -> Result<String, UploaderError> {
        loop {
            let (stream, peer) = listener.accept().await?;
            debug!("Callback connection from {}", peer);

            // 1つの接続の失敗でフロー全体を止めない
            match handle_connection(stream, self.redirect_uri.path(), expected_state).await {
                Ok(Some(result)) => return result,
                Ok(None) => {}
                Err(e) => warn!("Callback connection from {} failed: {}", peer, e),
            }
        }
    }
}

#[async_trait]
impl CodeReceiver for LoopbackCodeReceiver {
    async fn receive_code(&self, expected_state: &str) -> Result<String, UploaderError> {
        let address = self.bind_address()?;
        let listener = TcpListener::bind(&address).await?;
        debug!("Waiting for authorization callback on {}", address);

        tokio::time::timeout(
            self.timeout,
            self.accept_until_callback(listener, expected_state),
        )
        .await
        .map_err(|_| {
            UploaderError::Authentication(format!(
                "timed out after {}s waiting for the authorization callback",
                self.timeout.as_secs()
            ))
        })?
    }
}

/// 1つの接続を処理する
///
/// # Returns
///
/// コールバック以外のパス（favicon など）や、リクエスト行のない接続の場合は `None`
pub async fn handle_connection<S>(
    mut stream: S,
    callback_path: &str,
    expected_state: &str,
) -> Result<Option<Result<String, UploaderError>>, UploaderError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let head = read_request_head(&mut stream).await?;

    // リクエストを送らずに閉じられた接続（ブラウザの事前接続など）は無視する
    let target = match head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
    {
        Some(target) => target,
        None => return Ok(None),
    };

    let callback = match AuthorizationCallback::parse(target) {
        Some(callback) if callback.path == callback_path => callback,
        _ => {
            write_response(&mut stream, "404 Not Found", "").await?;
            return Ok(None);
        }
    };

    let result = callback.into_code(expected_state);
    let page = match &result {
        Ok(_) => SUCCESS_PAGE,
        Err(e) => {
            warn!("Authorization callback rejected: {}", e);
            FAILURE_PAGE
        }
    };
    write_response(&mut stream, "200 OK", page).await?;

    Ok(Some(result))
}

async fn read_request_head<S>(stream: &mut S) -> Result<String, UploaderError>
where
    S: AsyncRead + Unpin,
{
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") || head.len() >= MAX_REQUEST_HEAD {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&head).into_owned())
}

async fn write_response<S>(stream: &mut S, status: &str, body: &str) -> Result<(), UploaderError>
where
    S: AsyncWrite + Unpin,
{
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// 認可コード（またはリダイレクト先URL）を標準入力から受け取る
pub struct ManualCodeReceiver;

impl ManualCodeReceiver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ManualCodeReceiver {
    fn default() -> Self {
        Self::new()
    }
}

/// 入力からコードを取り出す
///
/// リダイレクト先URL全体が貼り付けられた場合はクエリを解釈し、
/// それ以外は入力をそのままコードとして扱う。
pub fn extract_code(input: &str, expected_state: &str) -> Result<String, UploaderError> {
    let input = input.trim();

    if input.contains("code=") || input.contains("error=") {
        let callback = AuthorizationCallback::parse(input)
            .or_else(|| AuthorizationCallback::parse(&format!("/?{}", input.trim_start_matches('?'))))
            .ok_or_else(|| UploaderError::Authentication("could not parse redirect URL".to_string()))?;
        return callback.into_code(expected_state);
    }

    if input.is_empty() {
        return Err(UploaderError::Authentication(
            "no authorization code entered".to_string(),
        ));
    }

    Ok(input.to_string())
}

#[async_trait]
impl CodeReceiver for ManualCodeReceiver {
    async fn receive_code(&self, expected_state: &str) -> Result<String, UploaderError> {
        eprintln!("リダイレクト先のURL全体、または認可コードを貼り付けてください:");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;

        extract_code(&line, expected_state)
    }
}
