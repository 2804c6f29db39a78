//! Graph Client
//!
//! DriveRepositoryのMicrosoft Graph実装（reqwest）

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::models::{
    ChildrenPage, CreateFolderRequest, CreateUploadSessionRequest, GraphErrorResponse,
    UploadProgressResponse, UploadSessionResponse,
};
use crate::domain::entities::drive_item::{ChunkResponse, DriveItem, FolderOutcome};
use crate::domain::entities::upload_session::ChunkRange;
use crate::domain::errors::UploaderError;
use crate::domain::repositories::drive_repository::DriveRepository;
use crate::domain::services::activity_log::ActivityLog;

const USER_AGENT: &str = concat!("onedrive-uploader/", env!("CARGO_PKG_VERSION"));

/// Microsoft Graph クライアント
///
/// `base_url` はドライブの所有者までを含むエンドポイント
/// （例: `https://graph.microsoft.com/v1.0/me`）
pub struct GraphClient {
    http: Client,
    base_url: Url,
    access_token: String,
    log: ActivityLog,
}

impl GraphClient {
    /// 新しいクライアントを作成
    ///
    /// # Errors
    ///
    /// HTTPクライアントを構築できない場合は `Configuration`
    pub fn new(
        base_url: Url,
        access_token: impl Into<String>,
        log: ActivityLog,
    ) -> Result<Self, UploaderError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| UploaderError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            access_token: access_token.into(),
            log,
        })
    }

    /// ドライブ内のパスに対応するURLを作る
    ///
    /// - ルート: `{base}/drive/root[/{action}]`
    /// - それ以外: `{base}/drive/root:/{path}[:/{action}]`
    ///
    /// 各セグメントはパーセントエンコードされる。
    pub fn drive_url(&self, path: &str, action: Option<&str>) -> Result<Url, UploaderError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut url = self.base_url.clone();

        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| UploaderError::InvalidPath(self.base_url.to_string()))?;
            parts.pop_if_empty().push("drive");

            if segments.is_empty() {
                parts.push("root");
            } else {
                parts.push("root:");
                let last = segments.len() - 1;
                for (i, segment) in segments.iter().enumerate() {
                    if i == last && action.is_some() {
                        parts.push(&format!("{}:", segment));
                    } else {
                        parts.push(segment);
                    }
                }
            }

            if let Some(action) = action {
                parts.push(action);
            }
        }

        Ok(url)
    }

    fn authorized(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header(ACCEPT, "application/json")
    }

    /// リクエストを送信し、ステータスを記録する
    async fn send(&self, method: &str, url: &str, request: RequestBuilder) -> Result<Response, UploaderError> {
        let response = request
            .send()
            .await
            .map_err(|e| UploaderError::Network(e.to_string()))?;

        self.log.request(method, url, response.status().as_u16());
        Ok(response)
    }

    /// 成功ステータスのレスポンスをJSONとして読む
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, UploaderError> {
        let response = Self::ensure_success(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| UploaderError::Network(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| UploaderError::InvalidResponse(e.to_string()))
    }

    /// 成功以外のステータスを `Transfer` エラーにする
    async fn ensure_success(response: Response) -> Result<Response, UploaderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(transfer_error(status, &body))
    }
}

/// ステータスとボディから `Transfer` エラーを作る
pub fn transfer_error(status: StatusCode, body: &str) -> UploaderError {
    let message = GraphErrorResponse::describe(body)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.chars().take(200).collect())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    UploaderError::Transfer {
        status: status.as_u16(),
        message,
    }
}

/// `a/b/c` を (`a/b`, `c`) に分ける
fn split_parent(path: &str) -> Option<(String, String)> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let (name, parents) = segments.split_last()?;
    Some((parents.join("/"), name.to_string()))
}

#[async_trait]
impl DriveRepository for GraphClient {
    async fn upload_small(
        &self,
        remote_path: &str,
        content: Vec<u8>,
    ) -> Result<DriveItem, UploaderError> {
        let url = self.drive_url(remote_path, Some("content"))?;
        let request = self
            .authorized(Method::PUT, url.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content);

        let response = self.send("PUT", url.as_str(), request).await?;
        Self::read_json(response).await
    }

    async fn create_upload_session(&self, remote_path: &str) -> Result<String, UploaderError> {
        let url = self.drive_url(remote_path, Some("createUploadSession"))?;
        let request = self
            .authorized(Method::POST, url.clone())
            .json(&CreateUploadSessionRequest::replace());

        let response = self.send("POST", url.as_str(), request).await?;
        let session: UploadSessionResponse = Self::read_json(response).await?;

        self.log.debug(format!(
            "アップロードセッションを作成しました: {} (有効期限: {})",
            remote_path,
            session.expiration_date_time.as_deref().unwrap_or("-")
        ));

        Ok(session.upload_url)
    }

    async fn upload_chunk(
        &self,
        upload_url: &str,
        range: ChunkRange,
        chunk: Vec<u8>,
    ) -> Result<ChunkResponse, UploaderError> {
        // セッションURLへのPUTには Authorization ヘッダーを付けない
        let request = self
            .http
            .put(upload_url)
            .header(CONTENT_LENGTH, range.len())
            .header(CONTENT_RANGE, range.content_range())
            .body(chunk);

        let response = self.send("PUT", upload_url, request).await?;

        if response.status() == StatusCode::ACCEPTED {
            let body = response
                .text()
                .await
                .map_err(|e| UploaderError::Network(e.to_string()))?;
            let progress: UploadProgressResponse = if body.trim().is_empty() {
                UploadProgressResponse::default()
            } else {
                serde_json::from_str(&body)
                    .map_err(|e| UploaderError::InvalidResponse(e.to_string()))?
            };

            return Ok(ChunkResponse::InProgress {
                next_expected_ranges: progress.next_expected_ranges,
            });
        }

        let item: DriveItem = Self::read_json(response).await?;
        Ok(ChunkResponse::Completed(item))
    }

    async fn create_folder(&self, folder_path: &str) -> Result<FolderOutcome, UploaderError> {
        let (parent, name) = split_parent(folder_path)
            .ok_or_else(|| UploaderError::InvalidPath(folder_path.to_string()))?;

        let url = self.drive_url(&parent, Some("children"))?;
        let request = self
            .authorized(Method::POST, url.clone())
            .json(&CreateFolderRequest::new(name));

        let response = self.send("POST", url.as_str(), request).await?;
        if response.status() == StatusCode::CONFLICT {
            return Ok(FolderOutcome::AlreadyExists);
        }

        let item: DriveItem = Self::read_json(response).await?;
        Ok(FolderOutcome::Created(item))
    }

    async fn list_children(&self, folder_path: &str) -> Result<Vec<DriveItem>, UploaderError> {
        let mut items = Vec::new();
        let mut next = Some(self.drive_url(folder_path, Some("children"))?);

        while let Some(url) = next.take() {
            let request = self.authorized(Method::GET, url.clone());
            let response = self.send("GET", url.as_str(), request).await?;
            let page: ChildrenPage = Self::read_json(response).await?;

            items.extend(page.value);
            next = match page.next_link {
                Some(link) => Some(Url::parse(&link).map_err(|e| {
                    UploaderError::InvalidResponse(format!("invalid @odata.nextLink: {}", e))
                })?),
                None => None,
            };
        }

        Ok(items)
    }

    async fn get_item(&self, item_path: &str) -> Result<Option<DriveItem>, UploaderError> {
        let url = self.drive_url(item_path, None)?;
        let request = self.authorized(Method::GET, url.clone());

        let response = self.send("GET", url.as_str(), request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Self::read_json(response).await.map(Some)
    }

    async fn delete_item(&self, item_path: &str) -> Result<bool, UploaderError> {
        let url = self.drive_url(item_path, None)?;
        let request = self.authorized(Method::DELETE, url.clone());

        let response = self.send("DELETE", url.as_str(), request).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(transfer_error(status, &body))
            }
        }
    }
}
