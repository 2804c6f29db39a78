//! Graph API Models
//!
//! Microsoft Graph のリクエスト・レスポンス形式

use serde::{Deserialize, Serialize};

use crate::domain::entities::drive_item::DriveItem;

/// 既存アイテムの扱い
pub const CONFLICT_REPLACE: &str = "replace";
pub const CONFLICT_FAIL: &str = "fail";

/// アップロードセッション作成リクエスト
#[derive(Debug, Serialize)]
pub struct CreateUploadSessionRequest {
    pub item: UploadSessionItem,
}

#[derive(Debug, Serialize)]
pub struct UploadSessionItem {
    #[serde(rename = "@microsoft.graph.conflictBehavior")]
    pub conflict_behavior: &'static str,
}

impl CreateUploadSessionRequest {
    pub fn replace() -> Self {
        Self {
            item: UploadSessionItem {
                conflict_behavior: CONFLICT_REPLACE,
            },
        }
    }
}

/// アップロードセッション作成レスポンス
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSessionResponse {
    pub upload_url: String,
    #[serde(default)]
    pub expiration_date_time: Option<String>,
}

/// チャンク受理（202）時のレスポンス
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgressResponse {
    #[serde(default)]
    pub next_expected_ranges: Vec<String>,
}

/// フォルダー作成リクエスト
#[derive(Debug, Serialize)]
pub struct CreateFolderRequest {
    pub name: String,
    pub folder: EmptyFacet,
    #[serde(rename = "@microsoft.graph.conflictBehavior")]
    pub conflict_behavior: &'static str,
}

#[derive(Debug, Default, Serialize)]
pub struct EmptyFacet {}

impl CreateFolderRequest {
    /// 既に存在する場合は 409 を返させる
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: EmptyFacet::default(),
            conflict_behavior: CONFLICT_FAIL,
        }
    }
}

/// 子アイテム一覧の1ページ
#[derive(Debug, Deserialize)]
pub struct ChildrenPage {
    #[serde(default)]
    pub value: Vec<DriveItem>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Graph のエラーレスポンス
#[derive(Debug, Deserialize)]
pub struct GraphErrorResponse {
    pub error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GraphErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl GraphErrorResponse {
    /// エラーボディから `code: message` 形式のメッセージを作る
    ///
    /// Graph のエラー形式でない場合は `None`
    pub fn describe(body: &str) -> Option<String> {
        let parsed: GraphErrorResponse = serde_json::from_str(body).ok()?;
        let GraphErrorDetail { code, message } = parsed.error;

        match (code.is_empty(), message.is_empty()) {
            (true, true) => None,
            (false, true) => Some(code),
            (true, false) => Some(message),
            (false, false) => Some(format!("{}: {}", code, message)),
        }
    }
}
