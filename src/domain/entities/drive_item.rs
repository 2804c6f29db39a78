//! # DriveItem Entity
//!
//! リモートのファイル・フォルダーを表すエンティティ

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// フォルダーファセット
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    #[serde(default)]
    pub child_count: u64,
}

/// ファイルファセット
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// リモートアイテム
///
/// バックエンドの `driveItem` リソースのうち、表示に使うフィールドのみ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<FolderFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date_time: Option<DateTime<Utc>>,
}

impl DriveItem {
    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }
}

/// フォルダー作成の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// 新規作成された
    Created(DriveItem),
    /// 既に存在していた（409）
    AlreadyExists,
}

/// チャンクPUTの応答
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkResponse {
    /// 受理済み、続きを待っている（202）
    InProgress { next_expected_ranges: Vec<String> },
    /// 最終チャンクを受理し、アイテムが確定した（200/201）
    Completed(DriveItem),
}

/// リモートパスを正規化する
///
/// 重複した `/` と先頭・末尾の `/` を取り除く。ルートは空文字列になる。
pub fn normalize_remote_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_remote_path() {
        assert_eq!(normalize_remote_path("/docs//2024/"), "docs/2024");
        assert_eq!(normalize_remote_path("a.txt"), "a.txt");
        assert_eq!(normalize_remote_path("/"), "");
        assert_eq!(normalize_remote_path(""), "");
    }

    #[test]
    fn test_deserialize_file_item() {
        let json = r#"{
            "id": "01ABC",
            "name": "report.pdf",
            "size": 1048576,
            "file": { "mimeType": "application/pdf", "hashes": {} },
            "webUrl": "https://onedrive.live.com/?id=01ABC",
            "lastModifiedDateTime": "2024-12-25T10:00:00Z",
            "@microsoft.graph.downloadUrl": "https://example.invalid/download"
        }"#;

        let item: DriveItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.id, "01ABC");
        assert_eq!(item.name, "report.pdf");
        assert_eq!(item.size, Some(1048576));
        assert!(!item.is_folder());
        assert_eq!(
            item.file.unwrap().mime_type.as_deref(),
            Some("application/pdf")
        );
        assert!(item.last_modified_date_time.is_some());
    }

    #[test]
    fn test_deserialize_folder_item() {
        let json = r#"{
            "id": "01DEF",
            "name": "test_folder",
            "folder": { "childCount": 3 }
        }"#;

        let item: DriveItem = serde_json::from_str(json).unwrap();

        assert!(item.is_folder());
        assert_eq!(item.folder.unwrap().child_count, 3);
        assert!(item.size.is_none());
    }
}
