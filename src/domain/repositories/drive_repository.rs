//! # Drive Repository Trait
//!
//! リモートドライブ操作を抽象化

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::entities::drive_item::{ChunkResponse, DriveItem, FolderOutcome};
use crate::domain::entities::upload_session::ChunkRange;
use crate::domain::errors::UploaderError;

/// ドライブリポジトリ
///
/// パスはすべてドライブルートからの相対パス（先頭・末尾の `/` なし）
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DriveRepository: Send + Sync {
    /// 単一PUTでコンテンツを置き換える（小さいファイル用）
    ///
    /// # Arguments
    ///
    /// * `remote_path` - アップロード先のパス
    /// * `content` - ファイル全体のバイト列
    ///
    /// # Returns
    ///
    /// 作成・更新されたアイテム
    async fn upload_small(
        &self,
        remote_path: &str,
        content: Vec<u8>,
    ) -> Result<DriveItem, UploaderError>;

    /// アップロードセッションを作成する
    ///
    /// # Returns
    ///
    /// 以降のチャンクPUTで使うアップロードURL
    async fn create_upload_session(&self, remote_path: &str) -> Result<String, UploaderError>;

    /// チャンクを1つ送信する
    ///
    /// # Arguments
    ///
    /// * `upload_url` - セッションのアップロードURL
    /// * `range` - このチャンクのバイト範囲
    /// * `chunk` - チャンクのバイト列（長さは `range.len()`）
    async fn upload_chunk(
        &self,
        upload_url: &str,
        range: ChunkRange,
        chunk: Vec<u8>,
    ) -> Result<ChunkResponse, UploaderError>;

    /// フォルダーを作成する
    ///
    /// 既に存在する場合はエラーではなく [`FolderOutcome::AlreadyExists`] を返す
    async fn create_folder(&self, folder_path: &str) -> Result<FolderOutcome, UploaderError>;

    /// フォルダー直下のアイテム一覧（空文字列はルート）
    async fn list_children(&self, folder_path: &str) -> Result<Vec<DriveItem>, UploaderError>;

    /// アイテムを取得する。存在しない場合は `None`
    async fn get_item(&self, item_path: &str) -> Result<Option<DriveItem>, UploaderError>;

    /// アイテムを削除する
    ///
    /// # Returns
    ///
    /// 削除した場合は `true`、元から存在しなかった場合は `false`
    async fn delete_item(&self, item_path: &str) -> Result<bool, UploaderError>;
}
