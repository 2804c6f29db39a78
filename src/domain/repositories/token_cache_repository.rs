//! # Token Cache Repository Trait
//!
//! 認証情報の永続化を抽象化

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::domain::entities::credential::Credential;
use crate::domain::errors::UploaderError;

/// トークンキャッシュリポジトリ
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenCacheRepository: Send + Sync {
    /// キャッシュ済みの認証情報を読み込む
    ///
    /// # Returns
    ///
    /// キャッシュが存在しない場合は `None`
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す
    async fn load(&self) -> Result<Option<Credential>, UploaderError>;

    /// 認証情報を保存する
    ///
    /// # Errors
    ///
    /// ファイルの書き込みに失敗した場合にエラーを返す
    async fn save(&self, credential: &Credential) -> Result<(), UploaderError>;

    /// キャッシュを削除する
    ///
    /// # Returns
    ///
    /// キャッシュが存在していた場合に `true`
    async fn clear(&self) -> Result<bool, UploaderError>;
}
