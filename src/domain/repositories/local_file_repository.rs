//! # Local File Repository Trait
//!
//! ローカルディレクトリの走査を抽象化

use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[cfg(test)]
use mockall::automock;

use crate::domain::errors::UploaderError;

/// ローカルエントリの種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalEntryKind {
    Directory,
    File,
    /// 走査中に読み込めなかったエントリ（壊れたシンボリックリンクなど）
    Unreadable { reason: String },
}

/// ローカルディレクトリ内のエントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// 絶対（または呼び出し元基準の）パス
    pub path: PathBuf,
    /// ルートからの相対パス（区切りは `/`）
    pub relative_path: String,
    pub kind: LocalEntryKind,
    /// ファイルサイズ（ディレクトリは0）
    pub size: u64,
}

/// ローカルファイルリポジトリ
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LocalFileRepository: Send + Sync {
    /// ルート配下のエントリを発見する
    ///
    /// ディレクトリはその中身より先に並ぶ。ルート自身は含まない。
    ///
    /// # Errors
    ///
    /// ルートが存在しない、またはディレクトリでない場合にエラーを返す
    async fn discover(&self, root: &Path) -> Result<Vec<LocalEntry>, UploaderError>;
}
