//! # Upload Directory Use Case
//!
//! ローカルディレクトリのツリーをまとめてアップロードする

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::create_folder::CreateFolderUseCase;
use super::upload_file::{ProgressObserver, UploadFileUseCase};
use crate::application::dto::upload_config::UploadConfig;
use crate::domain::entities::drive_item::{normalize_remote_path, FolderOutcome};
use crate::domain::errors::UploaderError;
use crate::domain::repositories::drive_repository::DriveRepository;
use crate::domain::repositories::local_file_repository::{LocalEntryKind, LocalFileRepository};
use crate::domain::services::activity_log::ActivityLog;
use crate::domain::services::retry_policy::RetryPolicy;

/// アップロードに成功したファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub size: u64,
}

/// アップロードに失敗したファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub error: String,
}

/// ディレクトリアップロードの結果のサマリー
#[derive(Debug, Clone, Default)]
pub struct DirectoryUploadSummary {
    pub uploaded: Vec<UploadedFile>,
    pub failed: Vec<FailedUpload>,
    /// 新規に作成されたリモートフォルダー
    pub folders_created: Vec<String>,
}

impl DirectoryUploadSummary {
    /// すべてのファイルが成功したかどうか
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.uploaded.iter().map(|f| f.size).sum()
    }
}

/// ディレクトリアップロードユースケース
///
/// ファイルごとにチャンク転送エンジンをリトライポリシーで包んで実行する。
/// 個々のファイルの失敗は記録して次のファイルへ進む。
pub struct UploadDirectoryUseCase<D: DriveRepository, L: LocalFileRepository> {
    local_files: Arc<L>,
    folders: CreateFolderUseCase<D>,
    uploader: UploadFileUseCase<D>,
    retry: RetryPolicy,
    log: ActivityLog,
}

impl<D: DriveRepository, L: LocalFileRepository> UploadDirectoryUseCase<D, L> {
    /// 新しいユースケースを作成
    ///
    /// # Arguments
    ///
    /// * `drive` - ドライブリポジトリ
    /// * `local_files` - ローカルファイルリポジトリ
    /// * `config` - アップロード設定
    /// * `retry` - ファイル単位・フォルダー単位のリトライポリシー
    /// * `log` - アクティビティログ
    pub fn new(
        drive: Arc<D>,
        local_files: Arc<L>,
        config: UploadConfig,
        retry: RetryPolicy,
        log: ActivityLog,
    ) -> Self {
        Self {
            local_files,
            folders: CreateFolderUseCase::new(drive.clone(), log.clone()),
            uploader: UploadFileUseCase::new(drive, config, log.clone()),
            retry,
            log,
        }
    }

    /// ディレクトリをアップロードする
    ///
    /// # Arguments
    ///
    /// * `local_dir` - アップロード元のローカルディレクトリ
    /// * `remote_dir` - アップロード先のリモートフォルダー
    /// * `observer` - 各ファイルの進捗の通知先
    ///
    /// # Errors
    ///
    /// ローカルディレクトリが走査できない場合、またはフォルダー作成に失敗した場合。
    /// ファイル単位の失敗はエラーにせずサマリーに記録する。
    pub async fn execute(
        &self,
        local_dir: &Path,
        remote_dir: &str,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<DirectoryUploadSummary, UploaderError> {
        let remote_root = normalize_remote_path(remote_dir);
        let entries = self.local_files.discover(local_dir).await?;

        self.log.info(format!(
            "ディレクトリアップロード開始: {} -> /{} ({} entries)",
            local_dir.display(),
            remote_root,
            entries.len()
        ));

        let mut summary = DirectoryUploadSummary::default();

        let created = self
            .retry
            .run(
                || self.folders.ensure_path(&remote_root),
                UploaderError::is_transient,
            )
            .await?;
        summary.folders_created.extend(created);

        for entry in &entries {
            let remote_path = join_remote(&remote_root, &entry.relative_path);

            match &entry.kind {
                LocalEntryKind::Directory => {
                    let remote = remote_path.as_str();
                    let outcome = self
                        .retry
                        .run(|| self.folders.execute(remote), UploaderError::is_transient)
                        .await?;
                    if let FolderOutcome::Created(_) = outcome {
                        summary.folders_created.push(remote_path);
                    }
                }
                LocalEntryKind::File => {
                    let local = entry.path.as_path();
                    let remote = remote_path.as_str();
                    let result = self
                        .retry
                        .run(
                            || self.uploader.execute(local, remote, observer),
                            UploaderError::is_transient,
                        )
                        .await;

                    match result {
                        Ok(_) => summary.uploaded.push(UploadedFile {
                            local_path: entry.path.clone(),
                            remote_path,
                            size: entry.size,
                        }),
                        Err(e) => {
                            self.log.warn(format!(
                                "ファイルをスキップします: {}: {}",
                                entry.path.display(),
                                e
                            ));
                            summary.failed.push(FailedUpload {
                                local_path: entry.path.clone(),
                                remote_path,
                                error: e.to_string(),
                            });
                        }
                    }
                }
                LocalEntryKind::Unreadable { reason } => {
                    self.log.warn(format!(
                        "読み込めないエントリをスキップします: {}: {}",
                        entry.path.display(),
                        reason
                    ));
                    summary.failed.push(FailedUpload {
                        local_path: entry.path.clone(),
                        remote_path,
                        error: reason.clone(),
                    });
                }
            }
        }

        self.log.info(format!(
            "ディレクトリアップロード完了: 成功 {} 件, 失敗 {} 件, 作成フォルダー {} 件",
            summary.uploaded.len(),
            summary.failed.len(),
            summary.folders_created.len()
        ));

        Ok(summary)
    }
}

/// リモートフォルダーと相対パスを連結する
pub fn join_remote(root: &str, relative: &str) -> String {
    let relative = normalize_remote_path(relative);
    if root.is_empty() {
        relative
    } else {
        format!("{}/{}", root, relative)
    }
}
