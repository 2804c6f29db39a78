//! Workflow Orchestration
//!
//! CLIコマンドごとの依存性注入とユースケースの実行

use anyhow::{bail, Context, Result};
use log::info;
use std::path::Path;
use std::sync::Arc;

use crate::adapter::auth::{
    CodeReceiver, LoopbackCodeReceiver, ManualCodeReceiver, MicrosoftIdentityProvider,
};
use crate::adapter::config::Config;
use crate::adapter::graph::GraphClient;
use crate::adapter::repositories::json_token_cache_repository::JsonTokenCacheRepository;
use crate::adapter::repositories::walkdir_local_file_repository::WalkdirLocalFileRepository;
use crate::application::dto::upload_config::UploadConfig;
use crate::application::use_cases::authenticate::AuthenticateUseCase;
use crate::application::use_cases::create_folder::CreateFolderUseCase;
use crate::application::use_cases::delete_item::DeleteItemUseCase;
use crate::application::use_cases::get_item::GetItemUseCase;
use crate::application::use_cases::list_items::ListItemsUseCase;
use crate::application::use_cases::upload_directory::{join_remote, UploadDirectoryUseCase};
use crate::application::use_cases::upload_file::{resolve_remote_path, UploadFileUseCase};
use crate::domain::entities::drive_item::{normalize_remote_path, FolderOutcome};
use crate::domain::entities::upload_session::{plan_chunks, ChunkRange, UploadStrategy};
use crate::domain::errors::UploaderError;
use crate::domain::repositories::identity_provider::AuthFlow;
use crate::domain::repositories::local_file_repository::{LocalEntryKind, LocalFileRepository};
use crate::domain::services::activity_log::{format_thousands, ActivityLog};
use crate::domain::services::retry_policy::RetryPolicy;

use super::cli::{Args, Command};
use super::console::{item_line, ConsolePrompt, ConsoleProgress};

type Authenticator = AuthenticateUseCase<MicrosoftIdentityProvider, JsonTokenCacheRepository>;

/// 1ファイル分のアップロード計画（dry-run 用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    pub remote_path: String,
    pub size: u64,
    pub strategy: UploadStrategy,
    pub chunks: Vec<ChunkRange>,
}

/// 認証せずにアップロード計画を立てる
///
/// # Errors
///
/// ローカルファイルが存在しない場合は `NotFound`、リモートパスが空の場合は `InvalidPath`
pub fn plan_upload(
    local_path: &Path,
    remote_path: &str,
    config: &UploadConfig,
) -> Result<UploadPlan, UploaderError> {
    let remote_path = resolve_remote_path(local_path, remote_path)?;
    let size = match std::fs::metadata(local_path) {
        Ok(metadata) if metadata.is_file() => metadata.len(),
        _ => return Err(UploaderError::NotFound(local_path.to_path_buf())),
    };

    let strategy = UploadStrategy::choose(size, config.simple_upload_limit, config.chunk_size);
    let chunks = match strategy {
        UploadStrategy::Simple => Vec::new(),
        UploadStrategy::Chunked { .. } => plan_chunks(size, config.chunk_size),
    };

    Ok(UploadPlan {
        remote_path,
        size,
        strategy,
        chunks,
    })
}

fn print_plan(local_path: &Path, plan: &UploadPlan) {
    println!(
        "  {} -> /{} ({} bytes)",
        local_path.display(),
        plan.remote_path,
        format_thousands(plan.size)
    );
    match plan.strategy {
        UploadStrategy::Simple => println!("    単一PUT"),
        UploadStrategy::Chunked { chunk_count } => {
            println!("    チャンク転送: {} chunks", chunk_count);
            for range in &plan.chunks {
                println!("      Content-Range: {}", range.content_range());
            }
        }
    }
}

/// アップローダーのワークフロー
pub struct UploaderWorkflow {
    config: Config,
    log: ActivityLog,
}

impl UploaderWorkflow {
    /// 新しいワークフローを作成
    pub fn new(config: Config, log: ActivityLog) -> Self {
        Self { config, log }
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.config.retry_policy(self.log.clone())
    }

    fn authenticator(&self, manual_code: bool) -> Result<Authenticator, UploaderError> {
        let receiver: Arc<dyn CodeReceiver> = if manual_code {
            Arc::new(ManualCodeReceiver::new())
        } else {
            Arc::new(LoopbackCodeReceiver::new(self.config.redirect_uri.clone()))
        };

        let provider =
            MicrosoftIdentityProvider::new(&self.config, Arc::new(ConsolePrompt), receiver)?;
        let cache = JsonTokenCacheRepository::new(self.config.token_cache_file.clone());

        Ok(AuthenticateUseCase::new(
            Arc::new(provider),
            Arc::new(cache),
            self.log.clone(),
        ))
    }

    /// 認証済みの Graph クライアントを作る
    async fn drive(&self, flow: AuthFlow, manual_code: bool) -> Result<Arc<GraphClient>> {
        let credential = self
            .authenticator(manual_code)?
            .acquire_token(flow)
            .await
            .context("サインインに失敗しました")?;

        let client = GraphClient::new(
            self.config.graph_api_endpoint.clone(),
            credential.access_token,
            self.log.clone(),
        )?;

        Ok(Arc::new(client))
    }

    /// コマンドを実行する
    ///
    /// # Errors
    ///
    /// 失敗した操作のエラー。ディレクトリアップロードで1件でも失敗した場合もエラーになる。
    pub async fn execute(&self, args: Args) -> Result<()> {
        info!("onedrive-uploader: {:?}", args.command);

        match args.command {
            Command::Login => {
                let credential = self.authenticator(args.manual_code)?.login(args.flow).await?;
                println!("✓ サインインしました (有効期限: {})", credential.expires_at);
            }
            Command::Logout => {
                if self.authenticator(args.manual_code)?.logout().await? {
                    println!("✓ トークンキャッシュを削除しました");
                } else {
                    println!("トークンキャッシュはありません");
                }
            }
            Command::Upload {
                local,
                remote,
                dry_run: true,
            } => {
                let plan = plan_upload(&local, &remote, &self.config.upload_config())?;
                println!("✓ Dry-run mode (not actually uploading)");
                print_plan(&local, &plan);
            }
            Command::Upload {
                local,
                remote,
                dry_run: false,
            } => {
                let drive = self.drive(args.flow, args.manual_code).await?;
                let uploader =
                    UploadFileUseCase::new(drive, self.config.upload_config(), self.log.clone());

                let progress = ConsoleProgress::new();
                let item = self
                    .retry_policy()
                    .run(
                        || uploader.execute(&local, &remote, Some(&progress)),
                        UploaderError::is_transient,
                    )
                    .await
                    .with_context(|| format!("{} のアップロードに失敗しました", local.display()))?;

                println!("✓ アップロード完了: {}", item.name);
                if let Some(url) = item.web_url {
                    println!("  {}", url);
                }
            }
            Command::UploadDir {
                local,
                remote,
                dry_run: true,
            } => self.print_directory_plan(&local, &remote).await?,
            Command::UploadDir {
                local,
                remote,
                dry_run: false,
            } => {
                let drive = self.drive(args.flow, args.manual_code).await?;
                let use_case = UploadDirectoryUseCase::new(
                    drive,
                    Arc::new(WalkdirLocalFileRepository::new()),
                    self.config.upload_config(),
                    self.retry_policy(),
                    self.log.clone(),
                );

                let progress = ConsoleProgress::new();
                let summary = use_case
                    .execute(&local, &remote, Some(&progress))
                    .await?;

                println!(
                    "✓ {} files uploaded ({} bytes), {} folders created",
                    summary.uploaded.len(),
                    format_thousands(summary.total_bytes()),
                    summary.folders_created.len()
                );
                for failed in &summary.failed {
                    println!(
                        "✗ {} -> /{}: {}",
                        failed.local_path.display(),
                        failed.remote_path,
                        failed.error
                    );
                }
                if !summary.is_success() {
                    bail!("{} files failed to upload", summary.failed.len());
                }
            }
            Command::Mkdir { path, parents } => {
                let drive = self.drive(args.flow, args.manual_code).await?;
                let use_case = CreateFolderUseCase::new(drive, self.log.clone());
                let retry = self.retry_policy();

                if parents {
                    let created = retry
                        .run(|| use_case.ensure_path(&path), UploaderError::is_transient)
                        .await?;
                    println!("✓ {} folders created", created.len());
                } else {
                    match retry
                        .run(|| use_case.execute(&path), UploaderError::is_transient)
                        .await?
                    {
                        FolderOutcome::Created(item) => println!("✓ フォルダーを作成しました: {}", item.name),
                        FolderOutcome::AlreadyExists => {
                            println!("フォルダーは既に存在します: /{}", normalize_remote_path(&path))
                        }
                    }
                }
            }
            Command::Ls { path } => {
                let drive = self.drive(args.flow, args.manual_code).await?;
                let use_case = ListItemsUseCase::new(drive, self.log.clone());
                let items = self
                    .retry_policy()
                    .run(|| use_case.execute(&path), UploaderError::is_transient)
                    .await?;

                for item in &items {
                    println!("{}", item_line(item));
                }
                println!("{} items", items.len());
            }
            Command::Stat { path } => {
                let drive = self.drive(args.flow, args.manual_code).await?;
                let use_case = GetItemUseCase::new(drive, self.log.clone());
                match self
                    .retry_policy()
                    .run(|| use_case.execute(&path), UploaderError::is_transient)
                    .await?
                {
                    Some(item) => {
                        println!("{}", item_line(&item));
                        println!("  id: {}", item.id);
                        if let Some(url) = item.web_url {
                            println!("  url: {}", url);
                        }
                    }
                    None => println!("not found: /{}", normalize_remote_path(&path)),
                }
            }
            Command::Rm { path } => {
                let drive = self.drive(args.flow, args.manual_code).await?;
                let use_case = DeleteItemUseCase::new(drive, self.log.clone());
                let existed = self
                    .retry_policy()
                    .run(|| use_case.execute(&path), UploaderError::is_transient)
                    .await?;

                if existed {
                    println!("✓ 削除しました: /{}", normalize_remote_path(&path));
                } else {
                    println!("既に存在しません: /{}", normalize_remote_path(&path));
                }
            }
        }

        Ok(())
    }

    async fn print_directory_plan(&self, local_dir: &Path, remote_dir: &str) -> Result<()> {
        let entries = WalkdirLocalFileRepository::new().discover(local_dir).await?;
        let remote_root = normalize_remote_path(remote_dir);
        let config = self.config.upload_config();

        println!("✓ Dry-run mode (not actually uploading)");
        println!("  フォルダー: /{}", remote_root);

        for entry in &entries {
            let remote_path = join_remote(&remote_root, &entry.relative_path);
            match &entry.kind {
                LocalEntryKind::Directory => println!("  フォルダー: /{}", remote_path),
                LocalEntryKind::Unreadable { reason } => {
                    println!("  ✗ {}: {}", entry.path.display(), reason)
                }
                LocalEntryKind::File => {
                    let plan = plan_upload(&entry.path, &remote_path, &config)?;
                    print_plan(&entry.path, &plan);
                }
            }
        }

        Ok(())
    }
}
