//! onedrive-uploader
//!
//! Microsoft Graph 経由で OneDrive にファイルをアップロード

// coverage_nightly cfg が設定されている場合のみ coverage_attribute を有効化
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use clap::Parser;
use std::process::ExitCode;

use onedrive_uploader::adapter::config::Config;
use onedrive_uploader::adapter::logging;
use onedrive_uploader::domain::services::activity_log::ActivityLog;
use onedrive_uploader::driver::{Args, UploaderWorkflow};

#[cfg_attr(coverage_nightly, coverage(off))]
async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::load(args.config.as_deref())?;
    logging::init(config.log_level, &config.log_file)?;

    // Create workflow with injected dependencies
    let workflow = UploaderWorkflow::new(config, ActivityLog::default());

    workflow.execute(args).await
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("エラー: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
