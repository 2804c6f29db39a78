//! CLI Argument Parsing
//!
//! CLIの引数解析

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::repositories::identity_provider::AuthFlow;

/// OneDrive にファイルをアップロードするCLI
#[derive(Parser, Debug, Clone)]
#[command(name = "onedrive-uploader")]
#[command(about = "Upload files to OneDrive through Microsoft Graph", long_about = None)]
pub struct Args {
    /// JSON config file (environment variables take precedence)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Interactive sign-in flow: device or browser
    #[arg(long, global = true, default_value_t = AuthFlow::DeviceCode)]
    pub flow: AuthFlow,

    /// Paste the redirected URL instead of listening on the redirect URI
    #[arg(long, global = true)]
    pub manual_code: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Sign in interactively and cache the token
    Login,

    /// Remove the cached token
    Logout,

    /// Upload a single file
    Upload {
        /// Local file
        local: PathBuf,

        /// Remote path (a trailing '/' keeps the local file name)
        remote: String,

        /// Show the upload plan without signing in
        #[arg(long)]
        dry_run: bool,
    },

    /// Upload a directory tree
    UploadDir {
        /// Local directory
        local: PathBuf,

        /// Remote folder
        remote: String,

        /// Show the upload plan without signing in
        #[arg(long)]
        dry_run: bool,
    },

    /// Create a folder
    Mkdir {
        path: String,

        /// Create missing parent folders as well
        #[arg(short, long)]
        parents: bool,
    },

    /// List a folder (root by default)
    Ls {
        #[arg(default_value = "")]
        path: String,
    },

    /// Show a single item
    Stat { path: String },

    /// Delete an item
    Rm { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["onedrive-uploader", "login"]);
        assert!(args.config.is_none());
        assert_eq!(args.flow, AuthFlow::DeviceCode);
        assert!(!args.manual_code);
        assert_eq!(args.command, Command::Login);
    }

    #[test]
    fn test_args_upload() {
        let args = Args::parse_from([
            "onedrive-uploader",
            "upload",
            "./report.pdf",
            "Documents/",
            "--dry-run",
        ]);

        assert_eq!(
            args.command,
            Command::Upload {
                local: PathBuf::from("./report.pdf"),
                remote: "Documents/".to_string(),
                dry_run: true,
            }
        );
    }

    #[test]
    fn test_args_browser_flow_after_subcommand() {
        let args = Args::parse_from([
            "onedrive-uploader",
            "upload-dir",
            "photos",
            "Backup/photos",
            "--flow",
            "browser",
            "--manual-code",
            "-c",
            "/custom/config.json",
        ]);

        assert_eq!(args.flow, AuthFlow::AuthorizationCode);
        assert!(args.manual_code);
        assert_eq!(args.config.as_deref(), Some("/custom/config.json"));
        assert!(matches!(args.command, Command::UploadDir { dry_run: false, .. }));
    }

    #[test]
    fn test_args_unknown_flow_rejected() {
        assert!(Args::try_parse_from(["onedrive-uploader", "--flow", "magic", "login"]).is_err());
    }

    #[test]
    fn test_args_ls_defaults_to_root() {
        let args = Args::parse_from(["onedrive-uploader", "ls"]);
        assert_eq!(args.command, Command::Ls { path: String::new() });
    }

    #[test]
    fn test_args_mkdir_parents() {
        let args = Args::parse_from(["onedrive-uploader", "mkdir", "-p", "a/b/c"]);
        assert_eq!(
            args.command,
            Command::Mkdir {
                path: "a/b/c".to_string(),
                parents: true,
            }
        );
    }

    #[test]
    fn test_args_requires_subcommand() {
        assert!(Args::try_parse_from(["onedrive-uploader"]).is_err());
    }
}
