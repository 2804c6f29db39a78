//! # Use Cases
//!
//! アプリケーションのビジネスフロー（ユースケース）
//!
//! ## ユースケース
//!
//! - **UploadFileUseCase**: 単一ファイルのアップロード（チャンク転送エンジン）
//! - **UploadDirectoryUseCase**: ディレクトリツリーのアップロード
//! - **CreateFolderUseCase**: フォルダー作成（`mkdir -p` 相当を含む）
//! - **ListItemsUseCase** / **GetItemUseCase** / **DeleteItemUseCase**: アイテム操作
//! - **AuthenticateUseCase**: アクセストークンの取得

pub mod authenticate;
pub mod create_folder;
pub mod delete_item;
pub mod get_item;
pub mod list_items;
pub mod upload_directory;
pub mod upload_file;
