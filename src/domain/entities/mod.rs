//! # Domain Entities
//!
//! ビジネスエンティティとバリューオブジェクトを定義するモジュール
//!
//! ## エンティティ
//!
//! - **UploadSession**: 再開可能アップロードの転送状態
//! - **Credential**: アクセストークンと有効期限
//! - **DriveItem**: リモートのファイル・フォルダー

pub mod credential;
pub mod drive_item;
pub mod upload_session;
