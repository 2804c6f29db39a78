//! # Domain Layer
//!
//! このモジュールはビジネスの核心的なルールとエンティティを定義します。
//!
//! ## 特徴
//!
//! - フレームワークに依存しない
//! - HTTP や OAuth の詳細について何も知らない
//! - 純粋なビジネスロジック
//!
//! ## 構成要素
//!
//! - **entities**: ビジネスエンティティ（UploadSession, Credential, DriveItemなど）
//! - **errors**: エラー分類
//! - **repositories**: Repository trait（インターフェース定義のみ）
//! - **services**: Domain Service（リトライポリシー）

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod services;
