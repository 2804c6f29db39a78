//! # Domain Services
//!
//! エンティティに属さないビジネスルール

pub mod activity_log;
pub mod retry_policy;
