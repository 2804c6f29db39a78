//! Repository Implementations
//!
//! Domain層のRepositoryトレイトの実装

pub mod json_token_cache_repository;
pub mod walkdir_local_file_repository;
