//! Walkdir Local File Repository Implementation
//!
//! LocalFileRepositoryのファイルシステム実装

use async_trait::async_trait;
use log::{info, warn};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::domain::errors::UploaderError;
use crate::domain::repositories::local_file_repository::{
    LocalEntry, LocalEntryKind, LocalFileRepository,
};

/// ファイルシステムベースのローカルファイルリポジトリ
pub struct WalkdirLocalFileRepository;

impl WalkdirLocalFileRepository {
    /// 新しいリポジトリを作成
    pub fn new() -> Self {
        Self
    }

    /// ディレクトリを走査する（内部実装）
    fn discover_internal(root: &Path) -> Result<Vec<LocalEntry>, UploaderError> {
        let expanded = shellexpand::tilde(&root.to_string_lossy()).into_owned();
        let root = PathBuf::from(expanded);

        if !root.is_dir() {
            return Err(UploaderError::NotFound(root));
        }

        let mut entries = Vec::new();

        // ソートしておくと、ディレクトリは常にその中身より先に現れる
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Unreadable entry: {}", e);
                    let path = e.path().unwrap_or(&root).to_path_buf();
                    let relative_path = path
                        .strip_prefix(&root)
                        .map(to_slash_path)
                        .unwrap_or_default();
                    entries.push(LocalEntry {
                        path,
                        relative_path,
                        kind: LocalEntryKind::Unreadable {
                            reason: e.to_string(),
                        },
                        size: 0,
                    });
                    continue;
                }
            };

            let path = entry.path();
            let relative_path = match path.strip_prefix(&root) {
                Ok(relative) => to_slash_path(relative),
                Err(_) => continue,
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                entries.push(LocalEntry {
                    path: path.to_path_buf(),
                    relative_path,
                    kind: LocalEntryKind::Directory,
                    size: 0,
                });
            } else if file_type.is_file() {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                entries.push(LocalEntry {
                    path: path.to_path_buf(),
                    relative_path,
                    kind: LocalEntryKind::File,
                    size,
                });
            }
        }

        info!(
            "Found {} entries in {}",
            entries.len(),
            root.display()
        );

        Ok(entries)
    }
}

/// 相対パスを `/` 区切りの文字列にする
fn to_slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl LocalFileRepository for WalkdirLocalFileRepository {
    async fn discover(&self, root: &Path) -> Result<Vec<LocalEntry>, UploaderError> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || Self::discover_internal(&root))
            .await
            .map_err(|e| UploaderError::Io(std::io::Error::other(e)))?
    }
}

impl Default for WalkdirLocalFileRepository {
    fn default() -> Self {
        Self::new()
    }
}
