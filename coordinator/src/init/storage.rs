//! Storage directory scaffolding.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::InitError;

/// Directories the application expects below its storage root.
pub const STORAGE_LAYOUT: [&str; 8] = [
    "app",
    "app/public",
    "framework",
    "framework/cache",
    "framework/sessions",
    "framework/testing",
    "framework/views",
    "logs",
];

/// Ensures every directory of [`STORAGE_LAYOUT`] exists below `root`.
///
/// Each directory is checked on its own, so a missing child of an existing parent
/// is created as well. Returns the directories that had to be created.
///
/// # Errors
///
/// Returns an error if a directory cannot be created, e.g. because a file is in the way.
pub async fn ensure_storage_tree(root: &Path) -> Result<Vec<PathBuf>, InitError> {
    let mut created = Vec::new();
    for relative in STORAGE_LAYOUT {
        let dir = root.join(relative);
        if fs::metadata(&dir).await.is_ok_and(|meta| meta.is_dir()) {
            continue;
        }
        fs::create_dir_all(&dir)
            .await
            .map_err(InitError::filesystem("create directory", &dir))?;
        created.push(dir);
    }
    Ok(created)
}
