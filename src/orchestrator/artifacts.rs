//! Filesystem operations on disposable-copy artifacts.

use async_trait::async_trait;
use std::io;
use std::path::Path;

#[async_trait]
pub trait ArtifactFs: Send + Sync {
    /// Byte-for-byte copy of the running image. Returns the number of bytes written.
    async fn copy_image(&self, from: &Path, to: &Path) -> io::Result<u64>;
    async fn exists(&self, path: &Path) -> bool;
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
    async fn remove_file(&self, path: &Path) -> io::Result<()>;
}

pub struct OsArtifactFs;

#[async_trait]
impl ArtifactFs for OsArtifactFs {
    async fn copy_image(&self, from: &Path, to: &Path) -> io::Result<u64> {
        // tokio::fs::copy also carries over permissions, so the copy stays executable.
        match tokio::fs::copy(from, to).await {
            Ok(n) => Ok(n),
            Err(e) => {
                let _ = tokio::fs::remove_file(to).await;
                Err(e)
            }
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}
