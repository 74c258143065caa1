use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Files rooted at `base_path`. Absolute paths passed in bypass the base.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.resolve(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // 先寫暫存檔再 rename，讀者永遠看不到寫到一半的檔案
        let tmp_path = temp_sibling(&full_path);
        let written = match tokio::fs::write(&tmp_path, data).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &full_path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read_roundtrip_creates_parents() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage
            .write_file("docs/live_stock.json", b"{}")
            .await
            .unwrap();

        let data = storage.read_file("docs/live_stock.json").await.unwrap();
        assert_eq!(data, b"{}");
        assert!(!dir.path().join("docs/live_stock.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_replaces_previous_file() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage.write_file("out.json", b"old contents").await.unwrap();
        storage.write_file("out.json", b"new").await.unwrap();

        let data = storage.read_file("out.json").await.unwrap();
        assert_eq!(data, b"new");
    }

    #[tokio::test]
    async fn test_failed_rename_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("out.json")).unwrap();
        std::fs::write(dir.path().join("out.json").join("keep"), "x").unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(storage.write_file("out.json", b"{}").await.is_err());
        assert!(!dir.path().join("out.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_temp_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        // 暫存檔路徑被目錄佔住，寫入本身就失敗
        std::fs::create_dir(dir.path().join("out.json.tmp")).unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(storage.write_file("out.json", b"{}").await.is_err());
        assert!(!dir.path().join("out.json").exists());
    }

    #[tokio::test]
    async fn test_read_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(storage.read_file("missing.txt").await.is_err());
    }
}
