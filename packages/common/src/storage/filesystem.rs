use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::path::StoragePath;
use super::traits::{BoxReader, FileStore};

/// Filesystem-backed file store.
///
/// Files live at `{base_path}/{storage path}`. Writes go through a temp file
/// under `{base_path}/.tmp` and are renamed into place, so readers never see a
/// partially written file.
pub struct FilesystemFileStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemFileStore {
    /// Create a new filesystem file store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn file_path(&self, path: &StoragePath) -> PathBuf {
        path.to_fs_path(&self.base_path)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl FileStore for FilesystemFileStore {
    async fn put_stream(
        &self,
        path: &StoragePath,
        mut reader: BoxReader,
    ) -> Result<u64, StorageError> {
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        let file_path = self.file_path(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &file_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(path = %path, bytes = total_bytes, "stored file");
        Ok(total_bytes)
    }

    async fn get_stream(&self, path: &StoragePath) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.file_path(path)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &StoragePath) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.file_path(path)).await?)
    }

    async fn delete(&self, path: &StoragePath) -> Result<bool, StorageError> {
        match fs::remove_file(self.file_path(path)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &StoragePath) -> Result<u64, StorageError> {
        match fs::metadata(self.file_path(path)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
