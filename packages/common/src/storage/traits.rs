use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::path::StoragePath;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Path-addressed file storage.
///
/// Writing to a path that already holds a file replaces it.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes at the given path.
    async fn put(&self, path: &StoragePath, data: &[u8]) -> Result<(), StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(path, reader).await.map(|_| ())
    }

    /// Store data from an async reader and return the number of bytes written.
    async fn put_stream(&self, path: &StoragePath, reader: BoxReader)
    -> Result<u64, StorageError>;

    /// Retrieve all bytes of a file.
    async fn get(&self, path: &StoragePath) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a file as a streaming async reader.
    async fn get_stream(&self, path: &StoragePath) -> Result<BoxReader, StorageError>;

    /// Check whether a file exists.
    async fn exists(&self, path: &StoragePath) -> Result<bool, StorageError>;

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &StoragePath) -> Result<bool, StorageError>;

    /// Get the size of a file in bytes.
    async fn size(&self, path: &StoragePath) -> Result<u64, StorageError>;
}
