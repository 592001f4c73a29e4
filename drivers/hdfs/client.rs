//! Namenode client abstraction / 名称节点客户端抽象
//!
//! The driver talks to HDFS only through these traits. Implementations own
//! the wire protocol and connection handling.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::storage::Interrupted;

use super::config::HdfsParameters;

/// Error reported by a namenode client / 客户端错误
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{exception}: {message}")]
    Exception { exception: String, message: String },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl RemoteError {
    pub fn exception(exception: &str, message: impl Into<String>) -> Self {
        Self::Exception {
            exception: exception.to_string(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Status of a file or directory as reported by the namenode / 文件状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Last path component
    pub name: String,
    pub length: u64,
    pub modification_time: DateTime<Utc>,
    pub is_dir: bool,
}

/// Open, seekable read handle / 可定位的读取句柄
#[async_trait]
pub trait RemoteFileReader: Send {
    /// Length of the file when it was opened
    fn len(&self) -> u64;

    /// Position the handle; returns the position actually reached, which is
    /// never past the end of the file.
    async fn seek(&mut self, offset: u64) -> RemoteResult<u64>;

    /// Consume the handle into a stream of the bytes from the current position
    fn into_stream(self: Box<Self>) -> BoxStream<'static, std::io::Result<Bytes>>;
}

/// Open write handle; every write reaches the backend before it returns.
#[async_trait]
pub trait RemoteFileWriter: Send {
    async fn write(&mut self, data: &[u8]) -> RemoteResult<()>;

    async fn close(&mut self) -> RemoteResult<()>;
}

/// Connected namenode client / 已连接的名称节点客户端
///
/// One client is shared by every operation of a driver and by concurrent
/// requests, so implementations must be safe for concurrent use.
#[async_trait]
pub trait NameNodeClient: Send + Sync {
    /// Identity the client presents to the namenode
    fn user(&self) -> &str;

    async fn read_file(&self, path: &str) -> RemoteResult<Bytes>;

    async fn open(&self, path: &str) -> RemoteResult<Box<dyn RemoteFileReader>>;

    /// Create a new empty file; fails if the path already exists.
    async fn create(&self, path: &str) -> RemoteResult<Box<dyn RemoteFileWriter>>;

    /// Open an existing file for appending.
    async fn append(&self, path: &str) -> RemoteResult<Box<dyn RemoteFileWriter>>;

    /// Remove a file or empty directory.
    async fn remove(&self, path: &str) -> RemoteResult<()>;

    /// Remove a path and everything below it.
    async fn remove_all(&self, path: &str) -> RemoteResult<()>;

    /// Rename `from` to `to`, replacing an existing file at `to`.
    async fn rename(&self, from: &str, to: &str) -> RemoteResult<()>;

    async fn stat(&self, path: &str) -> RemoteResult<FileStatus>;

    async fn read_dir(&self, path: &str) -> RemoteResult<Vec<FileStatus>>;

    /// Create `path` and any missing ancestors with `mode`.
    async fn mkdir_all(&self, path: &str, mode: u32) -> RemoteResult<()>;
}

/// Establishes namenode connections from resolved parameters / 连接器
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &HdfsParameters) -> RemoteResult<Arc<dyn NameNodeClient>>;
}
