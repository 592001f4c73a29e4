//! Storage error taxonomy / 存储错误类型
//!
//! Every failure a driver reaches while servicing a contract operation is
//! returned as one of these variants. Nothing is logged and dropped.

use super::context::Interrupted;

/// Error returned by storage driver operations / 存储驱动错误
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend reported that the object does not exist / 对象不存在
    #[error("path not found: {path}")]
    PathNotFound { path: String },

    /// The requested offset cannot be reached / 偏移量无效
    #[error("invalid offset {offset} for path: {path}")]
    InvalidOffset { path: String, offset: u64 },

    /// The driver does not offer this capability / 驱动不支持该方法
    #[error("unsupported method for driver {driver}")]
    UnsupportedMethod { driver: String },

    /// Path is malformed or escapes the driver root / 路径无效
    #[error("invalid path: {path}")]
    InvalidPath { path: String },

    /// Configuration could not be resolved / 配置无效
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Driver construction could not reach the backend / 连接失败
    #[error("{driver}: failed to connect: {source}")]
    Connect {
        driver: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other backend failure, wrapped with the driver name / 后端错误
    #[error("{driver}: {source}")]
    Backend {
        driver: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The file writer no longer accepts this operation / 写入器已结束
    #[error("file writer already {state}")]
    WriterClosed { state: &'static str },

    /// The request context was cancelled or its deadline passed
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl StorageError {
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    pub fn backend<E>(driver: &str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            driver: driver.to_string(),
            source: Box::new(source),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PathNotFound { .. })
    }
}

/// Result alias for storage operations / 存储操作结果
pub type StorageResult<T> = Result<T, StorageError>;
