use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

pub mod base;
pub mod context;
pub mod error;
pub mod manager;

pub use base::Base;
pub use context::{InterruptSignal, Interrupted, RequestContext};
pub use error::{StorageError, StorageResult};
pub use manager::{DriverBox, DriverFactory, StorageManager};

/// Readable stream returned by [`StorageDriver::reader`] / 读取流
pub type ReadStream = Box<dyn AsyncRead + Unpin + Send>;

/// Configuration item definition / 配置项定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    /// Display title (friendly name) / 显示标题
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ConfigItem {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            item_type: item_type.to_string(),
            default: None,
            required: false,
            help: None,
        }
    }

    pub fn title(mut self, val: &str) -> Self {
        self.title = Some(val.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, val: &str) -> Self {
        self.default = Some(val.to_string());
        self
    }

    pub fn help(mut self, val: &str) -> Self {
        self.help = Some(val.to_string());
        self
    }
}

/// Driver configuration information / 驱动配置信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_root: Option<String>,
}

/// Complete driver information / 驱动完整信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverInfo {
    /// Driver-specific configuration items / 驱动特有配置项
    pub additional: Vec<ConfigItem>,
    /// Basic driver configuration / 驱动基本配置
    pub config: DriverConfig,
}

/// Read-only snapshot of an object's metadata / 文件信息快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
    pub is_dir: bool,
}

/// Driver capability declaration / 驱动能力声明
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capability {
    /// Support offset reading (resumable download) / 支持偏移读取
    pub can_range_read: bool,
    /// Support append write / 支持追加写入
    pub can_append: bool,
    /// Support direct link download / 支持直链下载
    pub can_direct_link: bool,
    /// Writes stay invisible until commit / 提交前写入不可见
    pub transactional_writes: bool,
}

/// Write session handed out by [`StorageDriver::writer`] / 写入会话
///
/// Content written is stored at the writer's path. `commit` seals the
/// session, `cancel` removes the object at the path, `close` releases the
/// backend handle and may be called any number of times.
#[async_trait]
pub trait FileWriter: Send {
    /// Write a chunk; returns the number of bytes accepted / 写入数据
    async fn write(&mut self, buf: &[u8]) -> StorageResult<usize>;

    /// Total object size including content present before an append
    fn size(&self) -> u64;

    /// Release the backend handle / 关闭写入器
    async fn close(&mut self) -> StorageResult<()>;

    /// Remove the whole object at the writer's path / 取消写入并删除对象
    ///
    /// For an append session this also deletes content stored by earlier
    /// sessions, not just the bytes written through this writer.
    async fn cancel(&mut self) -> StorageResult<()>;

    /// Make the written content durable and seal the session / 提交写入
    async fn commit(&mut self) -> StorageResult<()>;
}

/// Storage driver contract consumed by the upstream service / 存储驱动接口
///
/// All paths are logical, slash-rooted object keys.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Driver name / 驱动名称
    fn name(&self) -> &str;

    /// Driver version / 驱动版本
    fn version(&self) -> &str;

    /// Driver capabilities / 驱动能力
    fn capabilities(&self) -> Capability;

    /// Retrieve the whole object at `path` / 读取完整内容
    async fn get_content(&self, ctx: &RequestContext, path: &str) -> StorageResult<Bytes>;

    /// Store `content` at `path`, replacing any previous object / 写入完整内容
    async fn put_content(&self, ctx: &RequestContext, path: &str, content: &[u8]) -> StorageResult<()>;

    /// Open a stream positioned at `offset` / 打开读取流
    async fn reader(&self, ctx: &RequestContext, path: &str, offset: u64) -> StorageResult<ReadStream>;

    /// Open a write session, appending to existing content when `append` is set
    async fn writer(
        &self,
        ctx: &RequestContext,
        path: &str,
        append: bool,
    ) -> StorageResult<Box<dyn FileWriter>>;

    /// Object metadata / 获取文件信息
    async fn stat(&self, ctx: &RequestContext, path: &str) -> StorageResult<FileInfo>;

    /// Paths of the direct children of `path` / 列出直接子项
    async fn list(&self, ctx: &RequestContext, path: &str) -> StorageResult<Vec<String>>;

    /// Move an object, removing the source / 移动对象
    async fn move_item(&self, ctx: &RequestContext, source: &str, dest: &str) -> StorageResult<()>;

    /// Recursively delete `path` and everything below it / 递归删除
    async fn delete(&self, ctx: &RequestContext, path: &str) -> StorageResult<()>;

    /// URL from which the object can be fetched directly / 获取直链
    async fn url_for(
        &self,
        _ctx: &RequestContext,
        _path: &str,
        _options: &serde_json::Map<String, serde_json::Value>,
    ) -> StorageResult<String> {
        Err(StorageError::UnsupportedMethod {
            driver: self.name().to_string(),
        })
    }
}
