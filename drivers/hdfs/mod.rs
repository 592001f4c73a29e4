//! HDFS 存储驱动 / HDFS storage driver
//!
//! Registry blob storage on HDFS, reached through WebHDFS by default.

pub mod client;
pub mod config;
mod driver;
pub mod memory;
mod reader;
pub mod webhdfs;
mod writer;

pub use client::{Connector, NameNodeClient};
pub use config::HdfsParameters;
pub use driver::{HdfsDriver, DRIVER_NAME, DRIVER_VERSION};
pub use reader::HdfsFileReader;
pub use writer::HdfsFileWriter;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::storage::{Base, ConfigItem, DriverConfig, DriverFactory, StorageDriver, StorageResult};
use config::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_ROOT_DIRECTORY, DEFAULT_USER, KEY_DIRECTORY_UMASK,
    KEY_NAMENODE, KEY_REQUEST_TIMEOUT, KEY_ROOT_DIRECTORY, KEY_USER,
};
use webhdfs::WebHdfsConnector;

/// HDFS 驱动工厂
pub struct HdfsDriverFactory {
    connector: Arc<dyn Connector>,
}

impl Default for HdfsDriverFactory {
    fn default() -> Self {
        Self::with_connector(Arc::new(WebHdfsConnector))
    }
}

impl HdfsDriverFactory {
    /// Factory connecting through `connector` instead of WebHDFS
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl DriverFactory for HdfsDriverFactory {
    fn driver_type(&self) -> &'static str {
        "hdfs"
    }

    fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            name: "HDFS".to_string(),
            default_root: Some(DEFAULT_ROOT_DIRECTORY.to_string()),
        }
    }

    fn additional_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new(KEY_NAMENODE, "string")
                .title("名称节点地址")
                .help("WebHDFS namenode address, e.g. namenode:9870 or https://nn.example:9871")
                .required(),
            ConfigItem::new(KEY_ROOT_DIRECTORY, "string")
                .title("根目录")
                .help("Directory on HDFS that holds all registry data")
                .default(DEFAULT_ROOT_DIRECTORY),
            ConfigItem::new(KEY_USER, "string")
                .title("用户")
                .help("User name presented to the namenode")
                .default(DEFAULT_USER),
            ConfigItem::new(KEY_DIRECTORY_UMASK, "number")
                .title("目录权限")
                .help("Permission bits for created directories, octal such as 755")
                .default("755"),
            ConfigItem::new(KEY_REQUEST_TIMEOUT, "number")
                .title("请求超时")
                .help("Per-request timeout in seconds")
                .default(&DEFAULT_REQUEST_TIMEOUT_SECS.to_string()),
        ]
    }

    async fn create_driver(&self, config: Value) -> StorageResult<Box<dyn StorageDriver>> {
        let params = HdfsParameters::from_value(&config)?;
        let driver = HdfsDriver::connect(params, self.connector.as_ref()).await?;
        Ok(Box::new(Base::new(driver)))
    }
}
