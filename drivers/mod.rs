// Driver package / 驱动包
pub mod hdfs;

use crate::storage::StorageManager;

/// Register all drivers to StorageManager / 注册所有驱动
pub async fn register_all(manager: &StorageManager) -> anyhow::Result<()> {
    // Register HDFS driver (WebHDFS transport) / 注册HDFS驱动
    manager.register_factory(Box::new(hdfs::HdfsDriverFactory::default())).await?;
    Ok(())
}
