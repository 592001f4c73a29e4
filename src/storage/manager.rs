use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::{StorageDriver, StorageResult, DriverConfig, DriverInfo, ConfigItem, RequestContext};

pub type DriverBox = Arc<Box<dyn StorageDriver>>;

/// Driver factory trait / 驱动工厂 trait
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Driver type name / 驱动类型名称
    fn driver_type(&self) -> &'static str;

    /// Resolve parameters and connect a driver instance / 创建驱动实例
    async fn create_driver(&self, config: Value) -> StorageResult<Box<dyn StorageDriver>>;

    /// Return driver basic config / 返回驱动基本配置
    fn driver_config(&self) -> DriverConfig;

    /// Return driver specific config items / 返回驱动特有配置项
    fn additional_items(&self) -> Vec<ConfigItem>;

    /// Generate complete driver info / 生成完整的驱动信息
    fn driver_info(&self) -> DriverInfo {
        DriverInfo {
            additional: self.additional_items(),
            config: self.driver_config(),
        }
    }
}

/// Storage manager (manages all driver instances) / 存储管理器
#[derive(Clone)]
pub struct StorageManager {
    drivers: Arc<RwLock<HashMap<String, DriverBox>>>,
    factories: Arc<RwLock<HashMap<String, Arc<Box<dyn DriverFactory>>>>>,
    /// Driver error status (id -> error message) / 驱动错误状态
    driver_errors: Arc<RwLock<HashMap<String, String>>>,
}

impl Default for StorageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageManager {
    pub fn new() -> Self {
        Self {
            drivers: Arc::new(RwLock::new(HashMap::new())),
            factories: Arc::new(RwLock::new(HashMap::new())),
            driver_errors: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register driver factory / 注册驱动工厂
    pub async fn register_factory(&self, factory: Box<dyn DriverFactory>) -> Result<()> {
        let driver_type = factory.driver_type().to_string();
        let factory_box = Arc::new(factory);

        let mut factories = self.factories.write().await;
        factories.insert(driver_type.clone(), factory_box);

        tracing::info!("Driver factory registered: {}", driver_type);
        Ok(())
    }

    /// Create driver instance (verify on success, record error on failure) / 创建驱动实例
    pub async fn create_driver(&self, id: String, driver_type: &str, config: Value) -> Result<String> {
        let factory = {
            let factories = self.factories.read().await;
            factories.get(driver_type)
                .cloned()
                .ok_or_else(|| anyhow!("Driver type not found: {}", driver_type))?
        };

        match factory.create_driver(config).await {
            Ok(driver) => {
                let driver_box: DriverBox = Arc::new(driver);

                // Verify driver validity: try list root directory / 验证驱动有效性
                let validation_result = driver_box.list(&RequestContext::background(), "/").await;

                let mut drivers = self.drivers.write().await;
                drivers.insert(id.clone(), driver_box);
                drop(drivers);

                match validation_result {
                    Ok(_) => {
                        let mut errors = self.driver_errors.write().await;
                        errors.remove(&id);
                        tracing::info!("Driver created and verified: {} ({})", id, driver_type);
                    }
                    Err(e) => {
                        // Verification failed, record error (but driver still created) / 验证失败
                        let error_msg = e.to_string();
                        let mut errors = self.driver_errors.write().await;
                        errors.insert(id.clone(), error_msg.clone());
                        tracing::warn!("Driver created but verification failed: {} ({}) - {}", id, driver_type, error_msg);
                    }
                }

                Ok(id)
            }
            Err(e) => {
                let error_msg = e.to_string();
                let mut errors = self.driver_errors.write().await;
                errors.insert(id.clone(), error_msg.clone());

                tracing::error!("Driver creation failed: {} ({}) - {}", id, driver_type, error_msg);
                Err(e.into())
            }
        }
    }

    /// Get driver error status / 获取驱动错误状态
    pub async fn get_driver_error(&self, id: &str) -> Option<String> {
        let errors = self.driver_errors.read().await;
        errors.get(id).cloned()
    }

    /// Get driver instance / 获取驱动实例
    pub async fn get_driver(&self, id: &str) -> Option<DriverBox> {
        let drivers = self.drivers.read().await;
        drivers.get(id).cloned()
    }

    /// Remove driver instance / 移除驱动实例
    pub async fn remove_driver(&self, id: &str) -> Result<()> {
        let mut drivers = self.drivers.write().await;
        drivers.remove(id)
            .ok_or_else(|| anyhow!("Driver not found: {}", id))?;

        let mut errors = self.driver_errors.write().await;
        errors.remove(id);

        tracing::info!("Driver removed: {}", id);
        Ok(())
    }

    /// List all drivers / 列出所有驱动
    pub async fn list_drivers(&self) -> Vec<String> {
        let drivers = self.drivers.read().await;
        let mut ids: Vec<String> = drivers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// List all available driver types / 列出所有可用的驱动类型
    pub async fn list_driver_types(&self) -> Vec<String> {
        let factories = self.factories.read().await;
        let mut types: Vec<String> = factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Driver info of a registered factory / 获取驱动信息
    pub async fn driver_info(&self, driver_type: &str) -> Option<DriverInfo> {
        let factories = self.factories.read().await;
        factories.get(driver_type).map(|f| f.driver_info())
    }
}
