//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location / 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "HDFS_BLOBSTORE_CONFIG";

/// Application configuration / 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default tracing filter when RUST_LOG is unset / 默认日志过滤
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Storage driver configuration / 存储驱动配置
    pub storage: StorageConfig,
}

/// Storage driver configuration / 存储驱动配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Driver instance id / 驱动实例 ID
    pub id: String,
    /// Registered driver type / 驱动类型
    pub driver_type: String,
    /// Driver parameters passed to the factory / 驱动参数
    #[serde(default)]
    pub config: Value,
}

fn default_log_filter() -> String {
    "hdfs_blobstore=debug".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            id: "registry".to_string(),
            driver_type: "hdfs".to_string(),
            config: json!({
                "hdfsnamenode": "localhost:9870",
                "hdfsrootdirectory": "/tmp/hdfs-registry",
                "hdfsuser": "hdfs",
                "directoryumask": "755",
            }),
        }
    }
}

/// Get the config file path / 获取配置文件路径
pub fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Configuration plus where it came from / 已加载的配置
///
/// Loading runs before logging is set up, so the caller reports the
/// origin once its subscriber is installed.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    /// The file did not exist and defaults were written / 新建默认配置
    pub created: bool,
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<LoadedConfig, String> {
    load_config_from(&get_config_path())
}

/// Load configuration from `config_path` / 从指定路径加载配置
pub fn load_config_from(config_path: &Path) -> Result<LoadedConfig, String> {
    let created = !config_path.exists();
    let config = if created {
        let config = AppConfig::default();
        save_config_to(config_path, &config)?;
        config
    } else {
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?
    };
    Ok(LoadedConfig {
        config,
        path: config_path.to_path_buf(),
        created,
    })
}

/// Save configuration to file / 保存配置到文件
pub fn save_config_to(config_path: &Path, config: &AppConfig) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_default_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let loaded = load_config_from(&path).unwrap();
        assert!(loaded.created);
        assert_eq!(loaded.path, path);
        let config = loaded.config;
        assert!(path.exists());
        assert_eq!(config.storage.driver_type, "hdfs");
        assert_eq!(config.log_filter, "hdfs_blobstore=debug");

        let reloaded = load_config_from(&path).unwrap();
        assert!(!reloaded.created);
        let reloaded = reloaded.config;
        assert_eq!(reloaded.storage.id, config.storage.id);
        assert_eq!(reloaded.storage.config, config.storage.config);
    }

    #[test]
    fn test_load_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(
            &path,
            r#"{"storage":{"id":"prod","driver_type":"hdfs","config":{"hdfsnamenode":"nn:9870"}}}"#,
        )
        .unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert!(!loaded.created);
        let config = loaded.config;
        assert_eq!(config.storage.id, "prod");
        assert_eq!(config.storage.config["hdfsnamenode"], "nn:9870");
        assert_eq!(config.log_filter, "hdfs_blobstore=debug");
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.starts_with("Failed to parse config file"));
    }
}
