//! HDFS driver parameters / HDFS 驱动参数

use serde_json::{Map, Value};
use std::time::Duration;

use crate::storage::{StorageError, StorageResult};
use crate::utils::{fix_and_clean_path, has_parent_ref};

pub const KEY_ROOT_DIRECTORY: &str = "hdfsrootdirectory";
pub const KEY_NAMENODE: &str = "hdfsnamenode";
pub const KEY_USER: &str = "hdfsuser";
pub const KEY_DIRECTORY_UMASK: &str = "directoryumask";
pub const KEY_REQUEST_TIMEOUT: &str = "requesttimeout";

pub const DEFAULT_ROOT_DIRECTORY: &str = "/tmp/hdfs-registry";
pub const DEFAULT_USER: &str = "hdfs";
pub const DEFAULT_DIRECTORY_UMASK: u32 = 0o755;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Resolved, immutable driver configuration / 已解析的驱动配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdfsParameters {
    /// Confinement prefix for every operation / 根目录
    pub root_directory: String,
    /// Namenode address, `host:port` or a URL / 名称节点地址
    pub namenode: String,
    /// Identity presented to the namenode / 用户
    pub user: String,
    /// Mode for auto-created directories / 目录权限
    pub directory_umask: u32,
    pub request_timeout: Duration,
}

impl HdfsParameters {
    /// Parameters for `namenode` with every other option at its default
    pub fn new(namenode: impl Into<String>) -> StorageResult<Self> {
        let mut map = Map::new();
        map.insert(KEY_NAMENODE.to_string(), Value::String(namenode.into()));
        Self::from_value(&Value::Object(map))
    }

    /// Validate a generic option map / 校验参数
    ///
    /// `Null` means no options were supplied. Values of the wrong type and a
    /// missing namenode are configuration errors.
    pub fn from_value(config: &Value) -> StorageResult<Self> {
        let empty = Map::new();
        let map = match config {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(StorageError::InvalidConfig(format!(
                    "driver parameters must be a map, got {}",
                    type_name(other)
                )))
            }
        };

        for key in map.keys() {
            if ![
                KEY_ROOT_DIRECTORY,
                KEY_NAMENODE,
                KEY_USER,
                KEY_DIRECTORY_UMASK,
                KEY_REQUEST_TIMEOUT,
            ]
            .contains(&key.as_str())
            {
                tracing::debug!("HDFS: ignoring unknown parameter {}", key);
            }
        }

        let root = get_string(map, KEY_ROOT_DIRECTORY)?.unwrap_or_else(|| DEFAULT_ROOT_DIRECTORY.to_string());
        let root_directory = resolve_root(&root)?;

        let namenode = get_string(map, KEY_NAMENODE)?.unwrap_or_default();
        let namenode = namenode.trim().to_string();
        if namenode.is_empty() {
            return Err(StorageError::InvalidConfig(format!(
                "no {} parameter provided",
                KEY_NAMENODE
            )));
        }

        let user = get_string(map, KEY_USER)?.unwrap_or_else(|| DEFAULT_USER.to_string());
        if user.trim().is_empty() {
            return Err(StorageError::InvalidConfig(format!("{} must not be empty", KEY_USER)));
        }

        let directory_umask = match map.get(KEY_DIRECTORY_UMASK) {
            None | Some(Value::Null) => DEFAULT_DIRECTORY_UMASK,
            Some(value) => parse_mode(value)?,
        };

        let request_timeout = match map.get(KEY_REQUEST_TIMEOUT) {
            None | Some(Value::Null) => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            Some(Value::Number(n)) => match n.as_u64() {
                Some(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(StorageError::InvalidConfig(format!(
                        "{} must be a positive number of seconds, got {}",
                        KEY_REQUEST_TIMEOUT, n
                    )))
                }
            },
            Some(other) => {
                return Err(StorageError::InvalidConfig(format!(
                    "{} must be an integer, got {}",
                    KEY_REQUEST_TIMEOUT,
                    type_name(other)
                )))
            }
        };

        Ok(Self {
            root_directory,
            namenode,
            user,
            directory_umask,
            request_timeout,
        })
    }
}

fn get_string(map: &Map<String, Value>, key: &str) -> StorageResult<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(StorageError::InvalidConfig(format!(
            "{} must be a string, got {}",
            key,
            type_name(other)
        ))),
    }
}

/// Accept an integer mode or a string of octal digits such as `"755"`
fn parse_mode(value: &Value) -> StorageResult<u32> {
    let mode = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => u64::from_str_radix(s.trim().trim_start_matches("0o"), 8).ok(),
        other => {
            return Err(StorageError::InvalidConfig(format!(
                "{} must be an integer, got {}",
                KEY_DIRECTORY_UMASK,
                type_name(other)
            )))
        }
    };
    match mode {
        Some(mode) if mode <= 0o7777 => Ok(mode as u32),
        _ => Err(StorageError::InvalidConfig(format!(
            "{} is not a valid permission mode: {}",
            KEY_DIRECTORY_UMASK, value
        ))),
    }
}

fn resolve_root(root: &str) -> StorageResult<String> {
    let root = root.trim();
    if root.is_empty() {
        return Err(StorageError::InvalidConfig(format!("{} must not be empty", KEY_ROOT_DIRECTORY)));
    }
    if has_parent_ref(root) {
        return Err(StorageError::InvalidConfig(format!(
            "{} must not contain '..': {}",
            KEY_ROOT_DIRECTORY, root
        )));
    }
    Ok(fix_and_clean_path(root))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
