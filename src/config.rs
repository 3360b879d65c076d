//! 配置模块，负责加载JSON配置文件
//!
//! ```json
//! {
//!     "backend": "postgres",
//!     "table_mapping": { "Account": "accounts", "Contact": "contacts" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::translator::Backend;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "dsql.json";
/// 覆盖配置文件路径的环境变量
pub const CONFIG_ENV_VAR: &str = "DSQL_CONFIG";

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {0}")]
    NotFound(PathBuf),

    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("无法解析JSON配置文件 {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 翻译器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DsqlConfig {
    /// 目标SQL方言
    pub backend: Backend,
    /// 实体名到数据库表名的映射
    pub table_mapping: HashMap<String, String>,
}

impl DsqlConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        // 检查文件是否存在
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        // 读取文件内容
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        // 解析JSON
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 配置文件路径：环境变量优先，否则为当前目录下的默认文件
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}
