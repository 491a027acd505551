use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::VariantPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 解码器配置，可以从 JSON 文件读取，缺省字段使用默认值
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DecoderConfig {
    /// 最多剥开几层包装
    pub max_wrap_depth: usize,
    /// asset 多变体时的处理策略
    pub variant_policy: VariantPolicy,
    /// 输入大小上限（字节），由调用方在解码前检查
    pub max_input_bytes: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_wrap_depth: 2,
            variant_policy: VariantPolicy::Reject,
            max_input_bytes: 1024 * 1024,
        }
    }
}

impl DecoderConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
