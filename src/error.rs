use serde::Serialize;
use thiserror::Error;

/// Native 请求解码错误。
/// 每个阶段失败即返回，不做任何部分解码或重试。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// 输入本身或被包装的字符串不是合法 JSON
    #[error("malformed JSON in {context}: {message}")]
    MalformedJson { context: &'static str, message: String },

    /// 既不是 1.1 结构，也不是可识别的旧版结构
    #[error("unrecognized native request shape: {0}")]
    UnrecognizedShape(String),

    /// 字段无法转换为期望的标量类型
    #[error("invalid value at `{field}`: {reason}")]
    InvalidScalar { field: String, reason: String },

    /// asset 没有或有多个变体键
    #[error("invalid variant in assets[{index}]: {reason}")]
    InvalidAssetVariant { index: usize, reason: String },
}

/// 错误类别，用于日志中的稳定标签
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorKind {
    MalformedJson,
    UnrecognizedShape,
    InvalidScalar,
    InvalidAssetVariant,
}

impl DecodeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeErrorKind::MalformedJson => "malformed_json",
            DecodeErrorKind::UnrecognizedShape => "unrecognized_shape",
            DecodeErrorKind::InvalidScalar => "invalid_scalar",
            DecodeErrorKind::InvalidAssetVariant => "invalid_asset_variant",
        }
    }
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::MalformedJson { .. } => DecodeErrorKind::MalformedJson,
            DecodeError::UnrecognizedShape(_) => DecodeErrorKind::UnrecognizedShape,
            DecodeError::InvalidScalar { .. } => DecodeErrorKind::InvalidScalar,
            DecodeError::InvalidAssetVariant { .. } => DecodeErrorKind::InvalidAssetVariant,
        }
    }

    pub(crate) fn invalid_scalar(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DecodeError::InvalidScalar {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_variant(index: usize, reason: impl Into<String>) -> Self {
        DecodeError::InvalidAssetVariant {
            index,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
