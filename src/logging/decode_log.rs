use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::error::{DecodeError, DecodeErrorKind};
use crate::native::Request;

/// **单次解码日志**
/// 记录输入来源、解码结果以及接入方式（是否包装），便于按接入方统计
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DecodeLog {
    /// 记录时间（RFC 3339）
    pub timestamp: String,
    /// 固定为 "native_decode"
    pub log_type: String,
    /// 输入来源，如文件路径或 "stdin"
    pub source: String,
    /// "success" 或 "failure"
    pub status: String,
    /// 解码后的版本号
    pub version: Option<String>,
    /// 是否以包装形式收到
    pub is_wrapped: Option<bool>,
    /// 素材数量
    pub asset_count: usize,
    /// 失败类别
    pub error_kind: Option<DecodeErrorKind>,
    /// 失败详情
    pub error: Option<String>,
}

impl DecodeLog {
    pub fn new(source: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "native_decode".to_string(),
            source: source.to_string(),
            status: "failure".to_string(), // 默认失败，成功时更新
            version: None,
            is_wrapped: None,
            asset_count: 0,
            error_kind: None,
            error: None,
        }
    }

    pub fn from_result(source: &str, result: &Result<Request, DecodeError>) -> Self {
        let mut log = Self::new(source);
        match result {
            Ok(request) => log.record_success(request),
            Err(err) => log.record_failure(err),
        }
        log
    }

    pub fn record_success(&mut self, request: &Request) {
        self.status = "success".to_string();
        self.version = Some(request.version.clone());
        self.is_wrapped = Some(request.is_wrapped);
        self.asset_count = request.assets.len();
    }

    pub fn record_failure(&mut self, err: &DecodeError) {
        self.status = "failure".to_string();
        self.error_kind = Some(err.kind());
        self.error = Some(err.to_string());
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// 输出为一条 tracing 事件
    pub fn emit(&self) {
        let record = serde_json::to_string(self).unwrap_or_default();
        if self.is_success() {
            info!(decode_log = %record, "native request decoded");
        } else {
            error!(decode_log = %record, "native request rejected");
        }
    }
}
