//! 接口统一响应格式

use serde::{Deserialize, Serialize};

use crate::error::ScreenerError;
use crate::services::common::get_eastern_time;

/// 所有接口的外层结构
///
/// 失败时 data 为 null，message 为错误描述；timestamp 为生成响应时的美东时间（RFC 3339）。
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    fn build(success: bool, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            success,
            data,
            message: message.into(),
            timestamp: get_eastern_time(),
        }
    }

    pub fn success(data: T) -> Self {
        Self::build(true, Some(data), "Success")
    }

    /// 成功，但需要提示调用方（例如没有符合条件的股票）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self::build(true, Some(data), message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::build(false, None, message)
    }
}

impl<T> From<&ScreenerError> for ApiResponse<T> {
    fn from(e: &ScreenerError) -> Self {
        Self::error(e.to_string())
    }
}
