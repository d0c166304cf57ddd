//! 筛选流程的错误分类
//!
//! 单只股票的失败在筛选器内部被吸收，只有批次级别的错误会返回给调用方

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenerError {
    /// 股票列表来源不可用（会降级为内置列表）
    #[error("股票列表来源不可用: {0}")]
    SourceUnavailable(String),

    /// 单只股票数据获取或指标计算失败
    #[error("股票 {ticker} 数据不可用: {reason}")]
    TickerUnavailable { ticker: String, reason: String },

    /// 没有需要分析的股票
    #[error("没有需要分析的股票")]
    NoTickers,

    /// 所有股票都没有得到有效结果
    #[error("{requested} 只股票均未获取到有效数据，请检查网络连接后重试")]
    EmptyResultSet { requested: usize },

    /// 筛选参数超出允许范围
    #[error("无效的筛选参数: {0}")]
    InvalidParameters(String),
}
