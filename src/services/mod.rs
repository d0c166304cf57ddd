//! 业务逻辑服务模块
//! 
//! 封装数据获取、指标计算和筛选逻辑

pub mod common;      // 公共常量和辅助函数
pub mod indicators;  // 技术指标
pub mod report;      // 报告整理
pub mod screener;    // 并发筛选
pub mod stock;       // 日K线数据源
pub mod tickers;     // 股票列表
