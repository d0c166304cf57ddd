//! 股票数据服务模块
//!
//! 按股票代码获取日线历史数据，数据源通过 `MarketDataProvider` 抽象

pub mod yahoo;

use std::time::Duration;

use async_trait::async_trait;

use crate::models::OhlcvSeries;

pub use yahoo::YahooProvider;

/// 行情数据源
///
/// 获取不到数据、数据不足 30 根 K 线或请求失败时一律返回 None，调用方直接跳过该股票
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_history(&self, ticker: &str, period: Duration) -> Option<OhlcvSeries>;
}
