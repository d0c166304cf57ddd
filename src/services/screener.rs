//! 并发筛选
//!
//! 每只股票一个任务，任务内获取日线并计算指标，最多 `max_concurrency` 个任务同时运行。
//! 结果按完成顺序收集；单只股票失败只会让该股票从结果中消失，不影响整批。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::indicators::compute_indicators;
use super::stock::MarketDataProvider;
use crate::error::ScreenerError;
use crate::models::{ScreeningParameters, ScreeningProgress, ScreeningResult};

/// 进度通道，每完成一个任务推送一次
pub type ProgressSender = mpsc::UnboundedSender<ScreeningProgress>;

pub struct Screener {
    provider: Arc<dyn MarketDataProvider>,
    period: Duration,
}

impl Screener {
    pub fn new(provider: Arc<dyn MarketDataProvider>, period: Duration) -> Self {
        Self { provider, period }
    }

    /// 对股票列表的前 `ticker_limit` 只执行一次筛选
    ///
    /// 返回顺序为任务完成顺序。没有任何有效结果时返回 `EmptyResultSet`，
    /// 与"有结果但都不在需求区"区分开。丢弃返回的 future 会中止仍在运行的任务。
    pub async fn screen(
        &self,
        tickers: &[String],
        params: &ScreeningParameters,
        progress: Option<ProgressSender>,
    ) -> Result<Vec<ScreeningResult>, ScreenerError> {
        let tickers: Vec<String> = tickers.iter().take(params.ticker_limit).cloned().collect();
        if tickers.is_empty() {
            return Err(ScreenerError::NoTickers);
        }

        let total = tickers.len();
        let width = params.max_concurrency.max(1);
        log::info!("开始分析 {} 只股票，并发数 {}", total, width);

        let semaphore = Arc::new(Semaphore::new(width));
        let mut tasks = JoinSet::new();

        for ticker in tickers {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let period = self.period;
            let params = params.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Err(unavailable(&ticker, "任务池已关闭"));
                };
                analyze_ticker(provider.as_ref(), ticker, period, &params).await
            });
        }

        let mut results = Vec::with_capacity(total);
        let mut completed = 0;

        while let Some(joined) = tasks.join_next().await {
            completed += 1;

            match joined {
                Ok(Ok(result)) => {
                    log::debug!(
                        "✅ {} RSI={:.2} 距低点={:.2}% 需求区={}",
                        result.ticker,
                        result.snapshot.rsi14,
                        result.snapshot.distance_from_low30_pct,
                        result.in_demand_zone
                    );
                    results.push(result);
                }
                Ok(Err(e)) => log::debug!("跳过: {}", e),
                Err(e) => log::warn!("分析任务异常退出: {}", e),
            }

            if let Some(tx) = &progress {
                // 接收端关闭不影响筛选
                let _ = tx.send(ScreeningProgress { completed, total });
            }
        }

        log::info!("分析完成: {}/{} 只股票得到有效数据", results.len(), total);

        if results.is_empty() {
            return Err(ScreenerError::EmptyResultSet { requested: total });
        }
        Ok(results)
    }
}

/// 单只股票：获取日线、计算指标、判断需求区
async fn analyze_ticker(
    provider: &dyn MarketDataProvider,
    ticker: String,
    period: Duration,
    params: &ScreeningParameters,
) -> Result<ScreeningResult, ScreenerError> {
    let series = provider
        .fetch_history(&ticker, period)
        .await
        .ok_or_else(|| unavailable(&ticker, "未获取到历史数据"))?;

    let snapshot =
        compute_indicators(&series).ok_or_else(|| unavailable(&ticker, "指标无法计算"))?;

    Ok(ScreeningResult {
        in_demand_zone: params.is_demand_zone(&snapshot),
        ticker,
        snapshot,
        series,
    })
}

fn unavailable(ticker: &str, reason: &str) -> ScreenerError {
    ScreenerError::TickerUnavailable {
        ticker: ticker.to_string(),
        reason: reason.to_string(),
    }
}
