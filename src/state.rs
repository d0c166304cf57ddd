//! 应用共享状态

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::config::AppConfig;
use crate::models::ScreeningProgress;
use crate::services::screener::Screener;
use crate::services::stock::{MarketDataProvider, YahooProvider};
use crate::services::tickers::TickerSource;

/// 保留最近的筛选批次数量
const MAX_TRACKED_RUNS: usize = 16;

/// 按批次记录筛选进度
///
/// 每次筛选分配一个递增的批次号，并发的筛选各自写入自己的进度。
#[derive(Default)]
pub struct ProgressBoard {
    last_run: AtomicU64,
    runs: RwLock<BTreeMap<u64, ScreeningProgress>>,
}

impl ProgressBoard {
    /// 登记新批次，返回批次号
    pub fn begin(&self, total: usize) -> u64 {
        let run_id = self.last_run.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut runs) = self.runs.write() {
            runs.insert(run_id, ScreeningProgress { completed: 0, total });
            while runs.len() > MAX_TRACKED_RUNS {
                runs.pop_first();
            }
        }
        run_id
    }

    /// 更新批次进度，已完成数量只增不减
    pub fn update(&self, run_id: u64, progress: ScreeningProgress) {
        if let Ok(mut runs) = self.runs.write() {
            if let Some(current) = runs.get_mut(&run_id) {
                if progress.completed >= current.completed {
                    *current = progress;
                }
            }
        }
    }

    pub fn get(&self, run_id: u64) -> Option<ScreeningProgress> {
        self.runs.read().ok()?.get(&run_id).copied()
    }

    /// 最近开始的批次
    pub fn latest(&self) -> Option<(u64, ScreeningProgress)> {
        let runs = self.runs.read().ok()?;
        runs.iter().next_back().map(|(id, progress)| (*id, *progress))
    }

    pub fn any_running(&self) -> bool {
        self.runs
            .read()
            .map(|runs| runs.values().any(|p| !p.is_finished()))
            .unwrap_or(false)
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub tickers: TickerSource,
    pub screener: Screener,
    pub progress: ProgressBoard,
}

impl AppState {
    /// 使用 Yahoo Finance 作为数据源
    pub fn new(config: AppConfig, client: reqwest::Client) -> Self {
        let provider = YahooProvider::new(client.clone(), &config.screener.chart_api_url);
        Self::with_provider(config, client, Arc::new(provider))
    }

    pub fn with_provider(
        config: AppConfig,
        client: reqwest::Client,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Self {
        let screener_config = &config.screener;
        let tickers = TickerSource::new(
            client,
            &screener_config.ticker_source_url,
            std::time::Duration::from_secs(screener_config.ticker_source_timeout_secs),
            screener_config.ticker_cache_ttl(),
        );
        let screener = Screener::new(provider, screener_config.history_period());

        Self {
            config,
            tickers,
            screener,
            progress: ProgressBoard::default(),
        }
    }
}
