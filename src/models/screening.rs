//! 筛选相关数据模型
//!
//! 筛选参数、单只股票的筛选结果、进度以及返回给前端的报告

use serde::{Deserialize, Serialize};

use super::stock::{IndicatorSnapshot, OhlcvSeries};
use crate::error::ScreenerError;

/// 可选的分析股票数量
pub const TICKER_LIMIT_OPTIONS: [usize; 3] = [25, 50, 100];

pub const RSI_THRESHOLD_RANGE: (f64, f64) = (10.0, 50.0);
pub const DISTANCE_THRESHOLD_RANGE: (f64, f64) = (1.0, 15.0);
pub const VOLUME_THRESHOLD_RANGE: (f64, f64) = (100_000.0, 10_000_000.0);

/// 筛选参数
///
/// 在一次筛选开始前确定，筛选过程中不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningParameters {
    /// RSI 上限（含）
    pub rsi_threshold: f64,
    /// 距 30 日低点百分比上限（含）
    pub distance_threshold_pct: f64,
    /// 成交量下限（含）
    pub volume_threshold: f64,
    /// 只分析列表中的前 N 只股票
    pub ticker_limit: usize,
    /// 并发任务数
    pub max_concurrency: usize,
}

impl ScreeningParameters {
    /// 需求区判断：三个条件同时满足，边界值视为满足
    pub fn is_demand_zone(&self, snapshot: &IndicatorSnapshot) -> bool {
        snapshot.rsi14 <= self.rsi_threshold
            && snapshot.distance_from_low30_pct <= self.distance_threshold_pct
            && snapshot.latest_volume >= self.volume_threshold
    }

    /// 校验操作界面允许的参数范围
    pub fn validate(&self) -> Result<(), ScreenerError> {
        check_range("rsi_threshold", self.rsi_threshold, RSI_THRESHOLD_RANGE)?;
        check_range(
            "distance_threshold",
            self.distance_threshold_pct,
            DISTANCE_THRESHOLD_RANGE,
        )?;
        check_range("volume_threshold", self.volume_threshold, VOLUME_THRESHOLD_RANGE)?;

        if !TICKER_LIMIT_OPTIONS.contains(&self.ticker_limit) {
            return Err(ScreenerError::InvalidParameters(format!(
                "top_n 只能是 {:?} 之一，收到 {}",
                TICKER_LIMIT_OPTIONS, self.ticker_limit
            )));
        }
        if self.max_concurrency == 0 {
            return Err(ScreenerError::InvalidParameters(
                "max_concurrency 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_range(name: &str, value: f64, (min, max): (f64, f64)) -> Result<(), ScreenerError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ScreenerError::InvalidParameters(format!(
            "{} 必须在 {} 到 {} 之间，收到 {}",
            name, min, max, value
        )))
    }
}

/// 筛选请求参数，未提供的字段使用配置中的默认值
#[derive(Debug, Default, Deserialize)]
pub struct ScreeningQuery {
    pub rsi_threshold: Option<f64>,
    pub distance_threshold: Option<f64>,
    pub volume_threshold: Option<f64>,
    pub top_n: Option<usize>,
}

impl ScreeningQuery {
    pub fn into_parameters(
        self,
        defaults: &ScreeningParameters,
    ) -> Result<ScreeningParameters, ScreenerError> {
        let params = ScreeningParameters {
            rsi_threshold: self.rsi_threshold.unwrap_or(defaults.rsi_threshold),
            distance_threshold_pct: self
                .distance_threshold
                .unwrap_or(defaults.distance_threshold_pct),
            volume_threshold: self.volume_threshold.unwrap_or(defaults.volume_threshold),
            ticker_limit: self.top_n.unwrap_or(defaults.ticker_limit),
            max_concurrency: defaults.max_concurrency,
        };
        params.validate()?;
        Ok(params)
    }
}

/// 单只股票的筛选结果
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningResult {
    pub ticker: String,
    pub snapshot: IndicatorSnapshot,
    pub in_demand_zone: bool,
    /// 保留原始序列用于绘图
    pub series: OhlcvSeries,
}

/// 筛选进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningProgress {
    pub completed: usize,
    pub total: usize,
}

impl ScreeningProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_finished(&self) -> bool {
        self.completed >= self.total
    }
}

/// 表格中的一行，数值保留两位小数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub ticker: String,
    pub weekly_pct: f64,
    pub monthly_pct: f64,
    pub rsi: f64,
    pub distance_from_low_pct: f64,
    pub volume: u64,
    pub close: f64,
    pub low_30d: f64,
    pub in_demand_zone: bool,
}

/// 图表中的一个点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: chrono::NaiveDate,
    pub close: f64,
    /// 前 29 根 K 线没有 30 日低点
    pub low_30d: Option<f64>,
    pub volume: f64,
}

/// 排名第一的需求区股票的价格/成交量图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartData {
    pub ticker: String,
    pub summary: ResultRow,
    pub points: Vec<ChartPoint>,
}

/// 一次筛选的完整报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    /// 筛选批次号，可用于查询进度
    #[serde(default)]
    pub run_id: Option<u64>,
    pub parameters: ScreeningParameters,
    /// 实际提交分析的股票数量
    pub tickers_requested: usize,
    pub total_analyzed: usize,
    pub demand_zone_count: usize,
    pub demand_zone_pct: f64,
    pub average_rsi: Option<f64>,
    /// 需求区股票
    pub demand_zone: Vec<ResultRow>,
    /// 全部股票，需求区在前
    pub all: Vec<ResultRow>,
    pub chart: Option<ChartData>,
    pub criteria: String,
    pub generated_at: String,
}
