//! 股票数据模型
//!
//! 定义日线 OHLCV 序列和技术指标快照

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 单日 K 线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    /// 交易日
    pub date: NaiveDate,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 收盘价
    pub close: f64,
    /// 成交量
    pub volume: f64,
}

impl OhlcvBar {
    /// 所有数值字段都是有限的非负数
    pub fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

/// 按日期排序的日线序列
///
/// 只能通过 `from_bars` 构建，保证日期严格递增且每根 K 线字段完整
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OhlcvSeries {
    bars: Vec<OhlcvBar>,
}

impl OhlcvSeries {
    /// 从原始 K 线构建序列
    ///
    /// 丢弃字段不合法的 K 线；同一交易日出现多次时保留最后一条
    pub fn from_bars(bars: Vec<OhlcvBar>) -> Self {
        let mut bars: Vec<OhlcvBar> = bars.into_iter().filter(OhlcvBar::is_well_formed).collect();
        bars.sort_by_key(|b| b.date);

        let mut deduped: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Self { bars: deduped }
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }
}

/// 最新一根 K 线上的技术指标
///
/// 任一字段无法计算时整个快照无效，不存在部分填充的快照
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// RSI(14)，范围 [0, 100]
    pub rsi14: f64,
    /// 距 30 日低点的百分比
    pub distance_from_low30_pct: f64,
    /// 周涨跌幅（5 个交易日）
    pub weekly_change_pct: f64,
    /// 月涨跌幅（21 个交易日）
    pub monthly_change_pct: f64,
    /// 最新成交量
    pub latest_volume: f64,
    /// 最新收盘价
    pub latest_close: f64,
    /// 30 日最低价
    pub low30d: f64,
}

impl IndicatorSnapshot {
    pub fn is_finite(&self) -> bool {
        [
            self.rsi14,
            self.distance_from_low30_pct,
            self.weekly_change_pct,
            self.monthly_change_pct,
            self.latest_volume,
            self.latest_close,
            self.low30d,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn test_from_bars_sorts_and_dedupes() {
        let series = OhlcvSeries::from_bars(vec![bar(3, 30.0), bar(1, 10.0), bar(3, 33.0), bar(2, 20.0)]);

        let dates: Vec<u32> = series.bars().iter().map(|b| chrono::Datelike::day(&b.date)).collect();
        assert_eq!(dates, vec![1, 2, 3]);
        assert_eq!(series.closes(), vec![10.0, 20.0, 33.0]);
    }

    #[test]
    fn test_from_bars_drops_malformed() {
        let mut negative = bar(2, 20.0);
        negative.volume = -5.0;
        let mut nan = bar(3, 30.0);
        nan.close = f64::NAN;

        let series = OhlcvSeries::from_bars(vec![bar(1, 10.0), negative, nan]);
        assert_eq!(series.len(), 1);
        assert_eq!(series.last().unwrap().close, 10.0);
    }
}
