//! 技术指标计算
//!
//! 纯函数，输入日线序列，输出最新一根 K 线上的指标快照。
//! 滚动序列与输入等长，无法计算的位置为 NaN。

use crate::models::{IndicatorSnapshot, OhlcvSeries};

use super::common::{LOW_WINDOW, MIN_BARS, MONTH_BARS, RSI_WINDOW, WEEK_BARS};

/// RSI 序列
///
/// 涨跌幅用 alpha = 1/window 的指数移动平均平滑（非 adjust 递推，y0 = x0），
/// 前 window-1 个位置无定义。第一根 K 线的涨跌视为 0。平均跌幅为 0 时 RSI 为 100。
pub fn rsi_series(closes: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    if window == 0 || closes.is_empty() {
        return out;
    }

    let alpha = 1.0 / window as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 0..closes.len() {
        let change = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i == 0 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = (1.0 - alpha) * avg_gain + alpha * gain;
            avg_loss = (1.0 - alpha) * avg_loss + alpha * loss;
        }

        if i + 1 >= window {
            out[i] = if avg_loss == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
            };
        }
    }

    out
}

/// 滚动最小值，窗口包含当前位置
pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                f64::NAN
            } else {
                values[i + 1 - window..=i]
                    .iter()
                    .copied()
                    .fold(f64::INFINITY, f64::min)
            }
        })
        .collect()
}

/// 相对 periods 根 K 线之前的涨跌幅（百分比）
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < periods {
                f64::NAN
            } else {
                let prev = values[i - periods];
                (values[i] - prev) / prev * 100.0
            }
        })
        .collect()
}

/// 计算最新一根 K 线的指标快照
///
/// 少于 30 根 K 线，或任一指标不是有限数（窗口不够、分母为 0）时返回 None
pub fn compute_indicators(series: &OhlcvSeries) -> Option<IndicatorSnapshot> {
    if series.len() < MIN_BARS {
        return None;
    }

    let closes = series.closes();
    let lows = series.lows();
    let latest = series.last()?;

    let rsi14 = *rsi_series(&closes, RSI_WINDOW).last()?;
    let low30d = *rolling_min(&lows, LOW_WINDOW).last()?;
    let distance_from_low30_pct = (latest.close - low30d) / low30d * 100.0;
    let weekly_change_pct = *pct_change(&closes, WEEK_BARS).last()?;
    let monthly_change_pct = *pct_change(&closes, MONTH_BARS).last()?;

    let snapshot = IndicatorSnapshot {
        rsi14,
        distance_from_low30_pct,
        weekly_change_pct,
        monthly_change_pct,
        latest_volume: latest.volume,
        latest_close: latest.close,
        low30d,
    };

    snapshot.is_finite().then_some(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OhlcvBar;
    use chrono::{Duration, NaiveDate};

    fn series_from(closes: &[f64]) -> OhlcvSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: (close - 1.0).max(0.0),
                close,
                volume: 1_500_000.0 + i as f64,
            })
            .collect();
        OhlcvSeries::from_bars(bars)
    }

    fn zigzag(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 - i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_rsi_small_window_by_hand() {
        // 涨跌: [0, +1, -1]; alpha = 0.5
        // avg_gain: 0, 0.5, 0.25; avg_loss: 0, 0, 0.5
        let rsi = rsi_series(&[1.0, 2.0, 1.0], 2);
        assert!(rsi[0].is_nan());
        assert_eq!(rsi[1], 100.0);
        assert!((rsi[2] - (100.0 - 100.0 / 1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_window_14_reference_values() {
        // 参考值来自 pandas ewm(alpha=1/14, adjust=False, min_periods=14) 的 RSI 计算
        let closes = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64, 46.21, 46.25, 45.71, 46.45,
            45.78, 45.35, 44.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let rsi = rsi_series(&closes, 14);

        assert!(rsi[..13].iter().all(|v| v.is_nan()));
        let expected = [
            (13, 71.80241065373282),
            (14, 71.80241065373282),
            (19, 54.17929542054697),
            (22, 52.84190089137166),
            (26, 36.41617986038088),
            (31, 30.247472272508077),
            (32, 35.51190155324906),
        ];
        for (i, value) in expected {
            assert!((rsi[i] - value).abs() < 1e-9, "rsi[{}] = {}, 期望 {}", i, rsi[i], value);
        }

        let series = series_from(&closes);
        let snap = compute_indicators(&series).unwrap();
        assert!((snap.rsi14 - 35.51190155324906).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_warmup_and_extremes() {
        let rising: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let rsi = rsi_series(&rising, 14);
        assert!(rsi[..13].iter().all(|v| v.is_nan()));
        assert!(rsi[13..].iter().all(|&v| v == 100.0));

        let falling: Vec<f64> = (0..20).map(|i| 50.0 - i as f64).collect();
        let rsi = rsi_series(&falling, 14);
        assert_eq!(*rsi.last().unwrap(), 0.0);
    }

    #[test]
    fn test_rsi_bounded() {
        let rsi = rsi_series(&zigzag(80), 14);
        for v in rsi.iter().skip(13) {
            assert!((0.0..=100.0).contains(v), "RSI 越界: {}", v);
        }
    }

    #[test]
    fn test_rolling_min() {
        let mins = rolling_min(&[5.0, 3.0, 4.0, 1.0, 6.0], 3);
        assert!(mins[0].is_nan() && mins[1].is_nan());
        assert_eq!(&mins[2..], &[3.0, 1.0, 1.0]);
    }

    #[test]
    fn test_pct_change() {
        let changes = pct_change(&[100.0, 110.0, 121.0], 1);
        assert!(changes[0].is_nan());
        assert!((changes[1] - 10.0).abs() < 1e-9);
        assert!((changes[2] - 10.0).abs() < 1e-9);

        let from_zero = pct_change(&[0.0, 5.0], 1);
        assert!(from_zero[1].is_infinite());
    }

    #[test]
    fn test_insufficient_history() {
        for n in [0, 1, 14, 29] {
            assert!(compute_indicators(&series_from(&zigzag(n))).is_none());
        }
        assert!(compute_indicators(&series_from(&zigzag(30))).is_some());
    }

    #[test]
    fn test_snapshot_values_linear_series() {
        // 收盘价 100..=139，每天 +1
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let snap = compute_indicators(&series_from(&closes)).unwrap();

        assert_eq!(snap.latest_close, 139.0);
        assert_eq!(snap.latest_volume, 1_500_039.0);
        // 最近 30 根的最低价 = 110 - 1
        assert_eq!(snap.low30d, 109.0);
        assert!((snap.distance_from_low30_pct - 30.0 / 109.0 * 100.0).abs() < 1e-9);
        assert!((snap.weekly_change_pct - 5.0 / 134.0 * 100.0).abs() < 1e-9);
        assert!((snap.monthly_change_pct - 21.0 / 118.0 * 100.0).abs() < 1e-9);
        assert_eq!(snap.rsi14, 100.0);
    }

    #[test]
    fn test_snapshot_all_finite_or_none() {
        for n in 30..90 {
            if let Some(snap) = compute_indicators(&series_from(&zigzag(n))) {
                assert!(snap.is_finite());
                assert!((0.0..=100.0).contains(&snap.rsi14));
                assert!(snap.distance_from_low30_pct >= 0.0);
            }
        }
    }

    #[test]
    fn test_zero_low_is_invalid() {
        // 最低价为 0 时距低点百分比的分母为 0
        let mut closes = zigzag(40);
        closes[35] = 0.5;
        assert!(compute_indicators(&series_from(&closes)).is_none());
    }

    #[test]
    fn test_zero_close_denominator_is_invalid() {
        // 5 天前收盘价为 0，周涨跌幅无定义
        let mut closes: Vec<f64> = (0..35).map(|i| 50.0 + i as f64).collect();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes[29] = 0.0;
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: 10.0_f64.min(close + 10.0),
                close,
                volume: 2_000_000.0,
            })
            .collect();
        let series = OhlcvSeries::from_bars(bars);
        assert_eq!(series.len(), 35);
        assert!(compute_indicators(&series).is_none());
    }
}
