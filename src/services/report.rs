//! 筛选报告
//!
//! 把筛选结果整理成前端展示用的表格、汇总指标和图表数据

use crate::models::{
    ChartData, ChartPoint, ResultRow, ScreeningParameters, ScreeningReport, ScreeningResult,
};

use super::common::{get_eastern_time, round2, LOW_WINDOW};
use super::indicators::rolling_min;

/// 单只股票的表格行
pub fn to_row(result: &ScreeningResult) -> ResultRow {
    let s = &result.snapshot;
    ResultRow {
        ticker: result.ticker.clone(),
        weekly_pct: round2(s.weekly_change_pct),
        monthly_pct: round2(s.monthly_change_pct),
        rsi: round2(s.rsi14),
        distance_from_low_pct: round2(s.distance_from_low30_pct),
        volume: s.latest_volume as u64,
        close: round2(s.latest_close),
        low_30d: round2(s.low30d),
        in_demand_zone: result.in_demand_zone,
    }
}

/// 收盘价、30 日低点和成交量
pub fn chart_for(result: &ScreeningResult) -> ChartData {
    let bars = result.series.bars();
    let lows = rolling_min(&result.series.lows(), LOW_WINDOW);

    let points = bars
        .iter()
        .zip(lows)
        .map(|(bar, low)| ChartPoint {
            date: bar.date,
            close: bar.close,
            low_30d: low.is_finite().then_some(low),
            volume: bar.volume,
        })
        .collect();

    ChartData {
        ticker: result.ticker.clone(),
        summary: to_row(result),
        points,
    }
}

/// 生成报告
///
/// 两组内部保持完成顺序，全表中需求区股票排在前面。图表取第一只需求区股票。
pub fn build_report(
    results: &[ScreeningResult],
    params: &ScreeningParameters,
    tickers_requested: usize,
) -> ScreeningReport {
    let (zone, other): (Vec<&ScreeningResult>, Vec<&ScreeningResult>) =
        results.iter().partition(|r| r.in_demand_zone);

    let demand_zone: Vec<ResultRow> = zone.iter().map(|r| to_row(r)).collect();
    let all: Vec<ResultRow> = zone.iter().chain(other.iter()).map(|r| to_row(r)).collect();

    let total_analyzed = results.len();
    let demand_zone_pct = if total_analyzed > 0 {
        round2(demand_zone.len() as f64 / total_analyzed as f64 * 100.0)
    } else {
        0.0
    };
    let average_rsi = (total_analyzed > 0).then(|| {
        let sum: f64 = results.iter().map(|r| r.snapshot.rsi14).sum();
        round2(sum / total_analyzed as f64)
    });

    ScreeningReport {
        run_id: None,
        parameters: params.clone(),
        tickers_requested,
        total_analyzed,
        demand_zone_count: demand_zone.len(),
        demand_zone_pct,
        average_rsi,
        demand_zone,
        all,
        chart: zone.first().map(|r| chart_for(r)),
        criteria: format!(
            "RSI ≤ {} AND Distance from Low ≤ {}% AND Volume ≥ {}",
            params.rsi_threshold, params.distance_threshold_pct, params.volume_threshold
        ),
        generated_at: get_eastern_time(),
    }
}
