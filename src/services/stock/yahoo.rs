//! Yahoo Finance 日K线接口实现
//!
//! 对接 https://query1.finance.yahoo.com/v8/finance/chart/<symbol>

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::America::New_York;
use reqwest::Client;
use serde::Deserialize;

use super::MarketDataProvider;
use crate::models::{OhlcvBar, OhlcvSeries};
use crate::services::common::MIN_BARS;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
    #[serde(default)]
    adjclose: Vec<ChartAdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance 行情数据源
#[derive(Clone)]
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    /// base_url 为 chart 接口地址，不含股票代码
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// 请求最近 period 时间内的日K线
    pub async fn request_history(&self, ticker: &str, period: Duration) -> Result<OhlcvSeries> {
        let period2 = Utc::now().timestamp();
        let period1 = period2 - period.as_secs() as i64;
        let url = format!("{}/{}", self.base_url, ticker);
        log::debug!("📡 请求日K线数据 URL: {} ({} - {})", url, period1, period2);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("includePrePost", "false".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("获取历史数据失败: {}", response.status()));
        }

        let text = response.text().await?;
        parse_chart_response(&text)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_history(&self, ticker: &str, period: Duration) -> Option<OhlcvSeries> {
        match self.request_history(ticker, period).await {
            Ok(series) if series.len() >= MIN_BARS => Some(series),
            Ok(series) if series.is_empty() => {
                log::debug!("{} 没有返回任何K线", ticker);
                None
            }
            Ok(series) => {
                log::debug!("{} 只有 {} 根K线，跳过", ticker, series.len());
                None
            }
            Err(e) => {
                log::debug!("{} 数据获取失败: {}", ticker, e);
                None
            }
        }
    }
}

/// 解析 Yahoo chart 接口返回的 JSON
///
/// 时间戳按美东时间转换为交易日；任一字段为 null 的 K 线会被丢弃。
/// 返回复权价格：开高低收按 adjclose / close 等比缩放，成交量不变。
/// 响应中没有 adjclose 数组时使用原始价格。
fn parse_chart_response(data: &str) -> Result<OhlcvSeries> {
    let response: ChartResponse =
        serde_json::from_str(data).map_err(|e| anyhow!("解析JSON失败: {}", e))?;

    if let Some(error) = response.chart.error.filter(|e| !e.is_null()) {
        return Err(anyhow!("数据源返回错误: {}", error));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| anyhow!("返回数据为空"))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose);

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(date) = DateTime::<Utc>::from_timestamp(*ts, 0)
            .map(|dt| dt.with_timezone(&New_York).date_naive())
        else {
            continue;
        };

        let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            field(&quote.volume),
        ) else {
            continue;
        };

        let ratio = match &adjclose {
            Some(values) => match field(values) {
                Some(adj) if close != 0.0 => adj / close,
                _ => continue,
            },
            None => 1.0,
        };

        bars.push(OhlcvBar {
            date,
            open: open * ratio,
            high: high * ratio,
            low: low * ratio,
            close: close * ratio,
            volume,
        });
    }

    Ok(OhlcvSeries::from_bars(bars))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2024-01-02 起的交易日，14:30 UTC 开盘
    fn chart_json(n: usize, null_at: Option<usize>) -> String {
        let base = 1_704_205_800i64;
        let timestamps: Vec<i64> = (0..n as i64).map(|i| base + i * 86_400).collect();
        let closes: Vec<serde_json::Value> = (0..n)
            .map(|i| {
                if Some(i) == null_at {
                    serde_json::Value::Null
                } else {
                    serde_json::json!(180.0 + i as f64)
                }
            })
            .collect();
        let opens: Vec<f64> = (0..n).map(|i| 179.5 + i as f64).collect();
        let highs: Vec<f64> = (0..n).map(|i| 181.0 + i as f64).collect();
        let lows: Vec<f64> = (0..n).map(|i| 179.0 + i as f64).collect();
        let volumes: Vec<u64> = (0..n).map(|i| 50_000_000 + i as u64).collect();

        serde_json::json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL", "exchangeTimezoneName": "America/New_York"},
                    "timestamp": timestamps,
                    "indicators": {
                        "quote": [{
                            "open": opens,
                            "high": highs,
                            "low": lows,
                            "close": closes,
                            "volume": volumes
                        }]
                    }
                }],
                "error": null
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_chart_response() {
        let series = parse_chart_response(&chart_json(35, None)).unwrap();
        assert_eq!(series.len(), 35);

        let first = &series.bars()[0];
        assert_eq!(first.date, chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(first.open, 179.5);
        assert_eq!(first.close, 180.0);
        assert_eq!(first.volume, 50_000_000.0);
        assert_eq!(series.last().unwrap().close, 214.0);
    }

    #[test]
    fn test_parse_skips_null_rows() {
        let series = parse_chart_response(&chart_json(31, Some(10))).unwrap();
        assert_eq!(series.len(), 30);
        assert!(series.bars().iter().all(|b| b.close != 190.0));
    }

    /// 前 20 根收盘 100、复权收盘 99（除息日在第 21 根），之后两者相同
    fn dividend_chart_json() -> String {
        let base = 1_704_205_800i64;
        let timestamps: Vec<i64> = (0..30i64).map(|i| base + i * 86_400).collect();
        let closes: Vec<f64> = vec![100.0; 30];
        let adjcloses: Vec<f64> = (0..30).map(|i| if i < 20 { 99.0 } else { 100.0 }).collect();

        serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": timestamps,
                    "indicators": {
                        "quote": [{
                            "open": vec![101.0; 30],
                            "high": vec![102.0; 30],
                            "low": vec![98.0; 30],
                            "close": closes,
                            "volume": vec![2_000_000u64; 30]
                        }],
                        "adjclose": [{"adjclose": adjcloses}]
                    }
                }],
                "error": null
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_applies_dividend_adjustment() {
        let series = parse_chart_response(&dividend_chart_json()).unwrap();
        assert_eq!(series.len(), 30);

        let first = &series.bars()[0];
        assert!((first.close - 99.0).abs() < 1e-9);
        assert!((first.open - 101.0 * 0.99).abs() < 1e-9);
        assert!((first.high - 102.0 * 0.99).abs() < 1e-9);
        assert!((first.low - 98.0 * 0.99).abs() < 1e-9);
        assert_eq!(first.volume, 2_000_000.0);

        let last = series.last().unwrap();
        assert_eq!(last.close, 100.0);
        assert_eq!(last.low, 98.0);
    }

    #[test]
    fn test_parse_drops_rows_without_adjclose() {
        let mut value: serde_json::Value =
            serde_json::from_str(&dividend_chart_json()).unwrap();
        value["chart"]["result"][0]["indicators"]["adjclose"][0]["adjclose"][5] =
            serde_json::Value::Null;
        let series = parse_chart_response(&value.to_string()).unwrap();
        assert_eq!(series.len(), 29);
    }

    #[test]
    fn test_parse_error_payload() {
        let data = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart_response(data).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_parse_empty_result() {
        assert!(parse_chart_response(r#"{"chart":{"result":[],"error":null}}"#).is_err());
        assert!(parse_chart_response("<html>rate limited</html>").is_err());
    }

    #[test]
    fn test_parse_missing_quote_is_empty_series() {
        let data = r#"{"chart":{"result":[{"timestamp":[1704205800],"indicators":{"quote":[]}}],"error":null}}"#;
        let series = parse_chart_response(data).unwrap();
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_history_unreachable_is_absent() {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let provider = YahooProvider::new(client, "http://127.0.0.1:9/chart");
        let series = provider
            .fetch_history("AAPL", Duration::from_secs(90 * 86_400))
            .await;
        assert!(series.is_none());
    }
}
