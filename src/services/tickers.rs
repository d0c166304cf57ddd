//! S&P 500 股票列表
//!
//! 从维基百科成分股表格抓取股票代码，失败时降级为内置列表。
//! 结果带过期时间缓存，刷新接口可手动清空。

use std::time::{Duration, Instant};

use reqwest::Client;
use scraper::{Html, Selector};
use tokio::sync::Mutex;

use super::common::{normalize_tickers, FALLBACK_TICKERS};
use crate::error::ScreenerError;

/// 缓存条目
#[derive(Debug, Clone)]
struct CachedTickers {
    tickers: Vec<String>,
    fetched_at: Instant,
}

impl CachedTickers {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// 股票列表来源
pub struct TickerSource {
    client: Client,
    url: String,
    timeout: Duration,
    ttl: Duration,
    cache: Mutex<Option<CachedTickers>>,
}

impl TickerSource {
    pub fn new(client: Client, url: &str, timeout: Duration, ttl: Duration) -> Self {
        Self {
            client,
            url: url.to_string(),
            timeout,
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// 获取股票列表
    ///
    /// 缓存未过期时直接返回；否则抓取成分股表格，失败则返回内置列表。
    /// 两种结果都会写入缓存。
    pub async fn get_tickers(&self) -> Vec<String> {
        let mut cache = self.cache.lock().await;

        if let Some(entry) = cache.as_ref() {
            if entry.is_fresh(Instant::now(), self.ttl) {
                return entry.tickers.clone();
            }
        }

        let tickers = match self.scrape().await {
            Ok(tickers) => {
                log::info!("✅ 从维基百科获取到 {} 只 S&P 500 股票", tickers.len());
                tickers
            }
            Err(e) => {
                log::warn!("⚠️ {}，使用内置的 {} 只股票", e, FALLBACK_TICKERS.len());
                fallback_tickers()
            }
        };

        *cache = Some(CachedTickers {
            tickers: tickers.clone(),
            fetched_at: Instant::now(),
        });
        tickers
    }

    /// 清空缓存，下次请求重新抓取
    pub async fn clear(&self) {
        *self.cache.lock().await = None;
        log::info!("股票列表缓存已清空");
    }

    async fn scrape(&self) -> Result<Vec<String>, ScreenerError> {
        log::debug!("📡 请求成分股列表 URL: {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| ScreenerError::SourceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScreenerError::SourceUnavailable(format!(
                "成分股页面返回 {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ScreenerError::SourceUnavailable(e.to_string()))?;

        parse_constituents_table(&html)
    }
}

/// 内置股票列表
pub fn fallback_tickers() -> Vec<String> {
    FALLBACK_TICKERS.iter().map(|s| s.to_string()).collect()
}

/// 解析成分股表格中的 Symbol 列
///
/// 优先使用 id 为 constituents 的表格，否则取页面中第一个表格
pub fn parse_constituents_table(html: &str) -> Result<Vec<String>, ScreenerError> {
    let document = Html::parse_document(html);

    let constituents_selector = Selector::parse("table#constituents").unwrap();
    let table_selector = Selector::parse("table").unwrap();
    let tr_selector = Selector::parse("tr").unwrap();
    let th_selector = Selector::parse("th").unwrap();
    let td_selector = Selector::parse("td").unwrap();

    let table = document
        .select(&constituents_selector)
        .next()
        .or_else(|| document.select(&table_selector).next())
        .ok_or_else(|| ScreenerError::SourceUnavailable("未找到成分股表格".to_string()))?;

    let mut rows = table.select(&tr_selector);

    let symbol_col = rows
        .next()
        .and_then(|header| {
            header
                .select(&th_selector)
                .position(|th| th.text().collect::<String>().trim() == "Symbol")
        })
        .ok_or_else(|| ScreenerError::SourceUnavailable("表格中没有 Symbol 列".to_string()))?;

    let raw: Vec<String> = rows
        .filter_map(|row| {
            row.select(&td_selector)
                .nth(symbol_col)
                .map(|cell| cell.text().collect::<String>())
        })
        .collect();

    let tickers = normalize_tickers(raw.iter().map(String::as_str));
    if tickers.is_empty() {
        return Err(ScreenerError::SourceUnavailable("成分股表格为空".to_string()));
    }
    Ok(tickers)
}
