//! 公共常量和辅助函数

use std::sync::OnceLock;

use chrono::Utc;
use chrono_tz::America::New_York;
use regex::Regex;

// ==================== 数据源常量 ====================

/// 维基百科 S&P 500 成分股列表
pub const SP500_CONSTITUENTS_URL: &str = "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies";
/// Yahoo Finance 日K线 API，后接股票代码
pub const YAHOO_CHART_API: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// 成分股抓取失败时使用的内置列表
pub const FALLBACK_TICKERS: [&str; 50] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "BRK-B", "LLY", "V", "TSM",
    "UNH", "XOM", "JPM", "JNJ", "PG", "MA", "HD", "CVX", "AVGO", "KO",
    "PEP", "COST", "MRK", "ABBV", "BAC", "PFE", "TMO", "ACN", "DHR", "VZ",
    "ADBE", "NFLX", "CRM", "CMCSA", "DIS", "NEE", "PM", "TXN", "RTX", "QCOM",
    "HON", "LOW", "UPS", "IBM", "INTU", "MS", "SPGI", "GS", "CAT", "DE",
];

// ==================== 指标常量 ====================

/// 分析所需的最少K线数量
pub const MIN_BARS: usize = 30;
pub const RSI_WINDOW: usize = 14;
pub const LOW_WINDOW: usize = 30;
/// 一周的交易日数
pub const WEEK_BARS: usize = 5;
/// 一个月的交易日数
pub const MONTH_BARS: usize = 21;

/// 获取美东时间字符串（ISO 8601 格式）
pub fn get_eastern_time() -> String {
    Utc::now().with_timezone(&New_York).to_rfc3339()
}

fn ticker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9][A-Z0-9\-]{0,9}$").unwrap())
}

/// 规范化股票代码：去空白、转大写、`.` 替换为 `-`（如 BRK.B -> BRK-B）
///
/// 不像股票代码的字符串返回 None
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_uppercase().replace('.', "-");
    if ticker_regex().is_match(&ticker) {
        Some(ticker)
    } else {
        None
    }
}

/// 规范化并去重，保留首次出现的顺序
pub fn normalize_tickers<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .filter_map(normalize_ticker)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
