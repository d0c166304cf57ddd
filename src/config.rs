//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::models::ScreeningParameters;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 外部数据源请求配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 请求头中的 User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 筛选器配置
///
/// 阈值字段只是默认值，每次请求都可以覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// RSI 阈值（10-50）
    #[serde(default = "default_rsi_threshold")]
    pub rsi_threshold: f64,
    /// 距 30 日低点的最大百分比（1-15）
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold_pct: f64,
    /// 最小成交量（100,000-10,000,000）
    #[serde(default = "default_volume_threshold")]
    pub volume_threshold: f64,
    /// 分析的股票数量（25/50/100）
    #[serde(default = "default_ticker_limit")]
    pub ticker_limit: usize,
    /// 并发抓取的最大任务数
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// 历史数据回溯天数（默认约 3 个月）
    #[serde(default = "default_history_days")]
    pub history_days: u64,
    /// 股票列表缓存时间（秒）
    #[serde(default = "default_ticker_cache_ttl")]
    pub ticker_cache_ttl_secs: u64,
    /// 股票列表抓取超时（秒）
    #[serde(default = "default_ticker_source_timeout")]
    pub ticker_source_timeout_secs: u64,
    /// S&P 500 成分股页面
    #[serde(default = "default_ticker_source_url")]
    pub ticker_source_url: String,
    /// 行情数据接口
    #[serde(default = "default_chart_api_url")]
    pub chart_api_url: String,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 外部请求配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 筛选器配置
    #[serde(default)]
    pub screener: ScreenerConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_log_level() -> String { "info".to_string() }
fn default_rsi_threshold() -> f64 { 40.0 }
fn default_distance_threshold() -> f64 { 5.0 }
fn default_volume_threshold() -> f64 { 1_000_000.0 }
fn default_ticker_limit() -> usize { 25 }
fn default_max_concurrency() -> usize { 10 }
fn default_history_days() -> u64 { 92 }
fn default_ticker_cache_ttl() -> u64 { 3600 }
fn default_ticker_source_timeout() -> u64 { 10 }
fn default_ticker_source_url() -> String {
    crate::services::common::SP500_CONSTITUENTS_URL.to_string()
}
fn default_chart_api_url() -> String {
    crate::services::common::YAHOO_CHART_API.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            rsi_threshold: default_rsi_threshold(),
            distance_threshold_pct: default_distance_threshold(),
            volume_threshold: default_volume_threshold(),
            ticker_limit: default_ticker_limit(),
            max_concurrency: default_max_concurrency(),
            history_days: default_history_days(),
            ticker_cache_ttl_secs: default_ticker_cache_ttl(),
            ticker_source_timeout_secs: default_ticker_source_timeout(),
            ticker_source_url: default_ticker_source_url(),
            chart_api_url: default_chart_api_url(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            log: LogConfig::default(),
            screener: ScreenerConfig::default(),
        }
    }
}

impl ScreenerConfig {
    /// 默认筛选参数
    pub fn default_parameters(&self) -> ScreeningParameters {
        ScreeningParameters {
            rsi_threshold: self.rsi_threshold,
            distance_threshold_pct: self.distance_threshold_pct,
            volume_threshold: self.volume_threshold,
            ticker_limit: self.ticker_limit,
            max_concurrency: self.max_concurrency,
        }
    }

    pub fn history_period(&self) -> Duration {
        Duration::from_secs(self.history_days * 24 * 60 * 60)
    }

    pub fn ticker_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.ticker_cache_ttl_secs)
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    pub fn load() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("使用默认配置");
        Self::default()
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 构建访问外部数据源的 HTTP 客户端
    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .user_agent(self.api.user_agent.clone())
            .timeout(Duration::from_secs(self.api.timeout_secs))
            .connect_timeout(Duration::from_secs(self.api.connect_timeout_secs))
            .build()?;
        Ok(client)
    }
}
