//! S&P 500 需求区筛选服务
//! 
//! 并发获取股票日K线，计算 RSI、距 30 日低点等指标，筛选出处于需求区的股票
//! 数据来源：Yahoo Finance、维基百科 S&P 500 成分股列表

mod config;     // 配置加载
mod error;      // 错误类型
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务
mod state;      // 共享状态

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::state::AppState;

/// 应用程序入口
/// 
/// 加载配置后启动 HTTP 服务器，默认监听 0.0.0.0:8080
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load();

    // 初始化日志系统，默认使用配置中的日志级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));

    let client = config
        .http_client()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let bind_addr = config.bind_addr();
    let workers = config.server.workers;
    let state = web::Data::new(AppState::new(config, client));

    log::info!("启动需求区筛选服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())  // 添加请求日志中间件
            .configure(handlers::config)  // 配置路由
    });
    if workers > 0 {
        server = server.workers(workers);
    }

    server.bind(bind_addr)?.run().await
}
