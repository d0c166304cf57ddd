//! 筛选接口处理器
//!
//! ## API 列表
//!
//! - GET /screen - 执行一次需求区筛选，返回报告
//! - GET /screen/progress - 筛选进度（默认最近一次，可用 run_id 指定批次）
//! - GET /tickers - 当前股票列表
//! - POST /cache/clear - 清空股票列表缓存

use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::ScreenerError;
use crate::models::{ApiResponse, ScreeningProgress, ScreeningQuery, ScreeningReport};
use crate::services::report::build_report;
use crate::state::AppState;

/// 执行筛选
///
/// GET /api/v1/screen
///
/// # 参数
/// - rsi_threshold: RSI 阈值（10-50，默认 40）
/// - distance_threshold: 距 30 日低点百分比（1-15，默认 5）
/// - volume_threshold: 最小成交量（100000-10000000，默认 1000000）
/// - top_n: 分析股票数量（25/50/100，默认 25）
pub async fn run_screen(
    state: web::Data<AppState>,
    query: web::Query<ScreeningQuery>,
) -> Result<HttpResponse> {
    let defaults = state.config.screener.default_parameters();
    let params = match query.into_inner().into_parameters(&defaults) {
        Ok(params) => params,
        Err(e) => return Ok(error_response(&e)),
    };

    let tickers = state.tickers.get_tickers().await;
    let requested = tickers.len().min(params.ticker_limit);
    let run_id = state.progress.begin(requested);

    let (tx, mut rx) = mpsc::unbounded_channel::<ScreeningProgress>();
    let progress_state = state.clone();
    let drain = actix_web::rt::spawn(async move {
        while let Some(progress) = rx.recv().await {
            progress_state.progress.update(run_id, progress);
            if progress.is_finished() {
                log::info!(
                    "批次 {} 已处理 {}/{} 只股票",
                    run_id,
                    progress.completed,
                    progress.total
                );
            }
        }
    });

    let outcome = state.screener.screen(&tickers, &params, Some(tx)).await;
    // screen 返回时发送端已关闭，等进度全部写入后再响应
    if let Err(e) = drain.await {
        log::warn!("批次 {} 进度任务异常: {}", run_id, e);
    }

    match outcome {
        Ok(results) => {
            let mut report = build_report(&results, &params, requested);
            report.run_id = Some(run_id);
            let response = if report.demand_zone_count == 0 {
                ApiResponse::success_with_message(report, "当前参数下没有处于需求区的股票")
            } else {
                ApiResponse::success(report)
            };
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgressQuery {
    pub run_id: Option<u64>,
}

/// 筛选进度
///
/// GET /api/v1/screen/progress?run_id=
pub async fn get_progress(
    state: web::Data<AppState>,
    query: web::Query<ProgressQuery>,
) -> Result<HttpResponse> {
    let found = match query.run_id {
        Some(run_id) => state.progress.get(run_id).map(|p| (run_id, p)),
        None => state.progress.latest(),
    };
    let data = found.map(|(run_id, p)| {
        serde_json::json!({
            "run_id": run_id,
            "completed": p.completed,
            "total": p.total,
            "fraction": p.fraction(),
        })
    });
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

/// 当前股票列表（带缓存）
///
/// GET /api/v1/tickers
pub async fn list_tickers(state: web::Data<AppState>) -> Result<HttpResponse> {
    let tickers = state.tickers.get_tickers().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(tickers)))
}

/// 清空缓存，下次筛选重新获取股票列表
///
/// POST /api/v1/cache/clear
pub async fn clear_cache(state: web::Data<AppState>) -> Result<HttpResponse> {
    state.tickers.clear().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Cache cleared")))
}

fn error_response(e: &ScreenerError) -> HttpResponse {
    let response = ApiResponse::<ScreeningReport>::from(e);
    match e {
        ScreenerError::InvalidParameters(_) => HttpResponse::BadRequest().json(response),
        ScreenerError::NoTickers | ScreenerError::EmptyResultSet { .. } => {
            HttpResponse::ServiceUnavailable().json(response)
        }
        _ => HttpResponse::InternalServerError().json(response),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/screen", web::get().to(run_screen))
        .route("/screen/progress", web::get().to(get_progress))
        .route("/tickers", web::get().to(list_tickers))
        .route("/cache/clear", web::post().to(clear_cache));
}
