use actix_web::{web, HttpResponse, Result};
use crate::models::ApiResponse;
use crate::state::AppState;

/// 健康检查，同时返回是否有筛选正在进行
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let screening = state.progress.any_running();
    let response = ApiResponse::success(serde_json::json!({
        "status": "healthy",
        "screening_in_progress": screening,
    }));
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
