//! 认证相关的 HTTP 处理器

use crate::{
    auth::middleware::AuthContext,
    error::AppError,
    middleware::AppState,
    models::auth::*,
    services::AuthError,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(reject_json)?;

    let service = state.auth_service.clone();
    let user = run_blocking(move || service.register(req)).await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user })))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(reject_json)?;

    let service = state.auth_service.clone();
    let response = run_blocking(move || service.login(req)).await?;

    Ok(Json(response))
}

/// 获取当前令牌中的用户信息
pub async fn get_current_user(auth_context: AuthContext) -> impl IntoResponse {
    Json(auth_context)
}

/// PBKDF2 派生是阻塞计算，放到阻塞线程池执行
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Auth worker failed: {}", e)))?
        .map_err(AppError::from)
}

fn reject_json(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge;
    }
    tracing::debug!(error = %rejection, "Rejected request body");
    AppError::InvalidInput("Invalid JSON payload".to_string())
}
