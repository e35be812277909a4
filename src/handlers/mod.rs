//! HTTP 处理器模块

pub mod auth;
pub mod health;

use crate::error::AppError;

/// 未匹配的路由
pub async fn not_found() -> AppError {
    AppError::NotFound
}
