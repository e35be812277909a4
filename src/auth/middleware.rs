//! Bearer 令牌认证中间件

use crate::{
    auth::jwt::{Claims, TokenService},
    error::AppError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub claims: Claims,
}

impl AuthContext {
    /// 从已验证的声明构造上下文，`sub` 必须存在
    pub fn from_claims(claims: Claims) -> Result<Self, AppError> {
        let user_id = claims
            .get("sub")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(AppError::invalid_token)?;
        let email = claims.get("email").and_then(Value::as_str).map(str::to_string);
        let name = claims.get("name").and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            user_id,
            email,
            name,
            claims,
        })
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))
}

/// 令牌认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(token_service): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 没有合法的 Bearer 头时直接拒绝，不调用 verify
    let token = extract_token(req.headers())?;

    let claims = token_service.verify(&token).map_err(|e| {
        tracing::debug!(error = %e, "Token validation failed");
        AppError::invalid_token()
    })?;

    let auth_context = AuthContext::from_claims(claims)?;
    tracing::debug!(user_id = %auth_context.user_id, "Request authenticated");

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
