//! 认证相关模型

use secrecy::Secret;
use serde::{Deserialize, Serialize};

use super::user::UserSummary;

/// 注册请求，缺失字段由服务层拒绝
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<Secret<String>>,
    pub name: Option<String>,
}

/// 登录请求
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<Secret<String>>,
}

/// 注册响应
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserSummary,
}

/// 登录响应
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}
