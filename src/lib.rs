//! 管理后台认证服务库
//! 凭据哈希、会话令牌与注册/登录流程

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
