//! 测试公共模块
//! 提供测试配置、应用状态和响应读取工具

#![allow(dead_code)]

use axum::{body::Body, http::Response};
use http_body_util::BodyExt;
use panel_auth::{
    auth::{jwt::TokenService, ManualClock},
    config::{AppConfig, LoggingConfig, SecurityConfig, ServerConfig},
    middleware::AppState,
    repository::InMemoryUserStore,
    services::AuthService,
};
use secrecy::Secret;
use std::sync::Arc;
use std::time::Instant;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            max_body_bytes: 1_000_000,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            token_ttl_secs: 3600,
        },
    }
}

/// 使用手动时钟的令牌服务
pub fn create_token_service(clock: Arc<ManualClock>) -> Arc<TokenService> {
    Arc::new(TokenService::with_clock(TEST_SECRET.as_bytes().to_vec(), clock))
}

/// 创建测试认证服务（空存储）
pub fn create_auth_service(clock: Arc<ManualClock>) -> AuthService {
    let config = create_test_config();
    AuthService::from_config(
        Arc::new(InMemoryUserStore::new()),
        create_token_service(clock),
        &config,
    )
}

/// 创建测试应用状态
pub fn create_test_app_state_with_config(
    config: AppConfig,
    clock: Arc<ManualClock>,
) -> Arc<AppState> {
    let token_service = create_token_service(clock);
    let auth_service = Arc::new(AuthService::from_config(
        Arc::new(InMemoryUserStore::new()),
        token_service.clone(),
        &config,
    ));

    Arc::new(AppState {
        config,
        auth_service,
        token_service,
        started_at: Instant::now(),
    })
}

pub fn create_test_app_state(clock: Arc<ManualClock>) -> Arc<AppState> {
    create_test_app_state_with_config(create_test_config(), clock)
}

/// 读取 JSON 响应体
pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
