//! 认证服务：注册、登录、会话令牌签发
//!
//! 方法都是同步的 CPU 计算（PBKDF2），HTTP 层通过 spawn_blocking 调用。

use crate::{
    auth::{
        jwt::{Claims, SignOptions, TokenError, TokenService},
        password::CredentialHasher,
    },
    config::AppConfig,
    models::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        user::{NewUser, UserSummary},
    },
    repository::{StoreError, UserStore},
};
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// 未知邮箱时也做一次完整派生，避免通过响应时间判断邮箱是否已注册
static DUMMY_RECORD: Lazy<String> =
    Lazy::new(|| CredentialHasher::new().hash("timing-equalizer"));

/// 认证流程错误
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    Unauthorized,

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AuthError::Conflict(e.to_string()),
        }
    }
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: CredentialHasher,
    token_service: Arc<TokenService>,
    token_ttl_secs: i64,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        token_service: Arc<TokenService>,
        token_ttl_secs: u64,
    ) -> Self {
        Self {
            store,
            hasher: CredentialHasher::new(),
            token_service,
            token_ttl_secs: i64::try_from(token_ttl_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn from_config(
        store: Arc<dyn UserStore>,
        token_service: Arc<TokenService>,
        config: &AppConfig,
    ) -> Self {
        Self::new(store, token_service, config.security.token_ttl_secs)
    }

    /// 注册新用户
    pub fn register(&self, req: RegisterRequest) -> Result<UserSummary, AuthError> {
        let password = req.password.filter(|p| !p.expose_secret().is_empty());
        let (Some(email), Some(password)) = (non_empty(req.email), password)
        else {
            return Err(AuthError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        };

        // 先查重，重复注册不必付出哈希的代价
        if self.store.find_by_email(&email).is_some() {
            return Err(StoreError::Conflict.into());
        }

        let name = req
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_name(&email));

        let password_hash = Secret::new(self.hasher.hash(password.expose_secret()));

        let user = self.store.insert(NewUser {
            email,
            name,
            password_hash,
        })?;

        metrics::counter!("auth_register_total").increment(1);
        tracing::info!(user_id = %user.id, "User registered");

        Ok(UserSummary::from(user))
    }

    /// 校验邮箱与密码
    ///
    /// 用户不存在与密码错误返回同一个错误。
    pub fn authenticate(&self, req: LoginRequest) -> Result<UserSummary, AuthError> {
        let password = req.password.unwrap_or_else(|| Secret::new(String::new()));
        let existing = req
            .email
            .as_deref()
            .and_then(|email| self.store.find_by_email(email));

        match existing {
            Some(user)
                if self
                    .hasher
                    .verify(password.expose_secret(), user.password_hash.expose_secret()) =>
            {
                metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
                tracing::info!(user_id = %user.id, "User authenticated");
                Ok(UserSummary::from(user))
            }
            Some(user) => {
                metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
                tracing::warn!(user_id = %user.id, "Authentication failed");
                Err(AuthError::Unauthorized)
            }
            None => {
                let _ = self.hasher.verify(password.expose_secret(), &DUMMY_RECORD);
                metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
                tracing::warn!("Authentication failed");
                Err(AuthError::Unauthorized)
            }
        }
    }

    /// 登录：校验凭据并签发会话令牌
    pub fn login(&self, req: LoginRequest) -> Result<LoginResponse, AuthError> {
        let user = self.authenticate(req)?;
        let token = self.issue_token(&user)?;

        Ok(LoginResponse { token, user })
    }

    /// 签发会话令牌，声明为 `{sub, email, name, exp}`
    pub fn issue_token(&self, user: &UserSummary) -> Result<String, AuthError> {
        let mut claims = Claims::new();
        claims.insert("sub".to_string(), Value::from(user.id.as_str()));
        claims.insert("email".to_string(), Value::from(user.email.as_str()));
        claims.insert("name".to_string(), Value::from(user.name.as_str()));

        let token = self
            .token_service
            .sign(&claims, SignOptions::expires_in(self.token_ttl_secs))?;

        Ok(token)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// 邮箱 @ 之前的部分
fn default_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
