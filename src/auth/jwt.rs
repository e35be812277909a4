//! HS256 会话令牌
//!
//! `base64url(header).base64url(payload).base64url(hmac_sha256)`，编码不带填充。
//! 算法固定，头部的 `alg` 只写不读。

use crate::{
    auth::{
        clock::{Clock, SystemClock},
        password::constant_time_eq,
    },
    config::{AppConfig, MIN_SECRET_LEN},
};
use ::config::ConfigError;
use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig},
        DecodePaddingMode,
    },
    Engine as _,
};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// 令牌声明：任意 JSON 对象
pub type Claims = serde_json::Map<String, Value>;

/// URL 安全字母表，输出无填充，输入有无填充均可
const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

/// 令牌错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid token format")]
    InvalidFormat,

    #[error("Signature mismatch")]
    SignatureMismatch,

    #[error("Token expired")]
    Expired,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// [`TokenService::sign`] 的选项
#[derive(Debug, Clone, Copy, Default)]
pub struct SignOptions {
    /// 写入 `exp = now + expires_in_secs`，覆盖调用方给出的 `exp`
    pub expires_in_secs: Option<i64>,
}

impl SignOptions {
    pub fn expires_in(secs: i64) -> Self {
        Self {
            expires_in_secs: Some(secs),
        }
    }
}

/// 令牌服务
pub struct TokenService {
    secret: Secret<Vec<u8>>,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: Secret::new(secret.into()),
            clock,
        }
    }

    /// 从配置创建令牌服务
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let secret = config.security.jwt_secret.expose_secret();

        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Message(format!(
                "JWT secret too short (min {} chars)",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self::new(secret.as_bytes().to_vec()))
    }

    /// 当前时间（秒）
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// 签发令牌，不修改 `payload`
    pub fn sign(&self, payload: &Claims, options: SignOptions) -> Result<String, TokenError> {
        let mut body = payload.clone();
        if let Some(ttl) = options.expires_in_secs {
            // 超大有效期饱和到 i64::MAX，不回绕成过去的时间
            let exp = self.clock.now().saturating_add(ttl);
            body.insert("exp".to_string(), Value::from(exp));
        }

        let header_json =
            serde_json::to_vec(&HEADER).map_err(|e| TokenError::Signing(e.to_string()))?;
        let payload_json =
            serde_json::to_vec(&body).map_err(|e| TokenError::Signing(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            BASE64URL.encode(header_json),
            BASE64URL.encode(payload_json)
        );
        let signature = self.signature(&signing_input)?;

        Ok(format!("{}.{}", signing_input, signature))
    }

    /// 校验签名与有效期，返回解码后的声明
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::InvalidFormat);
        };

        let expected = self.signature(&format!("{}.{}", header, payload))?;

        // HS256 编码后的签名长度固定，长度不同说明令牌已损坏
        if signature.len() != expected.len() {
            return Err(TokenError::SignatureMismatch);
        }
        if !constant_time_eq(signature.as_bytes(), expected.as_bytes()) {
            return Err(TokenError::SignatureMismatch);
        }

        let payload_json = BASE64URL
            .decode(payload)
            .map_err(|_| TokenError::InvalidFormat)?;
        let claims = match serde_json::from_slice::<Value>(&payload_json) {
            Ok(Value::Object(claims)) => claims,
            _ => return Err(TokenError::InvalidFormat),
        };

        if let Some(exp) = claims.get("exp").and_then(Value::as_f64) {
            if self.clock.now() as f64 >= exp {
                return Err(TokenError::Expired);
            }
        }

        Ok(claims)
    }

    fn signature(&self, signing_input: &str) -> Result<String, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret())
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        Ok(BASE64URL.encode(mac.finalize().into_bytes()))
    }
}
