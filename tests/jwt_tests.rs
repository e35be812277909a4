//! 会话令牌集成测试
//!
//! 测试签发、校验、过期以及与 jsonwebtoken 的互通

use base64::{engine::general_purpose::URL_SAFE, engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use panel_auth::auth::{Claims, ManualClock, SignOptions, TokenError, TokenService};
use serde_json::{json, Value};
use std::sync::Arc;

const SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

fn claims(value: Value) -> Claims {
    match value {
        Value::Object(map) => map,
        _ => panic!("claims must be an object"),
    }
}

fn service_at(now: i64) -> (TokenService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    (TokenService::with_clock(SECRET, clock.clone()), clock)
}

#[test]
fn test_sign_and_verify() {
    let (service, _) = service_at(1_700_000_000);
    let token = service
        .sign(&claims(json!({"sub": "u1", "role": "admin"})), SignOptions::default())
        .unwrap();

    assert_eq!(token.split('.').count(), 3);
    assert!(!token.contains('='));

    let decoded = service.verify(&token).unwrap();
    assert_eq!(decoded["sub"], "u1");
    assert_eq!(decoded["role"], "admin");
    assert!(!decoded.contains_key("exp"));
}

#[test]
fn test_header_is_fixed() {
    let (service, _) = service_at(1_700_000_000);
    let token = service.sign(&Claims::new(), SignOptions::default()).unwrap();

    let header = token.split('.').next().unwrap();
    let header: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(header).unwrap()).unwrap();
    assert_eq!(header, json!({"alg": "HS256", "typ": "JWT"}));
}

#[test]
fn test_expires_in_stamps_exp() {
    let (service, _) = service_at(1_700_000_000);
    let token = service
        .sign(&claims(json!({"sub": "u1", "exp": 1})), SignOptions::expires_in(3600))
        .unwrap();

    let decoded = service.verify(&token).unwrap();
    assert_eq!(decoded["exp"], 1_700_003_600);
}

#[test]
fn test_negative_expiry_is_expired() {
    let (service, _) = service_at(1_700_000_000);
    let token = service
        .sign(&claims(json!({"sub": "u1"})), SignOptions::expires_in(-1))
        .unwrap();

    assert_eq!(service.verify(&token), Err(TokenError::Expired));
}

#[test]
fn test_expiry_boundary() {
    let (service, clock) = service_at(1_700_000_000);
    let token = service
        .sign(&claims(json!({"sub": "u1"})), SignOptions::expires_in(3600))
        .unwrap();

    assert!(service.verify(&token).is_ok());

    clock.advance(3599);
    assert!(service.verify(&token).is_ok());

    // now == exp 即视为过期
    clock.advance(1);
    assert_eq!(service.verify(&token), Err(TokenError::Expired));

    clock.advance(1);
    assert_eq!(service.verify(&token), Err(TokenError::Expired));
}

#[test]
fn test_wrong_secret() {
    let (service, _) = service_at(1_700_000_000);
    let other = TokenService::with_clock(
        "another-secret-key-that-is-32-chars-long",
        Arc::new(ManualClock::new(1_700_000_000)),
    );
    let token = service.sign(&claims(json!({"sub": "u1"})), SignOptions::default()).unwrap();

    assert_eq!(other.verify(&token), Err(TokenError::SignatureMismatch));
}

#[test]
fn test_tampered_payload() {
    let (service, _) = service_at(1_700_000_000);
    let token = service
        .sign(&claims(json!({"sub": "u1", "role": "user"})), SignOptions::default())
        .unwrap();

    let parts: Vec<&str> = token.split('.').collect();
    let forged = URL_SAFE_NO_PAD.encode(br#"{"sub":"u1","role":"admin"}"#);
    let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);

    assert_eq!(service.verify(&tampered), Err(TokenError::SignatureMismatch));
}

#[test]
fn test_malformed_tokens() {
    let (service, _) = service_at(1_700_000_000);

    for token in ["", "abc", "a.b", "a.b.c.d", "..."] {
        assert_eq!(service.verify(token), Err(TokenError::InvalidFormat), "{:?}", token);
    }
}

#[test]
fn test_padded_payload_accepted() {
    let (service, _) = service_at(1_700_000_000);

    // 手工构造带填充的载荷段，签名覆盖带填充的文本
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE.encode(br#"{"sub":"u12"}"#);
    assert!(payload.ends_with('='));

    let key = EncodingKey::from_secret(SECRET.as_bytes());
    let signing_input = format!("{}.{}", header, payload);
    let signature = jsonwebtoken::crypto::sign(signing_input.as_bytes(), &key, Algorithm::HS256)
        .unwrap();
    let token = format!("{}.{}", signing_input, signature);

    let decoded = service.verify(&token).unwrap();
    assert_eq!(decoded["sub"], "u12");
}

#[test]
fn test_tokens_readable_by_jsonwebtoken() {
    let (service, _) = service_at(chrono::Utc::now().timestamp());
    let token = service
        .sign(&claims(json!({"sub": "u1", "email": "a@x.com"})), SignOptions::expires_in(600))
        .unwrap();

    let data = jsonwebtoken::decode::<Value>(
        &token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap();

    assert_eq!(data.header.alg, Algorithm::HS256);
    assert_eq!(data.claims["sub"], "u1");
    assert_eq!(data.claims["email"], "a@x.com");
}

#[test]
fn test_verifies_jsonwebtoken_tokens() {
    let now = chrono::Utc::now().timestamp();
    let (service, _) = service_at(now);

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({"sub": "u7", "exp": now + 60}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let decoded = service.verify(&token).unwrap();
    assert_eq!(decoded["sub"], "u7");
    assert_eq!(decoded["exp"], now + 60);
}

/// 以正确签名拼出任意载荷段的令牌
fn token_with_payload_segment(payload: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let signing_input = format!("{}.{}", header, payload);
    let key = EncodingKey::from_secret(SECRET.as_bytes());
    let signature = jsonwebtoken::crypto::sign(signing_input.as_bytes(), &key, Algorithm::HS256)
        .unwrap();
    format!("{}.{}", signing_input, signature)
}

#[test]
fn test_undecodable_payload_rejected() {
    let (service, _) = service_at(1_700_000_000);

    let token = token_with_payload_segment("!!!");
    assert_eq!(service.verify(&token), Err(TokenError::InvalidFormat));

    let token = token_with_payload_segment(&URL_SAFE_NO_PAD.encode(b"not json"));
    assert_eq!(service.verify(&token), Err(TokenError::InvalidFormat));
}

#[test]
fn test_huge_expiry_does_not_wrap() {
    let (service, clock) = service_at(1_700_000_000);
    let token = service
        .sign(&claims(json!({"sub": "u1"})), SignOptions::expires_in(i64::MAX))
        .unwrap();

    clock.advance(10 * 365 * 24 * 3600);
    let decoded = service.verify(&token).unwrap();
    assert_eq!(decoded["exp"], i64::MAX);
}
