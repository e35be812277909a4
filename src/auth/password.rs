//! 凭据哈希（PBKDF2-HMAC-SHA512）
//!
//! 存储格式：`<salt_hex>:<derived_key_hex>`

use rand::{rngs::OsRng, RngCore};
use sha2::Sha512;

/// 随机盐长度（字节），十六进制后 32 字符
pub const SALT_LEN: usize = 16;

/// PBKDF2 迭代次数，修改后所有已存记录失效
pub const PBKDF2_ITERATIONS: u32 = 150_000;

/// 派生密钥长度（字节）
pub const KEY_LEN: usize = 64;

/// 密码哈希器，参数固定
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialHasher;

impl CredentialHasher {
    pub fn new() -> Self {
        Self
    }

    /// 生成 `salt:key` 记录
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let salt_hex = hex::encode(salt);

        let derived = derive_key(password, &salt_hex);

        format!("{}:{}", salt_hex, hex::encode(derived))
    }

    /// 校验密码，格式错误的记录一律不匹配
    pub fn verify(&self, password: &str, record: &str) -> bool {
        let Some((salt_hex, key_hex)) = record.split_once(':') else {
            tracing::debug!("Credential record missing separator");
            return false;
        };

        let Ok(stored_key) = hex::decode(key_hex) else {
            tracing::debug!("Credential record key is not valid hex");
            return false;
        };

        if hex::decode(salt_hex).is_err() {
            tracing::debug!("Credential record salt is not valid hex");
            return false;
        }

        let derived = derive_key(password, salt_hex);

        constant_time_eq(&stored_key, &derived)
    }
}

/// 盐以十六进制文本参与派生，而不是解码后的字节
fn derive_key(password: &str, salt_hex: &str) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha512>(
        password.as_bytes(),
        salt_hex.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut key,
    );
    key
}

/// 常量时间比较，长度本身不保密
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
