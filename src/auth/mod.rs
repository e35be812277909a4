//! 认证模块：凭据哈希与会话令牌

pub mod clock;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use clock::{Clock, ManualClock, SystemClock};
pub use jwt::{Claims, SignOptions, TokenError, TokenService};
pub use middleware::{extract_token, jwt_auth_middleware, AuthContext};
pub use password::CredentialHasher;
