//! Input hygiene and anti-abuse helpers: sanitizing, validation, the
//! verification code and the in-memory rate limiter.

pub mod rate_limit;
pub mod sanitize;
pub mod validate;
pub mod verification;

pub use rate_limit::RateLimiter;
pub use sanitize::sanitize;
pub use validate::validate;
pub use verification::{generate_watermark, qr_payload, verification_code};
