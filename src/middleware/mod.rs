mod error_handler;
mod rate_limit;

pub use error_handler::{handle_panic, log_errors};
pub use rate_limit::{RATE_LIMIT_MESSAGE, RateLimitDecision, RateLimiter, rate_limit};
