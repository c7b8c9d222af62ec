//! Core building blocks: configuration, errors, logging, admission control.

pub mod admission;
pub mod config;
pub mod error;
pub mod logging;
pub mod rate_limiter;
pub mod stats;
pub mod validation;

pub use admission::{AdmissionGate, AdmissionPermit};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use logging::init_logger;
pub use rate_limiter::RateLimiter;
pub use stats::Stats;
pub use validation::{parse_platform, Platform};
