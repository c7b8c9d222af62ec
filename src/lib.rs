// Tests assert on concrete values and unwrap freely.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod core;
pub mod download;
pub mod telegram;

pub use crate::core::error::{AppError, AppResult};
