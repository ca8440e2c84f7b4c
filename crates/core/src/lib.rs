//! TextFusion Core Library
//!
//! Foundational utilities shared by every TextFusion crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{ApiKey, AppConfig, LlmSettings, RetrieverSettings};
pub use error::{AppError, AppResult};
