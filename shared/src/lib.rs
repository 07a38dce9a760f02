//! Shared types for the table-session core
//!
//! Common types used across the workspace: the persisted data model,
//! error taxonomy, and ID/time utilities. This crate carries no business
//! logic and no async code.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
