//! Error taxonomy for the session core
//!
//! Every fallible operation in the workspace returns [`AppResult`]. Error
//! codes are numeric so they survive serialization unchanged and can be
//! classified (transient vs. rejection) without string matching.

mod codes;
mod types;

pub use codes::ErrorCode;
pub use types::{AppError, AppResult};
