/// Shared utilities - error types, result alias, filesystem safety checks
pub mod error;
pub mod result;
pub mod security;

pub use result::Result;
