//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod geocode;
pub mod init;
pub mod retry_failed;
pub mod status;
pub mod sync;
pub mod validate;
