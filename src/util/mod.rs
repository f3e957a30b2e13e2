//! Shared helpers: logging setup, filesystem and shell-quoting utilities

pub mod fs;
pub mod logging;
pub mod shell;

pub use logging::{init_from_env, init_logging, LoggingConfig};
