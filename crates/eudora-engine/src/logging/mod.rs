//! Logger initialization.
//!
//! Engine code logs through the `log` facade; `env_logger` is the backend.

mod init;

pub use init::{init_logging, LoggingConfig};
