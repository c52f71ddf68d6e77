//! Logger initialization.
//!
//! Every module logs through the `log` facade; binaries call `init_logging`
//! once early in `main` to install `env_logger` behind it.

mod init;

pub use init::{init_logging, LoggingConfig};
