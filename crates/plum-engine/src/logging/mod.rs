//! Logging utilities.
//!
//! The engine logs through the `log` facade: `debug` for resource lifecycle,
//! `trace` for skipped draws, `warn` for leaks and unknown handles. Binaries call
//! [`init_logging`] early in `main`.

mod init;

pub use init::{init_logging, LoggingConfig};
