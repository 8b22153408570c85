//! Run-time side: the event logger linked into instrumented programs.
//!
//! Rust hosts build a [`Logger`] and pass it (with a [`CallContext`]) to
//! whoever emits events. C hosts reach the same logger through the
//! `lazydProfiling*` entry points in [`ffi`], backed by the registry in
//! [`global`].

pub mod config;
pub mod entry;
pub mod ffi;
pub mod global;
pub mod logger;

pub use config::LoggerConfig;
pub use entry::LogEntry;
pub use global::{install, set_depth_probe, shutdown, InstallGuard};
pub use logger::{CallContext, FileLogger, Logger};
