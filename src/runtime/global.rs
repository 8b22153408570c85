//! The process-wide logger used by the C entry points.
//!
//! Instrumented programs carry no handle to pass around, so the logger
//! they reach lives here. It is installed once (explicitly, or lazily on
//! the first event), and finalized once by `shutdown`, which runs from an
//! `atexit` hook or when an `InstallGuard` is dropped. A finalized registry
//! stays finalized: the log file is never reopened, since reopening would
//! truncate it.

use std::sync::{Arc, Once};

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::error::LogError;
use crate::runtime::config::LoggerConfig;
use crate::runtime::logger::{FileLogger, Logger};

enum Slot {
    Empty,
    Live(Arc<FileLogger>),
    Finalized,
}

lazy_static! {
    static ref LOGGER: RwLock<Slot> = RwLock::new(Slot::Empty);
    static ref DEPTH_PROBE: RwLock<fn() -> i32> = RwLock::new(no_depth);
}

static ATEXIT: Once = Once::new();

fn no_depth() -> i32 {
    0
}

/// Finalizes the installed logger on drop.
#[must_use = "dropping the guard finalizes the profiling log"]
pub struct InstallGuard {
    _private: (),
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        if let Err(e) = shutdown() {
            tracing::error!("profiling log teardown failed: {}", e);
        }
    }
}

/// Installs a logger built from `config`. Fails if one is already
/// installed or the log was already finalized.
pub fn install(config: &LoggerConfig) -> Result<InstallGuard, LogError> {
    let mut slot = LOGGER.write();
    match *slot {
        Slot::Live(_) => return Err(LogError::AlreadyInstalled),
        Slot::Finalized => return Err(LogError::Finalized),
        Slot::Empty => {}
    }
    *slot = Slot::Live(Arc::new(Logger::create(config)?));
    drop(slot);
    register_exit_hook();
    Ok(InstallGuard { _private: () })
}

/// Returns the installed logger, installing one from the environment and
/// registering the exit hook if none exists yet. Fails once the log has
/// been finalized.
pub fn global_logger() -> Result<Arc<FileLogger>, LogError> {
    match &*LOGGER.read() {
        Slot::Live(logger) => return Ok(Arc::clone(logger)),
        Slot::Finalized => return Err(LogError::Finalized),
        Slot::Empty => {}
    }
    let mut slot = LOGGER.write();
    match &*slot {
        Slot::Live(logger) => return Ok(Arc::clone(logger)),
        Slot::Finalized => return Err(LogError::Finalized),
        Slot::Empty => {}
    }
    let logger = Arc::new(Logger::create(&LoggerConfig::from_env()?)?);
    *slot = Slot::Live(Arc::clone(&logger));
    drop(slot);
    register_exit_hook();
    Ok(logger)
}

/// Runs `f` against the installed logger.
pub fn with_logger<T>(f: impl FnOnce(&FileLogger) -> T) -> Result<T, LogError> {
    match &*LOGGER.read() {
        Slot::Live(logger) => Ok(f(logger)),
        Slot::Empty => Err(LogError::NotInstalled),
        Slot::Finalized => Err(LogError::Finalized),
    }
}

/// Finalizes the installed logger and marks the registry finalized.
/// Does nothing if no logger was ever installed or it is already finalized.
pub fn shutdown() -> Result<(), LogError> {
    let logger = {
        let mut slot = LOGGER.write();
        match std::mem::replace(&mut *slot, Slot::Finalized) {
            Slot::Live(logger) => logger,
            other => {
                *slot = other;
                return Ok(());
            }
        }
    };
    match Arc::try_unwrap(logger) {
        Ok(logger) => logger.finalize().map(|_| ()),
        Err(shared) => {
            // The last holder's drop writes out anything emitted from here on.
            tracing::warn!(
                holders = Arc::strong_count(&shared) - 1,
                "profiling log still referenced at shutdown"
            );
            shared.flush()
        }
    }
}

/// Installs the routine the C entry points use to read the current
/// delegation depth. The task runtime provides it.
pub fn set_depth_probe(probe: fn() -> i32) {
    *DEPTH_PROBE.write() = probe;
}

pub(crate) fn current_depth() -> i32 {
    let probe = *DEPTH_PROBE.read();
    probe()
}

extern "C" fn exit_hook() {
    if let Err(e) = shutdown() {
        eprintln!("lazyprof: profiling log teardown failed: {}", e);
    }
}

fn register_exit_hook() {
    ATEXIT.call_once(|| {
        // SAFETY: `exit_hook` is a plain `extern "C"` function with no
        // captured state; registering it has no preconditions.
        let rc = unsafe { libc::atexit(exit_hook) };
        if rc != 0 {
            tracing::warn!("could not register profiling log exit hook");
        }
    });
}
