//! lazyprof: profiling instrumentation for lazy task-creation sites.
//!
//! Compile-time side:
//!
//! ```text
//! IrModule + CallGraph → ReverseCallGraph → Worklists
//!   → call-site rewrite → marker rewrite → instrumented IrModule
//! ```
//!
//! Run-time side: instrumented code calls `lazydProfilingPerf` and
//! `lazydProfilingCall`, which append records to `<TESTNAME>.perf.log`
//! through a buffered, thread-safe logger. `report` summarises the log
//! after the run.

pub mod cli;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod pass;
pub mod report;
pub mod runtime;

pub use error::Error;
pub use pass::profile::{instrument, PASS_NAME};
