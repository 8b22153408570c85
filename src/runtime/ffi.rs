//! C entry points called by instrumented code.
//!
//! The signatures match what the profiling pass emits. Any failure to
//! record an event aborts the process: a run with silently missing events
//! would produce wrong statistics.

#![allow(non_snake_case)]

use std::ffi::CStr;
use std::os::raw::c_char;

use crate::error::LogError;
use crate::runtime::entry::LogEntry;
use crate::runtime::global::{current_depth, global_logger};

/// Copies a C string, mapping null to the empty string.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn owned(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

fn emit_or_abort(entry: LogEntry) {
    let result = global_logger().and_then(|logger| logger.emit(entry));
    if let Err(e) = result {
        fatal(&e);
    }
}

fn fatal(e: &LogError) -> ! {
    eprintln!("lazyprof: fatal: {}", e);
    std::process::abort();
}

/// Event for a reached lazy task-creation site.
///
/// # Safety
/// The three string arguments must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn lazydProfilingPerf(
    version: i32,
    trip_count: u64,
    granularity: u64,
    depth: i32,
    caller_link: *const c_char,
    source_loc: *const c_char,
    inline_loc: *const c_char,
) {
    emit_or_abort(LogEntry::Intrinsic {
        version,
        trip_count,
        granularity,
        depth,
        caller_link: owned(caller_link),
        source_loc: owned(source_loc),
        inline_loc: owned(inline_loc),
    });
}

/// Event for a call into a function containing task-creation sites.
/// The depth comes from the task runtime's depth probe.
///
/// # Safety
/// The three string arguments must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn lazydProfilingCall(
    callee_link: *const c_char,
    callsite_loc: *const c_char,
    caller_link: *const c_char,
) {
    emit_or_abort(LogEntry::Call {
        callee_link: owned(callee_link),
        callsite_loc: owned(callsite_loc),
        caller_link: owned(caller_link),
        depth: current_depth(),
    });
}

/// Flushes and closes the log. Safe to call more than once.
#[no_mangle]
pub extern "C" fn lazydProfilingFinalize() {
    if let Err(e) = crate::runtime::global::shutdown() {
        fatal(&e);
    }
}
