//! Lazy task-parallelism profiling instrumentation.
//!
//! Two phases over one compilation unit:
//!
//! 1. Analysis: invert the call graph, find every lazy task marker, and
//!    record the call sites of every function owning one.
//! 2. Rewrite: insert a delegation event before each recorded call site,
//!    then replace each marker with a call into the runtime logger.
//!
//! All analysis results are fixed before the first mutation. Call sites are
//! rewritten before markers because discovery is keyed off the markers.

pub mod callsite;
pub mod collect;
pub mod location;
pub mod marker;

use crate::error::PassError;
use crate::ir::module::IrModule;
use crate::ir::types::{FnSig, IrType};
use crate::pass::call_graph::{CallGraph, ReverseCallGraph};
use crate::pass::Pass;

pub use collect::{collect_worklists, Worklists};
pub use location::{resolve_marker_location, ResolvedLocation};

/// Name the pass is registered under.
pub const PASS_NAME: &str = "profile-performance";

/// Runtime routine receiving one event per executed marker.
pub const PERF_ENTRY: &str = "lazydProfilingPerf";

/// Runtime routine receiving one event per executed delegation call.
pub const CALL_ENTRY: &str = "lazydProfilingCall";

/// `void (i32 version, i64 trip_count, i64 granularity, i32 depth,
/// ptr caller, ptr source_loc, ptr inline_loc)`
pub fn perf_entry_sig() -> FnSig {
    FnSig::new(
        vec![
            IrType::i32(),
            IrType::i64(),
            IrType::i64(),
            IrType::i32(),
            IrType::Ptr,
            IrType::Ptr,
            IrType::Ptr,
        ],
        IrType::Void,
    )
}

/// `void (ptr callee, ptr callsite_loc, ptr caller)`
pub fn call_entry_sig() -> FnSig {
    FnSig::new(vec![IrType::Ptr, IrType::Ptr, IrType::Ptr], IrType::Void)
}

/// What one instrumentation run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentStats {
    pub markers_rewritten: usize,
    pub call_sites_instrumented: usize,
}

impl InstrumentStats {
    pub fn changed(&self) -> bool {
        self.markers_rewritten > 0 || self.call_sites_instrumented > 0
    }
}

/// Instruments `module` given its call graph. Returns whether anything changed.
pub fn instrument(module: &mut IrModule, graph: &CallGraph) -> Result<bool, PassError> {
    instrument_with_stats(module, graph).map(|stats| stats.changed())
}

/// Same as [`instrument`], reporting how many sites were rewritten.
pub fn instrument_with_stats(
    module: &mut IrModule,
    graph: &CallGraph,
) -> Result<InstrumentStats, PassError> {
    let reverse = ReverseCallGraph::build(module, graph)?;
    let work = collect_worklists(module, &reverse);
    tracing::debug!(
        marker_functions = work.marker_worklist.len(),
        markers = work.marker_count(),
        callsite_functions = work.callsite_worklist.len(),
        call_sites = work.callsite_count(),
        "profiling worklists collected"
    );

    let mut stats = InstrumentStats::default();
    for (&func, sites) in &work.callsites_by_function {
        if callsite::instrument_call_sites(module, func, sites)? {
            stats.call_sites_instrumented += sites.len();
        }
    }
    for (&func, markers) in &work.markers_by_function {
        if marker::rewrite_markers(module, func, markers)? {
            stats.markers_rewritten += markers.len();
        }
    }

    tracing::info!(
        module = %module.name,
        markers = stats.markers_rewritten,
        call_sites = stats.call_sites_instrumented,
        "profile-performance instrumentation finished"
    );
    Ok(stats)
}

/// The profiling pass as a pipeline member: builds the call graph itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfilePerfPass;

impl Pass for ProfilePerfPass {
    fn name(&self) -> &'static str {
        PASS_NAME
    }

    fn run(&mut self, module: &mut IrModule) -> Result<bool, PassError> {
        let graph = CallGraph::build(module);
        instrument(module, &graph)
    }
}
