//! Discovery of lazy task markers and of the calls leading to them.

use std::collections::{BTreeMap, BTreeSet};

use crate::ir::function::FunctionId;
use crate::ir::instr::InstId;
use crate::ir::module::IrModule;
use crate::pass::call_graph::ReverseCallGraph;

/// Everything the rewriters act on, computed in one pass over the module
/// before any mutation happens.
#[derive(Debug, Default, Clone)]
pub struct Worklists {
    /// Functions owning at least one marker.
    pub marker_worklist: BTreeSet<FunctionId>,
    /// Functions owning at least one call to a marker-owning function.
    pub callsite_worklist: BTreeSet<FunctionId>,
    /// Markers per owning function, in program order.
    pub markers_by_function: BTreeMap<FunctionId, Vec<InstId>>,
    /// Recorded call sites per owning (calling) function.
    pub callsites_by_function: BTreeMap<FunctionId, BTreeSet<InstId>>,
}

impl Worklists {
    pub fn marker_count(&self) -> usize {
        self.markers_by_function.values().map(Vec::len).sum()
    }

    pub fn callsite_count(&self) -> usize {
        self.callsites_by_function.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.marker_worklist.is_empty() && self.callsite_worklist.is_empty()
    }
}

/// Scans every defined function for markers and records, for each function
/// owning one, the call sites that reach it.
pub fn collect_worklists(module: &IrModule, reverse: &ReverseCallGraph) -> Worklists {
    let mut work = Worklists::default();

    for func in module.defined_functions() {
        let markers: Vec<InstId> = func
            .instructions()
            .filter(|inst| inst.op.is_marker())
            .map(|inst| inst.id)
            .collect();
        if markers.is_empty() {
            continue;
        }

        work.marker_worklist.insert(func.id);
        work.markers_by_function.insert(func.id, markers);

        for site in reverse.callers_of(func.id) {
            work.callsites_by_function
                .entry(site.func)
                .or_default()
                .insert(site.inst);
            work.callsite_worklist.insert(site.func);
        }
    }

    work
}
