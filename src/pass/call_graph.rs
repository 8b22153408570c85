//! Call graph of a module and its reverse mapping.
//!
//! `CallGraph` is the analysis result a host compiler hands to the
//! profiling pass: one node per defined function, one edge per call
//! operation. `ReverseCallGraph` inverts it into callee -> call sites and
//! is computed once, before any rewriting. Instructions the pass inserts
//! later never appear in it.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::PassError;
use crate::ir::function::FunctionId;
use crate::ir::instr::{InstId, IrInstr};
use crate::ir::module::IrModule;

/// Identifies one instruction in the module: owning function plus stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallSiteRef {
    pub func: FunctionId,
    pub inst: InstId,
}

/// An outgoing edge of a call-graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEdge {
    /// The call operation, or `None` for references that are not calls
    /// (e.g. edges to an external node).
    pub site: Option<CallSiteRef>,
    /// The statically known target; `None` for indirect calls.
    pub callee: Option<FunctionId>,
}

#[derive(Debug, Clone)]
pub struct CallGraphNode {
    pub func: FunctionId,
    pub edges: Vec<CallEdge>,
}

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: Vec<CallGraphNode>,
}

impl CallGraph {
    /// Builds the call graph of every defined function in `module`.
    pub fn build(module: &IrModule) -> Self {
        let nodes = module
            .defined_functions()
            .map(|func| {
                let edges = func
                    .instructions()
                    .filter_map(|inst| {
                        let callee = match &inst.op {
                            IrInstr::Call { callee, .. } => module.function_id(callee),
                            IrInstr::CallIndirect { .. } => None,
                            _ => return None,
                        };
                        Some(CallEdge {
                            site: Some(CallSiteRef {
                                func: func.id,
                                inst: inst.id,
                            }),
                            callee,
                        })
                    })
                    .collect();
                CallGraphNode {
                    func: func.id,
                    edges,
                }
            })
            .collect();
        Self { nodes }
    }

    /// Wraps nodes computed elsewhere.
    pub fn from_nodes(nodes: Vec<CallGraphNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[CallGraphNode] {
        &self.nodes
    }

    /// Total number of edges over all nodes.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }
}

/// Maps each defined callee to the call operations targeting it.
#[derive(Debug, Clone, Default)]
pub struct ReverseCallGraph {
    callers: BTreeMap<FunctionId, BTreeSet<CallSiteRef>>,
}

impl ReverseCallGraph {
    /// Inverts `graph`.
    ///
    /// Edges without a static callee, or whose callee is only a
    /// declaration, are skipped. An edge whose call site no longer names a
    /// call operation in `module` is an error.
    pub fn build(module: &IrModule, graph: &CallGraph) -> Result<Self, PassError> {
        let mut callers: BTreeMap<FunctionId, BTreeSet<CallSiteRef>> = BTreeMap::new();
        for node in graph.nodes() {
            for edge in &node.edges {
                let Some(site) = edge.site else { continue };
                let is_call = module
                    .function(site.func)
                    .and_then(|f| f.inst(site.inst))
                    .map(|inst| inst.op.is_call())
                    .unwrap_or(false);
                if !is_call {
                    let func = module
                        .function(site.func)
                        .map(|f| f.name.clone())
                        .unwrap_or_else(|| format!("<function {}>", site.func.0));
                    return Err(PassError::StaleCallGraphEdge {
                        func,
                        inst: site.inst.to_string(),
                    });
                }
                let Some(callee) = edge.callee else { continue };
                let defined = module
                    .function(callee)
                    .map(|f| !f.is_declaration())
                    .unwrap_or(false);
                if defined {
                    callers.entry(callee).or_default().insert(site);
                }
            }
        }
        Ok(Self { callers })
    }

    /// Call sites targeting `callee`, in deterministic order.
    pub fn callers_of(&self, callee: FunctionId) -> impl Iterator<Item = &CallSiteRef> + '_ {
        self.callers.get(&callee).into_iter().flatten()
    }

    /// Number of callees with at least one recorded call site.
    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }
}
