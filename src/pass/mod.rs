pub mod call_graph;
pub mod profile;
pub mod registry;
pub mod validate;

pub use call_graph::{CallEdge, CallGraph, CallGraphNode, CallSiteRef, ReverseCallGraph};
pub use profile::{instrument, instrument_with_stats, InstrumentStats, ProfilePerfPass};
pub use registry::{ExtensionPoint, PassRegistry};
pub use validate::ValidatePass;

use crate::error::PassError;
use crate::ir::module::IrModule;

/// A compiler pass that operates on an `IrModule` in place.
///
/// Passes must be deterministic: given the same `IrModule`, the transformed
/// output must be identical across runs.
pub trait Pass {
    /// Human-readable name, used in error messages and pipeline lookup.
    fn name(&self) -> &'static str;

    /// Run the pass on the module. Returns whether the module changed.
    ///
    /// On error, the module state is unspecified and the pipeline aborts.
    fn run(&mut self, module: &mut IrModule) -> Result<bool, PassError>;
}

/// Manages and executes an ordered sequence of compiler passes.
///
/// Passes run in the order they were registered. The pipeline aborts at the
/// first error.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    /// If set, dumps IR text after the pass with this name completes.
    dump_after: Option<String>,
}

impl PassManager {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            dump_after: None,
        }
    }

    /// Appends a pass to the end of the pipeline.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    pub(crate) fn add_boxed(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// Configures the manager to dump IR after the named pass completes.
    pub fn set_dump_after(&mut self, pass_name: impl Into<String>) {
        self.dump_after = Some(pass_name.into());
    }

    /// Runs all passes in registration order on `module`.
    ///
    /// Returns whether any pass changed the module, or
    /// `Err((pass_name, error))` at the first failure.
    pub fn run(&mut self, module: &mut IrModule) -> Result<bool, (String, PassError)> {
        let mut changed = false;
        for pass in &mut self.passes {
            changed |= pass.run(module).map_err(|e| (pass.name().to_owned(), e))?;
            if self.dump_after.as_deref() == Some(pass.name()) {
                use crate::codegen::printer::emit_ir_text;
                if let Ok(text) = emit_ir_text(module) {
                    tracing::info!("--- IR after {} ---\n{}", pass.name(), text);
                }
            }
        }
        Ok(changed)
    }

    /// Returns the names of all registered passes in pipeline order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
