//! Name- and extension-point-based pass lookup.
//!
//! A host compiler builds pipelines either from pass names given on its
//! command line or by asking for every pass attached to a point of its
//! default pipeline. `PassRegistry` answers both questions.

use crate::error::PassError;
use crate::pass::profile::{ProfilePerfPass, PASS_NAME};
use crate::pass::validate::ValidatePass;
use crate::pass::{Pass, PassManager};

/// Points of the host's default pipeline where passes can be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionPoint {
    /// After task-parallel constructs have been lowered.
    TapirLate,
    /// At the very end of the optimization pipeline.
    OptimizerLast,
}

type PassFactory = fn() -> Box<dyn Pass>;

pub struct PassRegistry {
    named: Vec<(&'static str, PassFactory)>,
    extensions: Vec<(ExtensionPoint, PassFactory)>,
}

impl PassRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            named: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// A registry knowing the passes of this crate, with the profiling pass
    /// attached to `ExtensionPoint::TapirLate`.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register_named(PASS_NAME, || Box::new(ProfilePerfPass));
        reg.register_named("validate", || Box::new(ValidatePass));
        reg.register_extension(ExtensionPoint::TapirLate, || Box::new(ProfilePerfPass));
        reg
    }

    pub fn register_named(&mut self, name: &'static str, factory: PassFactory) {
        self.named.push((name, factory));
    }

    pub fn register_extension(&mut self, point: ExtensionPoint, factory: PassFactory) {
        self.extensions.push((point, factory));
    }

    /// Creates a fresh instance of the pass registered as `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn Pass>> {
        self.named
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, factory)| factory())
    }

    /// Builds a pipeline from a comma-separated list of pass names.
    pub fn parse_pipeline(&self, pipeline: &str) -> Result<PassManager, PassError> {
        let mut pm = PassManager::new();
        for name in pipeline.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let pass = self.create(name).ok_or_else(|| PassError::UnknownPass {
                name: name.to_owned(),
            })?;
            pm.add_boxed(pass);
        }
        Ok(pm)
    }

    /// Appends every pass attached to `point` to `pm`. Returns how many.
    pub fn populate_extension_point(&self, point: ExtensionPoint, pm: &mut PassManager) -> usize {
        let mut added = 0;
        for (_, factory) in self.extensions.iter().filter(|(p, _)| *p == point) {
            pm.add_boxed(factory());
            added += 1;
        }
        added
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
