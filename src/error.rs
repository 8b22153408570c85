use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("[instrumentation error] {0}")]
    Pass(#[from] PassError),

    #[error("[profiling log error] {0}")]
    Log(#[from] LogError),

    #[error("[report error] {0}")]
    Report(#[from] ReportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Pass errors
// ---------------------------------------------------------------------------

/// Errors raised while analysing or rewriting a module.
///
/// Every variant aborts compilation: partially instrumented output would
/// silently skew the measurements taken from it.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("in function '{func}': lazy task marker {inst} has no debug location: compile with debug info enabled")]
    MarkerWithoutDebugLoc { func: String, inst: String },

    #[error("in function '{func}': call site {inst} has no debug location: compile with debug info enabled")]
    CallSiteWithoutDebugLoc { func: String, inst: String },

    #[error("in function '{func}': call site {inst} has no statically known callee: the call graph and the module disagree")]
    UnresolvedCallee { func: String, inst: String },

    #[error("in function '{func}': call graph edge refers to {inst}, which is not a call in this module")]
    StaleCallGraphEdge { func: String, inst: String },

    #[error("in function '{func}': debug location {loc} does not resolve to an enclosing subprogram")]
    UnresolvedScope { func: String, loc: String },

    #[error("in function '{func}': dangling debug location {loc}")]
    DanglingDebugLoc { func: String, loc: String },

    #[error("in function '{func}': marker operand {value} has type '{found}', expected a pointer to the runtime routine")]
    BadMarkerTarget {
        func: String,
        value: String,
        found: String,
    },

    #[error("in function '{func}': variable '{value}' is used before it has been assigned a value")]
    UseBeforeDef { func: String, value: String },

    #[error("in function '{func}': variable '{value}' is defined more than once")]
    MultipleDefinition { func: String, value: String },

    #[error("in function '{func}': block '{block}' does not end with a return or branch")]
    MissingTerminator { func: String, block: String },

    #[error("in function '{func}': call to undeclared function '{callee}'")]
    UnknownCallee { func: String, callee: String },

    #[error("in function '{func}': indirect call through {callee} passes {found} arguments, signature takes {expected}")]
    ArityMismatch {
        func: String,
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("in function '{func}': address of unknown string global {global}")]
    UnknownGlobal { func: String, global: String },

    #[error("unknown pass '{name}'")]
    UnknownPass { name: String },
}

// ---------------------------------------------------------------------------
// Runtime log errors
// ---------------------------------------------------------------------------

/// Errors of the run-time event logger.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("environment variable {var} is not set: it names the output file '<{var}>.perf.log'")]
    MissingConfig { var: &'static str },

    #[error("cannot open profiling log '{path}' for writing: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed writing profiling log: {0}")]
    Write(#[from] std::io::Error),

    #[error("profiling logger already installed")]
    AlreadyInstalled,

    #[error("profiling logger not installed")]
    NotInstalled,

    #[error("profiling log already finalized: event arrived after teardown")]
    Finalized,
}

/// Errors parsing one line of a profiling log.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryParseError {
    #[error("unknown record tag '{tag}': expected 'builtin' or 'calledat'")]
    UnknownTag { tag: String },

    #[error("'{tag}' record has {found} fields, expected {expected}")]
    FieldCount {
        tag: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("field '{field}' is not a valid number: '{value}'")]
    BadNumber { field: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors reading back a profiling log.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: EntryParseError,
    },

    #[error("I/O error reading profiling log: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns a stable diagnostic code for this error.
    pub fn diagnostic_code(&self) -> &'static str {
        match self {
            Error::Pass(p) => match p {
                PassError::MarkerWithoutDebugLoc { .. } => "E0200",
                PassError::CallSiteWithoutDebugLoc { .. } => "E0201",
                PassError::UnresolvedCallee { .. } => "E0202",
                PassError::StaleCallGraphEdge { .. } => "E0203",
                PassError::UnresolvedScope { .. } => "E0204",
                PassError::DanglingDebugLoc { .. } => "E0205",
                PassError::BadMarkerTarget { .. } => "E0206",
                PassError::UseBeforeDef { .. } => "E0210",
                PassError::MultipleDefinition { .. } => "E0211",
                PassError::MissingTerminator { .. } => "E0212",
                PassError::UnknownCallee { .. } => "E0213",
                PassError::ArityMismatch { .. } => "E0214",
                PassError::UnknownGlobal { .. } => "E0215",
                PassError::UnknownPass { .. } => "E0220",
            },
            Error::Log(_) => "E0300",
            Error::Report(_) => "E0400",
            Error::Io(_) => "E0500",
        }
    }
}
