//! Source-level debug metadata.
//!
//! Scopes and locations live in a per-module arena and are referenced by
//! index. A location whose `inlined_at` is set was textually inlined: it
//! points at the location of the call that was inlined, which may itself
//! be inlined somewhere else. Following `inlined_at` to the end of the
//! chain yields the physical location in the function that owns the
//! instruction.

/// Index of a scope in `DebugInfo::scopes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub u32);

/// Index of a location in `DebugInfo::locations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocId(pub u32);

impl std::fmt::Display for LocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "!{}", self.0)
    }
}

/// A lexical scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiScope {
    /// A procedure's own scope.
    Subprogram {
        name: String,
        linkage_name: String,
        file: String,
    },
    /// A nested block inside another scope.
    LexicalBlock { parent: ScopeId, file: String },
    /// A scope with no enclosing subprogram (file or compile-unit level).
    File { file: String },
}

impl DiScope {
    pub fn file(&self) -> &str {
        match self {
            DiScope::Subprogram { file, .. }
            | DiScope::LexicalBlock { file, .. }
            | DiScope::File { file } => file,
        }
    }
}

/// A source position, optionally inlined into another location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiLocation {
    pub line: u32,
    pub column: u32,
    pub scope: ScopeId,
    pub inlined_at: Option<LocId>,
}

/// Arena holding every scope and location of a module.
#[derive(Debug, Default, Clone)]
pub struct DebugInfo {
    scopes: Vec<DiScope>,
    locations: Vec<DiLocation>,
}

impl DebugInfo {
    pub fn add_scope(&mut self, scope: DiScope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub fn add_subprogram(
        &mut self,
        name: impl Into<String>,
        linkage_name: impl Into<String>,
        file: impl Into<String>,
    ) -> ScopeId {
        self.add_scope(DiScope::Subprogram {
            name: name.into(),
            linkage_name: linkage_name.into(),
            file: file.into(),
        })
    }

    pub fn add_location(
        &mut self,
        line: u32,
        column: u32,
        scope: ScopeId,
        inlined_at: Option<LocId>,
    ) -> LocId {
        let id = LocId(self.locations.len() as u32);
        self.locations.push(DiLocation {
            line,
            column,
            scope,
            inlined_at,
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> Option<&DiScope> {
        self.scopes.get(id.0 as usize)
    }

    pub fn location(&self, id: LocId) -> Option<&DiLocation> {
        self.locations.get(id.0 as usize)
    }

    pub fn scopes(&self) -> &[DiScope] {
        &self.scopes
    }

    pub fn locations(&self) -> &[DiLocation] {
        &self.locations
    }
}
