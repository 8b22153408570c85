//! Resolution of inlined debug-location chains into printable positions.

use crate::error::PassError;
use crate::ir::debug::{DebugInfo, DiScope, LocId, ScopeId};

/// Positions recovered for a lazy task marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Where the marker sits lexically: `<file>:<line>:<column>`.
    pub source_loc: String,
    /// The physical call the marker was inlined through, same format.
    /// Equals `source_loc` when nothing was inlined.
    pub inline_loc: String,
    /// Linkage name of the subprogram lexically enclosing the marker, i.e.
    /// the innermost procedure of the chain.
    pub caller_link: String,
    /// Linkage name of the subprogram enclosing `inline_loc`.
    pub inline_subprogram: String,
}

/// Formats a location as `<file>:<line>:<column>`.
pub fn format_location(debug: &DebugInfo, loc: LocId) -> Option<String> {
    let l = debug.location(loc)?;
    let scope = debug.scope(l.scope)?;
    Some(format!("{}:{}:{}", scope.file(), l.line, l.column))
}

/// Follows `inlined_at` links to the last location of the chain.
///
/// Returns `None` if a link dangles or the chain does not terminate.
pub fn outermost_location(debug: &DebugInfo, loc: LocId) -> Option<LocId> {
    let mut current = loc;
    // A well-formed chain visits each location at most once.
    for _ in 0..=debug.locations().len() {
        match debug.location(current)?.inlined_at {
            Some(parent) => current = parent,
            None => return Some(current),
        }
    }
    None
}

/// Walks lexical blocks outwards and returns the enclosing subprogram's
/// linkage name.
pub fn enclosing_subprogram(debug: &DebugInfo, scope: ScopeId) -> Option<&str> {
    let mut current = scope;
    for _ in 0..=debug.scopes().len() {
        match debug.scope(current)? {
            DiScope::Subprogram { linkage_name, .. } => return Some(linkage_name),
            DiScope::LexicalBlock { parent, .. } => current = *parent,
            DiScope::File { .. } => return None,
        }
    }
    None
}

/// Formats the physical (outermost) position of `loc`.
pub fn resolve_physical_location(
    debug: &DebugInfo,
    loc: LocId,
    func: &str,
) -> Result<String, PassError> {
    let dangling = || PassError::DanglingDebugLoc {
        func: func.to_owned(),
        loc: loc.to_string(),
    };
    let outer = outermost_location(debug, loc).ok_or_else(dangling)?;
    format_location(debug, outer).ok_or_else(dangling)
}

/// Resolves both ends of a marker's location chain and the procedures
/// enclosing them.
pub fn resolve_marker_location(
    debug: &DebugInfo,
    loc: LocId,
    func: &str,
) -> Result<ResolvedLocation, PassError> {
    let dangling = |at: LocId| PassError::DanglingDebugLoc {
        func: func.to_owned(),
        loc: at.to_string(),
    };
    let source_loc = format_location(debug, loc).ok_or_else(|| dangling(loc))?;
    let outer = outermost_location(debug, loc).ok_or_else(|| dangling(loc))?;
    let inline_loc = format_location(debug, outer).ok_or_else(|| dangling(outer))?;

    let subprogram_of = |at: LocId| -> Result<String, PassError> {
        let scope = debug.location(at).ok_or_else(|| dangling(at))?.scope;
        enclosing_subprogram(debug, scope)
            .map(str::to_owned)
            .ok_or_else(|| PassError::UnresolvedScope {
                func: func.to_owned(),
                loc: at.to_string(),
            })
    };
    let caller_link = subprogram_of(loc)?;
    let inline_subprogram = subprogram_of(outer)?;

    Ok(ResolvedLocation {
        source_loc,
        inline_loc,
        caller_link,
        inline_subprogram,
    })
}
