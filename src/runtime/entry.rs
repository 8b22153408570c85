//! Profiling log records.
//!
//! One line per record, comma separated, no header. The first field tags
//! the record kind:
//!
//! ```text
//! builtin,<version>,<tripCount>,<granularity>,<depth>,<callerLinkName>,<sourceLoc>,<inlineLoc>
//! calledat,<calleeLink>,<callsiteLoc>,<callerLink>,<depth>
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EntryParseError;

pub const BUILTIN_TAG: &str = "builtin";
pub const CALLEDAT_TAG: &str = "calledat";

/// One profiling event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogEntry {
    /// A lazy task-creation site was reached.
    Intrinsic {
        version: i32,
        trip_count: u64,
        granularity: u64,
        depth: i32,
        caller_link: String,
        source_loc: String,
        inline_loc: String,
    },
    /// A function containing task-creation sites was called.
    Call {
        callee_link: String,
        callsite_loc: String,
        caller_link: String,
        depth: i32,
    },
}

impl LogEntry {
    pub fn tag(&self) -> &'static str {
        match self {
            LogEntry::Intrinsic { .. } => BUILTIN_TAG,
            LogEntry::Call { .. } => CALLEDAT_TAG,
        }
    }

    pub fn depth(&self) -> i32 {
        match self {
            LogEntry::Intrinsic { depth, .. } | LogEntry::Call { depth, .. } => *depth,
        }
    }
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogEntry::Intrinsic {
                version,
                trip_count,
                granularity,
                depth,
                caller_link,
                source_loc,
                inline_loc,
            } => write!(
                f,
                "{},{},{},{},{},{},{},{}",
                BUILTIN_TAG,
                version,
                trip_count,
                granularity,
                depth,
                caller_link,
                source_loc,
                inline_loc
            ),
            LogEntry::Call {
                callee_link,
                callsite_loc,
                caller_link,
                depth,
            } => write!(
                f,
                "{},{},{},{},{}",
                CALLEDAT_TAG, callee_link, callsite_loc, caller_link, depth
            ),
        }
    }
}

fn number<T: FromStr>(field: &'static str, value: &str) -> Result<T, EntryParseError> {
    value.parse().map_err(|_| EntryParseError::BadNumber {
        field,
        value: value.to_owned(),
    })
}

impl FromStr for LogEntry {
    type Err = EntryParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
        match fields[0] {
            BUILTIN_TAG => {
                if fields.len() != 8 {
                    return Err(EntryParseError::FieldCount {
                        tag: BUILTIN_TAG,
                        expected: 8,
                        found: fields.len(),
                    });
                }
                Ok(LogEntry::Intrinsic {
                    version: number("version", fields[1])?,
                    trip_count: number("tripCount", fields[2])?,
                    granularity: number("granularity", fields[3])?,
                    depth: number("depth", fields[4])?,
                    caller_link: fields[5].to_owned(),
                    source_loc: fields[6].to_owned(),
                    inline_loc: fields[7].to_owned(),
                })
            }
            CALLEDAT_TAG => {
                if fields.len() != 5 {
                    return Err(EntryParseError::FieldCount {
                        tag: CALLEDAT_TAG,
                        expected: 5,
                        found: fields.len(),
                    });
                }
                Ok(LogEntry::Call {
                    callee_link: fields[1].to_owned(),
                    callsite_loc: fields[2].to_owned(),
                    caller_link: fields[3].to_owned(),
                    depth: number("depth", fields[4])?,
                })
            }
            other => Err(EntryParseError::UnknownTag {
                tag: other.to_owned(),
            }),
        }
    }
}
