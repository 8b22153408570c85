//! Post-run summary of a `.perf.log`.
//!
//! `builtin` records are grouped per (version, caller), `calledat` records
//! per callee. A record at depth 0 counts as an eager-fork (`ef`) entry,
//! anything deeper as a divide-and-conquer (`dac`) entry.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io::BufRead;
use std::path::Path;

use serde::Serialize;

use crate::error::ReportError;
use crate::runtime::entry::LogEntry;

/// Display name of a task-creation strategy version.
pub fn version_name(version: i32) -> &'static str {
    match version {
        0 => "parallel_for",
        1 => "parallel_for_ef",
        2 => "parallel_for_dac",
        _ => "unknown",
    }
}

/// Aggregated `builtin` records of one (version, caller) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallerProfile {
    pub version: i32,
    pub caller: String,
    pub entries: u64,
    pub ef_entries: u64,
    pub dac_entries: u64,
    pub trip_count_sum: u64,
    pub granularity_sum: u64,
    pub depth_sum: i64,
    pub src_locs: BTreeSet<String>,
    pub inline_locs: BTreeSet<String>,
}

impl CallerProfile {
    fn add(&mut self, trip_count: u64, granularity: u64, depth: i32, src: &str, inline: &str) {
        self.entries += 1;
        if depth > 0 {
            self.dac_entries += 1;
        } else {
            self.ef_entries += 1;
        }
        self.trip_count_sum = self.trip_count_sum.saturating_add(trip_count);
        self.granularity_sum = self.granularity_sum.saturating_add(granularity);
        self.depth_sum += i64::from(depth);
        self.src_locs.insert(src.to_owned());
        self.inline_locs.insert(inline.to_owned());
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.entries == 0 {
            0.0
        } else {
            sum / self.entries as f64
        }
    }

    pub fn avg_trip_count(&self) -> f64 {
        self.mean(self.trip_count_sum as f64)
    }

    pub fn avg_granularity(&self) -> f64 {
        self.mean(self.granularity_sum as f64)
    }

    pub fn avg_depth(&self) -> f64 {
        self.mean(self.depth_sum as f64)
    }
}

/// Aggregated `calledat` records of one callee.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalleeProfile {
    pub callee: String,
    pub calls: u64,
    pub max_depth: i32,
    pub callsite_locs: BTreeSet<String>,
    pub callers: BTreeSet<String>,
}

/// Summary of a whole log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub records: u64,
    callers: BTreeMap<(i32, String), CallerProfile>,
    callees: BTreeMap<String, CalleeProfile>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a log file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Reads a log. Blank lines are skipped; anything else that does not
    /// parse is an error naming its 1-based line number.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, ReportError> {
        let mut report = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let entry: LogEntry = line.parse().map_err(|source| ReportError::Malformed {
                line: idx + 1,
                source,
            })?;
            report.add(&entry);
        }
        tracing::debug!(
            records = report.records,
            callers = report.callers.len(),
            callees = report.callees.len(),
            "perf log summarised"
        );
        Ok(report)
    }

    pub fn add(&mut self, entry: &LogEntry) {
        self.records += 1;
        match entry {
            LogEntry::Intrinsic {
                version,
                trip_count,
                granularity,
                depth,
                caller_link,
                source_loc,
                inline_loc,
            } => {
                let profile = self
                    .callers
                    .entry((*version, caller_link.clone()))
                    .or_insert_with(|| CallerProfile {
                        version: *version,
                        caller: caller_link.clone(),
                        ..CallerProfile::default()
                    });
                profile.add(*trip_count, *granularity, *depth, source_loc, inline_loc);
            }
            LogEntry::Call {
                callee_link,
                callsite_loc,
                caller_link,
                depth,
            } => {
                let profile = self
                    .callees
                    .entry(callee_link.clone())
                    .or_insert_with(|| CalleeProfile {
                        callee: callee_link.clone(),
                        ..CalleeProfile::default()
                    });
                profile.calls += 1;
                profile.max_depth = profile.max_depth.max(*depth);
                profile.callsite_locs.insert(callsite_loc.clone());
                profile.callers.insert(caller_link.clone());
            }
        }
    }

    pub fn caller(&self, version: i32, caller: &str) -> Option<&CallerProfile> {
        self.callers.get(&(version, caller.to_owned()))
    }

    pub fn callee(&self, callee: &str) -> Option<&CalleeProfile> {
        self.callees.get(callee)
    }

    /// Caller profiles in ascending entry count.
    pub fn callers_by_entries(&self) -> Vec<&CallerProfile> {
        let mut out: Vec<&CallerProfile> = self.callers.values().collect();
        out.sort_by_key(|p| p.entries);
        out
    }

    /// Callee profiles in descending call count.
    pub fn callees_by_calls(&self) -> Vec<&CalleeProfile> {
        let mut out: Vec<&CalleeProfile> = self.callees.values().collect();
        out.sort_by(|a, b| b.calls.cmp(&a.calls).then_with(|| a.callee.cmp(&b.callee)));
        out
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        let summary = JsonSummary {
            records: self.records,
            callers: self
                .callers_by_entries()
                .into_iter()
                .map(|p| JsonCaller {
                    strategy: version_name(p.version),
                    profile: p,
                    avg_trip_count: p.avg_trip_count(),
                    avg_granularity: p.avg_granularity(),
                    avg_depth: p.avg_depth(),
                })
                .collect(),
            callees: self.callees_by_calls(),
        };
        Ok(serde_json::to_string_pretty(&summary)?)
    }

    /// Indented text, one block per strategy version.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let by_entries = self.callers_by_entries();
        for version in 0..=2 {
            let _ = writeln!(out, "{}:", version_name(version));
            for p in by_entries.iter().filter(|p| p.version == version) {
                let _ = writeln!(
                    out,
                    "\t<{}> entry:{} ef:{} dac:{} avg.tc:{:.2} avg.gran:{:.2}\tcaller: {}",
                    version_name(p.version),
                    p.entries,
                    p.ef_entries,
                    p.dac_entries,
                    p.avg_trip_count(),
                    p.avg_granularity(),
                    p.caller
                );
                for loc in &p.src_locs {
                    let _ = writeln!(out, "\t\tsource code at: {}", loc);
                }
                for loc in &p.inline_locs {
                    let _ = writeln!(out, "\t\tinlined at: {}", loc);
                }
            }
        }
        if !self.callees.is_empty() {
            let _ = writeln!(out, "calls:");
            for c in self.callees_by_calls() {
                let _ = writeln!(
                    out,
                    "\t{} calls:{} max.depth:{}",
                    c.callee, c.calls, c.max_depth
                );
                for loc in &c.callsite_locs {
                    let _ = writeln!(out, "\t\tcalled at: {}", loc);
                }
            }
        }
        out
    }
}

#[derive(Serialize)]
struct JsonCaller<'a> {
    strategy: &'static str,
    #[serde(flatten)]
    profile: &'a CallerProfile,
    avg_trip_count: f64,
    avg_granularity: f64,
    avg_depth: f64,
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    records: u64,
    callers: Vec<JsonCaller<'a>>,
    callees: Vec<&'a CalleeProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
builtin,1,100,4,0,kernel,a.c:10:2,c.c:5:1
builtin,1,50,8,1,kernel,a.c:10:2,c.c:6:1
calledat,kernel,main.c:7:1,main,0

calledat,kernel,main.c:9:1,main,2
builtin,2,10,1,3,scan,s.c:1:1,s.c:1:1
";

    #[test]
    fn aggregates_per_version_and_caller() {
        let r = Report::from_reader(LOG.as_bytes()).unwrap();
        assert_eq!(r.records, 5);
        let k = r.caller(1, "kernel").unwrap();
        assert_eq!(k.entries, 2);
        assert_eq!(k.ef_entries, 1);
        assert_eq!(k.dac_entries, 1);
        assert_eq!(k.avg_trip_count(), 75.0);
        assert_eq!(k.avg_granularity(), 6.0);
        assert_eq!(k.src_locs.len(), 1);
        assert_eq!(k.inline_locs.len(), 2);
        assert!(r.caller(2, "kernel").is_none());

        let c = r.callee("kernel").unwrap();
        assert_eq!(c.calls, 2);
        assert_eq!(c.max_depth, 2);
        assert_eq!(c.callsite_locs.len(), 2);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = Report::from_reader("calledat,f,a.c:1:1,main,0\nbuiltin,x\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ReportError::Malformed { line: 2, .. }));
    }

    #[test]
    fn text_and_json_mention_each_caller() {
        let r = Report::from_reader(LOG.as_bytes()).unwrap();
        let text = r.render_text();
        assert!(text.contains("<parallel_for_ef> entry:2 ef:1 dac:1 avg.tc:75.00 avg.gran:6.00\tcaller: kernel"));
        assert!(text.contains("inlined at: c.c:6:1"));
        let json: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert_eq!(json["records"], 5);
        assert_eq!(json["callers"][0]["caller"], "scan");
        assert_eq!(json["callers"][0]["version"], 2);
        assert_eq!(json["callers"][0]["strategy"], "parallel_for_dac");
        assert_eq!(json["callees"][0]["calls"], 2);
    }
}
