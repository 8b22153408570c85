//! CLI argument parsing, exported from the library so integration tests can exercise it.

use std::path::PathBuf;

/// Output format of `lazyprof report`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// Fully-parsed arguments of a `report` request.
#[derive(Debug)]
pub struct ReportArgs {
    pub path: PathBuf,
    pub format: ReportFormat,
    /// Write output to this file instead of stdout.
    pub output: Option<PathBuf>,
}

/// Result of `parse_args`.
#[derive(Debug)]
pub enum ParseArgsResult {
    Report(ReportArgs),
    /// `--help` was present; caller should print usage and exit 0.
    Help,
    /// `--version` was present; caller should print the version and exit 0.
    Version,
}

/// Parses command-line arguments (the full `std::env::args()` slice including `argv[0]`).
pub fn parse_args(args: &[String]) -> Result<ParseArgsResult, String> {
    let mut command: Option<&str> = None;
    let mut path: Option<PathBuf> = None;
    let mut format = ReportFormat::Text;
    let mut output: Option<PathBuf> = None;
    let mut i = 1usize;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => return Ok(ParseArgsResult::Help),
            "--version" | "-V" => return Ok(ParseArgsResult::Version),
            "--json" => format = ReportFormat::Json,
            "-o" => {
                i += 1;
                let file = args
                    .get(i)
                    .ok_or_else(|| "-o requires an argument".to_owned())?;
                output = Some(PathBuf::from(file));
            }
            arg if !arg.starts_with('-') => {
                if command.is_none() {
                    command = Some(arg);
                } else if path.is_none() {
                    path = Some(PathBuf::from(arg));
                } else {
                    return Err(format!("unexpected argument: '{}'", arg));
                }
            }
            other => return Err(format!("unknown argument: '{}'", other)),
        }
        i += 1;
    }

    match command {
        Some("report") => {
            let path = path.ok_or_else(|| "no perf log specified".to_owned())?;
            Ok(ParseArgsResult::Report(ReportArgs {
                path,
                format,
                output,
            }))
        }
        Some(other) => Err(format!("unknown command: '{}' (valid: report)", other)),
        None => Err("no command specified".to_owned()),
    }
}

/// Returns the usage/help text for the CLI.
pub fn help_text() -> &'static str {
    "lazyprof: profiling support for lazy task-creation sites\n\
     Usage: lazyprof report [options] <TESTNAME.perf.log>\n\
     \n\
     Options:\n\
       --json                Print the summary as JSON\n\
       -o <file>             Write output to <file> instead of stdout\n\
       --version, -V         Print the version and exit\n\
       --help, -h            Print this help and exit\n\
     \n\
     Environment (instrumented programs):\n\
       TESTNAME              Run name; the log is written to <TESTNAME>.perf.log\n\
       LAZYD_PERF_DIR        Directory for the log (default: working directory)\n"
}

pub fn version_text() -> String {
    format!("lazyprof {}\n", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("lazyprof")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn report_with_json() {
        match parse_args(&argv(&["report", "--json", "wc.perf.log"])).unwrap() {
            ParseArgsResult::Report(r) => {
                assert_eq!(r.path, PathBuf::from("wc.perf.log"));
                assert_eq!(r.format, ReportFormat::Json);
                assert!(r.output.is_none());
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn help_and_version_win() {
        assert!(matches!(
            parse_args(&argv(&["report", "--help"])),
            Ok(ParseArgsResult::Help)
        ));
        assert!(matches!(
            parse_args(&argv(&["--version"])),
            Ok(ParseArgsResult::Version)
        ));
    }

    #[test]
    fn errors() {
        assert!(parse_args(&argv(&[])).is_err());
        assert!(parse_args(&argv(&["report"])).is_err());
        assert!(parse_args(&argv(&["run", "x"])).is_err());
        assert!(parse_args(&argv(&["report", "a", "b"])).is_err());
        assert!(parse_args(&argv(&["report", "-o"])).is_err());
        assert!(parse_args(&argv(&["report", "--fast", "a"])).is_err());
    }
}
