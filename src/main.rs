use std::process;

use tracing_subscriber::EnvFilter;

use lazyprof::cli::{parse_args, ParseArgsResult, ReportArgs, ReportFormat};
use lazyprof::report::Report;

fn main() {
    install_tracing();
    let args: Vec<String> = std::env::args().collect();

    match parse_args(&args) {
        Ok(ParseArgsResult::Help) => {
            print!("{}", lazyprof::cli::help_text());
        }
        Ok(ParseArgsResult::Version) => {
            print!("{}", lazyprof::cli::version_text());
        }
        Ok(ParseArgsResult::Report(cli)) => {
            if let Err(e) = run_report(&cli) {
                eprintln!("error[{}]: {}", e.diagnostic_code(), e);
                process::exit(1);
            }
        }
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", lazyprof::cli::help_text());
            process::exit(1);
        }
    }
}

fn run_report(cli: &ReportArgs) -> Result<(), lazyprof::Error> {
    let report = Report::from_path(&cli.path)?;
    let output = match cli.format {
        ReportFormat::Text => report.render_text(),
        ReportFormat::Json => report.to_json()?,
    };
    match &cli.output {
        Some(out_path) => std::fs::write(out_path, output)?,
        None => print!("{}", output),
    }
    Ok(())
}

fn install_tracing() {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Ok(directive) = "lazyprof=info".parse() {
        filter = filter.add_directive(directive);
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
