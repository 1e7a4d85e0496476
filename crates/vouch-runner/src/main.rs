//! Vouch CLI.
//!
//! Usage:
//!   vouch <SPEC> [OPTIONS]
//!
//! Loads the YAML specification, runs every group and case in declaration
//! order against the spec's base URL, prints a summary, and exits non-zero
//! if any case failed.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use vouch_runner::report::print_summary;
use vouch_runner::suite::{run_suite, RunOptions};
use vouch_runner::transport::HttpTransport;
use vouch_runner::Specification;

/// Vouch - contract tests for HTTP APIs from a declarative spec
#[derive(Parser, Debug)]
#[command(name = "vouch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML specification file
    spec: PathBuf,

    /// Per-case timeout in seconds
    #[arg(short, long, default_value = "10")]
    timeout: u64,

    /// Show curl commands for each executed case
    #[arg(short = 'c', long)]
    show_curl: bool,

    /// Verbose output (per-case PASS lines with latency)
    #[arg(short, long)]
    verbose: bool,

    /// List the cases that would run without sending any request
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let spec = Specification::from_file(&args.spec)?;
    let timeout = Duration::from_secs(args.timeout);
    let transport = HttpTransport::new(timeout)?;

    println!("Vouch contract-test runner");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Spec:     {}", args.spec.display());
    println!("Base URL: {}", spec.base_url());
    println!();

    let options = RunOptions {
        timeout,
        show_curl: args.show_curl,
        verbose: args.verbose,
        dry_run: args.dry_run,
    };

    let report = run_suite(&spec, &transport, &options).await;
    print_summary(&report, args.show_curl);

    if !report.all_passed() {
        std::process::exit(1);
    }

    Ok(())
}
