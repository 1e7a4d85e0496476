//! Run reporting.
//!
//! Collects per-case outcomes into a [`SuiteReport`] and renders the final
//! summary, including a failure-detail block with the reproducible curl line
//! for every failed case.

// ANSI color codes
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const RED: &str = "\x1b[31m";
pub(crate) const YELLOW: &str = "\x1b[33m";
pub(crate) const CYAN: &str = "\x1b[36m";
pub(crate) const BOLD: &str = "\x1b[1m";
pub(crate) const DIM: &str = "\x1b[2m";
pub(crate) const RESET: &str = "\x1b[0m";

#[derive(Debug, Default)]
pub struct SuiteReport {
    pub total_groups: usize,
    pub total_cases: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failures: Vec<FailureDetail>,
}

impl SuiteReport {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug)]
pub struct FailureDetail {
    pub group: String,
    pub title: String,
    /// `"METHOD url"` as far as the request got built.
    pub request: String,
    pub expected: String,
    pub actual: String,
    /// Captured response body, or the transport error message when the call
    /// never produced a response.
    pub detail: String,
    pub curl_command: Option<String>,
}

pub fn print_summary(report: &SuiteReport, show_curl: bool) {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{BOLD}Suite Summary{RESET}");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Groups:  {}", report.total_groups);
    println!("  Cases:   {}", report.total_cases);
    println!();
    println!("  {}Passed:  {}{}", GREEN, report.passed, RESET);
    println!("  {}Failed:  {}{}", RED, report.failed, RESET);
    println!("  {}Skipped: {}{}", YELLOW, report.skipped, RESET);
    println!();

    if !report.failures.is_empty() {
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("{RED}Failure Details{RESET}");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        for (i, failure) in report.failures.iter().enumerate() {
            println!();
            println!("{}. {} / {}", i + 1, failure.group, failure.title);
            println!("   Request:  {}", failure.request);
            println!("   Expected: {}", failure.expected);
            println!("   {}Actual:   {}{}", RED, failure.actual, RESET);
            println!("   Response: {}", failure.detail);

            if show_curl {
                if let Some(ref curl) = failure.curl_command {
                    println!("   Curl:     {curl}");
                }
            }
        }
        println!();
    }

    if report.all_passed() {
        println!("{GREEN}All cases passed!{RESET}");
    } else {
        println!(
            "{}{} case(s) failed. See details above.{}",
            RED, report.failed, RESET
        );
    }
}
