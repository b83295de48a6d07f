//! Display logic for the investigo CLI.
//!
//! Result lines, headers and summaries for both probing and `--test` mode.
//! Uses only the `console` crate; colors are switched off globally with
//! `--no-color`.

use console::style;
use investigo_lib::{ProbeOutcome, ProbeResult, ProbeSummary, SiteValidation};
use std::time::Duration;

// ── Header ───────────────────────────────────────────────────────────────────

/// Print the header that opens the results for one handle.
pub fn print_header(handle: &str) {
    println!(
        "{} {} on:",
        style("Investigating").bold(),
        style(handle).cyan().bold()
    );
}

// ── Single result line ───────────────────────────────────────────────────────

/// Render one probe result, or `None` when it should not be shown.
///
/// Not-found results are only shown in verbose mode.
pub fn format_result(result: &ProbeResult, verbose: bool) -> Option<String> {
    match &result.outcome {
        ProbeOutcome::Found { link } => Some(format!(
            "[{}] {}: {}",
            style("+").green().bold(),
            style(&result.site).bold(),
            link
        )),
        ProbeOutcome::NotFound if verbose => Some(format!(
            "[{}] {}: {}",
            style("-").red(),
            result.site,
            style("Not Found!").dim()
        )),
        ProbeOutcome::NotFound => None,
        ProbeOutcome::TransportError { .. } | ProbeOutcome::UnsupportedStrategy { .. } => {
            let message = result.error_message().unwrap_or_default();
            Some(format!(
                "[{}] {}: {} {}",
                style("!").yellow().bold(),
                result.site,
                style("ERROR:").red(),
                style(message).yellow()
            ))
        }
    }
}

/// Print one probe result as it arrives.
pub fn print_result(result: &ProbeResult, verbose: bool) {
    if let Some(line) = format_result(result, verbose) {
        println!("{}", line);
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the summary line for one handle.
pub fn print_summary(summary: &ProbeSummary) {
    println!(
        "{} {} found, {} not found, {} errors ({} sites in {:.1}s)",
        style("Summary:").bold(),
        style(summary.found).green().bold(),
        summary.not_found,
        style(summary.errors).yellow(),
        summary.total,
        summary.duration.as_secs_f64()
    );
    println!();
}

/// Print a warning to stderr.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), message);
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Render one self-validation verdict, or `None` when it should not be shown.
///
/// Working and skipped sites are only shown in verbose mode.
pub fn format_validation(validation: &SiteValidation, verbose: bool) -> Option<String> {
    if validation.is_skipped() {
        return verbose.then(|| {
            format!(
                "[{}] {}: {}",
                style("?").dim(),
                validation.site,
                style("Skipped (no test handles)").dim()
            )
        });
    }

    if validation.works() {
        return verbose.then(|| {
            format!(
                "[{}] {}: {}",
                style("+").green().bold(),
                validation.site,
                style("OK").green()
            )
        });
    }

    let errors = validation.error_summary();
    let verdict = if errors.is_empty() {
        "Failed".to_string()
    } else {
        format!("Failed with error {}", errors)
    };

    Some(format!(
        "[{}] {}: {}",
        style("-").red().bold(),
        validation.site,
        style(verdict).red()
    ))
}

/// Print one self-validation verdict as it arrives.
pub fn print_validation(validation: &SiteValidation, verbose: bool) {
    if let Some(line) = format_validation(validation, verbose) {
        println!("{}", line);
    }
}

/// Print the closing line of a `--test` run.
pub fn print_validation_summary(checked: usize, broken: usize, skipped: usize, duration: Duration) {
    println!();
    println!(
        "{} {} of {} sites incompatible, {} skipped ({:.1}s)",
        style("Summary:").bold(),
        style(broken).red().bold(),
        checked,
        skipped,
        duration.as_secs_f64()
    );
}
