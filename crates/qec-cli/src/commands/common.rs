//! Shared helpers for CLI commands.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use qec_adapter_sim::SimulatorBackend;
use qec_hal::{BackendFactory, Counts};
use qec_mitigation::MitigatedCounts;

use crate::config::Config;

/// Outcomes shown before the listing is truncated.
const MAX_ROWS: usize = 16;

/// How command output is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Styled tables for a terminal
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

/// Construct the configured backend.
pub fn create_backend(config: &Config) -> Result<SimulatorBackend> {
    SimulatorBackend::from_config(config.backend_config())
        .with_context(|| format!("Failed to create backend '{}'", config.execution.backend))
}

/// Spinner on stderr, hidden when output is JSON.
pub fn spinner(format: OutputFormat, message: &'static str) -> ProgressBar {
    if format == OutputFormat::Json {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{json}");
    Ok(())
}

/// Print raw counts as a table with a probability bar.
#[allow(clippy::cast_precision_loss)]
pub fn print_counts(title: &str, counts: &Counts) {
    let rows: Vec<(&String, f64)> = counts
        .sorted()
        .into_iter()
        .map(|(bitstring, count)| (bitstring, *count as f64))
        .collect();
    print_rows(title, &rows, counts.total_shots() as f64, |v| format!("{v:>8.0}"));
}

/// Print corrected counts as a table with a probability bar.
pub fn print_mitigated(title: &str, counts: &MitigatedCounts) {
    print_rows(title, &counts.sorted(), counts.total(), |v| format!("{v:>8.1}"));
}

fn print_rows(title: &str, rows: &[(&String, f64)], total: f64, fmt: impl Fn(f64) -> String) {
    println!("\n{} {title}:", style("✓").green().bold());

    for (bitstring, value) in rows.iter().take(MAX_ROWS) {
        let prob = if total > 0.0 { value / total * 100.0 } else { 0.0 };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        println!(
            "  {}: {} ({:>6.2}%) {}",
            style(bitstring).cyan(),
            fmt(*value),
            prob,
            style(bar).green()
        );
    }

    if rows.len() > MAX_ROWS {
        println!("  ... and {} more outcomes", rows.len() - MAX_ROWS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_backend_from_config() {
        let mut config = Config::default();
        config.execution.readout_error = 0.1;
        config.execution.seed = Some(5);

        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.readout_error(), 0.1);
    }

    #[test]
    fn test_hidden_spinner_for_json() {
        assert!(spinner(OutputFormat::Json, "working").is_hidden());
    }
}
