//! Calibrate command implementation.
//!
//! Runs the `2^k` basis-state preparation circuits and prints the measured
//! readout matrix.

use anyhow::Result;
use console::style;
use serde::Serialize;

use qec_hal::Backend;
use qec_mitigation::{CalibrationMatrix, MitigationSession, state_label};

use super::common::{OutputFormat, create_backend, print_json, spinner};
use crate::config::Config;

/// Arguments of `qec calibrate`.
#[derive(Debug, Clone)]
pub struct CalibrateArgs {
    pub qubits: usize,
    /// Shots per calibration circuit.
    pub shots: Option<u32>,
    pub readout_error: Option<f64>,
    pub seed: Option<u64>,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct CalibrationOutput {
    num_qubits: usize,
    shots: u32,
    labels: Vec<String>,
    /// Row = observed state, column = prepared state.
    matrix: Vec<Vec<f64>>,
    average_fidelity: f64,
}

/// Execute the calibrate command.
pub async fn execute(config: &Config, args: &CalibrateArgs) -> Result<()> {
    let config = config.with_overrides(None, args.readout_error, args.seed)?;
    let shots = args.shots.unwrap_or(config.mitigation.calibration_shots);

    let backend = create_backend(&config)?;
    let mut session = MitigationSession::new(&backend).with_shots(shots);

    if args.format == OutputFormat::Text {
        println!(
            "{} Calibrating {} measured qubit(s) on {} (2^{} circuits x {} shots)",
            style("→").cyan().bold(),
            args.qubits,
            style(backend.name()).yellow(),
            args.qubits,
            shots
        );
    }

    let spinner = spinner(args.format, "Running calibration circuits...");
    let matrix = session.calibrate(args.qubits).await.cloned();
    spinner.finish_and_clear();
    let matrix = matrix?;

    match args.format {
        OutputFormat::Json => print_json(&CalibrationOutput {
            num_qubits: matrix.num_qubits(),
            shots,
            labels: labels(&matrix),
            matrix: matrix.to_rows(),
            average_fidelity: matrix.average_fidelity(),
        }),
        OutputFormat::Text => {
            print_matrix(&matrix);
            Ok(())
        }
    }
}

fn labels(matrix: &CalibrationMatrix) -> Vec<String> {
    (0..matrix.dim())
        .map(|state| state_label(state, matrix.num_qubits()))
        .collect()
}

fn print_matrix(matrix: &CalibrationMatrix) {
    let labels = labels(matrix);
    let width = matrix.num_qubits().max(6);

    println!(
        "\n{} Calibration matrix (rows observed, columns prepared):",
        style("✓").green().bold()
    );
    print!("  {:>width$} ", "");
    for label in &labels {
        print!(" {}", style(format!("{label:>width$}")).cyan());
    }
    println!();

    for (observed, row) in matrix.to_rows().iter().enumerate() {
        print!("  {} ", style(format!("{:>width$}", labels[observed])).cyan());
        for (prepared, p) in row.iter().enumerate() {
            let cell = format!("{p:>width$.4}");
            if observed == prepared {
                print!(" {}", style(cell).green());
            } else {
                print!(" {cell}");
            }
        }
        println!();
    }

    println!(
        "\n  Average readout fidelity: {}",
        style(format!("{:.2}%", matrix.average_fidelity() * 100.0)).yellow()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(qubits: usize) -> CalibrateArgs {
        CalibrateArgs {
            qubits,
            shots: Some(100),
            readout_error: Some(0.05),
            seed: Some(3),
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_labels_are_ordered_by_state() {
        assert_eq!(labels(&CalibrationMatrix::identity(2).unwrap()), ["00", "01", "10", "11"]);
    }

    #[tokio::test]
    async fn test_execute_two_qubits() {
        execute(&Config::default(), &args(2)).await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_rejects_too_many_qubits() {
        assert!(execute(&Config::default(), &args(40)).await.is_err());
    }
}
