//! QEC Command-Line Interface
//!
//! Builds the bit-flip, phase-flip and Shor code circuits, runs them on the
//! local simulator and reports raw and readout-corrected counts.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::common::OutputFormat;
use commands::{calibrate, codes, run};
use config::{Config, LoggingConfig};

use qec_codes::{CodeKind, FaultKind, LogicalState};

/// QEC - quantum error-correction experiments with readout mitigation
#[derive(Parser)]
#[command(name = "qec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "QEC_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and run an error-correcting code
    Run {
        /// Code to run (bit-flip, phase-flip, shor)
        code: CodeKind,

        /// Number of shots
        #[arg(short, long)]
        shots: Option<u32>,

        /// Logical state to encode (0 or 1)
        #[arg(short, long, default_value = "0")]
        logical: LogicalState,

        /// Fault to inject (none, bit, phase, both); the code's default when omitted
        #[arg(short, long)]
        fault: Option<FaultKind>,

        /// Qubit the fault is injected on
        #[arg(short, long, default_value = "0")]
        target: u32,

        /// Force readout-error mitigation on
        #[arg(long, conflicts_with = "no_mitigate")]
        mitigate: bool,

        /// Force readout-error mitigation off
        #[arg(long)]
        no_mitigate: bool,

        /// Simulated per-bit readout flip probability
        #[arg(long)]
        readout_error: Option<f64>,

        /// Simulator seed
        #[arg(long)]
        seed: Option<u64>,

        /// Print the circuit listing
        #[arg(long)]
        show_circuit: bool,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Measure a readout calibration matrix
    Calibrate {
        /// Number of measured qubits to calibrate
        #[arg(short, long, default_value = "1")]
        qubits: usize,

        /// Shots per calibration circuit
        #[arg(short, long)]
        shots: Option<u32>,

        /// Simulated per-bit readout flip probability
        #[arg(long)]
        readout_error: Option<f64>,

        /// Simulator seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the available codes
    Codes,
}

fn init_logging(verbose: u8, logging: &LoggingConfig) {
    let filter = match verbose {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    init_logging(cli.verbose, &config.logging);
    tracing::debug!(?config, "configuration loaded");

    // Execute command
    let result = match cli.command {
        Commands::Run {
            code,
            shots,
            logical,
            fault,
            target,
            mitigate,
            no_mitigate,
            readout_error,
            seed,
            show_circuit,
            format,
        } => {
            let mitigate = match (mitigate, no_mitigate) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => config.mitigation.enabled,
            };
            let args = run::RunArgs {
                code,
                shots,
                readout_error,
                seed,
                logical,
                fault,
                target,
                mitigate,
                show_circuit,
                format,
            };
            run::execute(&config, &args).await
        }

        Commands::Calibrate {
            qubits,
            shots,
            readout_error,
            seed,
            format,
        } => {
            let args = calibrate::CalibrateArgs {
                qubits,
                shots,
                readout_error,
                seed,
                format,
            };
            calibrate::execute(&config, &args).await
        }

        Commands::Codes => {
            codes::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_options() {
        let cli = Cli::try_parse_from([
            "qec", "-vv", "run", "shor", "--shots", "500", "--fault", "phase", "--target", "4",
            "--no-mitigate", "--format", "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run {
                code,
                shots,
                fault,
                target,
                mitigate,
                no_mitigate,
                format,
                ..
            } => {
                assert_eq!(code, CodeKind::Shor);
                assert_eq!(shots, Some(500));
                assert_eq!(fault, Some(FaultKind::PhaseFlip));
                assert_eq!(target, 4);
                assert!(!mitigate && no_mitigate);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["qec", "run", "bit-flip"]).unwrap();
        match cli.command {
            Commands::Run {
                logical,
                fault,
                shots,
                format,
                ..
            } => {
                assert_eq!(logical, LogicalState::Zero);
                assert_eq!(fault, None);
                assert_eq!(shots, None);
                assert_eq!(format, OutputFormat::Text);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_code() {
        assert!(Cli::try_parse_from(["qec", "run", "steane"]).is_err());
    }

    #[test]
    fn test_parse_rejects_conflicting_mitigation_flags() {
        assert!(Cli::try_parse_from(["qec", "run", "shor", "--mitigate", "--no-mitigate"]).is_err());
    }

    #[test]
    fn test_parse_calibrate() {
        let cli = Cli::try_parse_from(["qec", "calibrate", "--qubits", "2", "--config", "qec.yaml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("qec.yaml")));
        assert!(matches!(cli.command, Commands::Calibrate { qubits: 2, .. }));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
