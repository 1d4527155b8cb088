//! Run command implementation.

use anyhow::Result;
use console::style;
use serde::Serialize;

use qec_codes::{CodeKind, CodeOptions, Experiment, ExperimentReport, Fault, FaultKind, LogicalState};
use qec_hal::Backend;
use qec_ir::QubitId;
use qec_mitigation::MitigationSession;

use super::common::{OutputFormat, create_backend, print_counts, print_json, print_mitigated, spinner};
use crate::config::Config;

/// Logical error rate up to which a run is reported as corrected.
pub const CORRECTED_TOLERANCE: f64 = 0.02;

/// Arguments of `qec run`.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub code: CodeKind,
    pub shots: Option<u32>,
    pub readout_error: Option<f64>,
    pub seed: Option<u64>,
    pub logical: LogicalState,
    /// The code's default fault kind when `None`.
    pub fault: Option<FaultKind>,
    pub target: u32,
    /// The code's default when `None`.
    pub mitigate: Option<bool>,
    pub show_circuit: bool,
    pub format: OutputFormat,
}

impl RunArgs {
    fn experiment(&self, shots: u32) -> Experiment {
        let kind = self.fault.unwrap_or(self.code.default_fault().kind);
        let options = CodeOptions::new(self.logical, Fault::new(kind, QubitId(self.target)));

        let experiment = Experiment::new(self.code)
            .with_options(options)
            .with_shots(shots);
        match self.mitigate {
            Some(mitigate) => experiment.with_mitigation(mitigate),
            None => experiment,
        }
    }
}

#[derive(Serialize)]
struct RunOutput<'a> {
    #[serde(flatten)]
    report: &'a ExperimentReport,
    expected: &'static str,
    decoded: Option<&'a str>,
    success_probability: f64,
    logical_error_rate: f64,
    corrected: bool,
}

/// Execute the run command.
pub async fn execute(config: &Config, args: &RunArgs) -> Result<()> {
    let config = config.with_overrides(args.shots, args.readout_error, args.seed)?;
    let experiment = args.experiment(config.execution.shots);

    let backend = create_backend(&config)?;
    let mut session = MitigationSession::new(&backend)
        .with_shots(config.mitigation.calibration_shots)
        .with_method(config.solve_method()?)
        .with_cache(config.mitigation.cache_calibration);

    let text = args.format == OutputFormat::Text;
    if text {
        println!(
            "{} Running {} on {} ({} shots)",
            style("→").cyan().bold(),
            style(args.code).green(),
            style(backend.name()).yellow(),
            experiment.shots()
        );
        println!(
            "  Logical {}, fault: {}, mitigation: {}",
            experiment.options().logical,
            experiment.options().fault,
            if experiment.mitigation_enabled() { "on" } else { "off" }
        );
    }

    let spinner = spinner(args.format, "Executing circuit...");
    let report = experiment.run(&backend, Some(&mut session)).await;
    spinner.finish_and_clear();
    let report = report?;

    let expected = report.expected_outcome();
    let success = report.success_probability(expected);
    let error_rate = report.logical_error_rate(expected);
    let corrected = report.is_corrected(CORRECTED_TOLERANCE);
    let decoded = report.decoded_outcome();

    if !text {
        return print_json(&RunOutput {
            report: &report,
            expected,
            decoded,
            success_probability: success,
            logical_error_rate: error_rate,
            corrected,
        });
    }

    if args.show_circuit {
        println!("\n{}", report.circuit);
    }

    print_counts(&format!("Results ({} shots)", report.shots), &report.raw);
    if let Some(ref mitigated) = report.mitigated {
        print_mitigated("Mitigated results", mitigated);
    }
    if let Some(ref reason) = report.mitigation_fallback {
        println!(
            "\n  {} Mitigation skipped: {}",
            style("!").yellow().bold(),
            reason
        );
    }

    let verdict = if corrected {
        style("corrected").green().bold()
    } else {
        style("not corrected").red().bold()
    };
    println!(
        "\n  Expected {}, decoded {}: success {}, logical error rate {:.2}% ({verdict})",
        style(expected).cyan(),
        style(decoded.unwrap_or("-")).cyan(),
        style(format!("{:.2}%", success * 100.0)).yellow(),
        error_rate * 100.0,
    );

    Ok(())
}
