//! Codes command implementation.

use console::style;

use qec_codes::{CodeKind, FaultKind};

/// Execute the codes command.
pub fn execute() {
    println!("{} Available codes:\n", style("QEC").cyan().bold());

    for code in CodeKind::all() {
        let corrects: Vec<&str> = code
            .correctable_faults()
            .iter()
            .filter(|&&kind| kind != FaultKind::None)
            .map(|kind| kind.name())
            .collect();

        println!("  {} {}", style("●").green(), style(code).bold());
        println!("    {}", code.description());
        println!("    Qubits: {}", code.num_qubits());
        println!("    Corrects: {}", corrects.join(", "));
        println!("    Default fault: {}", code.default_fault());
        println!(
            "    Mitigation: {}",
            if code.mitigated_by_default() { "on" } else { "off" }
        );
        println!();
    }
}
