//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - driven Kerr-oscillator project editor",
        style("qexplorer").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qexplorer-model  Entity tree, fields, formulas and dependencies");
    println!("  qexplorer-setup  Project collections, system assembly and compute");
    println!("  qexplorer-cli    Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
