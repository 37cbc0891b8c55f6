//! Configuration commands: print defaults and validate files.

use super::CliError;
use lgp::{Configuration, ConfigurationLoader, JsonConfigurationLoader, OperationSet};
use std::path::PathBuf;

/// Print the default configuration as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub(crate) fn print_default() -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&Configuration::default())?;
    println!("{json}");
    Ok(())
}

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a check fails.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn validate(path: PathBuf) -> Result<(), CliError> {
    println!("Validating: {}", path.display());
    println!();

    let loaded = JsonConfigurationLoader::new(&path).load();
    print_check("JSON parses", loaded.is_ok());
    let config = loaded?;

    let valid = config.validate();
    print_check("Parameters consistent", valid.is_ok());
    valid?;

    let operations = OperationSet::from_names(&config.operations);
    print_check("Operations known", operations.is_ok());
    let operations = operations?;

    println!();
    println!("Summary:");
    println!(
        "  Registers:     {} features + {} calculation",
        config.num_features, config.num_calculation_registers
    );
    println!("  Outputs:       {:?}", config.output_register_indices());
    println!(
        "  Operations:    {}",
        operations.operations().iter().map(|op| op.symbol()).collect::<Vec<_>>().join(" ")
    );
    println!("  Population:    {} x {} generations", config.population_size, config.generations);
    println!("  Runs:          {} (seed {})", config.number_of_runs, config.seed);
    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
