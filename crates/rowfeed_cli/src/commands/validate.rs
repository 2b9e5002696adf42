//! Validate command implementation.

use rowfeed_core::{Engine, EngineConfig, ValidationOutcome, ValidationQuery};

/// Runs the validate command.
///
/// Reads the whole directory, then checks `query`. Any outcome other than
/// success is returned as an error so the process exits non-zero.
pub fn run(
    config: EngineConfig,
    query: ValidationQuery,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::open_local(config)?;
    let outcome = engine.validate(&query)?;
    engine.close()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        _ => print_text_output(&outcome),
    }

    Ok(outcome.into_result()?)
}

fn print_text_output(outcome: &ValidationOutcome) {
    match outcome {
        ValidationOutcome::Success => println!("✓ All fields match"),
        ValidationOutcome::NoMatchingKey { key } => println!("✗ No row with key <{key}>"),
        ValidationOutcome::FieldMismatch { mismatches } => {
            println!("✗ {} field(s) differ", mismatches.len());
            for mismatch in mismatches {
                println!("  {mismatch}");
            }
        }
    }
}
