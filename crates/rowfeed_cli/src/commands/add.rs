//! Add command implementation.

use rowfeed_core::{Engine, EngineConfig, Row};

/// Runs the add command.
pub fn run(config: EngineConfig, row: &Row) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::open_local(config)?;
    let path = engine.add(row)?;
    engine.close()?;

    println!("✓ Row written");
    println!("  Path: {}", path.display());
    Ok(())
}
