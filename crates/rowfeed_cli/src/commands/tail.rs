//! Tail command implementation.

use rowfeed_core::{Engine, EngineConfig, IngestedRow};
use std::thread;
use std::time::Duration;
use tracing::info;

/// Runs the tail command.
///
/// Polls every `interval_ms` milliseconds and prints each parsed row, until
/// `polls` polls have run or forever if no limit is given.
pub fn run(
    config: EngineConfig,
    interval_ms: u64,
    polls: Option<u64>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::open_local(config)?;
    let interval = Duration::from_millis(interval_ms);

    let mut done = 0u64;
    while polls.is_none_or(|limit| done < limit) {
        if done > 0 {
            thread::sleep(interval);
        }
        let report = engine.poll()?;
        done += 1;

        for ingested in &report.rows {
            println!("{}", render(ingested, format));
        }
    }

    let stats = engine.stats();
    info!(
        polls = stats.polls,
        rows = stats.rows_ingested,
        rollovers = stats.rollovers,
        "tail finished"
    );
    engine.close()?;
    Ok(())
}

fn render(ingested: &IngestedRow, format: &str) -> String {
    let row = &ingested.row;
    match format {
        "json" => {
            let object: serde_json::Map<String, serde_json::Value> = row
                .iter()
                .map(|(name, value)| (name.to_string(), value.into()))
                .collect();
            serde_json::Value::Object(object).to_string()
        }
        _ => {
            let fields: Vec<String> = row
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            format!("{}: {}", ingested.file, fields.join(" "))
        }
    }
}
