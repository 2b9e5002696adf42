//! Inspect command implementation.

use rowfeed_core::{Engine, EngineConfig, FileSet};
use rowfeed_storage::{DirectorySource, LocalDirectory};
use serde::Serialize;

/// Directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Read directory.
    pub path: String,
    /// The file still being written, if any.
    pub open_file: Option<FileInfo>,
    /// Finished files, in name order.
    pub closed_files: Vec<FileInfo>,
    /// Entries carrying neither suffix.
    pub ignored: usize,
    /// Total bytes in open and closed files.
    pub total_size: u64,
    /// Distinct row keys.
    pub key_count: usize,
    /// Rows that replaced an earlier row with the same key.
    pub replaced_rows: u64,
    /// Lines that could not be parsed.
    pub parse_errors: usize,
    /// Every key, if requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

/// Name and size of one file.
#[derive(Debug, Serialize)]
pub struct FileInfo {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Runs the inspect command.
pub fn run(config: EngineConfig, show_keys: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let entries = LocalDirectory::new().list(&config.read_dir)?;
    let files = FileSet::classify(entries, &config.format)?;

    let path = config.read_dir.display().to_string();
    let mut engine = Engine::open_local(config)?;
    let report = engine.poll()?;
    let index = engine.index();

    let open_file = files.open.map(|entry| FileInfo {
        name: entry.name,
        size: entry.size,
    });
    let closed_files: Vec<FileInfo> = files
        .closed
        .into_iter()
        .map(|entry| FileInfo {
            name: entry.name,
            size: entry.size,
        })
        .collect();

    let result = InspectResult {
        path,
        total_size: open_file.iter().chain(&closed_files).map(|f| f.size).sum(),
        open_file,
        closed_files,
        ignored: files.ignored,
        key_count: index.len(),
        replaced_rows: index.replaced(),
        parse_errors: report.errors.len(),
        keys: show_keys.then(|| index.keys().into_iter().map(str::to_owned).collect()),
    };

    // Output
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    engine.close()?;
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("RowFeed Directory Inspection");
    println!("============================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Files:");
    match &result.open_file {
        Some(file) => println!("  Open:   {} ({} bytes)", file.name, file.size),
        None => println!("  Open:   (none)"),
    }
    println!("  Closed: {}", result.closed_files.len());
    for file in &result.closed_files {
        println!("    {} ({} bytes)", file.name, file.size);
    }
    println!("  Ignored entries: {}", result.ignored);
    println!("  Total size:      {} bytes", result.total_size);
    println!();
    println!("Rows:");
    println!("  Distinct keys: {}", result.key_count);
    println!("  Replaced:      {}", result.replaced_rows);
    println!("  Parse errors:  {}", result.parse_errors);

    if let Some(keys) = &result.keys {
        println!();
        println!("Keys:");
        for key in keys {
            println!("  {key}");
        }
    }
}
