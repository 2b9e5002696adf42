//! RowFeed CLI
//!
//! Command-line tools for watching row files in a directory.
//!
//! # Commands
//!
//! - `inspect` - Classify a directory and summarize the rows it holds
//! - `tail` - Poll a directory and print rows as they appear
//! - `validate` - Check expected field values against the rows in a directory
//! - `add` - Write one row as a new file

mod commands;

use clap::{Args, Parser, Subcommand};
use rowfeed_core::{
    EngineConfig, FormatSpec, ParseErrorPolicy, Row, StartPosition, DEFAULT_CLOSED_SUFFIX,
    DEFAULT_LINE_TERMINATOR, DEFAULT_OPEN_SUFFIX,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// RowFeed command-line tools.
#[derive(Parser)]
#[command(name = "rowfeed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    layout: LayoutArgs,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the rows live and what they look like.
#[derive(Args)]
struct LayoutArgs {
    /// Directory to read rows from
    #[arg(global = true, short, long)]
    dir: Option<PathBuf>,

    /// Directory new rows are written to (defaults to --dir)
    #[arg(global = true, long)]
    write_dir: Option<PathBuf>,

    /// Field definitions, e.g. "Id,Name" or "Id(4),Name(10)"
    #[arg(global = true, long)]
    fields: Option<String>,

    /// Field delimiter for delimited files
    #[arg(global = true, long)]
    delimiter: Option<String>,

    /// Name of the row-key field
    #[arg(global = true, short, long)]
    key: Option<String>,

    /// Suffix of the file still being written
    #[arg(global = true, long, default_value = DEFAULT_OPEN_SUFFIX)]
    open_suffix: String,

    /// Suffix of finished files
    #[arg(global = true, long, default_value = DEFAULT_CLOSED_SUFFIX)]
    closed_suffix: String,

    /// Line terminator
    #[arg(global = true, long, default_value = DEFAULT_LINE_TERMINATOR)]
    line_terminator: String,
}

impl LayoutArgs {
    fn format(&self) -> Result<FormatSpec, Box<dyn std::error::Error>> {
        let fields = self.fields.as_deref().ok_or("--fields is required")?;
        let key = self.key.as_deref().ok_or("--key is required")?;

        let mut builder = FormatSpec::builder()
            .fields(fields)
            .row_key(key)
            .open_suffix(&self.open_suffix)
            .closed_suffix(&self.closed_suffix)
            .line_terminator(&self.line_terminator);
        if let Some(delimiter) = &self.delimiter {
            builder = builder.delimiter(delimiter);
        }
        Ok(builder.build()?)
    }

    fn engine_config(&self, start: StartPosition) -> Result<EngineConfig, Box<dyn std::error::Error>> {
        let dir = self.dir.clone().ok_or("--dir is required")?;
        let mut config = EngineConfig::new(dir, self.format()?).start(start);
        if let Some(write_dir) = &self.write_dir {
            config = config.write_dir(write_dir);
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a directory and summarize the rows it holds
    Inspect {
        /// List every indexed key
        #[arg(long)]
        keys: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Poll a directory and print rows as they appear
    Tail {
        /// Also print rows already present
        #[arg(long)]
        from_start: bool,

        /// Milliseconds between polls
        #[arg(short, long, default_value = "1000")]
        interval_ms: u64,

        /// Stop after this many polls
        #[arg(short = 'n', long)]
        polls: Option<u64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check expected field values against the rows in a directory
    Validate {
        /// Expected value as NAME=VALUE; must include the row key
        #[arg(short, long = "expect", value_parser = parse_pair, required = true)]
        expect: Vec<(String, String)>,

        /// Fail on the first unparsable line
        #[arg(long)]
        strict: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Write one row as a new file
    Add {
        /// Field value as NAME=VALUE; omitted fields are written empty
        #[arg(short, long = "set", value_parser = parse_pair, required = true)]
        set: Vec<(String, String)>,
    },

    /// Show version information
    Version,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { keys, format } => {
            let config = cli.layout.engine_config(StartPosition::Beginning)?;
            commands::inspect::run(config, keys, &format)?;
        }
        Commands::Tail {
            from_start,
            interval_ms,
            polls,
            format,
        } => {
            let start = if from_start {
                StartPosition::Beginning
            } else {
                StartPosition::Now
            };
            let config = cli.layout.engine_config(start)?;
            commands::tail::run(config, interval_ms, polls, &format)?;
        }
        Commands::Validate {
            expect,
            strict,
            format,
        } => {
            let mut config = cli.layout.engine_config(StartPosition::Beginning)?;
            if strict {
                config = config.parse_errors(ParseErrorPolicy::Fail);
            }
            commands::validate::run(config, expect.into_iter().collect(), &format)?;
        }
        Commands::Add { set } => {
            let config = cli.layout.engine_config(StartPosition::Now)?;
            let row: Row = set.into_iter().collect();
            commands::add::run(config, &row)?;
        }
        Commands::Version => {
            println!("RowFeed CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("RowFeed Core v{}", rowfeed_core::VERSION);
        }
    }

    Ok(())
}
