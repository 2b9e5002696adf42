//! # RowFeed Core
//!
//! Change feed, row index and validation engine for RowFeed.
//!
//! This crate provides:
//! - Classification of directory listings into open and closed files
//! - A change feed that turns growth, rollover and new files into byte ranges
//! - Fixed-width and delimited row parsing
//! - A last-write-wins row index keyed by one field
//! - Field-by-field validation against the index
//! - A writer that drops single-row files into a directory
//!
//! Everything runs on the caller's thread; the [`Engine`] only does work
//! when polled.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_feed;
mod classifier;
mod config;
mod engine;
mod error;
mod format;
mod index;
mod parser;
mod row;
mod stats;
mod validator;
mod writer;

pub use change_feed::{ChangeFeed, ChangeUnit, TrackedFile, UnitReason};
pub use classifier::{kind_of, FileKind, FileSet};
pub use config::{EmptyPollPolicy, EngineConfig, ParseErrorPolicy, RolloverCheck, StartPosition};
pub use engine::{Engine, IngestedRow, PollReport};
pub use error::{CoreError, CoreResult};
pub use format::{
    FieldSpec, FormatSpec, FormatSpecBuilder, Layout, DEFAULT_CLOSED_SUFFIX,
    DEFAULT_LINE_TERMINATOR, DEFAULT_OPEN_SUFFIX,
};
pub use index::RowIndex;
pub use parser::{parse_line, parse_unit, split_lines, LineError, ParsedUnit};
pub use row::Row;
pub use stats::FeedStats;
pub use validator::{
    query_key, validate, FieldMismatch, ValidationFailure, ValidationOutcome, ValidationQuery,
};
pub use writer::{format_row, new_file_name, write_row};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
