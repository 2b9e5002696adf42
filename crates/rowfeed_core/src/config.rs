//! Engine configuration.

use crate::format::FormatSpec;
use std::path::PathBuf;

/// Where the feed starts when the engine is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartPosition {
    /// Files present at construction are skipped; only later bytes are fed.
    #[default]
    Now,
    /// Files present at construction are fed by the first poll.
    Beginning,
}

/// How a rollover continuation is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolloverCheck {
    /// A large enough finalized file is assumed to start with the consumed bytes.
    #[default]
    TrustSize,
    /// The finalized file's prefix is hashed and compared with the consumed bytes.
    VerifyPrefix,
}

/// What a validation does when its poll observed nothing new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyPollPolicy {
    /// Validate against the accumulated index anyway.
    #[default]
    Allow,
    /// Fail with [`crate::CoreError::NoNewData`].
    Fail,
}

/// What a poll does with lines that do not fit the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorPolicy {
    /// Record the line in the poll report and continue.
    #[default]
    Record,
    /// Ingest the rest of the poll, then fail with [`crate::CoreError::Parse`].
    Fail,
}

/// Configuration for opening an engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory watched for new rows.
    pub read_dir: PathBuf,

    /// Directory new rows are written to.
    pub write_dir: PathBuf,

    /// Row format and file naming.
    pub format: FormatSpec,

    /// Where the feed starts.
    pub start: StartPosition,

    /// How rollover continuations are trusted.
    pub rollover_check: RolloverCheck,

    /// Behavior of a validation whose poll saw no new bytes.
    pub empty_poll: EmptyPollPolicy,

    /// Behavior on lines that do not fit the format.
    pub parse_errors: ParseErrorPolicy,
}

impl EngineConfig {
    /// Creates a configuration reading and writing the same directory.
    pub fn new(dir: impl Into<PathBuf>, format: FormatSpec) -> Self {
        let dir = dir.into();
        Self {
            read_dir: dir.clone(),
            write_dir: dir,
            format,
            start: StartPosition::default(),
            rollover_check: RolloverCheck::default(),
            empty_poll: EmptyPollPolicy::default(),
            parse_errors: ParseErrorPolicy::default(),
        }
    }

    /// Sets the directory new rows are written to.
    #[must_use]
    pub fn write_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.write_dir = dir.into();
        self
    }

    /// Sets where the feed starts.
    #[must_use]
    pub const fn start(mut self, start: StartPosition) -> Self {
        self.start = start;
        self
    }

    /// Sets how rollover continuations are trusted.
    #[must_use]
    pub const fn rollover_check(mut self, check: RolloverCheck) -> Self {
        self.rollover_check = check;
        self
    }

    /// Sets the empty poll policy.
    #[must_use]
    pub const fn empty_poll(mut self, policy: EmptyPollPolicy) -> Self {
        self.empty_poll = policy;
        self
    }

    /// Sets the parse error policy.
    #[must_use]
    pub const fn parse_errors(mut self, policy: ParseErrorPolicy) -> Self {
        self.parse_errors = policy;
        self
    }
}
