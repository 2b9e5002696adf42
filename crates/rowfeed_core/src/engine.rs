//! The RowFeed engine.
//!
//! An [`Engine`] owns one directory source, a change feed over the read
//! directory and the row index built from it. It is driven entirely by its
//! caller: nothing happens between calls.

use crate::change_feed::{ChangeFeed, ChangeUnit, UnitReason};
use crate::classifier::FileSet;
use crate::config::{EmptyPollPolicy, EngineConfig, ParseErrorPolicy, StartPosition};
use crate::error::{CoreError, CoreResult};
use crate::index::RowIndex;
use crate::parser::{parse_unit, LineError};
use crate::row::Row;
use crate::stats::FeedStats;
use crate::validator::{self, ValidationOutcome, ValidationQuery};
use crate::writer;
use rowfeed_storage::{
    DirectorySource, LocalDirectory, RemoteConfig, RemoteConnector, StorageError,
};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A row added to the index by a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestedRow {
    /// File the row was read from.
    pub file: String,
    /// The parsed row.
    pub row: Row,
}

/// What one poll observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    /// Units read, in feed order.
    pub units: Vec<ChangeUnit>,
    /// Total bytes read.
    pub bytes_read: u64,
    /// Rows added to the index, in feed order.
    pub rows: Vec<IngestedRow>,
    /// Lines the parser rejected.
    pub errors: Vec<LineError>,
}

impl PollReport {
    /// Returns true if the poll read no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes_read == 0
    }
}

/// Watches a directory for rows and answers questions about them.
///
/// # Lifecycle
///
/// - [`Engine::open`] lists the read directory once; with
///   [`StartPosition::Now`] everything already there is skipped
/// - [`Engine::poll`] and [`Engine::validate`] feed new bytes into the index
/// - [`Engine::add`] writes one row into a new file in the write directory
/// - [`Engine::close`] (or drop) releases the directory session
///
/// Calls are expected to be serial; the engine takes `&mut self` and does
/// no locking of its own.
///
/// # Example
///
/// ```rust
/// use rowfeed_core::{Engine, EngineConfig, FormatSpec, ValidationQuery};
/// use rowfeed_storage::InMemoryDirectory;
/// use std::sync::Arc;
///
/// let format = FormatSpec::builder()
///     .fields("UserId,Name")
///     .delimiter(",")
///     .row_key("UserId")
///     .build()?;
/// let dir = Arc::new(InMemoryDirectory::with_dirs(["/out"]));
/// let mut engine = Engine::open(EngineConfig::new("/out", format), Box::new(Arc::clone(&dir)))?;
///
/// dir.append("/out/current.tmp", b"u1,alice\n");
/// let outcome = engine.validate(&ValidationQuery::new().field("UserId", "u1").field("Name", "alice"))?;
/// assert!(outcome.is_success());
/// # Ok::<(), rowfeed_core::CoreError>(())
/// ```
pub struct Engine {
    config: EngineConfig,
    source: Box<dyn DirectorySource>,
    feed: ChangeFeed,
    index: RowIndex,
    stats: FeedStats,
    is_open: bool,
}

impl Engine {
    /// Opens an engine over `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The read or write directory cannot be listed (`Transport`)
    /// - The open file cannot be read while catching up (`Transport`)
    /// - The read directory holds more than one open file
    pub fn open(config: EngineConfig, source: Box<dyn DirectorySource>) -> CoreResult<Self> {
        let entries = source.list(&config.read_dir)?;
        if config.write_dir != config.read_dir {
            source.list(&config.write_dir)?;
        }
        let files = FileSet::classify(entries, &config.format)?;

        let mut feed = ChangeFeed::new(config.rollover_check);
        if config.start == StartPosition::Now {
            feed.catch_up(source.as_ref(), &config.read_dir, &files)?;
        }

        info!(
            source = %source.describe(),
            read_dir = %config.read_dir.display(),
            write_dir = %config.write_dir.display(),
            start = ?config.start,
            "engine opened"
        );

        Ok(Self {
            index: RowIndex::new(config.format.row_key()),
            config,
            source,
            feed,
            stats: FeedStats::new(),
            is_open: true,
        })
    }

    /// Opens an engine over the local file system.
    ///
    /// # Errors
    ///
    /// See [`Engine::open`].
    pub fn open_local(config: EngineConfig) -> CoreResult<Self> {
        Self::open(config, Box::new(LocalDirectory::new()))
    }

    /// Opens a remote session with `connector` and an engine over it.
    ///
    /// The session is held until the engine is closed.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `remote` is incomplete, a transport
    /// error if the session cannot be established, or any error of
    /// [`Engine::open`].
    pub fn open_remote(
        config: EngineConfig,
        remote: &RemoteConfig,
        connector: &dyn RemoteConnector,
    ) -> CoreResult<Self> {
        let source: Arc<dyn DirectorySource> = rowfeed_storage::connect(connector, remote)
            .map_err(|e| match e {
                StorageError::InvalidConfig(message) => CoreError::configuration(message),
                other => CoreError::Transport(other),
            })?
            .into();
        info!(address = %remote.address(), user = %remote.username, "remote session opened");

        let shutdown = Arc::clone(&source);
        Self::open(config, Box::new(source)).inspect_err(|_| {
            if let Err(e) = shutdown.close() {
                warn!(error = %e, "failed to close remote session");
            }
        })
    }

    /// Reads whatever became visible since the previous poll into the index.
    ///
    /// # Errors
    ///
    /// Returns transport, rollover and ambiguity errors from the feed, or a
    /// parse error under [`ParseErrorPolicy::Fail`]. In the latter case the
    /// rows that did parse have already been ingested.
    pub fn poll(&mut self) -> CoreResult<PollReport> {
        self.ensure_open()?;

        let entries = self.source.list(&self.config.read_dir)?;
        let files = FileSet::classify(entries, &self.config.format)?;
        let units = self
            .feed
            .poll(self.source.as_ref(), &self.config.read_dir, &files)?;

        let mut report = PollReport::default();
        for unit in &units {
            report.bytes_read += unit.len();
            if matches!(unit.reason, UnitReason::Rollover { .. }) {
                self.stats.rollovers += 1;
            }

            let parsed = parse_unit(unit, &self.config.format);
            for row in parsed.rows {
                match self.index.insert(row.clone()) {
                    Ok(replaced) => {
                        if replaced.is_some() {
                            self.stats.rows_replaced += 1;
                        }
                        report.rows.push(IngestedRow {
                            file: unit.file.clone(),
                            row,
                        });
                    }
                    Err(row) => debug!(?row, "row without key skipped"),
                }
            }
            for error in &parsed.errors {
                warn!(
                    file = %error.file,
                    offset = error.offset,
                    line = %error.line,
                    "{}",
                    error.message
                );
            }
            report.errors.extend(parsed.errors);
        }
        report.units = units;

        self.stats.polls += 1;
        if report.is_empty() {
            self.stats.empty_polls += 1;
        }
        self.stats.units += report.units.len() as u64;
        self.stats.bytes_read += report.bytes_read;
        self.stats.rows_ingested += report.rows.len() as u64;
        self.stats.parse_errors += report.errors.len() as u64;

        debug!(
            units = report.units.len(),
            bytes = report.bytes_read,
            rows = report.rows.len(),
            errors = report.errors.len(),
            indexed = self.index.len(),
            "poll complete"
        );

        if self.config.parse_errors == ParseErrorPolicy::Fail {
            if let Some(error) = report.errors.first() {
                return Err(CoreError::Parse {
                    file: error.file.clone(),
                    offset: error.offset,
                    message: error.message.clone(),
                });
            }
        }
        Ok(report)
    }

    /// Polls, then checks `query` against the whole accumulated index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] before polling if the query does
    /// not fit the format, [`CoreError::NoNewData`] under
    /// [`EmptyPollPolicy::Fail`], or any error of [`Engine::poll`].
    pub fn validate(&mut self, query: &ValidationQuery) -> CoreResult<ValidationOutcome> {
        self.ensure_open()?;
        validator::query_key(query, &self.config.format)?;

        let report = self.poll()?;
        if report.is_empty() && self.config.empty_poll == EmptyPollPolicy::Fail {
            return Err(CoreError::NoNewData);
        }

        let outcome = validator::validate(&self.index, &self.config.format, query)?;
        self.stats.validations += 1;
        match &outcome {
            ValidationOutcome::Success => debug!("validation succeeded"),
            ValidationOutcome::NoMatchingKey { key } => info!(%key, "no row with key"),
            ValidationOutcome::FieldMismatch { mismatches } => {
                info!(count = mismatches.len(), "validation found mismatching fields");
            }
        }
        Ok(outcome)
    }

    /// Writes `fields` as a single row in a new file in the write directory.
    ///
    /// The index is not touched; the row becomes visible to validation only
    /// if the write directory is also the read directory and a later poll
    /// picks it up.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidQuery`] for undeclared fields, or a
    /// transport error if the file cannot be created.
    pub fn add(&mut self, fields: &Row) -> CoreResult<PathBuf> {
        self.ensure_open()?;
        let path = writer::write_row(
            self.source.as_ref(),
            &self.config.write_dir,
            &self.config.format,
            fields,
        )?;
        self.stats.rows_written += 1;
        Ok(path)
    }

    /// Returns the accumulated index.
    #[must_use]
    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    /// Returns the change feed cursor.
    #[must_use]
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Returns the statistics so far.
    #[must_use]
    pub fn stats(&self) -> FeedStats {
        self.stats
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns true until [`Engine::close`] is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Releases the directory session. Later calls fail with
    /// [`CoreError::Closed`]; closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the session did not shut down cleanly.
    pub fn close(&mut self) -> CoreResult<()> {
        if !self.is_open {
            return Ok(());
        }
        self.is_open = false;
        self.source.close()?;
        info!(
            polls = self.stats.polls,
            rows = self.index.len(),
            "engine closed"
        );
        Ok(())
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open {
            Ok(())
        } else {
            Err(CoreError::Closed)
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("source", &self.source.describe())
            .field("read_dir", &self.config.read_dir)
            .field("write_dir", &self.config.write_dir)
            .field("indexed", &self.index.len())
            .field("is_open", &self.is_open)
            .finish_non_exhaustive()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close directory session");
        }
    }
}
