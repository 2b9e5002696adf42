//! Change feed over a watched directory.
//!
//! The feed turns successive directory snapshots into an ordered list of
//! [`ChangeUnit`]s: the bytes that became visible since the previous poll.
//!
//! # Ordering
//!
//! Within one poll, units are emitted as:
//! 1. rollover continuations of open files that vanished earlier
//! 2. growth of the tracked open file
//! 3. newly discovered closed files, in name order
//! 4. a newly discovered open file
//!
//! Since every closed file is emitted on first sight, name order within a
//! poll is the same as first-observed order across polls.
//!
//! # Rollover
//!
//! When the tracked open file disappears it becomes *pending*. A pending
//! file of consumed size `N` is continued by the first new closed file of
//! size `M >= N`, from which only `[N, M)` is emitted. Smaller new closed
//! files are ordinary closed files. A pending file with no qualifying
//! candidate is retried on later polls without error.
//!
//! With [`RolloverCheck::VerifyPrefix`] the candidates are tried in name
//! order and the first whose leading `N` bytes hash to the consumed digest
//! wins; if none does the poll fails.
//!
//! A writer may finalize the open file and start a new one under the same
//! name before the next poll. Whenever a rollover candidate appears while
//! the tracked open name is still present, the open file's leading `N`
//! bytes are checked against the consumed digest; if they differ, the open
//! file is treated as new and the old cursor goes pending.
//!
//! # Atomicity
//!
//! A poll works on a copy of the cursor and commits it only after every
//! read succeeded, so a transport failure never skips or repeats bytes. An
//! open file renamed between the listing and the read is not an error; the
//! next poll sees it under its new name.

use crate::classifier::{FileKind, FileSet};
use crate::config::RolloverCheck;
use crate::error::{CoreError, CoreResult};
use rowfeed_storage::{DirEntry, DirectorySource, StorageError};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Why a unit was emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnitReason {
    /// The tracked open file grew in place.
    Growth,
    /// Tail of a closed file that finalized a vanished open file.
    Rollover {
        /// Name of the vanished open file.
        from: String,
    },
    /// A closed file seen for the first time.
    NewClosed,
    /// An open file seen for the first time.
    NewOpen,
}

/// Newly visible bytes of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeUnit {
    /// Name of the file the bytes were read from.
    pub file: String,
    /// Role of that file at read time.
    pub kind: FileKind,
    /// Offset of the first byte.
    pub start: u64,
    /// Offset one past the last byte.
    pub end: u64,
    /// Why the unit was emitted.
    pub reason: UnitReason,
    /// The bytes in `[start, end)`.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl ChangeUnit {
    /// Number of bytes in the unit.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns true if the unit holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Public view of a file the feed is tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedFile {
    /// File name.
    pub name: String,
    /// File role.
    pub kind: FileKind,
    /// Bytes consumed so far.
    pub consumed: u64,
}

#[derive(Clone)]
struct OpenCursor {
    name: String,
    consumed: u64,
    /// Digest of `[0, consumed)`; `None` when the prefix could not be read.
    digest: Option<Sha256>,
}

impl fmt::Debug for OpenCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenCursor")
            .field("name", &self.name)
            .field("consumed", &self.consumed)
            .field("verified", &self.digest.is_some())
            .finish()
    }
}

impl OpenCursor {
    fn tracked(&self) -> TrackedFile {
        TrackedFile {
            name: self.name.clone(),
            kind: FileKind::Open,
            consumed: self.consumed,
        }
    }
}

/// Read position over one watched directory.
///
/// # Invariants
///
/// - At most one open file is tracked between polls
/// - Consumed sizes never decrease for a tracked file
/// - A closed file is read at most once
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    open: Option<OpenCursor>,
    pending: Vec<OpenCursor>,
    closed: HashSet<String>,
    check: RolloverCheck,
}

impl ChangeFeed {
    /// Creates a feed that has seen nothing.
    #[must_use]
    pub fn new(check: RolloverCheck) -> Self {
        Self {
            open: None,
            pending: Vec::new(),
            closed: HashSet::new(),
            check,
        }
    }

    /// Marks everything in `files` as consumed without emitting it.
    ///
    /// Used at construction so the feed starts at "now". The open file's
    /// current content is hashed so that a later replacement under the same
    /// name can be told apart from growth.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the open file cannot be read.
    pub fn catch_up(
        &mut self,
        source: &dyn DirectorySource,
        dir: &Path,
        files: &FileSet,
    ) -> CoreResult<()> {
        for entry in &files.closed {
            self.closed.insert(entry.name.clone());
        }
        if let Some(entry) = &files.open {
            let digest = match source.read_at(&dir.join(&entry.name), 0, entry.size as usize) {
                Ok(prefix) => {
                    let mut digest = Sha256::new();
                    digest.update(&prefix);
                    Some(digest)
                }
                Err(StorageError::NotFound(_)) => {
                    debug!(file = %entry.name, "open file vanished during catch-up");
                    None
                }
                Err(e) => return Err(e.into()),
            };
            self.open = Some(OpenCursor {
                name: entry.name.clone(),
                consumed: entry.size,
                digest,
            });
        }
        debug!(
            closed = files.closed.len(),
            open = ?files.open.as_ref().map(|e| &e.name),
            "change feed caught up"
        );
        Ok(())
    }

    /// Computes and reads the units that became visible in `files`.
    ///
    /// `files` must be a classification of a fresh listing of `dir`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if a read fails, or
    /// [`CoreError::RolloverMismatch`] when prefix verification is enabled
    /// and a rollover candidate does not start with the consumed bytes. The
    /// cursor is unchanged on error.
    pub fn poll(
        &mut self,
        source: &dyn DirectorySource,
        dir: &Path,
        files: &FileSet,
    ) -> CoreResult<Vec<ChangeUnit>> {
        let mut next = self.clone();
        let mut units = Vec::new();
        let mut fresh: Vec<&DirEntry> = files
            .closed
            .iter()
            .filter(|entry| !next.closed.contains(&entry.name))
            .collect();

        // Decide whether the tracked open file is still the same file.
        let mut growth = None;
        if let Some(open) = next.open.take() {
            match &files.open {
                Some(entry) if entry.name == open.name && entry.size >= open.consumed => {
                    let contested = open.consumed > 0
                        && fresh.iter().any(|candidate| candidate.size >= open.consumed);
                    if contested && !still_holds_prefix(source, dir, &open)? {
                        info!(
                            file = %open.name,
                            consumed = open.consumed,
                            size = entry.size,
                            "open file was replaced under the same name"
                        );
                        next.pending.push(open);
                    } else {
                        if entry.size > open.consumed {
                            growth = Some(entry.size);
                        }
                        next.open = Some(open);
                    }
                }
                Some(entry) if entry.name == open.name => {
                    warn!(
                        file = %open.name,
                        consumed = open.consumed,
                        size = entry.size,
                        "open file shrank; treating it as a new file"
                    );
                    next.pending.push(open);
                }
                _ => {
                    debug!(file = %open.name, consumed = open.consumed, "open file vanished");
                    next.pending.push(open);
                }
            }
        }

        // Continue vanished open files from their finalized form.
        let mut unresolved = Vec::new();
        for cursor in std::mem::take(&mut next.pending) {
            let candidates: Vec<usize> = fresh
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.size >= cursor.consumed)
                .map(|(i, _)| i)
                .collect();
            let Some(&first) = candidates.first() else {
                unresolved.push(cursor);
                continue;
            };

            let chosen = match self.check {
                RolloverCheck::TrustSize => first,
                RolloverCheck::VerifyPrefix => {
                    let mut matched = None;
                    for &i in &candidates {
                        if prefix_matches(source, dir, &cursor, fresh[i])? {
                            matched = Some(i);
                            break;
                        }
                    }
                    matched.ok_or_else(|| CoreError::RolloverMismatch {
                        open: cursor.name.clone(),
                        closed: fresh[first].name.clone(),
                    })?
                }
            };
            let entry = fresh.remove(chosen);

            info!(
                open = %cursor.name,
                closed = %entry.name,
                consumed = cursor.consumed,
                size = entry.size,
                "rollover detected"
            );
            next.closed.insert(entry.name.clone());
            if let Some(unit) = read_unit(
                source,
                dir,
                entry,
                FileKind::Closed,
                cursor.consumed,
                UnitReason::Rollover {
                    from: cursor.name.clone(),
                },
            )? {
                units.push(unit);
            }
        }
        next.pending = unresolved;
        for cursor in &next.pending {
            debug!(file = %cursor.name, consumed = cursor.consumed, "rollover still pending");
        }

        if let (Some(size), Some(open)) = (growth, next.open.as_mut()) {
            let entry = DirEntry::new(open.name.clone(), size);
            let unit = read_open_unit(
                source,
                dir,
                &entry,
                open.consumed,
                UnitReason::Growth,
            )?;
            if let Some(Some(unit)) = unit {
                if let Some(digest) = open.digest.as_mut() {
                    digest.update(&unit.bytes);
                }
                open.consumed = unit.end;
                units.push(unit);
            }
        }

        for entry in fresh {
            next.closed.insert(entry.name.clone());
            if let Some(unit) =
                read_unit(source, dir, entry, FileKind::Closed, 0, UnitReason::NewClosed)?
            {
                units.push(unit);
            }
        }

        if next.open.is_none() {
            if let Some(entry) = &files.open {
                // Renamed since the listing: the next poll sees it as closed.
                let Some(unit) = read_open_unit(source, dir, entry, 0, UnitReason::NewOpen)? else {
                    *self = next;
                    return Ok(units);
                };
                let mut digest = Sha256::new();
                if let Some(unit) = &unit {
                    digest.update(&unit.bytes);
                }
                next.open = Some(OpenCursor {
                    name: entry.name.clone(),
                    consumed: entry.size,
                    digest: Some(digest),
                });
                units.extend(unit);
            }
        }

        *self = next;
        Ok(units)
    }

    /// Returns the tracked open file.
    #[must_use]
    pub fn open_file(&self) -> Option<TrackedFile> {
        self.open.as_ref().map(OpenCursor::tracked)
    }

    /// Returns vanished open files still awaiting their finalized form.
    #[must_use]
    pub fn pending(&self) -> Vec<TrackedFile> {
        self.pending.iter().map(OpenCursor::tracked).collect()
    }

    /// Returns true if the closed file `name` has been consumed.
    #[must_use]
    pub fn is_consumed(&self, name: &str) -> bool {
        self.closed.contains(name)
    }

    /// Number of closed files consumed.
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.closed.len()
    }
}

fn read_unit(
    source: &dyn DirectorySource,
    dir: &Path,
    entry: &DirEntry,
    kind: FileKind,
    start: u64,
    reason: UnitReason,
) -> CoreResult<Option<ChangeUnit>> {
    if entry.size <= start {
        return Ok(None);
    }
    let len = (entry.size - start) as usize;
    let bytes = source.read_at(&dir.join(&entry.name), start, len)?;
    Ok(Some(ChangeUnit {
        file: entry.name.clone(),
        kind,
        start,
        end: entry.size,
        reason,
        bytes,
    }))
}

/// Reads from the open file, returning `None` if it vanished after the
/// listing.
fn read_open_unit(
    source: &dyn DirectorySource,
    dir: &Path,
    entry: &DirEntry,
    start: u64,
    reason: UnitReason,
) -> CoreResult<Option<Option<ChangeUnit>>> {
    match read_unit(source, dir, entry, FileKind::Open, start, reason) {
        Ok(unit) => Ok(Some(unit)),
        Err(CoreError::Transport(StorageError::NotFound(_))) => {
            debug!(file = %entry.name, "open file vanished during poll");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn prefix_matches(
    source: &dyn DirectorySource,
    dir: &Path,
    cursor: &OpenCursor,
    candidate: &DirEntry,
) -> CoreResult<bool> {
    let Some(expected) = &cursor.digest else {
        debug!(
            file = %cursor.name,
            "prefix was never read; rollover cannot be verified"
        );
        return Ok(true);
    };

    let prefix = source.read_at(&dir.join(&candidate.name), 0, cursor.consumed as usize)?;
    Ok(Sha256::digest(&prefix) == expected.clone().finalize())
}

/// Returns true if the file still named like `cursor` starts with the bytes
/// the cursor consumed. A file that vanished since the listing counts as
/// unchanged; the next poll sees where it went.
fn still_holds_prefix(
    source: &dyn DirectorySource,
    dir: &Path,
    cursor: &OpenCursor,
) -> CoreResult<bool> {
    let Some(expected) = &cursor.digest else {
        return Ok(true);
    };
    match source.read_at(&dir.join(&cursor.name), 0, cursor.consumed as usize) {
        Ok(prefix) => Ok(Sha256::digest(&prefix) == expected.clone().finalize()),
        Err(StorageError::NotFound(_)) => Ok(true),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatSpec;
    use rowfeed_storage::{InMemoryDirectory, StorageError};

    const DIR: &str = "/out";

    fn format() -> FormatSpec {
        FormatSpec::builder()
            .fields("A")
            .delimiter(",")
            .row_key("A")
            .build()
            .unwrap()
    }

    fn snapshot(tree: &InMemoryDirectory) -> FileSet {
        FileSet::classify(tree.list(Path::new(DIR)).unwrap(), &format()).unwrap()
    }

    fn poll(feed: &mut ChangeFeed, tree: &InMemoryDirectory) -> Vec<ChangeUnit> {
        let files = snapshot(tree);
        feed.poll(tree, Path::new(DIR), &files).unwrap()
    }

    fn concat(units: &[ChangeUnit]) -> Vec<u8> {
        units.iter().flat_map(|u| u.bytes.clone()).collect()
    }

    fn started(tree: &InMemoryDirectory, check: RolloverCheck) -> ChangeFeed {
        let mut feed = ChangeFeed::new(check);
        feed.catch_up(tree, Path::new(DIR), &snapshot(tree)).unwrap();
        feed
    }

    #[test]
    fn catch_up_skips_existing_content() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        tree.put("/out/old.csv", b"1\n2\n");
        tree.put("/out/cur.tmp", b"3\n");

        let mut feed = started(&tree, RolloverCheck::TrustSize);
        assert!(poll(&mut feed, &tree).is_empty());
        assert_eq!(feed.open_file().unwrap().consumed, 2);
        assert!(feed.is_consumed("old.csv"));
    }

    #[test]
    fn growth_emits_only_new_bytes() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        tree.put("/out/cur.tmp", b"a\n");
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.append("/out/cur.tmp", b"b\nc\n");
        let units = poll(&mut feed, &tree);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].reason, UnitReason::Growth);
        assert_eq!((units[0].start, units[0].end), (2, 6));
        assert_eq!(units[0].bytes, b"b\nc\n");

        assert!(poll(&mut feed, &tree).is_empty());
    }

    #[test]
    fn new_open_file_is_emitted_in_full() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/cur.tmp", b"a\nb\n");
        let units = poll(&mut feed, &tree);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].reason, UnitReason::NewOpen);
        assert_eq!(units[0].bytes, b"a\nb\n");
        assert_eq!(feed.open_file().unwrap().consumed, 4);
    }

    #[test]
    fn rollover_emits_trailing_bytes_only() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/cur.tmp", b"a\nb\n");
        poll(&mut feed, &tree);

        tree.append("/out/cur.tmp", b"c\n");
        tree.rename("/out/cur.tmp", "/out/0001.csv");
        let units = poll(&mut feed, &tree);

        assert_eq!(units.len(), 1);
        assert_eq!(
            units[0].reason,
            UnitReason::Rollover {
                from: "cur.tmp".into()
            }
        );
        assert_eq!((units[0].start, units[0].end), (4, 6));
        assert_eq!(units[0].bytes, b"c\n");
        assert!(feed.open_file().is_none());
        assert!(feed.pending().is_empty());
    }

    #[test]
    fn rollover_precedes_other_closed_files_and_new_open_comes_last() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/cur.tmp", b"aaa\n");
        poll(&mut feed, &tree);

        tree.append("/out/cur.tmp", b"b\n");
        tree.rename("/out/cur.tmp", "/out/b.csv");
        tree.put("/out/a.csv", b"x\n");
        tree.put("/out/next.tmp", b"n\n");

        let units = poll(&mut feed, &tree);
        let order: Vec<_> = units.iter().map(|u| u.file.as_str()).collect();
        assert_eq!(order, vec!["b.csv", "a.csv", "next.tmp"]);
        assert_eq!(concat(&units), b"b\nx\nn\n");
        assert_eq!(feed.open_file().unwrap().name, "next.tmp");
    }

    #[test]
    fn small_candidate_is_an_ordinary_closed_file() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/cur.tmp", b"aaaa\n");
        poll(&mut feed, &tree);

        tree.remove("/out/cur.tmp");
        tree.put("/out/small.csv", b"b\n");
        let units = poll(&mut feed, &tree);

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].reason, UnitReason::NewClosed);
        assert_eq!(units[0].bytes, b"b\n");
        assert_eq!(feed.pending().len(), 1);
    }

    #[test]
    fn pending_rollover_is_resolved_later() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/cur.tmp", b"a\n");
        poll(&mut feed, &tree);

        let finished = {
            tree.append("/out/cur.tmp", b"b\n");
            tree.contents("/out/cur.tmp").unwrap()
        };
        tree.remove("/out/cur.tmp");
        assert!(poll(&mut feed, &tree).is_empty());
        assert_eq!(feed.pending()[0].name, "cur.tmp");

        tree.put("/out/0001.csv", &finished);
        let units = poll(&mut feed, &tree);
        assert_eq!(concat(&units), b"b\n");
        assert!(feed.pending().is_empty());
    }

    #[test]
    fn new_closed_files_are_emitted_whole_in_name_order() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/2.csv", b"second\n");
        tree.put("/out/1.csv", b"first\n");
        let units = poll(&mut feed, &tree);
        assert_eq!(concat(&units), b"first\nsecond\n");

        tree.put("/out/0.csv", b"late\n");
        let units = poll(&mut feed, &tree);
        assert_eq!(concat(&units), b"late\n");
        assert_eq!(feed.closed_count(), 3);
    }

    #[test]
    fn reused_open_name_after_shrink_is_a_new_file() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/cur.tmp", b"aaaa\nbbbb\n");
        poll(&mut feed, &tree);

        tree.rename("/out/cur.tmp", "/out/0001.csv");
        tree.put("/out/cur.tmp", b"c\n");
        let units = poll(&mut feed, &tree);

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].reason, UnitReason::NewOpen);
        assert_eq!(units[0].bytes, b"c\n");
        assert!(feed.pending().is_empty());
        assert!(feed.is_consumed("0001.csv"));
    }

    #[test]
    fn open_name_reused_before_poll_is_a_new_file() {
        for check in [RolloverCheck::TrustSize, RolloverCheck::VerifyPrefix] {
            let tree = InMemoryDirectory::with_dirs([DIR]);
            let mut feed = started(&tree, check);

            tree.put("/out/cur.tmp", b"a\nb\n");
            poll(&mut feed, &tree);

            tree.append("/out/cur.tmp", b"c\n");
            tree.rename("/out/cur.tmp", "/out/0001.csv");
            tree.put("/out/cur.tmp", b"d\ne\nf\n");

            let units = poll(&mut feed, &tree);
            let reasons: Vec<_> = units.iter().map(|u| u.reason.clone()).collect();
            assert_eq!(
                reasons,
                vec![
                    UnitReason::Rollover {
                        from: "cur.tmp".into()
                    },
                    UnitReason::NewOpen
                ]
            );
            assert_eq!(concat(&units), b"c\nd\ne\nf\n");
            assert_eq!(feed.open_file().unwrap().consumed, 6);
            assert!(feed.pending().is_empty());
        }
    }

    #[test]
    fn caught_up_open_name_reused_before_poll_is_a_new_file() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        tree.put("/out/cur.tmp", b"a\n");
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.append("/out/cur.tmp", b"b\n");
        tree.rename("/out/cur.tmp", "/out/0001.csv");
        tree.put("/out/cur.tmp", b"c\nd\n");

        let units = poll(&mut feed, &tree);
        assert_eq!(concat(&units), b"b\nc\nd\n");
        assert_eq!(units[1].reason, UnitReason::NewOpen);
    }

    #[test]
    fn growth_beside_unrelated_closed_file_stays_growth() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/cur.tmp", b"a\n");
        poll(&mut feed, &tree);

        tree.append("/out/cur.tmp", b"b\n");
        tree.put("/out/other.csv", b"x\ny\n");

        let units = poll(&mut feed, &tree);
        let reasons: Vec<_> = units.iter().map(|u| u.reason.clone()).collect();
        assert_eq!(reasons, vec![UnitReason::Growth, UnitReason::NewClosed]);
        assert_eq!(concat(&units), b"b\nx\ny\n");
        assert!(feed.pending().is_empty());
    }

    #[test]
    fn verified_rollover_accepts_matching_prefix() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::VerifyPrefix);

        tree.put("/out/cur.tmp", b"a\n");
        poll(&mut feed, &tree);
        tree.append("/out/cur.tmp", b"b\n");
        poll(&mut feed, &tree);

        tree.append("/out/cur.tmp", b"c\n");
        tree.rename("/out/cur.tmp", "/out/0001.csv");
        let units = poll(&mut feed, &tree);
        assert_eq!(concat(&units), b"c\n");
    }

    #[test]
    fn verified_rollover_rejects_divergent_prefix() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::VerifyPrefix);

        tree.put("/out/cur.tmp", b"a\nb\n");
        poll(&mut feed, &tree);

        tree.remove("/out/cur.tmp");
        tree.put("/out/0001.csv", b"x\ny\nz\n");
        let files = snapshot(&tree);
        let result = feed.poll(&tree, Path::new(DIR), &files);
        assert!(matches!(result, Err(CoreError::RolloverMismatch { .. })));

        // Cursor is untouched by the failed poll.
        assert_eq!(feed.open_file().unwrap().name, "cur.tmp");
        assert!(!feed.is_consumed("0001.csv"));
    }

    #[test]
    fn verified_rollover_skips_unrelated_candidate() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::VerifyPrefix);

        tree.put("/out/cur.tmp", b"a\n");
        poll(&mut feed, &tree);

        tree.append("/out/cur.tmp", b"b\n");
        tree.rename("/out/cur.tmp", "/out/b.csv");
        tree.put("/out/a.csv", b"zz\n");

        let units = poll(&mut feed, &tree);
        let order: Vec<_> = units.iter().map(|u| u.file.as_str()).collect();
        assert_eq!(order, vec!["b.csv", "a.csv"]);
        assert_eq!(concat(&units), b"b\nzz\n");
    }

    #[test]
    fn failed_read_leaves_cursor_unchanged() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/a.csv", b"a\n");
        tree.put("/out/b.csv", b"b\n");
        let stale = snapshot(&tree);
        tree.remove("/out/b.csv");

        let result = feed.poll(&tree, Path::new(DIR), &stale);
        assert!(matches!(
            result,
            Err(CoreError::Transport(StorageError::NotFound(_)))
        ));
        assert!(!feed.is_consumed("a.csv"));

        let units = poll(&mut feed, &tree);
        assert_eq!(concat(&units), b"a\n");
    }

    #[test]
    fn open_file_renamed_after_listing_is_picked_up_later() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/cur.tmp", b"a\n");
        let stale = snapshot(&tree);
        tree.rename("/out/cur.tmp", "/out/1.csv");

        assert!(feed.poll(&tree, Path::new(DIR), &stale).unwrap().is_empty());
        assert!(feed.open_file().is_none());

        let units = poll(&mut feed, &tree);
        assert_eq!(units[0].reason, UnitReason::NewClosed);
        assert_eq!(concat(&units), b"a\n");
    }

    #[test]
    fn growing_file_renamed_after_listing_rolls_over_later() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        tree.put("/out/cur.tmp", b"a\n");
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.append("/out/cur.tmp", b"b\n");
        let stale = snapshot(&tree);
        tree.rename("/out/cur.tmp", "/out/1.csv");

        assert!(feed.poll(&tree, Path::new(DIR), &stale).unwrap().is_empty());
        assert_eq!(feed.open_file().unwrap().consumed, 2);

        let units = poll(&mut feed, &tree);
        assert_eq!(
            units[0].reason,
            UnitReason::Rollover {
                from: "cur.tmp".into()
            }
        );
        assert_eq!(concat(&units), b"b\n");
    }

    #[test]
    fn empty_files_are_tracked_without_units() {
        let tree = InMemoryDirectory::with_dirs([DIR]);
        let mut feed = started(&tree, RolloverCheck::TrustSize);

        tree.put("/out/cur.tmp", b"");
        tree.put("/out/empty.csv", b"");
        assert!(poll(&mut feed, &tree).is_empty());
        assert_eq!(feed.open_file().unwrap().consumed, 0);
        assert!(feed.is_consumed("empty.csv"));

        tree.append("/out/cur.tmp", b"a\n");
        assert_eq!(concat(&poll(&mut feed, &tree)), b"a\n");
    }
}
