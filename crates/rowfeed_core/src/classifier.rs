//! Partitioning of a directory snapshot into open and closed files.

use crate::error::{CoreError, CoreResult};
use crate::format::FormatSpec;
use rowfeed_storage::DirEntry;
use serde::Serialize;

/// Role of a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// The in-progress file; may still grow.
    Open,
    /// A finalized file; immutable once visible.
    Closed,
}

/// A classified snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    /// The in-progress file, if any.
    pub open: Option<DirEntry>,
    /// Finalized files, sorted by name.
    pub closed: Vec<DirEntry>,
    /// Entries carrying neither suffix.
    pub ignored: usize,
}

impl FileSet {
    /// Classifies a directory listing.
    ///
    /// When a name carries both suffixes the longer one wins: with suffixes
    /// `.csv.part` (open) and `.part` (closed), `rows.csv.part` is open.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AmbiguousOpenFile`] if more than one open file
    /// is present.
    pub fn classify(entries: Vec<DirEntry>, format: &FormatSpec) -> CoreResult<Self> {
        let mut set = Self::default();
        let mut opens = Vec::new();

        for entry in entries {
            match kind_of(&entry.name, format) {
                Some(FileKind::Open) => opens.push(entry),
                Some(FileKind::Closed) => set.closed.push(entry),
                None => set.ignored += 1,
            }
        }

        opens.sort();
        let mut opens = opens.into_iter();
        set.open = opens.next();
        if let (Some(first), Some(second)) = (&set.open, opens.next()) {
            return Err(CoreError::AmbiguousOpenFile {
                first: first.name.clone(),
                second: second.name,
            });
        }

        set.closed.sort();
        Ok(set)
    }
}

/// Returns the role of `name` under `format`, or `None` if it is not watched.
#[must_use]
pub fn kind_of(name: &str, format: &FormatSpec) -> Option<FileKind> {
    let open = format.open_suffix();
    let closed = format.closed_suffix();
    let candidates = if open.len() >= closed.len() {
        [(open, FileKind::Open), (closed, FileKind::Closed)]
    } else {
        [(closed, FileKind::Closed), (open, FileKind::Open)]
    };

    candidates
        .into_iter()
        .find(|(suffix, _)| name.len() > suffix.len() && name.ends_with(suffix))
        .map(|(_, kind)| kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(open: &str, closed: &str) -> FormatSpec {
        FormatSpec::builder()
            .fields("A")
            .delimiter(",")
            .row_key("A")
            .open_suffix(open)
            .closed_suffix(closed)
            .build()
            .unwrap()
    }

    #[test]
    fn partitions_open_and_closed() {
        let format = format(".tmp", ".csv");
        let set = FileSet::classify(
            vec![
                DirEntry::new("b.csv", 3),
                DirEntry::new("current.tmp", 7),
                DirEntry::new("a.csv", 1),
                DirEntry::new("notes.txt", 9),
            ],
            &format,
        )
        .unwrap();

        assert_eq!(set.open, Some(DirEntry::new("current.tmp", 7)));
        assert_eq!(
            set.closed,
            vec![DirEntry::new("a.csv", 1), DirEntry::new("b.csv", 3)]
        );
        assert_eq!(set.ignored, 1);
    }

    #[test]
    fn empty_directory() {
        let set = FileSet::classify(Vec::new(), &format(".tmp", ".csv")).unwrap();
        assert!(set.open.is_none());
        assert!(set.closed.is_empty());
    }

    #[test]
    fn two_open_files_are_ambiguous() {
        let result = FileSet::classify(
            vec![DirEntry::new("x.tmp", 1), DirEntry::new("a.tmp", 1)],
            &format(".tmp", ".csv"),
        );
        match result {
            Err(CoreError::AmbiguousOpenFile { first, second }) => {
                assert_eq!(first, "a.tmp");
                assert_eq!(second, "x.tmp");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn longer_suffix_wins() {
        let format = format(".csv.part", ".part");
        assert_eq!(kind_of("rows.csv.part", &format), Some(FileKind::Open));
        assert_eq!(kind_of("rows.part", &format), Some(FileKind::Closed));
        assert_eq!(kind_of("rows.csv", &format), None);
    }

    #[test]
    fn bare_suffix_is_not_a_file() {
        let format = format(".tmp", ".csv");
        assert_eq!(kind_of(".csv", &format), None);
    }
}
