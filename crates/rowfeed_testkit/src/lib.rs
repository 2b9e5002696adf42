//! # RowFeed Testkit
//!
//! Test utilities for RowFeed.
//!
//! This crate provides:
//! - Watched directories on disk and in memory
//! - Property-based test generators using proptest
//! - A writer-side harness for cross-crate integration tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rowfeed_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_directory() {
//!     let dir = WatchedDir::new();
//!     let mut engine = dir.engine(user_format());
//!     dir.append_open(user_line(0).as_bytes());
//!     // ... poll and validate
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
