//! Error types shared by every stage of the analysis pipeline.
//!
//! All fallible operations in this crate report one of four error kinds:
//!
//! - [`SithError::File`]: input files that cannot be used at all (missing
//!   path, empty file, directory without matching files, read failures)
//! - [`SithError::Format`]: malformed file contents (missing sections,
//!   non-numeric tokens, count mismatches, invalid atom indices)
//! - [`SithError::Consistency`]: geometries that parsed correctly but do not
//!   fit together (mismatched atom counts, dimensions, or DOF sets)
//! - [`SithError::Sequencing`]: pipeline operations called out of order
//!
//! The distinction matters to callers: a `Format` error points at a broken
//! input file, a `Consistency` error at an incompatible set of files, and a
//! `Sequencing` error at a programming mistake in the calling code.

use thiserror::Error;

/// Error type covering the whole extraction and analysis pipeline.
#[derive(Error, Debug)]
pub enum SithError {
    /// Input file or directory cannot be used (missing, empty, unreadable)
    #[error("file error: {0}")]
    File(String),
    /// File contents do not match the expected checkpoint format
    #[error("format error: {0}")]
    Format(String),
    /// Parsed geometries are mutually inconsistent
    #[error("consistency error: {0}")]
    Consistency(String),
    /// Pipeline operation called before its prerequisites
    #[error("sequencing error: {0}")]
    Sequencing(String),
}

/// Type alias for pipeline operation results
pub type Result<T> = std::result::Result<T, SithError>;
