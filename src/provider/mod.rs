//! History provider abstraction.
//!
//! The revision model never talks to a version-control tool directly; it
//! issues the four queries below against a `HistoryProvider`. The one real
//! implementation (`git::GitCliProvider`) shells out to the `git` binary,
//! and tests substitute an in-memory fake.
//!
//! All queries follow renames: history and attribution trace the file's
//! identity across name changes.

pub mod git;

use std::path::PathBuf;

use crate::error::Result;
use crate::models::{AttributedLine, RevisionEntry};

pub use git::GitCliProvider;

pub trait HistoryProvider {
    /// Absolute root of the repository containing the working directory,
    /// anchored at the given branch or revision name.
    fn resolve_repo_root(&self, branch: &str) -> Result<PathBuf>;

    /// Every revision that touched `path`, newest first, each paired with
    /// the name the file had at that revision.
    fn change_log(&self, branch: &str, path: &str) -> Result<Vec<RevisionEntry>>;

    /// Per-line attribution of the file as it existed at `revision`.
    /// `path` must be relative to the repository root so that revisions
    /// before a rename can still be reached.
    fn line_attribution(&self, revision: &str, path: &str) -> Result<Vec<AttributedLine>>;

    /// Commit message and metadata of a single revision, as free text.
    fn revision_message(&self, revision: &str) -> Result<String>;
}
