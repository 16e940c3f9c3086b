use serde::Serialize;

/// Length of the identifier prefix used for display and line matching.
pub const ABBREV_LEN: usize = 8;

/// One entry of a file's revision history.
///
/// The path is the name the file had at that revision; entries before a
/// rename carry the old name, so attribution queries issued against them
/// reach the file the provider actually knew about at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisionEntry {
    /// Full revision identifier.
    pub id: String,
    /// Path of the tracked file at this revision, relative to the repo root.
    pub path: String,
}

impl RevisionEntry {
    /// Abbreviated identifier for display and line matching.
    pub fn abbrev(&self) -> &str {
        abbrev_of(&self.id)
    }
}

/// First `ABBREV_LEN` bytes of an identifier (the whole identifier if it
/// is shorter, which only happens with malformed provider output).
pub fn abbrev_of(id: &str) -> &str {
    id.get(..ABBREV_LEN).unwrap_or(id)
}
