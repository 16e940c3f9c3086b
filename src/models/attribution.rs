//! Structured per-line attribution records.
//!
//! The provider's blame output is parsed into one `AttributedLine` per
//! source line instead of being matched by string prefix against rendered
//! text. Line provenance checks compare abbreviated identifiers on the
//! parsed record; rendering back to a display string is a separate step.

use serde::Serialize;

use crate::models::revision::{ABBREV_LEN, abbrev_of};

/// Attribution for a single line of the file at some revision.
#[derive(Debug, Clone, Serialize)]
pub struct AttributedLine {
    /// Full identifier of the revision that last modified this line.
    pub revision: String,
    /// Name of the author of that revision.
    pub author: String,
    /// Line number in the file at the queried revision (1-indexed).
    pub line_no: u32,
    /// The line's text, without trailing newline.
    pub content: String,
    /// True if the line predates the walked history (the provider could
    /// not see past this revision, e.g. a shallow boundary).
    pub boundary: bool,
}

impl AttributedLine {
    /// Abbreviated identifier of the revision that last touched this line.
    pub fn abbrev(&self) -> &str {
        abbrev_of(&self.revision)
    }

    /// Whether this line was last modified by the revision with the given
    /// abbreviated identifier. Boundary lines never match: their recorded
    /// revision is a visibility limit, not the change that wrote them.
    pub fn changed_in(&self, abbrev: &str) -> bool {
        !self.boundary && self.abbrev() == abbrev
    }

    /// Display form, beginning with the abbreviated revision identifier.
    pub fn rendered(&self) -> String {
        format!(
            "{:<width$} ({} {:>4}) {}",
            self.abbrev(),
            self.author,
            self.line_no,
            self.content,
            width = ABBREV_LEN,
        )
    }
}
