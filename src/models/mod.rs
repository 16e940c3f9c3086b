//! Domain records shared between the provider and the revision model.
//!
//! - `revision`: RevisionEntry, one (identifier, path) pair of a file's history
//! - `attribution`: AttributedLine, structured per-line blame record
//! - `event`: ModelEvent, change notifications emitted by the model

pub mod attribution;
pub mod event;
pub mod revision;

pub use attribution::*;
pub use event::*;
pub use revision::*;
