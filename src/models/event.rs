use serde::Serialize;

/// Change notifications emitted by the revision model.
///
/// Both events fire only after the model's state is fully consistent;
/// a subscriber reading model queries from an event handler always sees
/// a complete snapshot, never a half-applied transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelEvent {
    /// The tracked file and its whole revision list were replaced.
    FileChanged,
    /// The selected revision changed; attribution, description and the
    /// first-changed-line index were recomputed.
    RevisionChanged,
}
