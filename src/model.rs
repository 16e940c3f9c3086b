//! Revision navigation model.
//!
//! `RevisionHistoryModel` owns the tracked file, its oldest-first revision
//! list (with the path the file had at each revision, so renames are
//! traversed), the current selection and everything derived from it:
//! per-line attribution, the commit description and the index of the first
//! line the selected revision changed.
//!
//! All derived state for a selection is computed into a `RevisionView`
//! before anything is committed, so a failed provider query leaves the
//! model exactly as it was. Notifications go out only after a transition
//! has fully landed.

use std::path::Path;
use std::sync::mpsc;

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{AttributedLine, ModelEvent, RevisionEntry, abbrev_of};
use crate::provider::HistoryProvider;

pub struct RevisionHistoryModel<P> {
    provider: P,
    branch: String,
    /// `../` prefix converting working-directory-relative paths into
    /// repository-root-relative ones; empty when the working directory is
    /// the repository root. Attribution queries need root-relative paths to
    /// reach files that no longer exist under their recorded name.
    repo_root_offset: String,
    file: Option<String>,
    /// Oldest first; index 0 is the oldest revision the provider reports.
    revisions: Vec<RevisionEntry>,
    selected: Option<usize>,
    view: Option<RevisionView>,
    subscribers: Vec<mpsc::Sender<ModelEvent>>,
}

/// Derived state for one selected revision, replaced wholesale on every
/// selection change.
struct RevisionView {
    id: String,
    abbrev: String,
    lines: Vec<AttributedLine>,
    description: String,
    first_changed: Option<usize>,
}

/// Serializable snapshot of the current state, for scripting consumers.
#[derive(Serialize)]
pub struct Snapshot<'a> {
    pub file: Option<&'a str>,
    pub revision_count: usize,
    pub revision_index: Option<usize>,
    pub revision_id: Option<&'a str>,
    pub description: &'a str,
    pub first_changed: Option<usize>,
    pub lines: &'a [AttributedLine],
}

impl<P: HistoryProvider> RevisionHistoryModel<P> {
    /// Create a model rooted at the process working directory.
    pub fn new(provider: P, branch: impl Into<String>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::with_working_dir(provider, branch, &cwd)
    }

    pub fn with_working_dir(provider: P, branch: impl Into<String>, cwd: &Path) -> Result<Self> {
        let branch = branch.into();
        let root = provider.resolve_repo_root(&branch)?;
        let repo_root_offset = root_offset(&root, cwd);

        Ok(Self {
            provider,
            branch,
            repo_root_offset,
            file: None,
            revisions: Vec::new(),
            selected: None,
            view: None,
            subscribers: Vec::new(),
        })
    }

    /// Register for change notifications. Receivers that hang up are
    /// dropped on the next emit.
    pub fn subscribe(&mut self) -> mpsc::Receiver<ModelEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Start tracking `path` and select its most recent revision.
    ///
    /// A file with no history is a valid terminal state: the revision list
    /// comes back empty and nothing is selected. A provider failure leaves
    /// the previously loaded file untouched.
    pub fn load_file(&mut self, path: &str) -> Result<()> {
        let mut revisions = self.provider.change_log(&self.branch, path)?;
        // The provider reports newest first; index 0 becomes the oldest so
        // stepping forward through indices means stepping forward in time.
        revisions.reverse();

        let selected = revisions.len().checked_sub(1);
        let view = match selected {
            Some(idx) => Some(self.build_view(&revisions, idx)?),
            None => None,
        };

        self.file = Some(path.to_string());
        self.revisions = revisions;
        self.selected = selected;
        self.view = view;

        if self.selected.is_some() {
            self.emit(ModelEvent::RevisionChanged);
        }
        self.emit(ModelEvent::FileChanged);
        Ok(())
    }

    /// Select the revision at `index` and recompute all derived state.
    ///
    /// Selecting the already-selected index or an out-of-range one is a
    /// no-op: no queries, no notification. Range-control consumers are
    /// expected to clamp, but the model defends regardless.
    pub fn select_revision(&mut self, index: usize) -> Result<()> {
        if Some(index) == self.selected || index >= self.revisions.len() {
            return Ok(());
        }

        let view = self.build_view(&self.revisions, index)?;
        self.selected = Some(index);
        self.view = Some(view);
        self.emit(ModelEvent::RevisionChanged);
        Ok(())
    }

    /// Select the first revision whose identifier starts with `prefix`,
    /// scanning oldest to newest. An unknown prefix leaves the selection
    /// unchanged.
    pub fn select_revision_by_id(&mut self, prefix: &str) -> Result<()> {
        let index = self
            .revisions
            .iter()
            .position(|rev| rev.id.starts_with(prefix))
            .ok_or_else(|| AppError::RevisionNotFound(prefix.to_string()))?;
        self.select_revision(index)
    }

    /// Navigation gesture on a displayed line.
    ///
    /// A line last changed by the selected revision steps the selection
    /// back by one, showing the state just before that change; any other
    /// line jumps to the revision that wrote its current content. Invalid
    /// line indices are ignored.
    pub fn activate_line(&mut self, line_idx: usize) -> Result<()> {
        let Some(view) = self.view.as_ref() else {
            return Ok(());
        };
        let Some(line) = view.lines.get(line_idx) else {
            return Ok(());
        };
        let changed_here = line.changed_in(&view.abbrev);
        let prefix = line.abbrev().to_string();

        if changed_here {
            match self.selected {
                Some(index) if index > 0 => self.select_revision(index - 1),
                _ => Ok(()),
            }
        } else {
            self.select_revision_by_id(&prefix)
        }
    }

    // Read-only queries. All reflect the last completed transition.

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn revisions(&self) -> &[RevisionEntry] {
        &self.revisions
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn revision_id(&self) -> Option<&str> {
        self.view.as_ref().map(|v| v.id.as_str())
    }

    pub fn abbrev(&self) -> Option<&str> {
        self.view.as_ref().map(|v| v.abbrev.as_str())
    }

    pub fn lines(&self) -> &[AttributedLine] {
        self.view.as_ref().map(|v| v.lines.as_slice()).unwrap_or(&[])
    }

    pub fn first_changed(&self) -> Option<usize> {
        self.view.as_ref().and_then(|v| v.first_changed)
    }

    pub fn description(&self) -> &str {
        self.view.as_ref().map(|v| v.description.as_str()).unwrap_or("")
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            file: self.file(),
            revision_count: self.revisions.len(),
            revision_index: self.selected,
            revision_id: self.revision_id(),
            description: self.description(),
            first_changed: self.first_changed(),
            lines: self.lines(),
        }
    }

    /// Compute every piece of derived state for `index` without touching
    /// `self`. The single transition path for all selection changes.
    fn build_view(&self, revisions: &[RevisionEntry], index: usize) -> Result<RevisionView> {
        let entry = &revisions[index];
        let query_path = format!("{}{}", self.repo_root_offset, entry.path);

        let lines = self.provider.line_attribution(&entry.id, &query_path)?;
        let description = self.provider.revision_message(&entry.id)?;

        let abbrev = abbrev_of(&entry.id).to_string();
        // First line this revision changed, if any; a revision that only
        // deletes lines has none.
        let first_changed = lines.iter().position(|line| line.changed_in(&abbrev));

        Ok(RevisionView {
            id: entry.id.clone(),
            abbrev,
            lines,
            description,
            first_changed,
        })
    }

    fn emit(&mut self, event: ModelEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

/// `../` prefix that takes `cwd` back up to `root`. Empty unless `cwd` is
/// a strict subdirectory of `root`.
fn root_offset(root: &Path, cwd: &Path) -> String {
    match cwd.strip_prefix(root) {
        Ok(rel) => rel.components().map(|_| "../").collect(),
        Err(_) => String::new(),
    }
}
