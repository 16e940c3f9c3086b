//! History provider backed by the `git` command-line tool.
//!
//! Each query is one fresh `git` process; stdout is parsed into the domain
//! records in `models`. The parsers are pure functions over the captured
//! output so they can be tested without a git binary.
//!
//! Commands issued:
//! - `git rev-parse --show-toplevel <branch>` for the repository root
//! - `git log --format=%H --name-only --follow` for the change log
//! - `git blame --line-porcelain --follow` for per-line attribution
//! - `git show --quiet` for the commit message

use std::path::PathBuf;
use std::process::Command;

use crate::error::{AppError, Result};
use crate::models::{AttributedLine, RevisionEntry};
use crate::provider::HistoryProvider;

pub struct GitCliProvider {
    /// Directory the git processes run in. Queries are issued relative to
    /// this directory, normally the process working directory.
    work_dir: PathBuf,
}

impl GitCliProvider {
    pub fn new() -> Self {
        Self::in_dir(".")
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: dir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let rendered = format!("git {}", args.join(" "));
        tracing::debug!(command = %rendered, "invoking history provider");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .output()
            .map_err(|e| AppError::Provider {
                command: rendered.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(AppError::Provider {
                command: rendered,
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for GitCliProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryProvider for GitCliProvider {
    fn resolve_repo_root(&self, branch: &str) -> Result<PathBuf> {
        let output = self
            .run(&["rev-parse", "--show-toplevel", branch])
            .map_err(|e| AppError::NotInRepository(e.to_string()))?;

        match output.lines().next() {
            Some(root) if !root.is_empty() => Ok(PathBuf::from(root)),
            _ => Err(AppError::MalformedOutput(
                "rev-parse returned no repository root".to_string(),
            )),
        }
    }

    fn change_log(&self, branch: &str, path: &str) -> Result<Vec<RevisionEntry>> {
        let output = self.run(&[
            "log",
            "--format=%H",
            "--name-only",
            "--follow",
            branch,
            "--",
            path,
        ])?;
        parse_change_log(&output)
    }

    fn line_attribution(&self, revision: &str, path: &str) -> Result<Vec<AttributedLine>> {
        let output = self.run(&["blame", "--line-porcelain", "--follow", revision, "--", path])?;
        parse_line_porcelain(&output)
    }

    fn revision_message(&self, revision: &str) -> Result<String> {
        self.run(&["show", "--quiet", revision])
    }
}

/// Parse `git log --format=%H --name-only` output into identifier/path
/// pairs, newest first.
///
/// The raw output alternates identifier lines and path lines, separated by
/// blanks. An odd number of non-blank lines means the output cannot be
/// paired and is rejected rather than silently truncated.
pub(crate) fn parse_change_log(output: &str) -> Result<Vec<RevisionEntry>> {
    let fields: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();

    if fields.len() % 2 != 0 {
        return Err(AppError::MalformedOutput(format!(
            "change log has {} non-blank lines, expected identifier/path pairs",
            fields.len()
        )));
    }

    Ok(fields
        .chunks(2)
        .map(|pair| RevisionEntry {
            id: pair[0].to_string(),
            path: pair[1].to_string(),
        })
        .collect())
}

/// Parse `git blame --line-porcelain` output into structured records.
///
/// Each source line is announced by a header `<id> <orig-line> <final-line>
/// [<span>]`, followed by metadata lines and finally the tab-prefixed line
/// content. Only the identifier, the final line number, the author and the
/// boundary marker are kept.
pub(crate) fn parse_line_porcelain(output: &str) -> Result<Vec<AttributedLine>> {
    let mut lines = Vec::new();
    let mut current: Option<(String, u32)> = None;
    let mut author = String::new();
    let mut boundary = false;

    for raw in output.lines() {
        if let Some(text) = raw.strip_prefix('\t') {
            let (revision, line_no) = current.take().ok_or_else(|| {
                AppError::MalformedOutput("content line without attribution header".to_string())
            })?;
            lines.push(AttributedLine {
                revision,
                author: std::mem::take(&mut author),
                line_no,
                content: text.to_string(),
                boundary,
            });
            boundary = false;
        } else if current.is_none() {
            let mut fields = raw.split_whitespace();
            let id = fields.next();
            let _orig_line = fields.next();
            let line_no = fields.next().and_then(|n| n.parse().ok());
            match (id, line_no) {
                (Some(id), Some(line_no)) => current = Some((id.to_string(), line_no)),
                _ => {
                    return Err(AppError::MalformedOutput(format!(
                        "unrecognized attribution header: {raw}"
                    )));
                }
            }
        } else if let Some(name) = raw.strip_prefix("author ") {
            author = name.to_string();
        } else if raw == "boundary" {
            boundary = true;
        }
        // committer, summary, filename and the rest are not needed here
    }

    if current.is_some() {
        return Err(AppError::MalformedOutput(
            "truncated attribution record".to_string(),
        ));
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_log_pairs_identifiers_with_paths() {
        let output = "\
bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\n\
\n\
new.txt\n\
\n\
aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n\
\n\
old.txt\n";
        let log = parse_change_log(output).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id, "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        assert_eq!(log[0].path, "new.txt");
        assert_eq!(log[1].path, "old.txt");
    }

    #[test]
    fn change_log_of_empty_output_is_empty() {
        assert!(parse_change_log("").unwrap().is_empty());
        assert!(parse_change_log("\n\n").unwrap().is_empty());
    }

    #[test]
    fn change_log_rejects_unpairable_output() {
        let output = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n";
        assert!(matches!(
            parse_change_log(output),
            Err(AppError::MalformedOutput(_))
        ));
    }

    #[test]
    fn porcelain_parse_extracts_line_records() {
        let output = "\
aaaaaaaa11111111aaaaaaaa11111111aaaaaaaa 1 1 1\n\
author Alice\n\
author-mail <alice@example.com>\n\
author-time 1700000000\n\
author-tz +0000\n\
summary first commit\n\
filename file.txt\n\
\tfn main() {}\n\
bbbbbbbb22222222bbbbbbbb22222222bbbbbbbb 2 2 1\n\
author Bob\n\
summary second commit\n\
filename file.txt\n\
\t// changed\n";
        let lines = parse_line_porcelain(output).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].abbrev(), "aaaaaaaa");
        assert_eq!(lines[0].author, "Alice");
        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[0].content, "fn main() {}");
        assert!(!lines[0].boundary);
        assert_eq!(lines[1].abbrev(), "bbbbbbbb");
        assert_eq!(lines[1].content, "// changed");
    }

    #[test]
    fn porcelain_parse_flags_boundary_lines() {
        let output = "\
aaaaaaaa11111111aaaaaaaa11111111aaaaaaaa 1 1 1\n\
author Alice\n\
boundary\n\
filename file.txt\n\
\toldest visible line\n";
        let lines = parse_line_porcelain(output).unwrap();
        assert!(lines[0].boundary);
        assert!(!lines[0].changed_in("aaaaaaaa"));
    }

    #[test]
    fn porcelain_parse_rejects_truncated_output() {
        let output = "aaaaaaaa11111111aaaaaaaa11111111aaaaaaaa 1 1 1\nauthor Alice\n";
        assert!(matches!(
            parse_line_porcelain(output),
            Err(AppError::MalformedOutput(_))
        ));
    }

    #[test]
    fn porcelain_parse_rejects_garbage() {
        assert!(parse_line_porcelain("not porcelain at all\n").is_err());
    }
}

#[cfg(test)]
mod repo_tests {
    //! End-to-end checks against a throwaway repository. Skipped when no
    //! git binary is on the PATH.

    use std::path::Path;
    use std::process::Command;

    use super::*;

    fn git(dir: &Path, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .expect("failed to spawn git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Repo with three commits: create `old.txt`, rename it to `new.txt`,
    /// then modify the second line.
    fn fixture_repo(dir: &Path) {
        git(dir, &["init", "-q"]);
        git(dir, &["config", "user.email", "test@test.com"]);
        git(dir, &["config", "user.name", "Test"]);
        git(dir, &["config", "commit.gpgsign", "false"]);

        std::fs::write(dir.join("old.txt"), "alpha\nbeta\n").unwrap();
        git(dir, &["add", "old.txt"]);
        git(dir, &["commit", "-q", "-m", "add old.txt"]);

        git(dir, &["mv", "old.txt", "new.txt"]);
        git(dir, &["commit", "-q", "-m", "rename to new.txt"]);

        std::fs::write(dir.join("new.txt"), "alpha\nbeta prime\n").unwrap();
        git(dir, &["add", "new.txt"]);
        git(dir, &["commit", "-q", "-m", "tweak beta"]);
    }

    #[test]
    fn change_log_follows_renames() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        fixture_repo(dir.path());

        let provider = GitCliProvider::in_dir(dir.path());
        let log = provider.change_log("HEAD", "new.txt").unwrap();

        assert_eq!(log.len(), 3);
        // Newest first: the tweak and the rename under the new name, the
        // original commit under the old one.
        assert_eq!(log[0].path, "new.txt");
        assert_eq!(log[1].path, "new.txt");
        assert_eq!(log[2].path, "old.txt");
    }

    #[test]
    fn attribution_tracks_last_touch_per_line() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        fixture_repo(dir.path());

        let provider = GitCliProvider::in_dir(dir.path());
        let log = provider.change_log("HEAD", "new.txt").unwrap();
        let newest = &log[0];
        let oldest = &log[2];

        let lines = provider.line_attribution(&newest.id, "new.txt").unwrap();
        assert_eq!(lines.len(), 2);
        // Line 1 is untouched since the first commit; line 2 was rewritten
        // by the newest one.
        assert_eq!(lines[0].revision, oldest.id);
        assert_eq!(lines[1].revision, newest.id);
        assert_eq!(lines[1].content, "beta prime");
        assert_eq!(lines[0].author, "Test");

        // Attribution at the pre-rename revision goes through the old path.
        let old_lines = provider.line_attribution(&oldest.id, "old.txt").unwrap();
        assert_eq!(old_lines.len(), 2);
        assert_eq!(old_lines[1].content, "beta");
    }

    #[test]
    fn revision_message_returns_commit_text() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        fixture_repo(dir.path());

        let provider = GitCliProvider::in_dir(dir.path());
        let log = provider.change_log("HEAD", "new.txt").unwrap();
        let message = provider.revision_message(&log[0].id).unwrap();
        assert!(message.contains("tweak beta"));
    }

    #[test]
    fn untracked_file_yields_empty_log() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        fixture_repo(dir.path());

        let provider = GitCliProvider::in_dir(dir.path());
        let log = provider.change_log("HEAD", "never-committed.txt").unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn missing_repository_is_reported() {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let provider = GitCliProvider::in_dir(dir.path());
        assert!(matches!(
            provider.resolve_repo_root("HEAD"),
            Err(AppError::NotInRepository(_))
        ));
    }
}
