//! blamescope - browse a file's line-by-line authorship history
//!
//! # Usage
//! ```bash
//! cd <repository>
//! blamescope src/lib.rs              # open at the most recent revision
//! blamescope src/lib.rs -b v1.2.0    # anchor history at a ref
//! ```
//!
//! The console prompt drives the revision model:
//! - `n` / `p`      step to the next / previous revision
//! - `g <index>`    go to a revision by index
//! - `j <id>`       jump to a revision by identifier prefix
//! - `l <line>`     activate a line: step behind its change, or jump to it
//! - `o <file>`     open another file
//! - `r`            list the revision history
//! - `show`         redraw the current view
//! - `json`         dump the current view as JSON
//! - `q`            quit

mod error;
mod model;
mod models;
mod provider;

use std::io::{BufRead, Write};
use std::sync::mpsc::Receiver;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use model::RevisionHistoryModel;
use models::ModelEvent;
use provider::GitCliProvider;

/// Browse a tracked file's revision history with per-line attribution
#[derive(Parser)]
#[command(name = "blamescope")]
#[command(about = "Interactive line-by-line authorship browser", long_about = None)]
struct Cli {
    /// File to browse; the working directory must be inside a repository
    /// tracking it
    #[arg(value_name = "FILE")]
    file: String,

    /// Branch or revision to anchor the history at
    #[arg(short, long, default_value = "HEAD")]
    branch: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (quiet by default, RUST_LOG=debug shows the
    // provider commands)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut model = match RevisionHistoryModel::new(GitCliProvider::new(), &cli.branch) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("✗ {e}");
            std::process::exit(1);
        }
    };
    let events = model.subscribe();

    if let Err(e) = model.load_file(&cli.file) {
        eprintln!("✗ Failed to load {}: {e}", cli.file);
        std::process::exit(1);
    }
    drain(&events);
    render(&model);

    repl(&mut model, &events)
}

/// Read-eval loop over stdin. Recoverable errors print and leave the
/// current view intact.
fn repl(model: &mut RevisionHistoryModel<GitCliProvider>, events: &Receiver<ModelEvent>) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    loop {
        print!("blamescope> ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            return Ok(()); // EOF
        }
        let mut words = input.split_whitespace();
        let (cmd, arg) = (words.next().unwrap_or(""), words.next());

        let result = match (cmd, arg) {
            ("", _) => Ok(()),
            ("q", _) | ("quit", _) => return Ok(()),
            ("n", _) => step(model, 1),
            ("p", _) => step(model, -1),
            ("g", Some(idx)) => match idx.parse() {
                Ok(idx) => model.select_revision(idx),
                Err(_) => {
                    eprintln!("✗ not an index: {idx}");
                    Ok(())
                }
            },
            ("j", Some(id)) => model.select_revision_by_id(id),
            ("l", Some(line)) => match line.parse() {
                Ok(line) => model.activate_line(line),
                Err(_) => {
                    eprintln!("✗ not a line number: {line}");
                    Ok(())
                }
            },
            ("o", Some(file)) => model.load_file(file),
            ("r", _) => {
                for (i, rev) in model.revisions().iter().enumerate() {
                    let marker = if Some(i) == model.selected_index() { '>' } else { ' ' };
                    println!("{marker} {i:>4} {} {}", rev.abbrev(), rev.path);
                }
                Ok(())
            }
            ("show", _) => {
                render(model);
                Ok(())
            }
            ("json", _) => {
                println!("{}", serde_json::to_string_pretty(&model.snapshot())?);
                Ok(())
            }
            _ => {
                println!(
                    "commands: n p g <index> j <id> l <line> o <file> r show json q"
                );
                Ok(())
            }
        };

        if let Err(e) = result {
            eprintln!("✗ {e}");
        }
        if drain(events) {
            render(model);
        }
    }
}

fn step(model: &mut RevisionHistoryModel<GitCliProvider>, delta: isize) -> error::Result<()> {
    let Some(index) = model.selected_index() else {
        return Ok(());
    };
    match index.checked_add_signed(delta) {
        Some(next) => model.select_revision(next),
        None => Ok(()),
    }
}

/// Consume pending notifications; true if anything arrived.
fn drain(events: &Receiver<ModelEvent>) -> bool {
    let mut seen = false;
    while events.try_recv().is_ok() {
        seen = true;
    }
    seen
}

fn render(model: &RevisionHistoryModel<GitCliProvider>) {
    let Some(file) = model.file() else {
        return;
    };
    let Some(index) = model.selected_index() else {
        println!("{file}: no revisions in history");
        return;
    };

    println!(
        "{file} — revision {}/{} [{}]",
        index + 1,
        model.revisions().len(),
        model.abbrev().unwrap_or("?"),
    );
    for line in model.description().trim_end().lines() {
        println!("  {line}");
    }
    println!();

    let abbrev = model.abbrev().unwrap_or("");
    for (i, line) in model.lines().iter().enumerate() {
        let marker = if line.changed_in(abbrev) { '*' } else { ' ' };
        println!("{i:>5} {marker} {}", line.rendered());
    }
    if let Some(first) = model.first_changed() {
        println!("\nfirst line changed in this revision: {first}");
    }
}
