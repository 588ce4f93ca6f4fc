//! note-history: command-line access to note revision histories.
//!
//! Histories live in a directory (default `~/.note-history`) holding
//! `config.json` and one JSON document per note under `notes/`.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use note_history::render::{diff_html, diff_markers};
use note_history::{AutoSaver, HistoryEvent, RevisionKind, SaveOutcome, VersionEngine};
use note_history_cli::config;
use note_history_cli::JsonFileStore;

#[derive(Parser, Debug)]
#[command(name = "note-history")]
#[command(about = "Revision history for notes")]
struct Args {
    /// Path to the history directory
    #[arg(short, long, env = "NOTE_HISTORY_DIR", default_value = "~/.note-history")]
    dir: String,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record the contents of a file as the newest revision of a note
    Save {
        note: String,
        file: PathBuf,
        #[arg(long)]
        author: Option<String>,
    },
    /// Feed stdin through autosave: each line is an edit, end of input is a blur
    Record { note: String },
    /// List the revisions of a note, oldest first
    Log { note: String },
    /// Print the full content of one revision
    Show { note: String, version: String },
    /// Show the changes between two revisions
    Diff {
        note: String,
        from: String,
        to: String,
        /// Render as an HTML fragment
        #[arg(long)]
        html: bool,
    },
    /// Size of the change recorded by one revision
    Stats { note: String, version: String },
    /// Print every revision with its content as JSON
    Export { note: String },
    /// List every note with history, logging total disk usage
    Notes,
    /// Delete histories not modified within the retention window
    Prune {
        /// Days to keep (defaults to retentionDays from config.json)
        #[arg(long)]
        days: Option<u64>,
    },
    /// Delete the whole history of a note
    Delete { note: String },
    /// Merge a remote copy into a local one, keeping local text the remote deleted
    Merge {
        local: PathBuf,
        remote: PathBuf,
        /// Save the merged result as a new revision of this note
        #[arg(long)]
        into: Option<String>,
    },
}

async fn read_file(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))
}

fn kind_label(kind: RevisionKind) -> &'static str {
    match kind {
        RevisionKind::Snapshot => "snapshot",
        RevisionKind::Delta => "delta",
        RevisionKind::Missing => "missing",
    }
}

async fn record(engine: VersionEngine<JsonFileStore>, note: String) -> Result<()> {
    let autosave = engine.config().autosave.clone();
    if !autosave.enabled {
        warn!("Autosave is disabled in config.json, only the final content will be recorded");
    }

    let engine = engine.into_shared();
    let _subscription = engine.lock().await.events().subscribe(|event| match event {
        HistoryEvent::VersionSaved { version_id, additions, deletions, .. } => {
            println!("{}\t+{} -{}", version_id, additions, deletions);
        }
        HistoryEvent::AutoSaveFailed { note_id, message } => {
            eprintln!("Autosave failed for {}: {}", note_id, message);
        }
        _ => {}
    });

    let saver = AutoSaver::new(Arc::clone(&engine), &autosave);
    saver.update_note_id(note).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut buffer = String::new();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&line);
        saver.content_changed(buffer.clone());
    }

    saver.blur(&buffer).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "debug,note_history=debug"
    } else {
        "info,note_history=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let dir = config::history_dir(&args.dir);
    let history_config = config::load(&dir)?;
    info!("History directory: {:?}", dir);

    let mut engine = VersionEngine::with_config(JsonFileStore::new(&dir), history_config);

    match args.command {
        Command::Save { note, file, author } => {
            let content = read_file(&file).await?;
            match engine.save_version(&note, &content, author.as_deref()).await? {
                SaveOutcome::Saved(meta) => println!("Saved {}", meta.id),
                SaveOutcome::Skipped => println!("No significant change, nothing saved"),
            }
        }
        Command::Record { note } => record(engine, note).await?,
        Command::Log { note } => {
            for meta in engine.get_versions(&note).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    meta.id,
                    meta.timestamp,
                    kind_label(meta.kind),
                    meta.author.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Show { note, version } => {
            match engine.get_version_content(&note, &version).await? {
                Some(content) => print!("{}", content),
                None => bail!("Version {} not found in the history of {}", version, note),
            }
        }
        Command::Diff { note, from, to, html } => {
            let Some(script) = engine.compare_versions(&note, &from, &to).await? else {
                bail!("Versions {} and {} are not both in the history of {}", from, to, note);
            };
            if html {
                println!("{}", diff_html(&script));
            } else {
                println!("{}", diff_markers(&script));
            }
        }
        Command::Stats { note, version } => match engine.diff_stats(&note, &version).await? {
            Some(stats) => println!(
                "+{} -{} ({} change(s))",
                stats.additions, stats.deletions, stats.changes
            ),
            None => bail!("Version {} not found in the history of {}", version, note),
        },
        Command::Export { note } => {
            let versions = engine.get_all_versions(&note).await?;
            println!("{}", serde_json::to_string_pretty(&versions)?);
        }
        Command::Notes => {
            for summary in engine.note_summaries().await {
                println!(
                    "{}\t{}\t{}",
                    summary.note_id, summary.revision_count, summary.last_modified
                );
            }
            let usage = engine.store().storage_info().await?;
            info!("{} history file(s), {} bytes", usage.documents, usage.bytes);
        }
        Command::Prune { days } => {
            let days = days.unwrap_or(engine.config().retention_days);
            engine.cleanup_old_data(days).await?;
        }
        Command::Delete { note } => {
            engine.delete_note_versions(&note).await?;
            println!("Deleted history for {}", note);
        }
        Command::Merge { local, remote, into } => {
            let local_content = read_file(&local).await?;
            let remote_content = read_file(&remote).await?;
            let label = into.clone().unwrap_or_else(|| local.display().to_string());
            let merged = engine.sync_collaborative(&label, &local_content, &remote_content);

            if let Some(note) = into {
                if let SaveOutcome::Saved(meta) = engine.save_version(&note, &merged, None).await? {
                    info!("Saved merged content of {} as {}", note, meta.id);
                }
            }
            print!("{}", merged);
        }
    }

    Ok(())
}
