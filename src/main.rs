//! Demo for the typed fzf wrapper.
//!
//! Run the binary to pick files from a directory; the chosen paths are
//! printed to stdout, one per line.  Run with `--check-version` to see whether
//! the installed fzf matches the one this wrapper was written against.

mod demo;

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use fzf_but_typed::core::version;
use fzf_but_typed::{DuplicatePolicy, Selector, SelectorConfig};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), about = "Pick files through fzf, typed end to end")]
struct Cli {
    /// Directory to list (defaults to `.`).
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Allow choosing several entries.
    #[arg(long)]
    multi: bool,

    /// Maximum walk depth.
    #[arg(long, default_value_t = 3)]
    depth: usize,

    /// Include hidden (dot) files.
    #[arg(long)]
    hidden: bool,

    /// Tell entries apart by index instead of by their display line.
    #[arg(long = "index-lines")]
    index_lines: bool,

    /// Compare the installed fzf with the supported versions and exit.
    #[arg(long = "check-version")]
    check_version: bool,

    /// Write the current configuration to the config file and exit.
    #[arg(long = "write-config")]
    write_config: bool,
}

// ───────────────────────────────────────── main ─────────────

fn main() -> Result<()> {
    // Logs go to stderr so stdout only ever carries the selection.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SelectorConfig::load();

    if cli.write_config {
        let path = config.save().context("writing config")?;
        eprintln!("wrote {}", path.display());
        return Ok(());
    }
    if cli.check_version {
        return check_version(&config.binary);
    }

    // ── candidates ────────────────────────────────────────────
    let root = cli
        .path
        .canonicalize()
        .with_context(|| format!("can't open {}", cli.path.display()))?;
    let entries = demo::collect_entries(&root, cli.depth, cli.hidden);
    tracing::info!(root = %root.display(), count = entries.len(), "collected entries");

    // ── selection ─────────────────────────────────────────────
    let policy = if cli.index_lines {
        DuplicatePolicy::IndexPrefix
    } else {
        DuplicatePolicy::Reject
    };
    let options = config
        .options()
        .multi(cli.multi)
        .prompt(format!("{}> ", root.display()))
        .header("kind       size  modified          path")
        .no_sort(true);
    let selector = Selector::from_config(&config)
        .options(options)
        .duplicates(policy);

    let selection = selector
        .select(&entries, demo::FileEntry::display)
        .context("running the selector")?;

    if selection.is_empty() {
        tracing::info!("nothing selected");
    }
    for entry in selection.items {
        println!("{}", entry.path.display());
    }

    Ok(())
}

fn check_version(program: &str) -> Result<()> {
    let found = version::installed_version(program)
        .with_context(|| format!("asking `{program}` for its version"))?;
    let report = version::check(found);
    if !report.is_compatible() {
        tracing::warn!(%found, "fzf version mismatch");
        bail!("{report}");
    }
    eprintln!("fzf {found} is compatible");
    Ok(())
}
