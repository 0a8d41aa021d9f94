//! Demo candidates: typed filesystem entries.
//!
//! The binary walks a directory the same way `.gitignore`-aware tools do and
//! offers the entries to the selector, so the round trip is visible:
//! [`FileEntry`] values go in, [`FileEntry`] values come out.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ignore::WalkBuilder;

/// One walked entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Path relative to the walk root, `/`-separated.
    pub rel: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    /// Single display line: kind, size, mtime, relative path.
    pub fn display(&self) -> String {
        let kind = if self.is_dir { 'd' } else { '-' };
        let size = if self.is_dir {
            "-".to_string()
        } else {
            human_size(self.size)
        };
        let modified = self
            .modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or_else(|| "-".to_string(), |d| format_ts(d.as_secs()));
        // Newlines in file names would split the line.
        let rel = self.rel.replace('\n', "\u{240a}");
        format!("{kind} {size:>10}  {modified}  {rel}")
    }
}

/// Every entry under `root` up to `max_depth`, sorted by path.  The root
/// itself is not included.
pub fn collect_entries(root: &Path, max_depth: usize, show_hidden: bool) -> Vec<FileEntry> {
    let walker = WalkBuilder::new(root)
        .max_depth(Some(max_depth))
        .hidden(!show_hidden)
        .git_ignore(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut out = Vec::new();
    for entry in walker.flatten() {
        let path = entry.path();
        if path == root {
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let meta = entry.metadata().ok();
        out.push(FileEntry {
            path: path.to_path_buf(),
            rel,
            is_dir: entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false),
            size: meta.as_ref().map_or(0, |m| m.len()),
            modified: meta.and_then(|m| m.modified().ok()),
        });
    }
    out
}

/// Human-readable size string.
pub fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = bytes as f64;
    for &unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} PiB")
}

fn format_ts(unix_secs: u64) -> String {
    use chrono::{Local, TimeZone};
    let s = i64::try_from(unix_secs).unwrap_or(i64::MAX);
    match Local.timestamp_opt(s, 0).single() {
        Some(dt) => dt.format("%Y/%m/%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}
