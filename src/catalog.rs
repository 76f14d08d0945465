//! Cleanup-entry catalog.
//!
//! A thin declarative data source: each entry names a reclaimable
//! location (or a tool invocation) and whether it is safe to run without
//! confirmation. The builtin list covers the usual macOS suspects; a user
//! catalog file can add or override entries. Everything else about an
//! entry's meaning lives in the action id (see `actions`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use crate::actions;
use crate::config::CatalogConfig;
use crate::error::{SweepError, SweepResult};

/// One candidate cleanup target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupEntry {
    pub name: String,
    pub description: String,
    /// Action id, opaque to everything but the dispatcher
    pub action: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Safe entries run without per-entry confirmation
    #[serde(default)]
    pub safe: bool,
}

impl CleanupEntry {
    pub fn requires_admin(&self) -> bool {
        actions::requires_admin(&self.action)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    entry: Vec<CleanupEntry>,
}

/// Size and recency metadata for a catalog entry's path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub size_kb: Option<i64>,
    pub last_used: Option<i64>,
}

/// Expand a leading `~/` against the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Builtin macOS entries, home-relative paths expanded.
pub fn builtin_entries() -> Vec<CleanupEntry> {
    let e = |name: &str, description: &str, action: &str, path: Option<&str>, safe: bool| {
        CleanupEntry {
            name: name.to_string(),
            description: description.to_string(),
            action: action.to_string(),
            path: path.map(|p| expand_home(Path::new(p))),
            safe,
        }
    };

    vec![
        e(
            "User caches",
            "Per-application caches under ~/Library/Caches",
            "delete-path",
            Some("~/Library/Caches"),
            false,
        ),
        e(
            "User logs",
            "Application logs under ~/Library/Logs",
            "delete-path",
            Some("~/Library/Logs"),
            true,
        ),
        e(
            "Trash",
            "Files waiting in ~/.Trash",
            "delete-path",
            Some("~/.Trash"),
            false,
        ),
        e(
            "Xcode DerivedData",
            "Build products and indexes Xcode regenerates on demand",
            "delete-path",
            Some("~/Library/Developer/Xcode/DerivedData"),
            true,
        ),
        e(
            "Homebrew downloads",
            "Cached bottle and formula downloads",
            "delete-path",
            Some("~/Library/Caches/Homebrew"),
            true,
        ),
        e(
            "Quick Look cache",
            "Thumbnail cache rebuilt automatically",
            "run-tool:qlmanage -r cache",
            None,
            true,
        ),
        e(
            "System caches",
            "Shared caches under /Library/Caches (administrator)",
            "admin:delete-path",
            Some("/Library/Caches"),
            false,
        ),
        e(
            "System logs",
            "Shared logs under /Library/Logs (administrator)",
            "admin:delete-path",
            Some("/Library/Logs"),
            false,
        ),
        e(
            "DNS cache",
            "Flush the directory-services resolver cache (administrator)",
            "admin:run-tool:dscacheutil -flushcache",
            None,
            true,
        ),
    ]
}

/// Builtin entries merged with the user catalog, if one is configured.
/// User entries with a matching name replace builtins; new names append.
pub fn load_catalog(config: &CatalogConfig) -> SweepResult<Vec<CleanupEntry>> {
    let mut entries = builtin_entries();

    if let Some(extra) = &config.extra {
        let content = fs::read_to_string(extra)?;
        let file: CatalogFile =
            toml::from_str(&content).map_err(|e| SweepError::InvalidCatalog {
                path: extra.clone(),
                message: e.to_string(),
            })?;
        for mut user_entry in file.entry {
            user_entry.path = user_entry.path.map(|p| expand_home(&p));
            match entries.iter_mut().find(|e| e.name == user_entry.name) {
                Some(slot) => *slot = user_entry,
                None => entries.push(user_entry),
            }
        }
    }

    Ok(entries)
}

/// Entries worth offering right now: pathless actions always qualify,
/// path-backed ones only when the path exists.
pub fn present_entries(entries: Vec<CleanupEntry>) -> Vec<CleanupEntry> {
    entries
        .into_iter()
        .filter(|e| e.path.as_deref().map_or(true, Path::exists))
        .collect()
}

// Walk budget so a pathological tree cannot stall the scan.
const MAX_WALK_ENTRIES: usize = 100_000;

/// Compute size and last-modified metadata for an entry's path.
///
/// Pathless entries (tool invocations) have no metadata; the menu then
/// degrades to name-only sorting when nothing carries any.
pub fn entry_metadata(entry: &CleanupEntry) -> EntryMetadata {
    let Some(path) = &entry.path else {
        return EntryMetadata::default();
    };
    let mut bytes: u64 = 0;
    let mut newest: Option<i64> = None;
    let mut budget = MAX_WALK_ENTRIES;
    walk(path, &mut bytes, &mut newest, &mut budget);

    if bytes == 0 && newest.is_none() {
        return EntryMetadata::default();
    }
    EntryMetadata {
        size_kb: Some((bytes / 1024) as i64),
        last_used: newest,
    }
}

fn walk(path: &Path, bytes: &mut u64, newest: &mut Option<i64>, budget: &mut usize) {
    if *budget == 0 {
        return;
    }
    *budget -= 1;

    let meta = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(_) => return,
    };

    if let Ok(modified) = meta.modified() {
        if let Ok(since) = modified.duration_since(UNIX_EPOCH) {
            let secs = since.as_secs() as i64;
            if newest.map_or(true, |n| secs > n) {
                *newest = Some(secs);
            }
        }
    }

    if meta.is_file() {
        *bytes += meta.len();
        return;
    }
    if !meta.is_dir() {
        // Symlinks are counted but never followed.
        return;
    }

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        walk(&entry.path(), bytes, newest, budget);
    }
}
