//! `macsweep scan` - report reclaimable space without touching anything.

use anyhow::Result;
use serde_json::json;

use macsweep::catalog::{self, CleanupEntry, EntryMetadata};
use macsweep::config::Config;
use macsweep::ui::menu::{format_last_used, format_size_kb};
use macsweep::ui::terminal::detect_capabilities;
use macsweep::ui::theme;

pub fn cmd_scan(json: bool, verbose: u8) -> Result<()> {
    let config = Config::load_or_default();
    let entries = catalog::present_entries(catalog::load_catalog(&config.catalog)?);

    let scanned: Vec<(CleanupEntry, EntryMetadata)> = entries
        .into_iter()
        .map(|e| {
            let meta = catalog::entry_metadata(&e);
            (e, meta)
        })
        .collect();

    if json {
        let rows: Vec<_> = scanned
            .iter()
            .map(|(entry, meta)| {
                json!({
                    "name": entry.name,
                    "description": entry.description,
                    "action": entry.action,
                    "path": entry.path,
                    "safe": entry.safe,
                    "admin": entry.requires_admin(),
                    "size_kb": meta.size_kb,
                    "last_used": meta.last_used,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if scanned.is_empty() {
        println!("Nothing to clean up.");
        return Ok(());
    }

    let caps = detect_capabilities();
    let icons = theme::icon_set(config.ui.unicode && caps.supports_unicode);
    println!("{} Macsweep Scan\n", icons.clean);
    let mut total_kb: i64 = 0;
    for (entry, meta) in &scanned {
        let size = meta
            .size_kb
            .map(format_size_kb)
            .unwrap_or_else(|| String::from("-"));
        let age = meta
            .last_used
            .map(format_last_used)
            .unwrap_or_else(|| String::from("-"));
        let admin = if entry.requires_admin() { " (admin)" } else { "" };
        println!("  {:<24} {:>9}  {:>8}{}", entry.name, size, age, admin);
        if verbose > 0 {
            println!("      {}", entry.description);
            if let Some(path) = &entry.path {
                println!("      {}", path.display());
            }
        }
        total_kb += meta.size_kb.unwrap_or(0);
    }
    println!("\nReclaimable: {}", format_size_kb(total_kb));
    Ok(())
}
