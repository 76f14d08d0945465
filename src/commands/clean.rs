//! `macsweep clean` - interactive cleanup.
//!
//! Catalog entries go through the paginated menu; the chosen subset is
//! confirmed (unless marked safe or `--yes`) and handed to the action
//! dispatcher, with the privileged session established once on the first
//! admin entry. The Ctrl-C flag set by the menu's signal handler is also
//! honored here, so an interrupt during the destructive phase stops
//! before the next entry instead of being swallowed.

use anyhow::Result;
use dialoguer::Confirm;

use macsweep::catalog::{self, CleanupEntry, EntryMetadata};
use macsweep::config::{ColorMode, Config};
use macsweep::error::SweepResult;
use macsweep::session::{PrivilegedSession, SudoBackend};
use macsweep::ui::menu::{cancel_requested, format_size_kb, paginated_select, SortMetadata};
use macsweep::ui::terminal::detect_capabilities;
use macsweep::ui::{debug_log, theme};
use macsweep::Dispatcher;

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// Skip per-entry confirmation for unsafe entries
    pub yes: bool,
    /// Preselect every entry
    pub all: bool,
    /// CLI color choice, overriding config and detection
    pub color: Option<ColorMode>,
}

#[derive(Debug, Default)]
struct CleanSummary {
    cleaned: usize,
    skipped: usize,
    failed: usize,
    freed_kb: i64,
    interrupted: bool,
}

pub fn cmd_clean(opts: CleanOptions, verbose: u8) -> Result<()> {
    let config = Config::load_or_default();
    let entries = catalog::present_entries(catalog::load_catalog(&config.catalog)?);

    if entries.is_empty() {
        println!("Nothing to clean up.");
        return Ok(());
    }

    let scanned: Vec<(CleanupEntry, EntryMetadata)> = entries
        .into_iter()
        .map(|e| {
            let meta = catalog::entry_metadata(&e);
            (e, meta)
        })
        .collect();

    let labels: Vec<String> = scanned.iter().map(|(e, _)| e.name.clone()).collect();
    let metadata = SortMetadata {
        epochs: scanned.iter().map(|(_, m)| m.last_used).collect(),
        sizes: scanned.iter().map(|(_, m)| m.size_kb).collect(),
    };
    let preselected: Vec<usize> = if opts.all {
        (0..labels.len()).collect()
    } else {
        Vec::new()
    };

    let Some(selection) = paginated_select(
        "Macsweep Clean",
        &labels,
        &preselected,
        Some(&metadata),
        opts.color,
    )?
    else {
        println!("Cancelled.");
        return Ok(());
    };

    let caps = detect_capabilities();
    let icons = theme::icon_set(config.ui.unicode && caps.supports_unicode);
    let mut session = PrivilegedSession::new(&config.session);
    let dispatcher = Dispatcher::builtin();
    let mut confirm = |entry: &CleanupEntry| {
        opts.yes
            || Confirm::new()
                .with_prompt(format!("Clean '{}'?", entry.name))
                .default(false)
                .interact()
                .unwrap_or(false)
    };

    let summary = apply_selection(
        &scanned,
        &selection,
        &mut session,
        &dispatcher,
        icons,
        verbose,
        &mut confirm,
        &cancel_requested,
    )?;
    session.stop_session();

    if summary.interrupted {
        println!("\nInterrupted; stopping.");
    }
    println!(
        "\nCleaned {} entr{} ({} freed), {} skipped, {} failed",
        summary.cleaned,
        if summary.cleaned == 1 { "y" } else { "ies" },
        format_size_kb(summary.freed_kb),
        summary.skipped,
        summary.failed
    );
    if summary.failed > 0 {
        anyhow::bail!("{} cleanup action(s) failed", summary.failed);
    }
    Ok(())
}

/// Execute the selected entries in order. The interrupt probe is checked
/// at the top of every iteration (before any confirmation prompt), so a
/// Ctrl-C delivered mid-run stops the loop before the next entry; work
/// already done stays done.
#[allow(clippy::too_many_arguments)]
fn apply_selection<B: SudoBackend>(
    scanned: &[(CleanupEntry, EntryMetadata)],
    selection: &[usize],
    session: &mut PrivilegedSession<B>,
    dispatcher: &Dispatcher,
    icons: &theme::IconSet,
    verbose: u8,
    confirm: &mut dyn FnMut(&CleanupEntry) -> bool,
    interrupted: &dyn Fn() -> bool,
) -> SweepResult<CleanSummary> {
    let mut summary = CleanSummary::default();

    for &index in selection {
        if interrupted() {
            summary.interrupted = true;
            break;
        }
        let (entry, meta) = &scanned[index];

        if !entry.safe && !confirm(entry) {
            summary.skipped += 1;
            continue;
        }

        if entry.requires_admin() && !session.ensure_session()? {
            println!(
                "{} {} skipped (administrator access declined)",
                icons.warning, entry.name
            );
            summary.skipped += 1;
            continue;
        }

        debug_log(&format!("executing {} for '{}'", entry.action, entry.name));
        match dispatcher.execute(&entry.action, entry.path.as_deref()) {
            Ok(()) => {
                println!("{} {}", icons.success, entry.name);
                summary.cleaned += 1;
                summary.freed_kb += meta.size_kb.unwrap_or(0);
            }
            Err(e) => {
                eprintln!("{} {}: {}", icons.error, entry.name, e);
                summary.failed += 1;
            }
        }
        if verbose > 0 {
            if let Some(path) = &entry.path {
                println!("    {}", path.display());
            }
        }
    }

    // Catches an interrupt that arrived during the final entry.
    if interrupted() {
        summary.interrupted = true;
    }
    Ok(summary)
}
