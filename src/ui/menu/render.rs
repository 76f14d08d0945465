//! Frame rendering for the paginated menu.
//!
//! Builds every frame as a fixed number of plain strings so the controller
//! can repaint in place: same line count each time, unused rows padded,
//! which keeps stale content from a longer previous frame off the screen.

use chrono::{TimeZone, Utc};
use crossterm::style::Stylize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::ui::theme::selection_icon;

use super::state::MenuState;

/// Render one full frame. The returned vector always has
/// `page_size + 5` lines for a given state shape.
pub fn render_frame(
    state: &MenuState,
    title: &str,
    color: bool,
    unicode: bool,
    width: u16,
) -> Vec<String> {
    let width = width.max(40) as usize;
    let mut lines = Vec::with_capacity(state.page_size() + 5);

    lines.push(render_title(title, state, color));
    lines.push(render_mode_line(state));

    let mut rows = 0;
    for (index, is_cursor) in state.page() {
        lines.push(render_row(state, index, is_cursor, color, unicode, width));
        rows += 1;
    }
    if rows == 0 {
        lines.push(String::from("  (no matching items)"));
        rows = 1;
    }
    // Pad to a fixed frame height.
    for _ in rows..state.page_size() {
        lines.push(String::new());
    }

    lines.push("─".repeat(width.min(72)));
    lines.push(render_status_bar(state));
    lines.push(render_help_bar(state));

    lines
}

fn render_title(title: &str, state: &MenuState, color: bool) -> String {
    let heading = format!("{} ({} items)", title, state.items().len());
    if color {
        heading.bold().to_string()
    } else {
        heading
    }
}

/// Second line: live filter while editing, otherwise applied filter and
/// sort summary.
fn render_mode_line(state: &MenuState) -> String {
    if state.filter_mode() {
        return format!("Filter: {}█", state.live_filter());
    }

    let mut parts = Vec::new();
    if !state.applied_filter().is_empty() {
        parts.push(format!("filter \"{}\"", state.applied_filter()));
    }
    if state.sort_enabled() {
        let dir = if state.sort_reversed() { " (rev)" } else { "" };
        parts.push(format!("sort: {}{}", state.sort_key().label(), dir));
    } else {
        parts.push(String::from("sort: name"));
    }
    parts.join("  ·  ")
}

fn render_row(
    state: &MenuState,
    index: usize,
    is_cursor: bool,
    color: bool,
    unicode: bool,
    width: usize,
) -> String {
    let item = &state.items()[index];
    let cursor = if is_cursor { "> " } else { "  " };
    let icon = selection_icon(state.is_selected(index), unicode);

    let mut meta = String::new();
    if let Some(kb) = item.size_kb {
        meta.push_str(&format!("  {:>9}", format_size_kb(kb)));
    }
    if let Some(epoch) = item.last_used {
        meta.push_str(&format!("  {}", format_last_used(epoch)));
    }

    let budget = width.saturating_sub(4 + icon.width() + meta.width());
    let label = truncate_label(&item.label, budget);

    let line = format!("{}{} {}{}", cursor, icon, label, meta);
    if is_cursor && color {
        line.reverse().to_string()
    } else {
        line
    }
}

fn render_status_bar(state: &MenuState) -> String {
    format!(
        "Selected: {}/{}  {} shown",
        state.selected_count(),
        state.items().len(),
        state.view_indices().len(),
    )
}

fn render_help_bar(state: &MenuState) -> String {
    if state.filter_mode() {
        return String::from("[Enter] Apply filter    [Esc] Cancel    [Backspace] Erase");
    }
    if state.help_visible() {
        return String::from(
            "[Space] Toggle  [Enter] Confirm  [/] Filter  [s] Sort key  [S] Reverse  [q] Quit",
        );
    }
    String::from("↑↓ navigate · Space select · Enter confirm · / filter · ? help · q quit")
}

/// Truncate a label to a display-cell budget, appending an ellipsis.
/// The ellipsis counts against the budget, so the result never exceeds
/// it even on very narrow terminals.
fn truncate_label(label: &str, budget: usize) -> String {
    if label.width() <= budget {
        return label.to_string();
    }
    if budget == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in label.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > budget {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Human size from kilobytes ("412 KB", "1.2 MB", "3.4 GB").
pub fn format_size_kb(kb: i64) -> String {
    const MB: i64 = 1024;
    const GB: i64 = 1024 * 1024;
    if kb >= GB {
        format!("{:.1} GB", kb as f64 / GB as f64)
    } else if kb >= MB {
        format!("{:.1} MB", kb as f64 / MB as f64)
    } else {
        format!("{} KB", kb)
    }
}

/// Short relative age from a unix epoch ("today", "3d ago", "2mo ago").
pub fn format_last_used(epoch: i64) -> String {
    let then = match Utc.timestamp_opt(epoch, 0).single() {
        Some(t) => t,
        None => return String::from("-"),
    };
    let days = (Utc::now() - then).num_days();
    if days <= 0 {
        String::from("today")
    } else if days < 30 {
        format!("{}d ago", days)
    } else if days < 365 {
        format!("{}mo ago", days / 30)
    } else {
        format!("{}y ago", days / 365)
    }
}
