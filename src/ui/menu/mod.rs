//! Paginated interactive selection menu.

mod controller;
mod render;
mod state;

pub use controller::{cancel_requested, restore_terminal, run_menu, MenuOptions};
pub use render::{format_last_used, format_size_kb};
pub use state::{MenuItem, MenuState, SortKey, Transition};

use crate::config::{self, ColorMode, Config};
use crate::error::SweepResult;
use crate::ui::terminal::detect_capabilities;

/// Optional per-item sort metadata for [`paginated_select`]. Parallel to
/// the label list; items without a value simply carry `None`.
#[derive(Debug, Clone, Default)]
pub struct SortMetadata {
    pub epochs: Vec<Option<i64>>,
    pub sizes: Vec<Option<i64>>,
}

/// Select from `labels` interactively.
///
/// Returns ascending original indices on confirm, `None` on cancel.
/// Display settings come from the user config and detected terminal
/// capabilities; a CLI-level color choice overrides both. Callers that
/// need finer control use [`run_menu`].
pub fn paginated_select(
    title: &str,
    labels: &[String],
    preselected: &[usize],
    metadata: Option<&SortMetadata>,
    color_override: Option<ColorMode>,
) -> SweepResult<Option<Vec<usize>>> {
    let config = Config::load_or_default();
    let caps = detect_capabilities();

    let color = match color_override.unwrap_or(config.ui.color) {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => caps.supports_color && !caps.is_ci,
    };

    let items = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let epoch = metadata.and_then(|m| m.epochs.get(i).copied().flatten());
            let size = metadata.and_then(|m| m.sizes.get(i).copied().flatten());
            MenuItem::new(i, label.clone()).with_metadata(epoch, size)
        })
        .collect();

    let opts = MenuOptions {
        title: title.to_string(),
        page_size: config.ui.page_size,
        color,
        unicode: config.ui.unicode && caps.supports_unicode,
        managed_screen: config::managed_screen(),
        width: caps.width,
    };

    run_menu(items, preselected, &opts)
}
