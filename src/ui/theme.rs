//! Design tokens for the Macsweep UI.
//!
//! Design constraints:
//! - All icons must be sourced from this module
//! - Every icon has an ascii twin for terminals without unicode support

/// One coherent set of icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconSet {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub clean: &'static str,
    pub selected: &'static str,
    pub unselected: &'static str,
}

pub static UNICODE_ICONS: IconSet = IconSet {
    success: "✓",
    error: "✗",
    warning: "⚠",
    clean: "🧹",
    selected: "●",
    unselected: "○",
};

pub static ASCII_ICONS: IconSet = IconSet {
    success: "[OK]",
    error: "[FAIL]",
    warning: "[WARN]",
    clean: "[CLEAN]",
    selected: "[x]",
    unselected: "[ ]",
};

/// Pick the icon set matching the terminal's unicode support.
pub fn icon_set(unicode: bool) -> &'static IconSet {
    if unicode {
        &UNICODE_ICONS
    } else {
        &ASCII_ICONS
    }
}

/// Pick the selection icon for the active icon set.
pub fn selection_icon(selected: bool, unicode: bool) -> &'static str {
    let set = icon_set(unicode);
    if selected {
        set.selected
    } else {
        set.unselected
    }
}
