//! Terminal UI: capability detection, key decoding and the selection menu.

pub mod keys;
pub mod menu;
pub mod terminal;
pub mod theme;

use std::io::Write;

/// Append a diagnostic line to the side-channel debug log.
///
/// Diagnostics never go to stdout while the menu owns the screen; when
/// `MACSWEEP_DEBUG` is set they land in a log file under the temp dir.
pub fn debug_log(message: &str) {
    if !crate::config::debug_enabled() {
        return;
    }
    let path = std::env::temp_dir().join("macsweep-debug.log");
    if let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{}", message);
    }
}
