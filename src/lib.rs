//! Macsweep - macOS maintenance utility
//!
//! Macsweep scans the filesystem for reclaimable space (caches, logs,
//! stale build products) and presents an interactive paginated menu for
//! picking what to clean, with administrator actions bridged through a
//! managed privileged session.

pub mod actions;
pub mod catalog;
pub mod config;
pub mod error;
pub mod session;
pub mod ui;

// Re-exports for convenience
pub use actions::{requires_admin, Dispatcher};
pub use catalog::{builtin_entries, load_catalog, CleanupEntry};
pub use config::Config;
pub use error::{SweepError, SweepResult};
pub use session::{PrivilegedSession, SessionState, SudoBackend};
pub use ui::menu::{paginated_select, MenuItem, MenuState, SortMetadata};
