//! Command implementations for the Macsweep CLI.

pub mod clean;
pub mod scan;
