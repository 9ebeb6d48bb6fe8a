//! Library components of the orgdiff CLI.

pub mod export;
pub mod logging;
