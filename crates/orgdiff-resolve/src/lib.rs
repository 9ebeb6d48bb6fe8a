//! Duplicate-key resolution.
//!
//! Reviewed duplicates are resolved either by keeping one record of a key in
//! its JSONL collection or by blacklisting the key for every comparison.

mod atomic;
mod blacklist_file;
mod keep_line;
mod resolution;
mod resolver;

// === Files ===
pub use atomic::{ContentWriter, FsWriter, backup_path, replace_with_backup, write_atomic};
pub use blacklist_file::{
    BLACKLIST_FILE_NAME, BlacklistFile, blacklist_path, load_blacklist, save_blacklist,
};

// === Resolutions ===
pub use keep_line::{KeepLine, KeepOutcome, keep_lines};
pub use resolution::{
    Resolution, ResolutionAction, ResolutionDocument, ResolutionKey, load_resolutions,
};
pub use resolver::{RESOLUTION_SUMMARY_FILE_NAME, ResolutionSummary, Resolver, apply};
