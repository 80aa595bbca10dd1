// src/pipeline/output.rs

use std::path::Path;

use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;

use super::FileItem;

/// Counts from writing a task's results.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    pub written: usize,
    pub unchanged: usize,
}

/// Write every item below `dest`.
///
/// A file whose bytes already match what is on disk is left alone, so its
/// modification time does not move.
pub fn write_all(fs: &dyn FileSystem, dest: &Path, items: &[FileItem]) -> Result<WriteStats> {
    let mut stats = WriteStats::default();

    for item in items {
        let target = dest.join(&item.rel);

        if fs.is_file(&target) {
            let existing = fs.read(&target)?;
            if blake3::hash(&existing) == blake3::hash(&item.contents) {
                debug!(file = ?target, "output unchanged; not rewriting");
                stats.unchanged += 1;
                continue;
            }
        }

        fs.write(&target, &item.contents)?;
        stats.written += 1;
    }

    Ok(stats)
}
