// src/pipeline/clean.rs

use std::path::Path;

use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;

/// Remove every path in `paths` (relative to `root`). Paths that do not
/// exist are ignored. Returns how many were removed.
pub fn clean_paths(fs: &dyn FileSystem, root: &Path, paths: &[String]) -> Result<usize> {
    let mut removed = 0;

    for rel in paths {
        let path = root.join(rel);
        if !fs.exists(&path) {
            debug!(path = ?path, "nothing to clean");
            continue;
        }

        fs.remove_all(&path)?;
        info!(path = ?path, "cleaned");
        removed += 1;
    }

    Ok(removed)
}
