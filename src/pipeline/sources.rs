// src/pipeline/sources.rs

//! Source glob expansion.
//!
//! A pattern such as `src/img/*.{jpg,png}` is split into its literal base
//! (`src/img`) and the glob part (`*.{jpg,png}`). Files below the base are
//! matched against the glob part, and keep their path relative to the base.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;

/// A matched input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path of the file.
    pub path: PathBuf,
    /// Path relative to the pattern's base directory.
    pub rel: PathBuf,
}

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Split a pattern into its literal base directory and the remaining glob.
///
/// A pattern without glob characters is a single file: its parent is the
/// base and its file name the glob.
pub fn split_pattern(pattern: &str) -> (PathBuf, String) {
    let parts: Vec<&str> = pattern.split('/').filter(|p| !p.is_empty()).collect();
    let first_glob = parts
        .iter()
        .position(|p| p.contains(GLOB_META))
        .unwrap_or(parts.len().saturating_sub(1));

    let base: PathBuf = parts[..first_glob].iter().collect();
    let glob = parts[first_glob..].join("/");
    (base, glob)
}

pub(crate) fn compile_glob(glob: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| PipelineError::ConfigError(format!("invalid glob '{glob}': {e}")))
}

/// Render a relative path with forward slashes, for glob matching.
pub(crate) fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Expand `patterns` below `root` into a sorted, de-duplicated file list.
///
/// A missing base directory is a [`PipelineError::MissingSource`] unless
/// `allow_empty` is set.
pub fn expand(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[String],
    allow_empty: bool,
) -> Result<Vec<SourceFile>> {
    let mut found: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for pattern in patterns {
        let (base, glob) = split_pattern(pattern);
        let base_dir = root.join(&base);

        if !fs.is_dir(&base_dir) {
            if allow_empty {
                debug!(pattern = %pattern, base = ?base_dir, "source base missing; no files");
                continue;
            }
            return Err(PipelineError::MissingSource(base_dir));
        }

        let matcher = compile_glob(&glob)?;
        let mut files = Vec::new();
        walk(fs, &base_dir, &mut files)?;

        for path in files {
            let Ok(rel) = path.strip_prefix(&base_dir) else {
                continue;
            };
            if matcher.is_match(slash_path(rel)) {
                found.entry(path.clone()).or_insert_with(|| rel.to_path_buf());
            }
        }
    }

    Ok(found
        .into_iter()
        .map(|(path, rel)| SourceFile { path, rel })
        .collect())
}

fn walk(fs: &dyn FileSystem, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs.read_dir(dir)? {
        if fs.is_dir(&entry) {
            walk(fs, &entry, out)?;
        } else if fs.is_file(&entry) {
            out.push(entry);
        }
    }
    Ok(())
}
