// src/pipeline/incremental.rs

//! "newer" filtering: skip sources whose destination artifact is up to date.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::StepConfig;
use crate::errors::Result;
use crate::fs::FileSystem;

use super::sources::SourceFile;
use super::steps::{only_matcher, selected};

/// Result of the filter: the sources that still need work, and how many
/// were skipped.
#[derive(Debug)]
pub struct NewerFilter {
    pub stale: Vec<SourceFile>,
    pub skipped: usize,
}

/// Where the steps will put the artifact produced from `rel`.
///
/// Only renaming command steps that replace their input (`keep_input` off)
/// change the predicted path.
pub fn predicted_rel(steps: &[StepConfig], rel: &Path) -> Result<PathBuf> {
    let mut rel = rel.to_path_buf();
    for step in steps {
        if let StepConfig::Command {
            ext: Some(ext),
            only,
            keep_input: false,
            ..
        } = step
        {
            let only = only_matcher(only.as_deref())?;
            if selected(only.as_ref(), &rel) {
                rel.set_extension(ext);
            }
        }
    }
    Ok(rel)
}

/// Keep only the sources that are newer than their destination artifact.
///
/// With a `concat` step every source feeds one target, so either all of them
/// pass (target missing, or any source newer) or none do.
pub fn filter_newer(
    fs: &dyn FileSystem,
    sources: Vec<SourceFile>,
    dest: &Path,
    steps: &[StepConfig],
) -> Result<NewerFilter> {
    let concat_at = steps.iter().enumerate().find_map(|(i, s)| match s {
        StepConfig::Concat { file } => Some((i, file)),
        _ => None,
    });

    if let Some((idx, file)) = concat_at {
        let target = dest.join(predicted_rel(&steps[idx + 1..], Path::new(file))?);

        let mut any_newer = !fs.exists(&target);
        if !any_newer {
            let target_time = fs.modified(&target)?;
            for src in &sources {
                if fs.modified(&src.path)? > target_time {
                    any_newer = true;
                    break;
                }
            }
        }

        return Ok(if any_newer {
            NewerFilter {
                stale: sources,
                skipped: 0,
            }
        } else {
            debug!(target = ?target, "bundle is up to date");
            NewerFilter {
                skipped: sources.len(),
                stale: Vec::new(),
            }
        });
    }

    let mut stale = Vec::new();
    let mut skipped = 0;

    for src in sources {
        let target = dest.join(predicted_rel(steps, &src.rel)?);
        if !fs.exists(&target) || fs.modified(&src.path)? > fs.modified(&target)? {
            stale.push(src);
        } else {
            skipped += 1;
        }
    }

    Ok(NewerFilter { stale, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renaming_command_changes_predicted_extension() {
        let steps = vec![StepConfig::Command {
            cmd: "cwebp {input} -o {output}".into(),
            ext: Some("webp".into()),
            only: None,
            keep_input: false,
        }];
        assert_eq!(
            predicted_rel(&steps, Path::new("a/photo.jpg")).unwrap(),
            PathBuf::from("a/photo.webp")
        );

        let kept = vec![StepConfig::Command {
            cmd: "pyftsubset {input} --output-file={output}".into(),
            ext: Some("woff".into()),
            only: None,
            keep_input: true,
        }];
        assert_eq!(
            predicted_rel(&kept, Path::new("font.ttf")).unwrap(),
            PathBuf::from("font.ttf")
        );
    }
}
