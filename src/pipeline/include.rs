// src/pipeline/include.rs

//! Inlining of `<!--=include NAME -->` and `//=include NAME` directives.
//!
//! NAME is looked up next to the including file first, then in each of the
//! configured include paths (relative to the project root). Included files
//! are expanded recursively; an include cycle is an error.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::fs::FileSystem;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:<!--=\s*include\s+([^\s>]+)\s*-->|//=\s*include\s+(\S+))[ \t]*\r?$")
        .expect("include directive regex is valid")
});

/// Resolves include directives for one task.
#[derive(Debug)]
pub struct IncludeResolver<'a> {
    fs: &'a dyn FileSystem,
    search_paths: Vec<PathBuf>,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(fs: &'a dyn FileSystem, root: &Path, paths: &[String]) -> Self {
        Self {
            fs,
            search_paths: paths.iter().map(|p| root.join(p)).collect(),
        }
    }

    /// Expand every directive in `contents`, which was read from `origin`.
    ///
    /// Errors are plain messages; the caller decides whether they fail the
    /// task.
    pub fn expand(&self, origin: &Path, contents: &str) -> Result<String, String> {
        let mut stack = vec![origin.to_path_buf()];
        self.expand_inner(origin, contents, &mut stack)
    }

    fn expand_inner(
        &self,
        origin: &Path,
        contents: &str,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, String> {
        let mut out = String::with_capacity(contents.len());
        let mut last = 0;

        for caps in DIRECTIVE.captures_iter(contents) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };

            out.push_str(&contents[last..whole.start()]);
            last = whole.end();

            let path = self.locate(origin, name.as_str()).ok_or_else(|| {
                format!(
                    "include '{}' not found next to {:?} or in {:?}",
                    name.as_str(),
                    origin,
                    self.search_paths
                )
            })?;

            if stack.contains(&path) {
                return Err(format!("include cycle through {:?}", path));
            }

            let included = self
                .fs
                .read_to_string(&path)
                .map_err(|e| format!("reading include {:?}: {e}", path))?;

            stack.push(path.clone());
            let expanded = self.expand_inner(&path, &included, stack)?;
            stack.pop();

            out.push_str(expanded.trim_end_matches(['\r', '\n']));
        }

        out.push_str(&contents[last..]);
        Ok(out)
    }

    fn locate(&self, origin: &Path, name: &str) -> Option<PathBuf> {
        let beside = origin.parent().map(|dir| dir.join(name));
        beside
            .into_iter()
            .chain(self.search_paths.iter().map(|dir| dir.join(name)))
            .find(|candidate| self.fs.is_file(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn inlines_html_and_js_directives() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/src/components/header.html", "<header></header>\n");
        fs.add_file("/site/src/js/util.js", "let x = 1;\n");

        let resolver =
            IncludeResolver::new(&fs, Path::new("/site"), &["src/components".to_string()]);

        let html = resolver
            .expand(
                Path::new("/site/src/pages/home.html"),
                "<body>\n  <!--=include header.html -->\n</body>\n",
            )
            .unwrap();
        assert_eq!(html, "<body>\n<header></header>\n</body>\n");

        let js = resolver
            .expand(Path::new("/site/src/js/main.js"), "//=include util.js\nrun();\n")
            .unwrap();
        assert_eq!(js, "let x = 1;\nrun();\n");
    }

    #[test]
    fn missing_include_and_cycles_are_errors() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/a.html", "<!--=include b.html -->");
        fs.add_file("/site/b.html", "<!--=include a.html -->");
        let resolver = IncludeResolver::new(&fs, Path::new("/site"), &[]);

        let err = resolver
            .expand(Path::new("/site/a.html"), "<!--=include b.html -->")
            .unwrap_err();
        assert!(err.contains("cycle"), "{err}");

        let err = resolver
            .expand(Path::new("/site/a.html"), "<!--=include nope.html -->")
            .unwrap_err();
        assert!(err.contains("not found"), "{err}");
    }
}
