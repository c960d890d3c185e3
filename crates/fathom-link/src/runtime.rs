//! The on-disk distribution of precompiled runtime files.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{LinkError, LinkResult};

/// File name of the support object that is always linked explicitly.
pub const SUPPORT_FILE: &str = "support.o";

const LINKABLE_EXTENSIONS: &[&str] = &["o", "obj", "bc", "a", "lib"];

/// A directory of precompiled runtime objects and archives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeDistribution {
    dir: PathBuf,
    excluded: Vec<OsString>,
}

impl RuntimeDistribution {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            excluded: vec![SUPPORT_FILE.into()],
        }
    }

    /// Keep `file_name` out of automatic inclusion.
    pub fn exclude(mut self, file_name: impl Into<OsString>) -> Self {
        self.excluded.push(file_name.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Linkable files offered to tree-shaking, sorted by name.
    pub fn candidates(&self) -> LinkResult<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(LinkError::MissingFile {
                path: self.dir.clone(),
            });
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let linkable = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| LINKABLE_EXTENSIONS.contains(&ext));
            let excluded = path
                .file_name()
                .is_some_and(|name| self.excluded.iter().any(|ex| ex == name));

            if path.is_file() && linkable && !excluded {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Excluded files that exist in the distribution; linked by the caller.
    pub fn support_files(&self) -> Vec<PathBuf> {
        self.excluded
            .iter()
            .map(|name| self.dir.join(name))
            .filter(|path| path.is_file())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_skip_support_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["array.o", "math.bc", "libc.a", SUPPORT_FILE, "README.md"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let runtime = RuntimeDistribution::new(dir.path());
        let names: Vec<_> = runtime
            .candidates()
            .unwrap()
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, ["array.o", "libc.a", "math.bc"]);
        assert_eq!(runtime.support_files(), [dir.path().join(SUPPORT_FILE)]);
    }

    #[test]
    fn test_missing_directory() {
        let runtime = RuntimeDistribution::new("/nonexistent/fathom-runtime");
        assert!(matches!(runtime.candidates(), Err(LinkError::MissingFile { .. })));
    }
}
