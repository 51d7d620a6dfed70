use crate::core::errors::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Recursive source discovery rooted at one path.
///
/// Returns a sorted, duplicate-free list of absolute paths; walk order
/// varies by platform and every downstream first-wins choice depends on
/// a stable one.
pub struct FileWalker {
    root: PathBuf,
    extensions: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            extensions: vec!["f90".to_string()],
            exclude_patterns: vec![],
        }
    }

    /// Extensions to accept, compared without a leading dot and
    /// case-insensitively, so `.F90` sources match.
    pub fn with_extensions(mut self, extensions: &[String]) -> Self {
        self.extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Glob patterns matched against the full path of each candidate.
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let patterns = self
            .exclude_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Absolute paths, so exclude matching and the sort order do not
        // depend on how the root was spelled.
        let root = std::path::absolute(&self.root)?;
        let mut files = Vec::new();
        let walker = WalkBuilder::new(&root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("skipping unreadable directory entry: {e}");
                    continue;
                }
            };
            let path = entry.path();

            if path.is_file() && self.should_process(path, &patterns) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    fn should_process(&self, path: &Path, patterns: &[glob::Pattern]) -> bool {
        let Some(ext) = path.extension() else {
            return false;
        };
        let ext = ext.to_string_lossy().to_ascii_lowercase();
        if !self.extensions.contains(&ext) {
            return false;
        }

        let path_str = path.to_string_lossy();
        !patterns.iter().any(|p| p.matches(&path_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::Error;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, relative: &str) -> PathBuf {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, "").expect("write file");
        path
    }

    #[test]
    fn matches_extensions_case_insensitively() {
        let dir = TempDir::new().expect("temp dir");
        let lower = touch(&dir, "a.f90");
        let upper = touch(&dir, "b.F90");
        touch(&dir, "notes.txt");
        touch(&dir, "no_extension");

        let files = FileWalker::new(dir.path().to_path_buf())
            .walk()
            .expect("walk");
        assert_eq!(files, vec![lower, upper]);
    }

    #[test]
    fn results_are_sorted_regardless_of_creation_order() {
        let dir = TempDir::new().expect("temp dir");
        let z = touch(&dir, "z.f90");
        let a = touch(&dir, "a.f90");
        let m = touch(&dir, "sub/m.f90");

        let files = FileWalker::new(dir.path().to_path_buf())
            .walk()
            .expect("walk");
        assert_eq!(files, vec![a, m, z]);
    }

    #[test]
    fn exclude_patterns_drop_matching_paths() {
        let dir = TempDir::new().expect("temp dir");
        let kept = touch(&dir, "src/main.f90");
        touch(&dir, "build/generated.f90");

        let files = FileWalker::new(dir.path().to_path_buf())
            .with_exclude_patterns(vec!["**/build/**".to_string()])
            .walk()
            .expect("walk");
        assert_eq!(files, vec![kept]);
    }

    #[test]
    fn invalid_exclude_pattern_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let err = FileWalker::new(dir.path().to_path_buf())
            .with_exclude_patterns(vec!["[invalid".to_string()])
            .walk()
            .expect_err("bad pattern");
        assert!(matches!(err, Error::Pattern(_)));
    }

    #[test]
    fn a_single_file_root_yields_just_that_file() {
        let dir = TempDir::new().expect("temp dir");
        let file = touch(&dir, "main.f90");

        let files = FileWalker::new(file.clone()).walk().expect("walk");
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn custom_extensions_replace_the_default() {
        let dir = TempDir::new().expect("temp dir");
        touch(&dir, "old.f90");
        let f95 = touch(&dir, "new.f95");

        let files = FileWalker::new(dir.path().to_path_buf())
            .with_extensions(&[".f95".to_string()])
            .walk()
            .expect("walk");
        assert_eq!(files, vec![f95]);
    }
}
