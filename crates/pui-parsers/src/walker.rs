//! Repo-root file discovery (spec §4.3 C3).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use pui_core::types::Language;

use crate::ignore_resolver::{build_overrides, SELF_EXCLUDE};
use crate::language::detect_language;
use crate::monorepo::MonorepoLayout;

pub struct WalkEntry {
    pub path: PathBuf,
    /// `None` for files that passed ignore filtering but whose extension
    /// isn't a recognized source language (spec §4.3: these still get a
    /// `FileRow` with `language = None` and zero symbols, rather than being
    /// dropped from the walk entirely).
    pub language: Option<Language>,
    pub package: Option<String>,
    pub size: u64,
}

/// A file skipped during the walk, with the reason (spec §7: oversized files
/// are skip-and-log, not fatal).
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct FileWalker {
    root: PathBuf,
    explicit_excludes: Vec<String>,
    language_overrides: HashMap<String, String>,
    max_file_size: u64,
}

impl FileWalker {
    pub fn new(root: &Path, explicit_excludes: Vec<String>, language_overrides: HashMap<String, String>, max_file_size: u64) -> Self {
        Self {
            root: root.to_path_buf(),
            explicit_excludes,
            language_overrides,
            max_file_size,
        }
    }

    /// Walk the root directory, returning recognized source files and any
    /// files skipped for being oversized. Symlinks are never followed, so
    /// symlink loops cannot cause an infinite walk.
    pub fn walk(&self) -> (Vec<WalkEntry>, Vec<SkippedFile>) {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        let overrides = match build_overrides(&self.root, &self.explicit_excludes) {
            Ok(o) => o,
            Err(_) => ignore::overrides::OverrideBuilder::new(&self.root).build().unwrap(),
        };

        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .follow_links(false)
            .overrides(overrides)
            .add_custom_ignore_filename(".puiignore")
            .build();

        for result in walker {
            let entry = match result {
                Ok(e) => e,
                Err(_) => continue,
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.into_path();
            if path.components().any(|c| c.as_os_str() == SELF_EXCLUDE) {
                continue;
            }

            let lang = detect_language(&path, &self.language_overrides);

            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if size > self.max_file_size {
                skipped.push(SkippedFile {
                    path,
                    reason: format!("exceeds max_file_size ({size} > {})", self.max_file_size),
                });
                continue;
            }

            entries.push(WalkEntry { path, language: lang, package: None, size });
        }

        (entries, skipped)
    }

    /// Walk and annotate each file with its monorepo package, using
    /// longest-prefix match against the detected layout.
    pub fn walk_with_packages(&self, layout: &MonorepoLayout) -> (Vec<WalkEntry>, Vec<SkippedFile>) {
        let (mut entries, skipped) = self.walk();
        for entry in &mut entries {
            entry.package = find_package_for_path(&entry.path, layout);
        }
        (entries, skipped)
    }
}

fn find_package_for_path(file_path: &Path, layout: &MonorepoLayout) -> Option<String> {
    let mut best_match: Option<&str> = None;
    let mut best_len = 0;

    for pkg in &layout.packages {
        if file_path.starts_with(&pkg.path) {
            let pkg_len = pkg.path.as_os_str().len();
            if pkg_len > best_len {
                best_len = pkg_len;
                best_match = Some(&pkg.name);
            }
        }
    }

    best_match.map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_walker_finds_source_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("src/lib.py"), "def f(): pass").unwrap();
        fs::write(dir.path().join("README.md"), "# Hello").unwrap();

        let walker = FileWalker::new(dir.path(), vec![], HashMap::new(), 2 * 1024 * 1024);
        let (entries, skipped) = walker.walk();

        assert_eq!(entries.len(), 3);
        assert!(skipped.is_empty());
        let langs: Vec<_> = entries.iter().map(|e| e.language).collect();
        assert!(langs.contains(&Some(Language::Rust)));
        assert!(langs.contains(&Some(Language::Python)));
    }

    #[test]
    fn test_walker_emits_entry_with_no_language_for_unrecognized_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "# Hello").unwrap();

        let walker = FileWalker::new(dir.path(), vec![], HashMap::new(), 2 * 1024 * 1024);
        let (entries, skipped) = walker.walk();

        assert_eq!(entries.len(), 1);
        assert!(skipped.is_empty());
        assert_eq!(entries[0].language, None);
    }

    #[test]
    fn test_walker_respects_puiignore() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("vendor")).unwrap();
        fs::write(dir.path().join("src/app.ts"), "export {}").unwrap();
        fs::write(dir.path().join("vendor/lib.ts"), "export {}").unwrap();
        fs::write(dir.path().join(".puiignore"), "vendor/\n").unwrap();

        let walker = FileWalker::new(dir.path(), vec![], HashMap::new(), 2 * 1024 * 1024);
        let (entries, _) = walker.walk();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.to_str().unwrap().contains("app.ts"));
    }

    #[test]
    fn test_walker_skips_pui_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".pui")).unwrap();
        fs::write(dir.path().join(".pui/scratch.py"), "x = 1").unwrap();
        fs::write(dir.path().join("main.py"), "x = 1").unwrap();

        let walker = FileWalker::new(dir.path(), vec![], HashMap::new(), 2 * 1024 * 1024);
        let (entries, _) = walker.walk();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].path.ends_with("main.py"));
    }

    #[test]
    fn test_walker_skips_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.py"), "x = 1\n".repeat(10)).unwrap();

        let walker = FileWalker::new(dir.path(), vec![], HashMap::new(), 10);
        let (entries, skipped) = walker.walk();

        assert!(entries.is_empty());
        assert_eq!(skipped.len(), 1);
    }

    #[test]
    fn test_walk_with_packages_annotates_correctly() {
        use crate::monorepo::{MonorepoKind, PackageInfo};
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("packages/web/src")).unwrap();
        fs::create_dir_all(root.join("packages/api/src")).unwrap();
        fs::write(root.join("packages/web/src/app.ts"), "export {}").unwrap();
        fs::write(root.join("packages/api/src/main.ts"), "export {}").unwrap();
        fs::write(root.join("root.ts"), "export {}").unwrap();

        let layout = MonorepoLayout {
            kind: MonorepoKind::NpmWorkspaces,
            packages: vec![
                PackageInfo {
                    name: "web".to_string(),
                    path: root.join("packages/web"),
                    kind: MonorepoKind::NpmWorkspaces,
                    language: "typescript".to_string(),
                },
                PackageInfo {
                    name: "api".to_string(),
                    path: root.join("packages/api"),
                    kind: MonorepoKind::NpmWorkspaces,
                    language: "typescript".to_string(),
                },
            ],
        };

        let walker = FileWalker::new(root, vec![], HashMap::new(), 2 * 1024 * 1024);
        let (entries, _) = walker.walk_with_packages(&layout);

        let web_entry = entries.iter().find(|e| e.path.to_str().unwrap().contains("packages/web"));
        let api_entry = entries.iter().find(|e| e.path.to_str().unwrap().contains("packages/api"));
        let root_entry = entries.iter().find(|e| e.path.file_name().and_then(|n| n.to_str()) == Some("root.ts"));

        assert_eq!(web_entry.unwrap().package.as_deref(), Some("web"));
        assert_eq!(api_entry.unwrap().package.as_deref(), Some("api"));
        assert_eq!(root_entry.unwrap().package, None);
    }
}
