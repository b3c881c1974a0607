//! Monorepo detection and package enumeration (spec §4.7, groundwork for
//! MODULE_DEPENDS_ON edges).
//!
//! Detects Cargo workspaces, npm/yarn/pnpm workspaces, Go workspaces, Nx,
//! Turbo, Lerna, and Python packages by inspecting config files at the
//! project root. Falls back to grouping by top-level directory when no
//! workspace manifest is found but the tree still looks multi-package.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The kind of monorepo detected at the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MonorepoKind {
    CargoWorkspace,
    NpmWorkspaces,
    GoWorkspace,
    NxMonorepo,
    TurboMonorepo,
    LernaMonorepo,
    PythonPackages,
    TopLevelDirectories,
    None,
}

impl Default for MonorepoKind {
    fn default() -> Self {
        MonorepoKind::None
    }
}

/// Metadata about a single package within a monorepo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub path: PathBuf,
    pub kind: MonorepoKind,
    pub language: String,
}

/// The overall layout of a monorepo: its kind and constituent packages.
#[derive(Debug, Clone, Default)]
pub struct MonorepoLayout {
    pub kind: MonorepoKind,
    pub packages: Vec<PackageInfo>,
}

/// Detect whether `root` is a monorepo and enumerate its packages.
///
/// Tries each detection strategy in priority order and returns the first
/// match; falls back to a top-level-directory heuristic before giving up.
pub fn detect_monorepo(root: &Path) -> MonorepoLayout {
    if let Some(layout) = detect_cargo_workspace(root) {
        return layout;
    }
    if let Some(layout) = detect_npm_workspaces(root) {
        return layout;
    }
    if let Some(layout) = detect_go_workspace(root) {
        return layout;
    }
    if let Some(layout) = detect_nx(root) {
        return layout;
    }
    if let Some(layout) = detect_turbo(root) {
        return layout;
    }
    if let Some(layout) = detect_lerna(root) {
        return layout;
    }
    if let Some(layout) = detect_python_packages(root) {
        return layout;
    }
    if let Some(layout) = detect_top_level_directories(root) {
        return layout;
    }
    MonorepoLayout::default()
}

fn detect_cargo_workspace(root: &Path) -> Option<MonorepoLayout> {
    let cargo_toml = root.join("Cargo.toml");
    let content = fs::read_to_string(&cargo_toml).ok()?;

    if !content.contains("[workspace]") {
        return None;
    }

    let mut packages = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("members") {
            let after_eq = trimmed.splitn(2, '=').nth(1)?.trim();
            if after_eq.starts_with('[') {
                let members_str = extract_toml_array(&content, "members")?;
                for member_glob in members_str {
                    expand_glob_pattern(root, &member_glob, &mut packages, "rust");
                }
                break;
            }
        }
    }

    if packages.is_empty() {
        return None;
    }

    for pkg in &mut packages {
        pkg.kind = MonorepoKind::CargoWorkspace;
    }

    Some(MonorepoLayout {
        kind: MonorepoKind::CargoWorkspace,
        packages,
    })
}

fn detect_npm_workspaces(root: &Path) -> Option<MonorepoLayout> {
    let pkg_json = root.join("package.json");
    let content = fs::read_to_string(&pkg_json).ok()?;
    let parsed: serde_json::Value = serde_json::from_str(&content).ok()?;

    let workspace_globs = match parsed.get("workspaces") {
        Some(serde_json::Value::Array(arr)) => {
            arr.iter().filter_map(|v| v.as_str().map(String::from)).collect::<Vec<_>>()
        }
        Some(serde_json::Value::Object(obj)) => obj
            .get("packages")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default(),
        _ => return None,
    };

    if workspace_globs.is_empty() {
        return None;
    }

    let mut packages = Vec::new();
    for glob in &workspace_globs {
        expand_glob_pattern(root, glob, &mut packages, "typescript");
    }

    if packages.is_empty() {
        return None;
    }

    for pkg in &mut packages {
        pkg.kind = MonorepoKind::NpmWorkspaces;
    }

    Some(MonorepoLayout {
        kind: MonorepoKind::NpmWorkspaces,
        packages,
    })
}

fn detect_go_workspace(root: &Path) -> Option<MonorepoLayout> {
    let go_work = root.join("go.work");
    let content = fs::read_to_string(&go_work).ok()?;

    let mut packages = Vec::new();
    let mut in_use_block = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == "use (" {
            in_use_block = true;
            continue;
        }
        if trimmed == ")" {
            in_use_block = false;
            continue;
        }
        if in_use_block {
            push_go_use_dir(root, trimmed, &mut packages);
        }
        if trimmed.starts_with("use ") && !trimmed.contains('(') {
            let dir = trimmed.strip_prefix("use ").unwrap_or("").trim();
            push_go_use_dir(root, dir, &mut packages);
        }
    }

    if packages.is_empty() {
        return None;
    }

    Some(MonorepoLayout {
        kind: MonorepoKind::GoWorkspace,
        packages,
    })
}

fn push_go_use_dir(root: &Path, raw: &str, packages: &mut Vec<PackageInfo>) {
    let dir = raw.trim_matches(|c: char| c == '"' || c.is_whitespace());
    if dir.is_empty() || dir.starts_with("//") {
        return;
    }
    let pkg_path = root.join(dir);
    if pkg_path.is_dir() {
        let name = dir.rsplit('/').next().unwrap_or(dir).to_string();
        packages.push(PackageInfo {
            name,
            path: pkg_path,
            kind: MonorepoKind::GoWorkspace,
            language: "go".to_string(),
        });
    }
}

fn detect_nx(root: &Path) -> Option<MonorepoLayout> {
    let nx_json = root.join("nx.json");
    if !nx_json.exists() {
        return None;
    }

    let mut packages = Vec::new();
    scan_for_project_json(root, &mut packages, 3);

    if packages.is_empty() {
        return None;
    }

    Some(MonorepoLayout {
        kind: MonorepoKind::NxMonorepo,
        packages,
    })
}

fn detect_turbo(root: &Path) -> Option<MonorepoLayout> {
    let turbo_json = root.join("turbo.json");
    if !turbo_json.exists() {
        return None;
    }

    let pkg_json = root.join("package.json");
    let content = fs::read_to_string(&pkg_json).ok()?;
    let parsed: serde_json::Value = serde_json::from_str(&content).ok()?;

    let workspace_globs = match parsed.get("workspaces") {
        Some(serde_json::Value::Array(arr)) => {
            arr.iter().filter_map(|v| v.as_str().map(String::from)).collect::<Vec<_>>()
        }
        _ => return None,
    };

    let mut packages = Vec::new();
    for glob in &workspace_globs {
        expand_glob_pattern(root, glob, &mut packages, "typescript");
    }

    if packages.is_empty() {
        return None;
    }

    for pkg in &mut packages {
        pkg.kind = MonorepoKind::TurboMonorepo;
    }

    Some(MonorepoLayout {
        kind: MonorepoKind::TurboMonorepo,
        packages,
    })
}

fn detect_lerna(root: &Path) -> Option<MonorepoLayout> {
    let lerna_json = root.join("lerna.json");
    let content = fs::read_to_string(&lerna_json).ok()?;
    let parsed: serde_json::Value = serde_json::from_str(&content).ok()?;

    let pkg_globs = parsed
        .get("packages")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect::<Vec<_>>())
        .unwrap_or_else(|| vec!["packages/*".to_string()]);

    let mut packages = Vec::new();
    for glob in &pkg_globs {
        expand_glob_pattern(root, glob, &mut packages, "typescript");
    }

    if packages.is_empty() {
        return None;
    }

    for pkg in &mut packages {
        pkg.kind = MonorepoKind::LernaMonorepo;
    }

    Some(MonorepoLayout {
        kind: MonorepoKind::LernaMonorepo,
        packages,
    })
}

/// Detect a multi-package Python tree: several subdirectories each carrying
/// their own `pyproject.toml` or `setup.py`. A single root-level
/// `pyproject.toml` with no nested manifests is a plain single-package repo,
/// not a monorepo, and is left to [`detect_top_level_directories`].
fn detect_python_packages(root: &Path) -> Option<MonorepoLayout> {
    let entries = fs::read_dir(root).ok()?;
    let mut packages = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string();
        if name.starts_with('.') {
            continue;
        }
        if path.join("pyproject.toml").exists() || path.join("setup.py").exists() {
            packages.push(PackageInfo {
                name,
                path,
                kind: MonorepoKind::PythonPackages,
                language: "python".to_string(),
            });
        }
    }

    if packages.len() < 2 {
        return None;
    }

    Some(MonorepoLayout {
        kind: MonorepoKind::PythonPackages,
        packages,
    })
}

/// Last-resort grouping: no workspace manifest anywhere, but the repo root
/// has several sibling directories that each contain source files. Group
/// MODULE_DEPENDS_ON candidates by top-level directory name so polyglot
/// repos without any workspace tooling still get package-level grouping.
fn detect_top_level_directories(root: &Path) -> Option<MonorepoLayout> {
    const SKIP: &[&str] = &[
        ".git", "node_modules", "target", "vendor", "dist", "build", ".pui",
    ];
    let entries = fs::read_dir(root).ok()?;
    let mut packages = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string();
        if name.starts_with('.') || SKIP.contains(&name.as_str()) {
            continue;
        }
        if dir_has_any_file(&path, 3) {
            packages.push(PackageInfo {
                name,
                path,
                kind: MonorepoKind::TopLevelDirectories,
                language: "unknown".to_string(),
            });
        }
    }

    if packages.len() < 2 {
        return None;
    }

    Some(MonorepoLayout {
        kind: MonorepoKind::TopLevelDirectories,
        packages,
    })
}

fn dir_has_any_file(dir: &Path, max_depth: u32) -> bool {
    if max_depth == 0 {
        return false;
    }
    let Ok(entries) = fs::read_dir(dir) else { return false };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            return true;
        }
        if path.is_dir() && dir_has_any_file(&path, max_depth - 1) {
            return true;
        }
    }
    false
}

// --- Shared TOML/JSON helpers ---

fn extract_toml_array(content: &str, key: &str) -> Option<Vec<String>> {
    let mut values = Vec::new();
    let mut in_array = false;
    let mut found_key = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if !found_key {
            if trimmed.starts_with(key) && trimmed.contains('=') {
                found_key = true;
                let after_eq = trimmed.splitn(2, '=').nth(1)?.trim();
                if after_eq.starts_with('[') && after_eq.ends_with(']') {
                    parse_inline_array(after_eq, &mut values);
                    return Some(values);
                } else if after_eq.starts_with('[') {
                    in_array = true;
                    let partial = after_eq.trim_start_matches('[');
                    parse_inline_array(&format!("[{}]", partial.trim_end_matches(']')), &mut values);
                }
            }
            continue;
        }

        if in_array {
            if trimmed.starts_with(']') {
                return Some(values);
            }
            let cleaned = trimmed.trim_end_matches(',').trim();
            let unquoted = cleaned.trim_matches('"');
            if !unquoted.is_empty() && !unquoted.starts_with('#') {
                values.push(unquoted.to_string());
            }
        }
    }

    if found_key && !values.is_empty() {
        Some(values)
    } else {
        None
    }
}

fn parse_inline_array(s: &str, out: &mut Vec<String>) {
    let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
    for part in inner.split(',') {
        let cleaned = part.trim().trim_matches('"').trim_matches('\'');
        if !cleaned.is_empty() {
            out.push(cleaned.to_string());
        }
    }
}

fn expand_glob_pattern(root: &Path, pattern: &str, packages: &mut Vec<PackageInfo>, default_language: &str) {
    let clean = pattern.trim_end_matches('/');
    if let Some(prefix) = clean.strip_suffix("/*").or_else(|| clean.strip_suffix("/**")) {
        let search_dir = root.join(prefix);
        if let Ok(entries) = fs::read_dir(&search_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("unknown").to_string();
                    if name.starts_with('.') {
                        continue;
                    }
                    packages.push(PackageInfo {
                        name,
                        path,
                        kind: MonorepoKind::None,
                        language: default_language.to_string(),
                    });
                }
            }
        }
    } else {
        let pkg_path = root.join(clean);
        if pkg_path.is_dir() {
            let name = clean.rsplit('/').next().unwrap_or(clean).to_string();
            packages.push(PackageInfo {
                name,
                path: pkg_path,
                kind: MonorepoKind::None,
                language: default_language.to_string(),
            });
        }
    }
}

fn scan_for_project_json(dir: &Path, packages: &mut Vec<PackageInfo>, max_depth: u32) {
    if max_depth == 0 {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string();
            if name.starts_with('.') || name == "node_modules" {
                continue;
            }
            if path.join("project.json").exists() {
                packages.push(PackageInfo {
                    name,
                    path: path.clone(),
                    kind: MonorepoKind::NxMonorepo,
                    language: "typescript".to_string(),
                });
            } else {
                scan_for_project_json(&path, packages, max_depth - 1);
            }
        }
    }
}

impl std::fmt::Display for MonorepoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonorepoKind::CargoWorkspace => write!(f, "Cargo workspace"),
            MonorepoKind::NpmWorkspaces => write!(f, "npm workspaces"),
            MonorepoKind::GoWorkspace => write!(f, "Go workspace"),
            MonorepoKind::NxMonorepo => write!(f, "Nx monorepo"),
            MonorepoKind::TurboMonorepo => write!(f, "Turbo monorepo"),
            MonorepoKind::LernaMonorepo => write!(f, "Lerna monorepo"),
            MonorepoKind::PythonPackages => write!(f, "Python packages"),
            MonorepoKind::TopLevelDirectories => write!(f, "top-level directories (fallback)"),
            MonorepoKind::None => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_cargo_workspace() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "\n[workspace]\nmembers = [\"crates/core\", \"crates/cli\"]\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("crates/core")).unwrap();
        fs::create_dir_all(dir.path().join("crates/cli")).unwrap();

        let layout = detect_monorepo(dir.path());
        assert_eq!(layout.kind, MonorepoKind::CargoWorkspace);
        assert_eq!(layout.packages.len(), 2);
    }

    #[test]
    fn test_detect_npm_workspaces() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "root", "workspaces": ["packages/*"] }"#,
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("packages/web")).unwrap();
        fs::create_dir_all(dir.path().join("packages/api")).unwrap();

        let layout = detect_monorepo(dir.path());
        assert_eq!(layout.kind, MonorepoKind::NpmWorkspaces);
        assert_eq!(layout.packages.len(), 2);
    }

    #[test]
    fn test_detect_go_workspace() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.work"), "go 1.21\n\nuse (\n\t./svc\n\t./lib\n)\n").unwrap();
        fs::create_dir_all(dir.path().join("svc")).unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();

        let layout = detect_monorepo(dir.path());
        assert_eq!(layout.kind, MonorepoKind::GoWorkspace);
        assert_eq!(layout.packages.len(), 2);
    }

    #[test]
    fn test_detect_python_packages() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("service_a")).unwrap();
        fs::create_dir_all(dir.path().join("service_b")).unwrap();
        fs::write(dir.path().join("service_a/pyproject.toml"), "[project]\nname='a'\n").unwrap();
        fs::write(dir.path().join("service_b/setup.py"), "").unwrap();

        let layout = detect_monorepo(dir.path());
        assert_eq!(layout.kind, MonorepoKind::PythonPackages);
        assert_eq!(layout.packages.len(), 2);
    }

    #[test]
    fn test_fallback_top_level_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("frontend")).unwrap();
        fs::create_dir_all(dir.path().join("backend")).unwrap();
        fs::write(dir.path().join("frontend/index.js"), "").unwrap();
        fs::write(dir.path().join("backend/main.go"), "").unwrap();

        let layout = detect_monorepo(dir.path());
        assert_eq!(layout.kind, MonorepoKind::TopLevelDirectories);
        assert_eq!(layout.packages.len(), 2);
    }

    #[test]
    fn test_detect_no_monorepo_single_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.go"), "package main").unwrap();

        let layout = detect_monorepo(dir.path());
        assert_eq!(layout.kind, MonorepoKind::None);
    }

    #[test]
    fn test_extract_toml_array_inline() {
        let content = "\n[workspace]\nmembers = [\"a\", \"b\", \"c\"]\n";
        let vals = extract_toml_array(content, "members").unwrap();
        assert_eq!(vals, vec!["a", "b", "c"]);
    }
}
