//! Repo-root path normalization and sandboxing (spec §7 `PathEscapesRoot`).
//!
//! Every path that enters the system from the outside (CLI args, indexed
//! file paths, `--focus`/`--files` targets) is normalized and checked here
//! before anything else touches it.

use std::path::{Component, Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::error::PuiError;

/// Normalize `path` (which may be relative or absolute) against `root`,
/// returning a repo-root-relative, forward-slash, NFC-normalized string.
///
/// Rejects any path that, after resolving `.`/`..` components, would land
/// outside `root`. Never touches the filesystem (no `canonicalize`), so it
/// works for paths that don't exist yet.
pub fn normalize_in_root(root: &Path, path: &Path) -> Result<String, PuiError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };

    let resolved = resolve_components(&absolute)?;
    let root_resolved = resolve_components(root)?;

    let relative = resolved.strip_prefix(&root_resolved).map_err(|_| {
        PuiError::PathEscapesRoot(path.display().to_string())
    })?;

    let as_str = relative.to_string_lossy();
    let slashed = as_str.replace('\\', "/");
    Ok(slashed.nfc().collect::<String>())
}

/// Lexically resolve `.` and `..` components without touching the
/// filesystem. A leading `..` that would escape the path root is an error.
fn resolve_components(path: &Path) -> Result<PathBuf, PuiError> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !out.pop() {
                    return Err(PuiError::PathEscapesRoot(path.display().to_string()));
                }
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_relative_path() {
        let root = Path::new("/repo");
        let got = normalize_in_root(root, Path::new("src/main.rs")).unwrap();
        assert_eq!(got, "src/main.rs");
    }

    #[test]
    fn test_absolute_path_inside_root() {
        let root = Path::new("/repo");
        let got = normalize_in_root(root, Path::new("/repo/src/main.rs")).unwrap();
        assert_eq!(got, "src/main.rs");
    }

    #[test]
    fn test_dot_dot_inside_root_is_fine() {
        let root = Path::new("/repo");
        let got = normalize_in_root(root, Path::new("src/../src/main.rs")).unwrap();
        assert_eq!(got, "src/main.rs");
    }

    #[test]
    fn test_escaping_root_is_rejected() {
        let root = Path::new("/repo");
        let err = normalize_in_root(root, Path::new("../../etc/passwd")).unwrap_err();
        assert!(matches!(err, PuiError::PathEscapesRoot(_)));
    }

    #[test]
    fn test_absolute_path_outside_root_is_rejected() {
        let root = Path::new("/repo");
        let err = normalize_in_root(root, Path::new("/etc/passwd")).unwrap_err();
        assert!(matches!(err, PuiError::PathEscapesRoot(_)));
    }

    #[test]
    fn test_root_itself_normalizes_to_empty() {
        let root = Path::new("/repo");
        let got = normalize_in_root(root, Path::new(".")).unwrap();
        assert_eq!(got, "");
    }
}
