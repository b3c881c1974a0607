//! Configuration file loading for pui.
//!
//! Reads `.pui/config.json` and provides typed access to all settings.
//! Falls back to sensible defaults when the config file is missing or incomplete.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level pui configuration (spec §6, "Configuration keys").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuiConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub parsing: ParsingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Discovery and indexing tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Language selection and overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsingConfig {
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub language_overrides: std::collections::HashMap<String, String>,
}

/// Default pack output tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_format")]
    pub format: String,
}

/// Built-in directories and binary extensions excluded unless overridden
/// (spec §4.2). Mirrors `pui_parsers::ignore_resolver::BUILTIN_EXCLUDES` /
/// `BUILTIN_BINARY_EXTENSIONS` -- duplicated rather than shared because
/// pui-core can't depend on pui-parsers.
fn default_exclude_dirs() -> Vec<String> {
    let dirs = [
        ".git", ".hg", ".svn", "venv", ".venv", "node_modules", "target", ".pui", "vendor",
        "dist", "build",
    ];
    let binary_exts = [
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "pdf", "zip", "tar", "gz", "bz2", "xz",
        "7z", "rar", "so", "dylib", "dll", "exe", "o", "a", "class", "jar", "wasm", "pyc", "woff",
        "woff2", "ttf", "eot", "mp3", "mp4", "mov", "avi", "db", "sqlite", "sqlite3",
    ];
    dirs.iter()
        .map(|d| format!("**/{d}/**"))
        .chain(binary_exts.iter().map(|ext| format!("**/*.{ext}")))
        .collect()
}
fn default_max_file_size() -> u64 {
    2 * 1024 * 1024 // 2 MiB
}
fn default_workers() -> usize {
    num_cpus::get()
}
fn default_batch_size() -> usize {
    200
}
fn default_languages() -> Vec<String> {
    vec![
        "python".to_string(),
        "javascript".to_string(),
        "typescript".to_string(),
        "go".to_string(),
        "rust".to_string(),
        "c".to_string(),
        "cpp".to_string(),
    ]
}
fn default_max_tokens() -> usize {
    4000
}
fn default_format() -> String {
    "markdown".to_string()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            max_file_size: default_max_file_size(),
            workers: default_workers(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            language_overrides: std::collections::HashMap::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            format: default_format(),
        }
    }
}

impl Default for PuiConfig {
    fn default() -> Self {
        Self {
            index: IndexConfig::default(),
            parsing: ParsingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PuiConfig {
    /// Load configuration from `.pui/config.json` inside the given pui
    /// directory. Returns defaults if the file doesn't exist or can't be
    /// parsed; a parse failure is logged, never fatal.
    pub fn load(pui_dir: &Path) -> Self {
        let config_path = pui_dir.join("config.json");
        let content = match std::fs::read_to_string(&config_path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!(
                    "pui: warning: failed to parse {}: {}, using defaults",
                    config_path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Write the effective configuration back to `.pui/config.json`, so
    /// later commands observe exactly what the last index run used.
    pub fn save(&self, pui_dir: &Path) -> std::io::Result<()> {
        let config_path = pui_dir.join("config.json");
        let json = serde_json::to_string_pretty(self).expect("PuiConfig always serializes");
        std::fs::write(config_path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let cfg = PuiConfig::default();
        assert_eq!(cfg.index.batch_size, 200);
        assert_eq!(cfg.index.max_file_size, 2 * 1024 * 1024);
        assert!(cfg.index.workers >= 1);
        assert_eq!(cfg.output.max_tokens, 4000);
        assert_eq!(cfg.output.format, "markdown");
        assert!(cfg.parsing.languages.contains(&"rust".to_string()));
    }

    #[test]
    fn test_default_exclude_dirs_covers_spec_builtins() {
        let dirs = default_exclude_dirs();
        for must_have in ["**/.hg/**", "**/.svn/**", "**/venv/**", "**/.venv/**", "**/*.png", "**/*.so"] {
            assert!(dirs.contains(&must_have.to_string()), "missing {must_have}");
        }
    }

    #[test]
    fn test_load_missing_file() {
        let cfg = PuiConfig::load(Path::new("/nonexistent"));
        assert_eq!(cfg.index.batch_size, 200);
    }

    #[test]
    fn test_load_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = serde_json::json!({
            "index": { "max_file_size": 1024, "workers": 2, "batch_size": 10 },
            "output": { "max_tokens": 8000, "format": "json" }
        });
        fs::write(dir.path().join("config.json"), config.to_string()).unwrap();
        let cfg = PuiConfig::load(dir.path());
        assert_eq!(cfg.index.max_file_size, 1024);
        assert_eq!(cfg.index.workers, 2);
        assert_eq!(cfg.index.batch_size, 10);
        assert_eq!(cfg.output.max_tokens, 8000);
        assert_eq!(cfg.output.format, "json");
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = serde_json::json!({ "parsing": { "languages": ["go"] } });
        fs::write(dir.path().join("config.json"), config.to_string()).unwrap();
        let cfg = PuiConfig::load(dir.path());
        assert_eq!(cfg.parsing.languages, vec!["go"]);
        assert_eq!(cfg.index.batch_size, 200); // default
        assert_eq!(cfg.output.max_tokens, 4000); // default
    }

    #[test]
    fn test_load_malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        let cfg = PuiConfig::load(dir.path());
        assert_eq!(cfg, PuiConfig::default());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = PuiConfig::default();
        cfg.output.max_tokens = 12000;
        cfg.save(dir.path()).unwrap();
        let reloaded = PuiConfig::load(dir.path());
        assert_eq!(reloaded.output.max_tokens, 12000);
    }
}
