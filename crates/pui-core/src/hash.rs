//! Stable symbol ids and file content hashing (spec §3).

use sha2::{Digest, Sha256};
use xxhash_rust::xxh64::xxh64;

const BASE62_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode a u64 value as a base62 string (11 chars, zero-padded).
fn base62_encode(mut value: u64) -> String {
    if value == 0 {
        return "0".repeat(11);
    }
    let mut result = Vec::with_capacity(11);
    while value > 0 {
        let idx = (value % 62) as usize;
        result.push(BASE62_CHARS[idx]);
        value /= 62;
    }
    while result.len() < 11 {
        result.push(b'0');
    }
    result.reverse();
    String::from_utf8(result).expect("base62 chars are valid UTF-8")
}

/// Compute a symbol's stable id from (path, kind, qualified_name, start line).
///
/// Re-parsing an unchanged file must yield identical ids (spec §3), so this
/// is derived from structural position, not from content — a symbol whose
/// body changes keeps its id; a symbol that moves to a new line does not.
pub fn stable_symbol_id(path: &str, kind: &str, qualified_name: &str, line_start: u32) -> String {
    let mut input =
        String::with_capacity(path.len() + kind.len() + qualified_name.len() + 16);
    input.push_str(path);
    input.push('\0');
    input.push_str(kind);
    input.push('\0');
    input.push_str(qualified_name);
    input.push('\0');
    input.push_str(&line_start.to_string());

    base62_encode(xxh64(input.as_bytes(), 0))
}

/// Compute the SHA-256 content hash of a file's raw bytes, as a lowercase
/// hex string (spec §3 `File.content_hash`).
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_id_deterministic() {
        let a = stable_symbol_id("src/a.py", "function", "a.foo", 3);
        let b = stable_symbol_id("src/a.py", "function", "a.foo", 3);
        assert_eq!(a, b);
        assert_eq!(a.len(), 11);
    }

    #[test]
    fn test_stable_id_survives_unrelated_change() {
        // Same path/kind/qualified_name/line -> same id even if signature differs.
        let a = stable_symbol_id("src/a.py", "function", "a.foo", 3);
        let b = stable_symbol_id("src/a.py", "function", "a.foo", 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stable_id_changes_with_line() {
        let a = stable_symbol_id("src/a.py", "function", "a.foo", 3);
        let b = stable_symbol_id("src/a.py", "function", "a.foo", 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_stable_id_changes_with_kind() {
        let a = stable_symbol_id("src/a.py", "function", "a.foo", 3);
        let b = stable_symbol_id("src/a.py", "method", "a.foo", 3);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sha256_hex_deterministic_and_len() {
        let h1 = sha256_hex(b"def foo(): pass\n");
        let h2 = sha256_hex(b"def foo(): pass\n");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_sha256_hex_changes_with_content() {
        let h1 = sha256_hex(b"a");
        let h2 = sha256_hex(b"b");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_known_sha256_vector() {
        // sha256("") == e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
