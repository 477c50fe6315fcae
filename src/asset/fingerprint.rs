//! Content fingerprints for cache busting.
//!
//! Fingerprints are blake3 digests of an asset's final bytes, hex encoded.
//! Names embed a truncated prefix; the full digest is kept so any
//! truncation length can be rendered later.

/// Full-length (64 hex chars) fingerprint of `bytes`.
pub fn compute(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// Truncate a full fingerprint to `len` characters.
#[inline]
pub fn truncate(full: &str, len: usize) -> &str {
    &full[..len.min(full.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_is_deterministic() {
        let a = compute(b"body { color: red; }");
        let b = compute(b"body { color: red; }");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_compute_changes_with_content() {
        assert_ne!(compute(b"console.log(1)"), compute(b"console.log(2)"));
    }

    #[test]
    fn test_truncate() {
        let full = compute(b"x");
        assert_eq!(truncate(&full, 8).len(), 8);
        assert_eq!(truncate(&full, 100), full);
    }
}
