use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compares two token strings in constant time.
///
/// Length is not treated as secret; content comparison never short-circuits.
#[inline]
pub fn token_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

/// A short SHA-256 prefix of a token, safe to write to logs.
///
/// Raw token values must never reach the log stream.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_eq_matches_exact_strings() {
        assert!(token_eq("abc.def.ghi", "abc.def.ghi"));
        assert!(!token_eq("abc.def.ghi", "abc.def.ghj"));
        assert!(!token_eq("abc", "abcd"));
        assert!(token_eq("", ""));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let fp = token_fingerprint("some-refresh-token");
        assert_eq!(fp, token_fingerprint("some-refresh-token"));
        assert_eq!(fp.len(), 16);
        assert_ne!(fp, token_fingerprint("another-refresh-token"));
    }
}
