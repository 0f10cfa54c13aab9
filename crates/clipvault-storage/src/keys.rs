//! Key generation for stored objects.
//!
//! Keys are never checked against the store for uniqueness; 256 bits of randomness per
//! key make collisions negligible.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use clipvault_core::AspectBucket;
use rand::RngCore;

const TOKEN_BYTES: usize = 32;

/// A fresh URL-safe random token (43 characters, no padding).
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a storage key `{aspect}/{token}.{extension}` for a new object.
pub fn make_key(aspect: AspectBucket, extension: &str) -> String {
    format!(
        "{}{}.{}",
        aspect.key_prefix(),
        random_token(),
        extension.trim_start_matches('.')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashSet;

    #[test]
    fn test_key_shape_per_bucket() {
        let cases = [
            (AspectBucket::Landscape, r"^landscape/[A-Za-z0-9_-]{43}\.mp4$"),
            (AspectBucket::Portrait, r"^portrait/[A-Za-z0-9_-]{43}\.mp4$"),
            (AspectBucket::Other, r"^other/[A-Za-z0-9_-]{43}\.mp4$"),
        ];
        for (aspect, pattern) in cases {
            let re = Regex::new(pattern).unwrap();
            let key = make_key(aspect, "mp4");
            assert!(re.is_match(&key), "{key} does not match {pattern}");
        }
    }

    #[test]
    fn test_leading_dot_in_extension() {
        let key = make_key(AspectBucket::Other, ".mp4");
        assert!(key.ends_with(".mp4"));
        assert!(!key.ends_with("..mp4"));
    }

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<String> = (0..10_000)
            .map(|_| make_key(AspectBucket::Landscape, "mp4"))
            .collect();
        assert_eq!(keys.len(), 10_000);
    }
}
