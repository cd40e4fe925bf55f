//! BlurHash well-formedness checks.
//!
//! Placeholder hashes arrive from the intake pipeline and come back out of
//! the metadata store; both sides check them here before trusting them.

/// Base-83 alphabet of the BlurHash encoding
pub const BASE83_ALPHABET: &[u8; 83] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz#$%*+,-.:;=?@[]^_{|}~";

/// Single-component hash of the placeholder colour (#fafafa)
pub const FALLBACK_BLURHASH: &str = "00S$ov";

pub fn decode83(c: u8) -> Option<u64> {
    BASE83_ALPHABET
        .iter()
        .position(|&b| b == c)
        .map(|p| p as u64)
}

/// Whether `hash` is a structurally valid BlurHash
///
/// At least 6 characters, all from the base-83 alphabet, and exactly
/// `4 + 2 * nx * ny` long for the component counts in the size flag.
pub fn is_valid_blurhash(hash: &str) -> bool {
    let bytes = hash.as_bytes();
    if bytes.len() < 6 {
        return false;
    }
    if !bytes.iter().all(|&b| decode83(b).is_some()) {
        return false;
    }
    let Some(size_flag) = decode83(bytes[0]) else {
        return false;
    };
    let num_y = size_flag / 9 + 1;
    let num_x = size_flag % 9 + 1;
    bytes.len() as u64 == 4 + 2 * num_x * num_y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_blurhash() {
        assert!(is_valid_blurhash("LEHV6nWB2yk8pyo0adR*.7kCMdnj"));
        assert!(is_valid_blurhash("00OZZy"));
        assert!(!is_valid_blurhash(""));
        assert!(!is_valid_blurhash("L0TSU"));
        assert!(!is_valid_blurhash("not a blurhash!"));
        // length disagrees with the 4x3 size flag
        assert!(!is_valid_blurhash("LEHV6nWB2yk8pyo0adR*.7kCMdn"));
        // character outside the base-83 alphabet
        assert!(!is_valid_blurhash("LEHV6nWB2yk8pyo0adR*.7kCMd\"j"));
    }

    #[test]
    fn test_fallback_is_valid() {
        assert!(is_valid_blurhash(FALLBACK_BLURHASH));
    }
}
