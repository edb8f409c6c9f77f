//! Device key generation and comparison.

use rand::RngCore;

/// Length of a device key in hex characters.
pub const DEVICE_KEY_LEN: usize = 32;

/// Generates a new device shared secret: 32 lowercase hex characters
/// (128 bits of randomness).
pub fn generate_device_key() -> String {
    let mut bytes = [0u8; DEVICE_KEY_LEN / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compares two secrets in constant time with respect to the contents
/// of `expected`.
///
/// The comparison always scans the full length of `expected`, so a
/// mismatching prefix does not return early. Length mismatch is still
/// observable, which is acceptable since key length is public.
pub fn constant_time_eq(presented: &str, expected: &str) -> bool {
    let a = presented.as_bytes();
    let b = expected.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_device_key_length() {
        let key = generate_device_key();
        assert_eq!(key.len(), DEVICE_KEY_LEN);
    }

    #[test]
    fn test_generate_device_key_is_hex() {
        let key = generate_device_key();
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(key.chars().all(|c| !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_device_key_unique() {
        assert_ne!(generate_device_key(), generate_device_key());
    }

    #[test]
    fn test_constant_time_eq_match() {
        assert!(constant_time_eq("abcdef", "abcdef"));
    }

    #[test]
    fn test_constant_time_eq_mismatch() {
        assert!(!constant_time_eq("abcdef", "abcdeg"));
        assert!(!constant_time_eq("abcdef", "zbcdef"));
    }

    #[test]
    fn test_constant_time_eq_length_mismatch() {
        assert!(!constant_time_eq("abc", "abcdef"));
        assert!(!constant_time_eq("", "a"));
    }

    #[test]
    fn test_constant_time_eq_empty() {
        assert!(constant_time_eq("", ""));
    }
}
