// Random token generation for the password-reset flow.

use rand::RngCore;

/// Generate a hex-encoded token carrying `bytes` bytes of entropy.
pub fn generate_token(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length() {
        // Hex doubles the byte count
        assert_eq!(generate_token(24).len(), 48);
        assert_eq!(generate_token(0).len(), 0);
    }

    #[test]
    fn test_token_is_hex() {
        let token = generate_token(32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_uniqueness() {
        assert_ne!(generate_token(24), generate_token(24));
    }
}
