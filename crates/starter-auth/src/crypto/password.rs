// Password hashing.
//
// scrypt (N=16384, r=16, p=1, dkLen=64) with a random 16-byte salt per call.
// Output format: "hex(salt):hex(key)". Verification compares derived keys in
// constant time.

use rand::RngCore;
use scrypt::{scrypt, Params};
use subtle::ConstantTimeEq;

use starter_auth_core::error::{AuthError, Result};

/// Hash a password using scrypt.
///
/// Returns a string in the format `salt:key` where both are hex-encoded.
/// Two calls with the same input produce different digests (fresh salt).
/// RNG or KDF failure is an error; an empty hash is never returned.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt_hex = hex::encode(salt_bytes);

    let key = generate_key(password, &salt_hex)?;
    Ok(format!("{}:{}", salt_hex, hex::encode(key)))
}

/// Hash a password that may be absent.
///
/// An absent or empty password yields `None` — the account simply has no
/// local credential. This is the only path by which "no password" is
/// represented; a plaintext or empty string is never stored as a hash.
pub fn maybe_hash_password(password: Option<&str>) -> Result<Option<String>> {
    match password {
        Some(p) if !p.is_empty() => hash_password(p).map(Some),
        _ => Ok(None),
    }
}

/// Verify a password against a hash produced by `hash_password`.
pub fn verify_password(hash: &str, password: &str) -> Result<bool> {
    let (salt, key_hex) = hash
        .split_once(':')
        .ok_or_else(|| AuthError::Crypto("Invalid password hash format".into()))?;

    let expected_key = hex::decode(key_hex)
        .map_err(|e| AuthError::Crypto(format!("Invalid hex in password hash: {e}")))?;

    let derived_key = generate_key(password, salt)?;

    Ok(constant_time_equal(&derived_key, &expected_key))
}

/// Constant-time byte comparison. Length mismatch returns early, which leaks
/// only the length, never the mismatch position.
pub fn constant_time_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Internal: derive a 64-byte key using scrypt.
fn generate_key(password: &str, salt: &str) -> Result<Vec<u8>> {
    // N=16384 → log2(N)=14, r=16, p=1, dkLen=64
    let params = Params::new(14, 16, 1, 64)
        .map_err(|e| AuthError::Crypto(format!("Invalid scrypt params: {e}")))?;

    let mut output = vec![0u8; 64];
    scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut output)
        .map_err(|e| AuthError::Crypto(format!("scrypt failed: {e}")))?;

    Ok(output)
}
