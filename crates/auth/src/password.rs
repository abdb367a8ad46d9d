//! Password hashing.
//!
//! One-way SHA-256, stored as lowercase hex. Verification compares the full
//! digest in constant time so timing does not leak how much of it matched.

use sha2::{Digest, Sha256};

/// Hash a plaintext password to its stored representation.
pub fn hash_password(plain: &str) -> String {
    let digest = Sha256::digest(plain.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    let computed = hash_password(plain);
    constant_time_eq(computed.as_bytes(), stored_hash.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
