use sha2::{Digest, Sha256};

/// Single SHA-256 of `data`. This is the digest that gets signed and verified,
/// byte for byte what elliptic's `ec.sign(hashHex, key)` receives once decoded.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
