//! secp256k1 key generation, message signing and signature verification.
//!
//! Signatures are plain ECDSA over the SHA-256 digest of a message, interchangeable
//! with those produced and checked by the JavaScript `elliptic` library.

pub mod ecc;
pub mod error;
pub mod keypair;
pub mod utils;

pub use ecc::{
    ecdsa::{PrivateKey, PublicKey, Signature},
    secp256k1::Curve,
};
pub use error::{Error, Result};
pub use keypair::{
    KeyPairService, SignerConfig, generate_private_key, generate_public_key, sign_message,
    verify_digest, verify_message,
};
