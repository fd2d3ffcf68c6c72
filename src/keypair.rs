//! Key generation, signing and verification over secp256k1, compatible with the
//! signatures produced and accepted by the JavaScript `elliptic` library.
//!
//! Messages are hashed with a single SHA-256 and the raw 32-byte digest is what gets
//! signed. The free functions draw randomness from the operating system; use
//! [`KeyPairService`] to supply another random source or change [`SignerConfig`].

use log::debug;
use rand::{TryCryptoRng, rngs::OsRng};

use crate::{
    ecc::ecdsa::{PrivateKey, PublicKey, Signature},
    error::Result,
    utils::sha256::sha256,
};

/// Options applied when producing signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignerConfig {
    /// Replace `s` with `n - s` when it is above n/2 (elliptic's `canonical: true`).
    pub low_s: bool,
}

impl SignerConfig {
    pub fn with_low_s(mut self, low_s: bool) -> Self {
        self.low_s = low_s;
        self
    }
}

#[derive(Debug)]
pub struct KeyPairService<R = OsRng> {
    rng: R,
    config: SignerConfig,
}

impl KeyPairService<OsRng> {
    pub fn new() -> Self {
        Self::with_rng(OsRng)
    }
}

impl Default for KeyPairService<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: TryCryptoRng> KeyPairService<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            config: SignerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SignerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> SignerConfig {
        self.config
    }

    /// Draws a private scalar uniformly from `[1, n - 1]`.
    ///
    /// Fails with [`Error::RandomSource`](crate::Error::RandomSource) if the random
    /// source fails; no key is returned in that case.
    pub fn generate_private_key(&mut self) -> Result<PrivateKey> {
        let private_key = PrivateKey::random(&mut self.rng)?;
        debug!("generated private key");
        Ok(private_key)
    }

    /// `private_key * G`. Deterministic.
    pub fn generate_public_key(&self, private_key: &PrivateKey) -> PublicKey {
        private_key.public_key()
    }

    /// Signs `SHA-256(message)` with a fresh random nonce.
    pub fn sign_message(
        &mut self,
        message: impl AsRef<[u8]>,
        private_key: &PrivateKey,
    ) -> Result<Signature> {
        self.sign_digest(&sha256(message.as_ref()), private_key)
    }

    /// Signs an already computed SHA-256 digest.
    pub fn sign_digest(
        &mut self,
        message_hash: &[u8; 32],
        private_key: &PrivateKey,
    ) -> Result<Signature> {
        let signature = private_key.sign(message_hash, &mut self.rng)?;
        let signature = if self.config.low_s {
            signature.normalize_s()
        } else {
            signature
        };
        debug!(
            "signed digest {}.. r={}..",
            hex::encode(&message_hash[..4]),
            &signature.r_hex()[..8]
        );
        Ok(signature)
    }

    pub fn verify_message(
        &self,
        message: impl AsRef<[u8]>,
        public_key: &PublicKey,
        signature: &Signature,
    ) -> bool {
        verify_digest(&sha256(message.as_ref()), public_key, signature)
    }
}

/// Generates a private key from the operating system's random source.
pub fn generate_private_key() -> Result<PrivateKey> {
    KeyPairService::new().generate_private_key()
}

pub fn generate_public_key(private_key: &PrivateKey) -> PublicKey {
    private_key.public_key()
}

/// Signs `SHA-256(message)` using the operating system's random source for the nonce.
pub fn sign_message(message: impl AsRef<[u8]>, private_key: &PrivateKey) -> Result<Signature> {
    KeyPairService::new().sign_message(message, private_key)
}

/// Returns whether `signature` is a valid signature of `SHA-256(message)` under `public_key`.
///
/// Exactly one verification is performed over the raw digest bytes.
pub fn verify_message(
    message: impl AsRef<[u8]>,
    public_key: &PublicKey,
    signature: &Signature,
) -> bool {
    verify_digest(&sha256(message.as_ref()), public_key, signature)
}

pub fn verify_digest(message_hash: &[u8; 32], public_key: &PublicKey, signature: &Signature) -> bool {
    let valid = public_key.verify_signature(message_hash, signature);
    debug!(
        "verified digest {}.. against {}..: {valid}",
        hex::encode(&message_hash[..4]),
        &public_key.to_hex()[..10]
    );
    valid
}

#[cfg(test)]
mod test {
    use primitive_types::U256;
    use rand::{SeedableRng, TryRngCore, rngs::StdRng};

    use super::*;
    use crate::{Error, ecc::secp256k1::Curve};

    #[derive(Debug)]
    struct FailingRng;

    impl TryRngCore for FailingRng {
        type Error = std::io::Error;

        fn try_next_u32(&mut self) -> std::result::Result<u32, Self::Error> {
            Err(std::io::Error::other("entropy source unavailable"))
        }

        fn try_next_u64(&mut self) -> std::result::Result<u64, Self::Error> {
            Err(std::io::Error::other("entropy source unavailable"))
        }

        fn try_fill_bytes(&mut self, _dst: &mut [u8]) -> std::result::Result<(), Self::Error> {
            Err(std::io::Error::other("entropy source unavailable"))
        }
    }

    impl TryCryptoRng for FailingRng {}

    fn seeded(seed: u64) -> KeyPairService<StdRng> {
        KeyPairService::with_rng(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn generated_keys_are_in_range() {
        let mut service = seeded(1);
        for _ in 0..32 {
            let key = service.generate_private_key().unwrap().as_u256();
            assert!(key > U256::zero());
            assert!(key < Curve::N);
        }

        let key = generate_private_key().unwrap().as_u256();
        assert!(key > U256::zero() && key < Curve::N);
    }

    #[test]
    fn public_key_is_deterministic() {
        let private_key = generate_private_key().unwrap();
        let first = generate_public_key(&private_key);
        let second = seeded(2).generate_public_key(&private_key);
        assert_eq!(first, second);
        assert_eq!(first, private_key.public_key());
    }

    #[test]
    fn hello_world_scenario() {
        let k1 = generate_private_key().unwrap();
        let p1 = generate_public_key(&k1);
        let s1 = sign_message("hello world", &k1).unwrap();

        assert!(verify_message("hello world", &p1, &s1));
        assert!(!verify_message("hello World", &p1, &s1));
    }

    #[test]
    fn mismatched_public_key_fails() {
        let mut service = seeded(3);
        let signer = service.generate_private_key().unwrap();
        let other = service.generate_private_key().unwrap();
        let signature = service.sign_message(b"payload", &signer).unwrap();

        assert!(service.verify_message(b"payload", &signer.public_key(), &signature));
        assert!(!service.verify_message(b"payload", &other.public_key(), &signature));
    }

    #[test]
    fn signatures_are_randomized() {
        let private_key = generate_private_key().unwrap();
        let public_key = generate_public_key(&private_key);

        let first = sign_message("same message", &private_key).unwrap();
        let second = sign_message("same message", &private_key).unwrap();
        assert_ne!((first.r(), first.s()), (second.r(), second.s()));
        assert!(verify_message("same message", &public_key, &first));
        assert!(verify_message("same message", &public_key, &second));
    }

    #[test]
    fn round_trip_many_messages() {
        let mut service = seeded(4);
        let private_key = service.generate_private_key().unwrap();
        let public_key = service.generate_public_key(&private_key);

        for message in ["", "a", "hello world", "\u{1F980} unicode", &"x".repeat(10_000)] {
            let signature = service.sign_message(message, &private_key).unwrap();
            assert!(service.verify_message(message, &public_key, &signature));
            assert!(!service.verify_message(format!("{message}!"), &public_key, &signature));
        }
    }

    #[test]
    fn low_s_config() {
        let mut service = seeded(5).with_config(SignerConfig::default().with_low_s(true));
        assert!(service.config().low_s);
        let private_key = service.generate_private_key().unwrap();
        let public_key = private_key.public_key();

        for i in 0..32 {
            let message = format!("message {i}");
            let signature = service.sign_message(&message, &private_key).unwrap();
            assert!(signature.is_low_s());
            assert!(verify_message(&message, &public_key, &signature));
        }
    }

    #[test]
    fn default_config_keeps_high_s() {
        let mut service = seeded(6);
        assert_eq!(service.config(), SignerConfig::default());
        let private_key = service.generate_private_key().unwrap();
        let public_key = private_key.public_key();

        // With 64 unnormalized signatures, a high s shows up with overwhelming probability.
        let mut saw_high_s = false;
        for i in 0..64 {
            let message = format!("message {i}");
            let signature = service.sign_message(&message, &private_key).unwrap();
            saw_high_s |= !signature.is_low_s();
            assert!(service.verify_message(&message, &public_key, &signature));
        }
        assert!(saw_high_s);
    }

    #[test]
    fn sign_digest_matches_sign_message() {
        let private_key = PrivateKey::new(42.into()).unwrap();
        let from_message = seeded(8).sign_message("digest", &private_key).unwrap();
        let from_digest = seeded(8)
            .sign_digest(&sha256(b"digest"), &private_key)
            .unwrap();
        assert_eq!(from_message, from_digest);
        assert!(verify_digest(
            &sha256(b"digest"),
            &private_key.public_key(),
            &from_digest
        ));
    }

    #[test]
    fn random_source_failure_surfaces() {
        let mut service = KeyPairService::with_rng(FailingRng);
        assert!(matches!(
            service.generate_private_key(),
            Err(Error::RandomSource(_))
        ));

        let private_key = PrivateKey::new(7.into()).unwrap();
        assert!(matches!(
            service.sign_message("hello world", &private_key),
            Err(Error::RandomSource(_))
        ));
    }

    #[test]
    fn degenerate_keys_rejected() {
        assert!(matches!(
            PrivateKey::new(U256::zero()),
            Err(Error::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            PrivateKey::new(Curve::N),
            Err(Error::InvalidPrivateKey(_))
        ));
    }
}
