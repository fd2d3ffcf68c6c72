use std::fmt::{Debug, Display};

use k256::{
    AffinePoint, ProjectivePoint, Scalar,
    elliptic_curve::{Group, point::AffineCoordinates, sec1::ToEncodedPoint},
};
use log::trace;
use primitive_types::U256;
use rand::TryCryptoRng;

use super::secp256k1::{
    Curve, digest_scalar, random_scalar, reduce_bytes, scalar_in_range, scalar_to_u256,
};
use crate::{
    error::{Error, Result},
    utils::parse_hex_u256,
};

const SECRET_KEY_SIZE: usize = 32;
const COMPRESSED_SIZE: usize = 33;
const UNCOMPRESSED_SIZE: usize = 65;

/// Represents an ECDSA signature, consisting of two scalar values, r and s.
///
/// Both are integers modulo the curve order. A signature built with [`Signature::new`]
/// is not range checked; verification rejects out-of-range components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    r: U256,
    s: U256,
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}, {})", self.r_hex(), self.s_hex())
    }
}

impl Signature {
    pub fn new(r: U256, s: U256) -> Self {
        Self { r, s }
    }

    /// Builds a signature from untrusted components, requiring `1 <= r, s < n`.
    pub fn try_new(r: U256, s: U256) -> Result<Self> {
        if scalar_in_range(r).is_none() {
            return Err(Error::InvalidSignature("r outside [1, n - 1]".to_string()));
        }
        if scalar_in_range(s).is_none() {
            return Err(Error::InvalidSignature("s outside [1, n - 1]".to_string()));
        }
        Ok(Self { r, s })
    }

    /// Parses the `{ r, s }` hex pair elliptic produces.
    pub fn from_hex_parts(r: &str, s: &str) -> Result<Self> {
        Self::try_new(parse_hex_u256(r)?, parse_hex_u256(s)?)
    }

    pub fn r(&self) -> U256 {
        self.r
    }

    pub fn s(&self) -> U256 {
        self.s
    }

    pub fn r_hex(&self) -> String {
        hex::encode(self.r.to_big_endian())
    }

    pub fn s_hex(&self) -> String {
        hex::encode(self.s.to_big_endian())
    }

    pub fn is_low_s(&self) -> bool {
        self.s <= Curve::HALF_N
    }

    /// Returns the equivalent signature `(r, n - s)` when s is above n/2.
    pub fn normalize_s(&self) -> Self {
        if self.is_low_s() || self.s >= Curve::N {
            *self
        } else {
            Self::new(self.r, Curve::N - self.s)
        }
    }

    /// Helper function to encode a U256 into DER INTEGER format.
    /// This produces a byte vector: [0x02, len, value_bytes].
    fn encode_der_integer(value: U256) -> Vec<u8> {
        let bytes = value.to_big_endian();
        // Keep at least one byte so that zero encodes as [0x00].
        let first_non_zero_idx = bytes
            .iter()
            .position(|b| *b != 0x00)
            .unwrap_or(bytes.len() - 1);
        let bytes = &bytes[first_non_zero_idx..];

        // A set high bit would read as negative, so pad with 0x00.
        let pad = bytes[0] & 0x80 != 0;
        let value_len = bytes.len() + usize::from(pad);

        let mut der_int = Vec::with_capacity(2 + value_len);
        der_int.push(Self::INTEGER_TAG);
        der_int.push(value_len as u8); // at most 33
        if pad {
            der_int.push(0x00);
        }
        der_int.extend_from_slice(bytes);
        der_int
    }

    /// Reads one DER INTEGER starting at `*pos`, advancing past it.
    fn parse_der_integer(raw: &[u8], pos: &mut usize) -> Result<U256> {
        if raw.get(*pos) != Some(&Self::INTEGER_TAG) {
            return Err(Error::InvalidDER);
        }
        let len = *raw.get(*pos + 1).ok_or(Error::InvalidDER)? as usize;
        let start = *pos + 2;
        let bytes = raw.get(start..start + len).ok_or(Error::InvalidDER)?;
        if bytes.is_empty() || bytes[0] & 0x80 != 0 {
            return Err(Error::InvalidDER);
        }
        let first_non_zero_idx = bytes.iter().position(|b| *b != 0x00).unwrap_or(bytes.len());
        let significant = &bytes[first_non_zero_idx..];
        if significant.len() > 32 {
            return Err(Error::InvalidDER);
        }
        *pos = start + len;
        Ok(U256::from_big_endian(significant))
    }

    const SEQUENCE_TAG: u8 = 0x30;
    const INTEGER_TAG: u8 = 0x02;

    pub fn serialize_der(&self) -> Vec<u8> {
        let r_der = Signature::encode_der_integer(self.r);
        let s_der = Signature::encode_der_integer(self.s);

        // Each integer is at most 35 bytes, so the content length fits a single byte.
        let total_content_len = r_der.len() + s_der.len();

        let mut der_signature = Vec::with_capacity(2 + total_content_len);
        der_signature.push(Self::SEQUENCE_TAG);
        der_signature.push(total_content_len as u8);
        der_signature.extend_from_slice(&r_der);
        der_signature.extend_from_slice(&s_der);
        der_signature
    }

    /// Parses a DER signature (`30 len 02 rlen r 02 slen s`), as produced by elliptic's `toDER()`.
    pub fn parse_der(raw_signature: &[u8]) -> Result<Self> {
        if raw_signature.len() < 2 || raw_signature[0] != Self::SEQUENCE_TAG {
            return Err(Error::InvalidDER);
        }
        let total_len = raw_signature[1] as usize;
        if raw_signature.len() != 2 + total_len {
            return Err(Error::InvalidDER);
        }

        let mut pos = 2;
        let r = Self::parse_der_integer(raw_signature, &mut pos)?;
        let s = Self::parse_der_integer(raw_signature, &mut pos)?;
        if pos != raw_signature.len() {
            return Err(Error::InvalidDER);
        }

        Self::try_new(r, s)
    }

    pub fn to_der_hex(&self) -> String {
        hex::encode(self.serialize_der())
    }

    pub fn from_der_hex(der: &str) -> Result<Self> {
        Self::parse_der(&hex::decode(der)?)
    }
}

/// Represents a secp256k1 private key.
/// It's a scalar value within the order of the generator point.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PrivateKey {
    secret: Scalar,
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}

impl PrivateKey {
    /// Builds a key from an integer, rejecting 0 and anything `>= n`.
    pub fn new(secret: U256) -> Result<Self> {
        let secret = scalar_in_range(secret).ok_or_else(|| {
            Error::InvalidPrivateKey("scalar must be in [1, n - 1]".to_string())
        })?;
        Ok(Self { secret })
    }

    pub(crate) fn from_scalar(secret: Scalar) -> Self {
        Self { secret }
    }

    /// Draws a fresh key from `rng`.
    pub fn random<R: TryCryptoRng + ?Sized>(rng: &mut R) -> Result<Self> {
        random_scalar(rng).map(Self::from_scalar)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(Error::InvalidPrivateKey(format!(
                "expected {SECRET_KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        Self::new(U256::from_big_endian(bytes))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        Self::new(parse_hex_u256(hex_str)?)
    }

    pub fn as_u256(&self) -> U256 {
        scalar_to_u256(&self.secret)
    }

    pub fn to_bytes(&self) -> [u8; SECRET_KEY_SIZE] {
        self.as_u256().to_big_endian()
    }

    /// Lowercase, zero-padded to 64 digits.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derives the public key corresponding to this private key.
    /// pubKey = privateKey * G (where G is the generator point)
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            point: (ProjectivePoint::GENERATOR * self.secret).to_affine(),
        }
    }

    /// Signs a 32-byte message digest with a fresh random nonce per attempt.
    ///
    /// `r = (k * G).x mod n` and `s = k^-1 * (z + r * d) mod n`. A nonce that yields
    /// a zero `r` or `s` is discarded and a new one drawn. `s` is returned as computed,
    /// without low-S normalization.
    pub fn sign<R: TryCryptoRng + ?Sized>(
        &self,
        message_hash: &[u8; 32],
        rng: &mut R,
    ) -> Result<Signature> {
        let z = digest_scalar(message_hash);

        loop {
            let k = random_scalar(rng)?;
            let r = reduce_bytes(&(ProjectivePoint::GENERATOR * k).to_affine().x());
            if bool::from(r.is_zero()) {
                trace!("nonce produced r = 0, retrying");
                continue;
            }

            let Some(k_inv) = Option::<Scalar>::from(k.invert()) else {
                continue;
            };
            let s = k_inv * (z + r * self.secret);
            if bool::from(s.is_zero()) {
                trace!("nonce produced s = 0, retrying");
                continue;
            }

            return Ok(Signature::new(scalar_to_u256(&r), scalar_to_u256(&s)));
        }
    }
}

/// A point on secp256k1, never the point at infinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: AffinePoint,
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl PublicKey {
    /// Builds a key from affine coordinates, checking the point is on the curve.
    pub fn from_coordinates(x: U256, y: U256) -> Result<Self> {
        let mut sec = [0u8; UNCOMPRESSED_SIZE];
        sec[0] = 0x04;
        sec[1..33].copy_from_slice(&x.to_big_endian());
        sec[33..65].copy_from_slice(&y.to_big_endian());
        Self::parse(&sec)
    }

    /// Parses a compressed (33 byte) or uncompressed (65 byte) SEC1 key.
    pub fn parse(sec: &[u8]) -> Result<Self> {
        if sec.len() != COMPRESSED_SIZE && sec.len() != UNCOMPRESSED_SIZE {
            return Err(Error::InvalidPublicKey(format!(
                "expected {COMPRESSED_SIZE} or {UNCOMPRESSED_SIZE} bytes, got {}",
                sec.len()
            )));
        }
        let key = k256::PublicKey::from_sec1_bytes(sec)
            .map_err(|_| Error::InvalidPublicKey("point not on curve".to_string()))?;
        Ok(Self {
            point: *key.as_affine(),
        })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self> {
        Self::parse(&hex::decode(hex_str)?)
    }

    pub fn x(&self) -> U256 {
        U256::from_big_endian(&self.serialize_uncompressed()[1..33])
    }

    pub fn y(&self) -> U256 {
        U256::from_big_endian(&self.serialize_uncompressed()[33..65])
    }

    pub fn curve(&self) -> &'static Curve {
        Curve::secp256k1()
    }

    pub fn serialize(&self) -> [u8; COMPRESSED_SIZE] {
        let mut result = [0u8; COMPRESSED_SIZE];
        result.copy_from_slice(self.point.to_encoded_point(true).as_bytes());
        result
    }

    pub fn serialize_uncompressed(&self) -> [u8; UNCOMPRESSED_SIZE] {
        let mut result = [0u8; UNCOMPRESSED_SIZE];
        result.copy_from_slice(self.point.to_encoded_point(false).as_bytes());
        result
    }

    /// Uncompressed SEC1 hex, the form elliptic's `getPublic('hex')` returns.
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize_uncompressed())
    }

    /// Checks `signature` against a 32-byte message digest.
    ///
    /// Components outside `[1, n - 1]` fail. Otherwise, with `w = s^-1`,
    /// accepts iff `(z * w * G + r * w * P).x mod n == r`. High-S signatures are accepted.
    pub fn verify_signature(&self, message_hash: &[u8; 32], signature: &Signature) -> bool {
        let (Some(r), Some(s)) = (scalar_in_range(signature.r), scalar_in_range(signature.s))
        else {
            trace!("signature component outside [1, n - 1]");
            return false;
        };
        let Some(s_inv) = Option::<Scalar>::from(s.invert()) else {
            return false;
        };

        let z = digest_scalar(message_hash);
        let u = z * s_inv;
        let v = r * s_inv;
        let total = ProjectivePoint::GENERATOR * u + ProjectivePoint::from(self.point) * v;
        if bool::from(total.is_identity()) {
            return false;
        }

        reduce_bytes(&total.to_affine().x()) == r
    }
}

impl From<&PrivateKey> for PublicKey {
    fn from(private_key: &PrivateKey) -> Self {
        private_key.public_key()
    }
}
