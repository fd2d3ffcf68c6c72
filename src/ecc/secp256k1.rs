//! secp256k1 curve parameters and the glue between `U256` integers and `k256` scalars.
// • a = 0, b = 7, making the equation y2 = x3 + 7
// • p = 2^256 – 2^32 – 977
// • Gx =
// 0x79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798
// • Gy =
// 0x483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8
// • n = 0xfffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141

use k256::{
    FieldBytes, Scalar,
    elliptic_curve::{PrimeField, ops::Reduce},
};
use log::trace;
use primitive_types::U256;
use rand::TryCryptoRng;

use crate::error::{Error, Result};

/// Domain parameters of secp256k1. Limbs are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Curve {
    pub p: U256,
    pub a: U256,
    pub b: U256,
    pub gx: U256,
    pub gy: U256,
    pub n: U256,
}

impl Curve {
    pub const P: U256 = U256([
        0xFFFFFFFEFFFFFC2F,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
    ]);
    pub const A: U256 = U256([0, 0, 0, 0]);
    pub const B: U256 = U256([7, 0, 0, 0]);
    pub const GX: U256 = U256([
        0x59F2815B16F81798,
        0x029BFCDB2DCE28D9,
        0x55A06295CE870B07,
        0x79BE667EF9DCBBAC,
    ]);
    pub const GY: U256 = U256([
        0x9C47D08FFB10D4B8,
        0xFD17B448A6855419,
        0x5DA4FBFC0E1108A8,
        0x483ADA7726A3C465,
    ]);
    pub const N: U256 = U256([
        0xBFD25E8CD0364141,
        0xBAAEDCE6AF48A03B,
        0xFFFFFFFFFFFFFFFE,
        0xFFFFFFFFFFFFFFFF,
    ]);
    /// floor(n / 2), the largest S of a low-S signature.
    pub const HALF_N: U256 = U256([
        0xDFE92F46681B20A0,
        0x5D576E7357A4501D,
        0xFFFFFFFFFFFFFFFF,
        0x7FFFFFFFFFFFFFFF,
    ]);

    pub fn secp256k1() -> &'static Curve {
        &SECP256K1
    }
}

static SECP256K1: Curve = Curve {
    p: Curve::P,
    a: Curve::A,
    b: Curve::B,
    gx: Curve::GX,
    gy: Curve::GY,
    n: Curve::N,
};

pub(crate) fn u256_to_field_bytes(value: U256) -> FieldBytes {
    FieldBytes::from(value.to_big_endian())
}

pub(crate) fn field_bytes_to_u256(bytes: &FieldBytes) -> U256 {
    U256::from_big_endian(&bytes[..])
}

pub(crate) fn scalar_to_u256(scalar: &Scalar) -> U256 {
    field_bytes_to_u256(&scalar.to_bytes())
}

/// Returns the scalar for `value` if it lies in `[1, n - 1]`.
pub(crate) fn scalar_in_range(value: U256) -> Option<Scalar> {
    let scalar: Option<Scalar> = Scalar::from_repr(u256_to_field_bytes(value)).into();
    scalar.filter(|s| !bool::from(s.is_zero()))
}

/// Interprets 32 big-endian bytes as an integer reduced mod n.
pub(crate) fn reduce_bytes(bytes: &FieldBytes) -> Scalar {
    <Scalar as Reduce<k256::U256>>::reduce_bytes(bytes)
}

pub(crate) fn digest_scalar(message_hash: &[u8; 32]) -> Scalar {
    reduce_bytes(&FieldBytes::from(*message_hash))
}

/// Draws a uniform scalar in `[1, n - 1]` by rejection sampling 32-byte candidates.
pub(crate) fn random_scalar<R: TryCryptoRng + ?Sized>(rng: &mut R) -> Result<Scalar> {
    loop {
        let mut candidate = [0u8; 32];
        rng.try_fill_bytes(&mut candidate)
            .map_err(|e| Error::RandomSource(e.to_string()))?;

        if let Some(scalar) = scalar_in_range(U256::from_big_endian(&candidate)) {
            return Ok(scalar);
        }
        trace!("random candidate outside [1, n - 1], drawing again");
    }
}
