//! Prime-field arithmetic for the secret-sharing polynomial.
//!
//! All arithmetic is performed modulo the BN254 scalar-field prime. Shares
//! travel as decimal strings, so the type converts between `BigUint`,
//! decimal, and zero-padded hex.

use std::sync::LazyLock;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};
use rand::RngCore;

use crate::errors::{CryptoError, Result};

/// The BN254 scalar-field modulus (a 254-bit prime).
pub static MODULUS: LazyLock<BigUint> = LazyLock::new(|| {
    "21888242871839275222246405745257275088548364400416034343698204186575808495617"
        .parse()
        .expect("modulus literal is a valid decimal integer")
});

/// An element of the prime field, always reduced modulo [`MODULUS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// Build an element from an arbitrary integer, reducing modulo the prime.
    pub fn new(value: BigUint) -> Self {
        Self(value % &*MODULUS)
    }

    /// The additive identity.
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// The multiplicative identity.
    pub fn one() -> Self {
        Self(BigUint::one())
    }

    /// Build an element from a small integer.
    pub fn from_u64(value: u64) -> Self {
        Self::new(BigUint::from(value))
    }

    /// Interpret big-endian bytes as an integer and reduce.
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        Self::new(BigUint::from_bytes_be(bytes))
    }

    /// Parse a decimal string.
    pub fn from_decimal(s: &str) -> Result<Self> {
        let value: BigUint = s
            .parse()
            .map_err(|_| CryptoError::InvalidInput(format!("not a decimal integer: {s:?}")))?;
        Ok(Self::new(value))
    }

    /// Decimal encoding used for share transport.
    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// 64-character zero-padded lowercase hex encoding.
    pub fn to_hex_padded(&self) -> String {
        format!("{:064x}", self.0)
    }

    /// Whether this is the additive identity.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The reduced integer value.
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    /// Field addition.
    pub fn add(&self, other: &Self) -> Self {
        Self::new(&self.0 + &other.0)
    }

    /// Additive inverse.
    pub fn neg(&self) -> Self {
        if self.0.is_zero() {
            Self::zero()
        } else {
            Self(&*MODULUS - &self.0)
        }
    }

    /// Field subtraction.
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Field multiplication.
    pub fn mul(&self, other: &Self) -> Self {
        Self::new(&self.0 * &other.0)
    }

    /// Multiplicative inverse via the extended Euclidean algorithm.
    ///
    /// Fails for the zero element, which has no inverse.
    pub fn inverse(&self) -> Result<Self> {
        if self.0.is_zero() {
            return Err(CryptoError::InvalidInput(
                "zero has no modular inverse".to_string(),
            ));
        }

        let modulus = BigInt::from(MODULUS.clone());
        let mut r0 = modulus.clone();
        let mut r1 = BigInt::from(self.0.clone());
        let mut t0 = BigInt::zero();
        let mut t1 = BigInt::one();

        while !r1.is_zero() {
            let quotient = &r0 / &r1;
            let r2 = &r0 - &quotient * &r1;
            r0 = std::mem::replace(&mut r1, r2);
            let t2 = &t0 - &quotient * &t1;
            t0 = std::mem::replace(&mut t1, t2);
        }

        // The modulus is prime and self is nonzero, so gcd(self, p) = 1 and
        // t0 is the Bezout coefficient of self.
        let mut t = t0 % &modulus;
        if t.sign() == Sign::Minus {
            t += &modulus;
        }
        Ok(Self(
            t.to_biguint()
                .expect("coefficient is non-negative after normalization"),
        ))
    }

    /// Sample a uniform field element.
    ///
    /// Reduction-based: 64 random bytes are reduced modulo the 254-bit
    /// prime, leaving a bias below 2^-258.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut bytes = [0u8; 64];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::RandomGenerationFailed(e.to_string()))?;
        Ok(Self::from_bytes_be(&bytes))
    }
}
