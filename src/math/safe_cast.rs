//! Narrowing conversions that fail instead of truncating.

use crate::U160_MAX;
use crate::error::MathError;
use alloy_primitives::{I256, U256};

/// Casts to a 160-bit value (kept in a `U256`), failing above `2^160 - 1`.
#[inline]
pub fn to_u160(x: U256) -> Result<U256, MathError> {
    if x > U160_MAX {
        return Err(MathError::UnsafeCast);
    }
    Ok(x)
}

/// Reinterprets an unsigned value as signed, failing at or above `2^255`.
#[inline]
pub fn to_i256(x: U256) -> Result<I256, MathError> {
    if x.bit(255) {
        return Err(MathError::UnsafeCast);
    }
    Ok(I256::from_raw(x))
}

#[inline]
pub fn to_u128(x: U256) -> Result<u128, MathError> {
    u128::try_from(x).map_err(|_| MathError::UnsafeCast)
}

#[inline]
pub fn to_i128(x: u128) -> Result<i128, MathError> {
    i128::try_from(x).map_err(|_| MathError::UnsafeCast)
}

/// Keeps the low 128 bits. Owed-token and protocol-fee counters are
/// `u128` and accumulate with wrapping arithmetic.
#[inline]
pub fn truncate_u128(x: U256) -> u128 {
    let limbs = x.as_limbs();
    (u128::from(limbs[1]) << 64) | u128::from(limbs[0])
}
