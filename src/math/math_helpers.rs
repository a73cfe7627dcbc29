use crate::error::MathError;
use alloy_primitives::U256;

const U256_TWO: U256 = U256::from_limbs([2, 0, 0, 0]);
const U256_THREE: U256 = U256::from_limbs([3, 0, 0, 0]);

/// Computes `floor(a * b / denominator)` with a full 512‑bit intermediate
/// product, returning a `MathError` on overflow or division by zero.
///
/// Underpins every price, amount and fee computation in the crate.
#[inline(always)]
pub fn mul_div(a: U256, b: U256, mut denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }

    // 512-bit product split into [prod1 prod0]
    let mm = a.mul_mod(b, U256::MAX);
    let mut prod0 = a.wrapping_mul(b);

    let (mut prod1, borrow1) = mm.overflowing_sub(prod0);
    if borrow1 {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    if prod1.is_zero() {
        return Ok(prod0.wrapping_div(denominator));
    }

    // result must fit in 256 bits
    if denominator <= prod1 {
        return Err(MathError::Overflow);
    }

    let remainder = a.mul_mod(b, denominator);
    let (prod0_new, borrow2) = prod0.overflowing_sub(remainder);
    prod0 = prod0_new;
    if borrow2 {
        prod1 = prod1.wrapping_sub(U256::ONE);
    }

    // factor powers of two out of the denominator
    let twos = denominator & denominator.wrapping_neg();
    denominator = denominator.wrapping_div(twos);
    prod0 = prod0.wrapping_div(twos);

    let twos_adj = twos
        .wrapping_neg()
        .wrapping_div(twos)
        .wrapping_add(U256::ONE);
    prod0 |= prod1.wrapping_mul(twos_adj);

    // modular inverse of the odd denominator, correct to 4 bits, then
    // doubled by each Newton-Raphson round up to 256 bits
    let mut inv = U256_THREE.wrapping_mul(denominator) ^ U256_TWO;
    for _ in 0..6 {
        inv = inv.wrapping_mul(U256_TWO.wrapping_sub(denominator.wrapping_mul(inv)));
    }

    Ok(prod0.wrapping_mul(inv))
}

/// Like [`mul_div`], but rounds the result up when there is a
/// non‑zero remainder, returning an overflow error if the result
/// would exceed `U256::MAX`.
#[inline(always)]
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    let result = mul_div(a, b, denominator)?;

    if a.mul_mod(b, denominator).is_zero() {
        return Ok(result);
    }
    result.checked_add(U256::ONE).ok_or(MathError::Overflow)
}

/// Single entry point over both rounding modes.
#[inline]
pub fn mul_div_rounded(
    a: U256,
    b: U256,
    denominator: U256,
    round_up: bool,
) -> Result<U256, MathError> {
    if round_up {
        mul_div_rounding_up(a, b, denominator)
    } else {
        mul_div(a, b, denominator)
    }
}

/// Divides `a` by `b`, rounding the result up to the next integer
/// when there is a non‑zero remainder.
///
/// This will panic on division by zero, mirroring primitive integer
/// division, so callers must ensure `b != 0`.
#[inline(always)]
pub fn div_rounding_up(a: U256, b: U256) -> U256 {
    let (quotient, remainder) = a.div_rem(b);
    if remainder.is_zero() {
        quotient
    } else {
        quotient + U256::ONE
    }
}
