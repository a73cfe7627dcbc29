use crate::math::math_helpers::{div_rounding_up, mul_div, mul_div_rounding_up};
use crate::math::safe_cast::{to_i256, to_u160};
use crate::{
    Q96, RESOLUTION, U160_MAX,
    error::{Error, MathError, StateError},
};
use alloy_primitives::{I256, U256};

/// Next sqrt price after adding or removing `amount` of token0, rounded up.
///
/// Rounding up keeps the price from moving too far when token0 is added
/// (the pool receives at least enough) and moves it far enough when
/// token0 is removed (the pool never sends out too much).
pub fn get_next_sqrt_price_from_amount_0_rounding_up(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    if amount.is_zero() {
        return Ok(sqrt_p_x96);
    }

    let numerator1: U256 = U256::from(liquidity) << RESOLUTION;
    let product: U256 = amount.wrapping_mul(sqrt_p_x96);
    let product_fits = product / amount == sqrt_p_x96;

    if add {
        if product_fits {
            let denominator = numerator1.wrapping_add(product);
            if denominator >= numerator1 {
                // always fits 160 bits: the price only goes down
                return Ok(mul_div_rounding_up(numerator1, sqrt_p_x96, denominator)?);
            }
        }
        let denominator = (numerator1 / sqrt_p_x96)
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        Ok(div_rounding_up(numerator1, denominator))
    } else {
        if !product_fits || numerator1 <= product {
            return Err(StateError::InsufficientReserves.into());
        }
        let denominator = numerator1 - product;
        Ok(to_u160(mul_div_rounding_up(numerator1, sqrt_p_x96, denominator)?)?)
    }
}

/// Next sqrt price after adding or removing `amount` of token1, rounded down.
pub fn get_next_sqrt_price_from_amount_1_rounding_down(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, Error> {
    let liquidity = U256::from(liquidity);
    if add {
        let quotient: U256 = if amount <= U160_MAX {
            (amount << RESOLUTION) / liquidity
        } else {
            mul_div(amount, Q96, liquidity)?
        };

        let result = sqrt_p_x96
            .checked_add(quotient)
            .ok_or(MathError::Overflow)?;
        to_u160(result).map_err(|_| MathError::Overflow.into())
    } else {
        let quotient: U256 = if amount <= U160_MAX {
            div_rounding_up(amount << RESOLUTION, liquidity)
        } else {
            mul_div_rounding_up(amount, Q96, liquidity)?
        };

        if sqrt_p_x96 <= quotient {
            return Err(StateError::InsufficientReserves.into());
        }
        // always fits 160 bits: the price only goes down
        Ok(sqrt_p_x96 - quotient)
    }
}

/// Token0 amount between two sqrt prices for `liquidity`:
/// `liquidity * (sqrt_b - sqrt_a) / (sqrt_a * sqrt_b)`.
pub fn get_amount_0_delta_base(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };

    if sqrt_ratio_a_x96.is_zero() {
        return Err(StateError::SqrtRatioIsZero.into());
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;

    if round_up {
        Ok(div_rounding_up(
            mul_div_rounding_up(numerator1, numerator2, sqrt_ratio_b_x96)?,
            sqrt_ratio_a_x96,
        ))
    } else {
        Ok(mul_div(numerator1, numerator2, sqrt_ratio_b_x96)? / sqrt_ratio_a_x96)
    }
}

/// Token1 amount between two sqrt prices for `liquidity`:
/// `liquidity * (sqrt_b - sqrt_a)`.
pub fn get_amount_1_delta_base(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96) = (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    };
    let liquidity = U256::from(liquidity);

    if round_up {
        mul_div_rounding_up(liquidity, sqrt_ratio_b_x96 - sqrt_ratio_a_x96, Q96)
    } else {
        mul_div(liquidity, sqrt_ratio_b_x96 - sqrt_ratio_a_x96, Q96)
    }
}

/// Signed token0 delta for a signed liquidity change. Added liquidity is
/// owed to the pool and rounds up; removed liquidity is paid out and
/// rounds down.
pub fn get_amount_0_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<I256, Error> {
    if liquidity < 0 {
        let amount = get_amount_0_delta_base(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity.unsigned_abs(),
            false,
        )?;
        Ok(-to_i256(amount)?)
    } else {
        let amount =
            get_amount_0_delta_base(sqrt_ratio_a_x96, sqrt_ratio_b_x96, liquidity as u128, true)?;
        Ok(to_i256(amount)?)
    }
}

/// Signed token1 delta for a signed liquidity change, rounded like
/// [`get_amount_0_delta`].
pub fn get_amount_1_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<I256, MathError> {
    if liquidity < 0 {
        let amount = get_amount_1_delta_base(
            sqrt_ratio_a_x96,
            sqrt_ratio_b_x96,
            liquidity.unsigned_abs(),
            false,
        )?;
        Ok(-to_i256(amount)?)
    } else {
        let amount =
            get_amount_1_delta_base(sqrt_ratio_a_x96, sqrt_ratio_b_x96, liquidity as u128, true)?;
        to_i256(amount)
    }
}

/// Next sqrt price after `amount_in` of the input token enters the pool,
/// choosing the token0 or token1 formula from `zero_for_one`.
pub fn get_next_sqrt_price_from_input(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    if sqrt_p_x96.is_zero() {
        return Err(StateError::SqrtPriceIsZero.into());
    }
    if liquidity == 0 {
        return Err(StateError::LiquidityIsZero.into());
    }

    if zero_for_one {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_p_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_p_x96, liquidity, amount_in, true)
    }
}

/// Next sqrt price after `amount_out` of the output token leaves the pool.
pub fn get_next_sqrt_price_from_output(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256, Error> {
    if sqrt_p_x96.is_zero() {
        return Err(StateError::SqrtPriceIsZero.into());
    }
    if liquidity == 0 {
        return Err(StateError::LiquidityIsZero.into());
    }

    if zero_for_one {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_p_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_p_x96, liquidity, amount_out, false)
    }
}
