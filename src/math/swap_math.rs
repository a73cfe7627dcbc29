use crate::U256_E6;
use crate::error::Error;
use crate::math::math_helpers::{mul_div, mul_div_rounding_up};
use crate::math::sqrt_price_math::{
    get_amount_0_delta_base, get_amount_1_delta_base, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use alloy_primitives::{I256, U256};

/// Outcome of a single bounded swap step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapStep {
    /// Price after the step, never beyond the target.
    pub sqrt_price_next_x96: U256,
    /// Input consumed by the price movement, excluding the fee.
    pub amount_in: U256,
    pub amount_out: U256,
    /// Fee taken on top of `amount_in`.
    pub fee_amount: U256,
}

/// Computes the result of swapping some amount in or out within a single
/// price range, moving from `sqrt_ratio_current_x96` towards
/// `sqrt_ratio_target_x96`.
///
/// `amount_remaining` is positive for exact input and negative for exact
/// output. `fee_pips` is in hundredths of a bip (`3000` = 0.3%). The fee is
/// rounded up and the amounts are rounded in the pool's favor, so the pool
/// receives exactly `amount_in + fee_amount`.
pub fn compute_swap_step(
    sqrt_ratio_current_x96: U256,
    sqrt_ratio_target_x96: U256,
    liquidity: u128,
    amount_remaining: I256,
    fee_pips: u32,
) -> Result<SwapStep, Error> {
    let zero_for_one = sqrt_ratio_current_x96 >= sqrt_ratio_target_x96;
    let exact_in = !amount_remaining.is_negative();
    let remaining_abs = amount_remaining.unsigned_abs();
    let fee = U256::from(fee_pips);

    let mut step = SwapStep::default();

    if exact_in {
        let amount_remaining_less_fee = mul_div(remaining_abs, U256_E6 - fee, U256_E6)?;
        step.amount_in = if zero_for_one {
            get_amount_0_delta_base(
                sqrt_ratio_target_x96,
                sqrt_ratio_current_x96,
                liquidity,
                true,
            )?
        } else {
            get_amount_1_delta_base(
                sqrt_ratio_current_x96,
                sqrt_ratio_target_x96,
                liquidity,
                true,
            )?
        };
        step.sqrt_price_next_x96 = if amount_remaining_less_fee >= step.amount_in {
            sqrt_ratio_target_x96
        } else {
            get_next_sqrt_price_from_input(
                sqrt_ratio_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?
        };
    } else {
        step.amount_out = if zero_for_one {
            get_amount_1_delta_base(
                sqrt_ratio_target_x96,
                sqrt_ratio_current_x96,
                liquidity,
                false,
            )?
        } else {
            get_amount_0_delta_base(
                sqrt_ratio_current_x96,
                sqrt_ratio_target_x96,
                liquidity,
                false,
            )?
        };
        step.sqrt_price_next_x96 = if remaining_abs >= step.amount_out {
            sqrt_ratio_target_x96
        } else {
            get_next_sqrt_price_from_output(
                sqrt_ratio_current_x96,
                liquidity,
                remaining_abs,
                zero_for_one,
            )?
        };
    }

    let reached_target = sqrt_ratio_target_x96 == step.sqrt_price_next_x96;
    let next = step.sqrt_price_next_x96;

    // recompute whichever side was not pinned by reaching the target
    if zero_for_one {
        if !(reached_target && exact_in) {
            step.amount_in = get_amount_0_delta_base(next, sqrt_ratio_current_x96, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            step.amount_out =
                get_amount_1_delta_base(next, sqrt_ratio_current_x96, liquidity, false)?;
        }
    } else {
        if !(reached_target && exact_in) {
            step.amount_in = get_amount_1_delta_base(sqrt_ratio_current_x96, next, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            step.amount_out =
                get_amount_0_delta_base(sqrt_ratio_current_x96, next, liquidity, false)?;
        }
    }

    // the output can never exceed what was asked for
    if !exact_in && step.amount_out > remaining_abs {
        step.amount_out = remaining_abs;
    }

    step.fee_amount = if exact_in && !reached_target {
        // the remainder beyond the price movement is all fee
        remaining_abs - step.amount_in
    } else {
        mul_div_rounding_up(step.amount_in, fee, U256_E6 - fee)?
    };

    Ok(step)
}
