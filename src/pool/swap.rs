use crate::Q128;
use crate::error::{Error, MathError, PoolError};
use crate::ledger::Ledger;
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::mul_div;
use crate::math::safe_cast::{to_i256, truncate_u128};
use crate::math::swap_math::compute_swap_step;
use crate::math::tick_bitmap::{has_initialized_tick, next_initialized_tick_within_one_word};
use crate::math::tick_math::{
    MAX_SQRT_RATIO, MAX_TICK, MIN_SQRT_RATIO, MIN_TICK, get_sqrt_ratio_at_tick,
    get_tick_at_sqrt_ratio,
};
use crate::pool::callback::SwapCallback;
use crate::pool::tick::{self, Accumulators};
use crate::pool::v3_pool::Pool;
use alloy_primitives::{Address, I256, U256};
use tracing::{debug, trace};

#[derive(Copy, Clone, Debug)]
pub struct SwapParams {
    /// Receives the output token.
    pub recipient: Address,
    /// Swap direction: `true` for token0 → token1, `false` for token1 → token0.
    pub zero_for_one: bool,
    /// Signed amount being swapped. Positive means “exact in”, negative means “exact out”.
    pub amount_specified: I256,
    /// Sqrt‑price limit in Q96 that bounds how far the price is allowed to move.
    pub sqrt_price_limit_x96: U256,
}

impl SwapParams {
    #[inline]
    pub fn new(
        recipient: Address,
        zero_for_one: bool,
        amount_specified: I256,
        sqrt_price_limit_x96: U256,
    ) -> Self {
        Self {
            recipient,
            zero_for_one,
            amount_specified,
            sqrt_price_limit_x96,
        }
    }
}

/// Balance deltas from the pool's point of view: positive was paid in,
/// negative was sent out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapResult {
    pub amount0: I256,
    pub amount1: I256,
    /// Total fee charged in the input token, protocol share included.
    pub fees_paid: U256,
}

// values fixed for the whole swap
struct SwapCache {
    // the protocol fee for the input token
    fee_protocol: u8,
    // liquidity at the beginning of the swap
    liquidity_start: u128,
    // the oracle clock at the beginning of the swap
    time: u32,
    // oracle snapshot, taken on the first initialized tick crossed
    latest_observation: Option<(i64, U256)>,
}

// the top level state of the swap, the results of which are recorded in storage at the end
struct SwapState {
    // the amount remaining to be swapped in/out of the input/output asset
    amount_specified_remaining: I256,
    // the amount already swapped out/in of the output/input asset
    amount_calculated: I256,
    // current sqrt(price)
    sqrt_price_x96: U256,
    // the tick associated with the current price
    tick: i32,
    // the global fee growth of the input token
    fee_growth_global_x128: U256,
    // amount of input token paid as protocol fee
    protocol_fee: u128,
    // the current liquidity in range
    liquidity: u128,
    // accumulated swap fees
    swap_fee: U256,
}

#[derive(Default)]
struct StepComputations {
    // the price at the beginning of the step
    sqrt_price_start_x96: U256,
    // the next tick to swap to from the current tick in the swap direction
    tick_next: i32,
    // whether tickNext is initialized or not
    initialized: bool,
    // sqrt(price) for the next tick (1/0)
    sqrt_price_next_x96: U256,
    // how much is being swapped in this step
    amount_in: U256,
    // how much is being swapped out
    amount_out: U256,
    // how much fee is being paid in
    fee_amount: U256,
}

impl<L: Ledger + Clone> Pool<L> {
    /// Swaps against the pool until `amount_specified` is exhausted or the
    /// price reaches `sqrt_price_limit_x96`.
    ///
    /// The output is transferred to the recipient first; the callback must
    /// then pay the input, which is verified against the pool's balance.
    /// Any failure leaves the pool and ledger untouched.
    pub fn swap<C: SwapCallback<L>>(
        &mut self,
        params: SwapParams,
        callback: &mut C,
        data: &[u8],
    ) -> Result<SwapResult, Error> {
        self.transact(|pool| pool.swap_locked(params, callback, data))
    }

    fn swap_locked<C: SwapCallback<L>>(
        &mut self,
        params: SwapParams,
        callback: &mut C,
        data: &[u8],
    ) -> Result<SwapResult, Error> {
        let amount_specified = params.amount_specified;
        if amount_specified.is_zero() {
            return Err(PoolError::ZeroAmount.into());
        }

        let slot0_start = self.state.slot0;
        let zero_for_one = params.zero_for_one;
        let sqrt_price_limit_x96 = params.sqrt_price_limit_x96;
        if sqrt_price_limit_x96 == slot0_start.sqrt_price_x96 {
            return Err(PoolError::PriceLimitAlreadyReached.into());
        }
        let limit_ok = if zero_for_one {
            sqrt_price_limit_x96 < slot0_start.sqrt_price_x96
                && sqrt_price_limit_x96 > MIN_SQRT_RATIO
        } else {
            sqrt_price_limit_x96 > slot0_start.sqrt_price_x96
                && sqrt_price_limit_x96 < MAX_SQRT_RATIO
        };
        if !limit_ok {
            return Err(PoolError::InvalidPriceLimit.into());
        }

        if self.state.liquidity == 0
            && !has_initialized_tick(
                &self.state.tick_bitmap,
                slot0_start.tick,
                self.tick_spacing(),
                zero_for_one,
            )
        {
            return Err(PoolError::InsufficientLiquidity.into());
        }

        let mut cache = SwapCache {
            fee_protocol: if zero_for_one {
                slot0_start.fee_protocol % 16
            } else {
                slot0_start.fee_protocol >> 4
            },
            liquidity_start: self.state.liquidity,
            time: self.block_timestamp(),
            latest_observation: None,
        };

        let exact_input = amount_specified.is_positive();

        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: I256::ZERO,
            sqrt_price_x96: slot0_start.sqrt_price_x96,
            tick: slot0_start.tick,
            fee_growth_global_x128: if zero_for_one {
                self.state.fee_growth_global0_x128
            } else {
                self.state.fee_growth_global1_x128
            },
            protocol_fee: 0,
            liquidity: cache.liquidity_start,
            swap_fee: U256::ZERO,
        };

        let tick_spacing = self.tick_spacing();
        let fee = self.fee();

        while !state.amount_specified_remaining.is_zero()
            && state.sqrt_price_x96 != sqrt_price_limit_x96
        {
            let mut step = StepComputations {
                sqrt_price_start_x96: state.sqrt_price_x96,
                ..StepComputations::default()
            };

            // moving down from exactly on a tick: the tick is crossed only
            // once the price leaves it, and the search starts below it
            let on_tick = zero_for_one
                && state.sqrt_price_x96 == get_sqrt_ratio_at_tick(state.tick)?;
            let pending_net = if on_tick {
                self.state
                    .ticks
                    .get(&state.tick)
                    .filter(|info| info.initialized)
                    .map(|info| info.liquidity_net)
            } else {
                None
            };
            let step_liquidity = match pending_net {
                Some(liquidity_net) => add_delta(state.liquidity, -liquidity_net)?,
                None => state.liquidity,
            };

            (step.tick_next, step.initialized) = next_initialized_tick_within_one_word(
                &self.state.tick_bitmap,
                if on_tick { state.tick - 1 } else { state.tick },
                tick_spacing,
                zero_for_one,
            )?;

            // the bitmap has no notion of the tick bounds
            step.tick_next = step.tick_next.clamp(MIN_TICK, MAX_TICK);

            step.sqrt_price_next_x96 = get_sqrt_ratio_at_tick(step.tick_next)?;

            let target = if zero_for_one {
                step.sqrt_price_next_x96.max(sqrt_price_limit_x96)
            } else {
                step.sqrt_price_next_x96.min(sqrt_price_limit_x96)
            };

            let computed = compute_swap_step(
                state.sqrt_price_x96,
                target,
                step_liquidity,
                state.amount_specified_remaining,
                fee,
            )?;
            state.sqrt_price_x96 = computed.sqrt_price_next_x96;
            step.amount_in = computed.amount_in;
            step.amount_out = computed.amount_out;
            step.fee_amount = computed.fee_amount;

            let moved = state.sqrt_price_x96 != step.sqrt_price_start_x96;
            if pending_net.is_some() && moved {
                // fee growth so far was earned above the tick
                let delta = self.cross_in_swap(
                    &mut cache,
                    state.tick,
                    zero_for_one,
                    state.fee_growth_global_x128,
                )?;
                state.liquidity = add_delta(state.liquidity, delta)?;
            }

            state.swap_fee = state
                .swap_fee
                .checked_add(step.fee_amount)
                .ok_or(MathError::Overflow)?;

            let paid_in = to_i256(step.amount_in + step.fee_amount)?;
            let amount_out = to_i256(step.amount_out)?;
            if exact_input {
                state.amount_specified_remaining = state
                    .amount_specified_remaining
                    .checked_sub(paid_in)
                    .ok_or(MathError::Underflow)?;
                state.amount_calculated = state
                    .amount_calculated
                    .checked_sub(amount_out)
                    .ok_or(MathError::Underflow)?;
            } else {
                state.amount_specified_remaining = state
                    .amount_specified_remaining
                    .checked_add(amount_out)
                    .ok_or(MathError::Overflow)?;
                state.amount_calculated = state
                    .amount_calculated
                    .checked_add(paid_in)
                    .ok_or(MathError::Overflow)?;
            }

            if cache.fee_protocol > 0 {
                let delta = step.fee_amount / U256::from(cache.fee_protocol);
                step.fee_amount -= delta;
                state.protocol_fee = state.protocol_fee.wrapping_add(truncate_u128(delta));
            }

            if state.liquidity > 0 {
                state.fee_growth_global_x128 = state.fee_growth_global_x128.wrapping_add(
                    mul_div(step.fee_amount, Q128, U256::from(state.liquidity))?,
                );
            }

            trace!(
                tick = state.tick,
                tick_next = step.tick_next,
                initialized = step.initialized,
                sqrt_price_x96 = %state.sqrt_price_x96,
                amount_in = %step.amount_in,
                amount_out = %step.amount_out,
                fee_amount = %step.fee_amount,
                "swap step"
            );

            if state.sqrt_price_x96 == step.sqrt_price_next_x96 {
                // a downward cross waits until the price moves below the tick
                if step.initialized && !zero_for_one {
                    let delta = self.cross_in_swap(
                        &mut cache,
                        step.tick_next,
                        zero_for_one,
                        state.fee_growth_global_x128,
                    )?;
                    state.liquidity = add_delta(state.liquidity, delta)?;
                }
                state.tick = step.tick_next;
            } else if moved {
                state.tick = get_tick_at_sqrt_ratio(state.sqrt_price_x96)?;
            }
        }

        let slot0 = &mut self.state.slot0;
        if state.tick != slot0_start.tick {
            (slot0.observation_index, slot0.observation_cardinality) =
                self.state.observations.write(
                    slot0_start.observation_index,
                    cache.time,
                    slot0_start.tick,
                    cache.liquidity_start,
                    slot0_start.observation_cardinality,
                    slot0_start.observation_cardinality_next,
                );
            slot0.tick = state.tick;
        }
        slot0.sqrt_price_x96 = state.sqrt_price_x96;

        self.state.liquidity = state.liquidity;

        let fees = &mut self.state.protocol_fees;
        if zero_for_one {
            self.state.fee_growth_global0_x128 = state.fee_growth_global_x128;
            fees.token0 = fees.token0.wrapping_add(state.protocol_fee);
        } else {
            self.state.fee_growth_global1_x128 = state.fee_growth_global_x128;
            fees.token1 = fees.token1.wrapping_add(state.protocol_fee);
        }

        let swapped = amount_specified
            .checked_sub(state.amount_specified_remaining)
            .ok_or(MathError::Overflow)?;
        let (amount0, amount1) = if zero_for_one == exact_input {
            (swapped, state.amount_calculated)
        } else {
            (state.amount_calculated, swapped)
        };

        let (token_in, token_out, amount_in, amount_out) = if zero_for_one {
            (self.token0(), self.token1(), amount0, amount1)
        } else {
            (self.token1(), self.token0(), amount1, amount0)
        };

        if amount_out.is_negative() {
            self.pay_out(token_out, params.recipient, amount_out.unsigned_abs())?;
        }

        let pool = self.address();
        let balance_in_before = self.ledger().balance_of(token_in, pool);
        let balance_out_before = self.ledger().balance_of(token_out, pool);
        callback.swap_callback(self, amount0, amount1, data)?;
        let required = balance_in_before
            .checked_add(amount_in.unsigned_abs())
            .ok_or(MathError::Overflow)?;
        if self.ledger().balance_of(token_in, pool) < required {
            return Err(PoolError::InsufficientInputAmount.into());
        }
        if self.ledger().balance_of(token_out, pool) < balance_out_before {
            return Err(PoolError::BalanceDecreased.into());
        }

        debug!(
            pool = %pool,
            recipient = %params.recipient,
            zero_for_one,
            amount0 = %amount0,
            amount1 = %amount1,
            sqrt_price_x96 = %state.sqrt_price_x96,
            liquidity = state.liquidity,
            tick = state.tick,
            "swap"
        );

        Ok(SwapResult {
            amount0,
            amount1,
            fees_paid: state.swap_fee,
        })
    }

    /// Crosses `tick` mid-swap and returns the liquidity change in the swap
    /// direction. The oracle is read on the first cross only.
    fn cross_in_swap(
        &mut self,
        cache: &mut SwapCache,
        tick: i32,
        zero_for_one: bool,
        fee_growth_global_x128: U256,
    ) -> Result<i128, Error> {
        let (tick_cumulative, seconds_per_liquidity_cumulative_x128) =
            match cache.latest_observation {
                Some(observation) => observation,
                None => {
                    // slot0 is only written back after the loop
                    let slot0 = self.state.slot0;
                    let observation = self.state.observations.observe_single(
                        cache.time,
                        0,
                        slot0.tick,
                        slot0.observation_index,
                        cache.liquidity_start,
                        slot0.observation_cardinality,
                    )?;
                    cache.latest_observation = Some(observation);
                    observation
                }
            };

        let (fee_growth_global0_x128, fee_growth_global1_x128) = if zero_for_one {
            (fee_growth_global_x128, self.state.fee_growth_global1_x128)
        } else {
            (self.state.fee_growth_global0_x128, fee_growth_global_x128)
        };
        let globals = Accumulators {
            fee_growth_global0_x128,
            fee_growth_global1_x128,
            seconds_per_liquidity_cumulative_x128,
            tick_cumulative,
            time: cache.time,
        };

        let liquidity_net = tick::cross(&mut self.state.ticks, tick, &globals);
        // moving leftward, the net liquidity applies in reverse
        Ok(if zero_for_one {
            -liquidity_net
        } else {
            liquidity_net
        })
    }
}
