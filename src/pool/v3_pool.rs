use crate::config::PoolConfig;
use crate::error::{Error, MathError, PoolError};
use crate::ledger::Ledger;
use crate::math::liquidity_math::add_delta;
use crate::math::safe_cast::{to_i128, truncate_u128};
use crate::math::sqrt_price_math::{get_amount_0_delta, get_amount_1_delta};
use crate::math::tick_bitmap::{flip_tick, get_word};
use crate::math::tick_math::{MAX_TICK, MIN_TICK, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio};
use crate::pool::callback::MintCallback;
use crate::pool::oracle::{Observation, Observations};
use crate::pool::position::{PositionInfo, PositionKey};
use crate::pool::tick::{self, Accumulators, TickInfo, tick_spacing_to_max_liquidity_per_tick};
use crate::{FastMap, U160_MAX};
use alloy_primitives::{Address, I256, U256};
use tracing::{debug, info};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    /// Always `get_tick_at_sqrt_ratio(sqrt_price_x96)`.
    pub tick: i32,
    pub observation_index: u16,
    pub observation_cardinality: u16,
    pub observation_cardinality_next: u16,
    /// Protocol share of fees as `1/x`: low nibble token0, high nibble token1.
    pub fee_protocol: u8,
    pub unlocked: bool,
}

/// Fees owed to the protocol, in token units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtocolFees {
    pub token0: u128,
    pub token1: u128,
}

/// Everything a failed call must roll back.
#[derive(Clone, Debug, Default)]
pub(crate) struct PoolState {
    pub(crate) slot0: Slot0,
    pub(crate) fee_growth_global0_x128: U256,
    pub(crate) fee_growth_global1_x128: U256,
    pub(crate) protocol_fees: ProtocolFees,
    /// Liquidity of all positions whose range contains the current tick.
    pub(crate) liquidity: u128,
    pub(crate) ticks: FastMap<i32, TickInfo>,
    pub(crate) tick_bitmap: FastMap<i16, U256>,
    pub(crate) positions: FastMap<PositionKey, PositionInfo>,
    pub(crate) observations: Observations,
}

/// A single concentrated-liquidity pool settling against a [`Ledger`].
#[derive(Clone, Debug)]
pub struct Pool<L> {
    config: PoolConfig,
    max_liquidity_per_tick: u128,
    pub(crate) state: PoolState,
    pub(crate) ledger: L,
}

fn valid_fee_protocol(fee_protocol: u8) -> bool {
    fee_protocol == 0 || (4..=10).contains(&fee_protocol)
}

impl<L: Ledger> Pool<L> {
    /// Creates an uninitialized pool; call [`Pool::initialize`] before use.
    pub fn new(config: PoolConfig, ledger: L) -> Result<Self, PoolError> {
        config.validate()?;
        let max_liquidity_per_tick = tick_spacing_to_max_liquidity_per_tick(config.tick_spacing);

        Ok(Self {
            config,
            max_liquidity_per_tick,
            state: PoolState::default(),
            ledger,
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    pub fn token0(&self) -> Address {
        self.config.token0
    }

    pub fn token1(&self) -> Address {
        self.config.token1
    }

    pub fn fee(&self) -> u32 {
        self.config.fee
    }

    pub fn tick_spacing(&self) -> i32 {
        self.config.tick_spacing
    }

    pub fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Host access to the ledger, e.g. to fund accounts or move the clock.
    ///
    /// Fails with `PoolError::Locked` while a call is in progress, so a
    /// settlement callback cannot reach the pool's own account. Callbacks
    /// settle through [`Pool::pay`] instead.
    pub fn ledger_mut(&mut self) -> Result<&mut L, PoolError> {
        let slot0 = self.state.slot0;
        if !slot0.unlocked && !slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::Locked);
        }
        Ok(&mut self.ledger)
    }

    /// Moves `amount` of `token` from `payer` onto the pool's account.
    ///
    /// This is the only transfer open to settlement callbacks; it can never
    /// debit the pool.
    pub fn pay(&mut self, token: Address, payer: Address, amount: U256) -> Result<(), Error> {
        if amount.is_zero() {
            return Ok(());
        }
        let to = self.config.address;
        self.ledger.transfer(token, payer, to, amount)?;
        Ok(())
    }

    pub fn slot0(&self) -> Slot0 {
        self.state.slot0
    }

    pub fn liquidity(&self) -> u128 {
        self.state.liquidity
    }

    pub fn fee_growth_global0_x128(&self) -> U256 {
        self.state.fee_growth_global0_x128
    }

    pub fn fee_growth_global1_x128(&self) -> U256 {
        self.state.fee_growth_global1_x128
    }

    pub fn protocol_fees(&self) -> ProtocolFees {
        self.state.protocol_fees
    }

    /// State of `tick`; uninitialized ticks read as zeroed.
    pub fn ticks(&self, tick: i32) -> TickInfo {
        self.state.ticks.get(&tick).copied().unwrap_or_default()
    }

    pub fn tick_bitmap(&self, word: i16) -> U256 {
        get_word(&self.state.tick_bitmap, word)
    }

    pub fn positions(&self, owner: Address, tick_lower: i32, tick_upper: i32) -> PositionInfo {
        self.state
            .positions
            .get(&PositionKey::new(owner, tick_lower, tick_upper))
            .copied()
            .unwrap_or_default()
    }

    pub fn observations(&self, index: u16) -> Observation {
        self.state.observations.get(index)
    }

    pub fn balance0(&self) -> U256 {
        self.ledger.balance_of(self.config.token0, self.config.address)
    }

    pub fn balance1(&self) -> U256 {
        self.ledger.balance_of(self.config.token1, self.config.address)
    }

    /// Oracle clock; the host time modulo 2^32.
    pub(crate) fn block_timestamp(&self) -> u32 {
        self.ledger.block_timestamp() as u32
    }

    /// Cumulative tick and seconds per liquidity for each entry of
    /// `seconds_agos`, counted back from the current block time.
    pub fn observe(&self, seconds_agos: &[u32]) -> Result<(Vec<i64>, Vec<U256>), Error> {
        let slot0 = self.state.slot0;
        Ok(self.state.observations.observe(
            self.block_timestamp(),
            seconds_agos,
            slot0.tick,
            slot0.observation_index,
            self.state.liquidity,
            slot0.observation_cardinality,
        )?)
    }

    /// Tick cumulative, seconds per liquidity and seconds spent while the
    /// price was inside `[tick_lower, tick_upper)`.
    ///
    /// Only differences between two snapshots of the same range are
    /// meaningful, and only if both boundaries stayed initialized in
    /// between.
    pub fn snapshot_cumulatives_inside(
        &self,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<(i64, U256, u32), Error> {
        self.check_ticks(tick_lower, tick_upper)?;

        let initialized = |index: i32| {
            self.state
                .ticks
                .get(&index)
                .copied()
                .filter(|info| info.initialized)
                .ok_or(PoolError::TickNotInitialized(index))
        };
        let lower = initialized(tick_lower)?;
        let upper = initialized(tick_upper)?;
        let slot0 = self.state.slot0;

        if slot0.tick < tick_lower {
            Ok((
                lower
                    .tick_cumulative_outside
                    .wrapping_sub(upper.tick_cumulative_outside),
                lower
                    .seconds_per_liquidity_outside_x128
                    .wrapping_sub(upper.seconds_per_liquidity_outside_x128)
                    & U160_MAX,
                lower.seconds_outside.wrapping_sub(upper.seconds_outside),
            ))
        } else if slot0.tick < tick_upper {
            let time = self.block_timestamp();
            let (tick_cumulative, seconds_per_liquidity) =
                self.state.observations.observe_single(
                    time,
                    0,
                    slot0.tick,
                    slot0.observation_index,
                    self.state.liquidity,
                    slot0.observation_cardinality,
                )?;
            Ok((
                tick_cumulative
                    .wrapping_sub(lower.tick_cumulative_outside)
                    .wrapping_sub(upper.tick_cumulative_outside),
                seconds_per_liquidity
                    .wrapping_sub(lower.seconds_per_liquidity_outside_x128)
                    .wrapping_sub(upper.seconds_per_liquidity_outside_x128)
                    & U160_MAX,
                time.wrapping_sub(lower.seconds_outside)
                    .wrapping_sub(upper.seconds_outside),
            ))
        } else {
            Ok((
                upper
                    .tick_cumulative_outside
                    .wrapping_sub(lower.tick_cumulative_outside),
                upper
                    .seconds_per_liquidity_outside_x128
                    .wrapping_sub(lower.seconds_per_liquidity_outside_x128)
                    & U160_MAX,
                upper.seconds_outside.wrapping_sub(lower.seconds_outside),
            ))
        }
    }

    fn check_ticks(&self, tick_lower: i32, tick_upper: i32) -> Result<(), PoolError> {
        if tick_lower >= tick_upper {
            return Err(PoolError::TickLowerNotBelowUpper);
        }
        if tick_lower < MIN_TICK {
            return Err(PoolError::TickLowerTooLow);
        }
        if tick_upper > MAX_TICK {
            return Err(PoolError::TickUpperTooHigh);
        }
        for tick in [tick_lower, tick_upper] {
            if tick % self.config.tick_spacing != 0 {
                return Err(PoolError::TickNotSpaced(tick));
            }
        }
        Ok(())
    }

    /// Sends `amount` of the pool's own `token` to `recipient`.
    pub(crate) fn pay_out(
        &mut self,
        token: Address,
        recipient: Address,
        amount: U256,
    ) -> Result<(), Error> {
        if amount.is_zero() {
            return Ok(());
        }
        let from = self.config.address;
        self.ledger.transfer(token, from, recipient, amount)?;
        Ok(())
    }

    fn only_owner(&self, caller: Address) -> Result<(), PoolError> {
        if caller != self.config.owner {
            return Err(PoolError::NotOwner);
        }
        Ok(())
    }

    /// Sets the starting price. Allowed exactly once; the pool stays
    /// locked until then.
    pub fn initialize(&mut self, sqrt_price_x96: U256) -> Result<(), Error> {
        if !self.state.slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::AlreadyInitialized.into());
        }

        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96)?;
        let (cardinality, cardinality_next) =
            self.state.observations.initialize(self.block_timestamp());

        self.state.slot0 = Slot0 {
            sqrt_price_x96,
            tick,
            observation_index: 0,
            observation_cardinality: cardinality,
            observation_cardinality_next: cardinality_next,
            fee_protocol: 0,
            unlocked: true,
        };

        info!(
            pool = %self.config.address,
            sqrt_price_x96 = %sqrt_price_x96,
            tick,
            "pool initialized"
        );
        Ok(())
    }
}

impl<L: Ledger + Clone> Pool<L> {
    /// Runs `op` under the reentrancy lock. On failure the pool state,
    /// including the lock flag, and the ledger are restored to what they
    /// were on entry.
    pub(crate) fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if !self.state.slot0.unlocked {
            let err = if self.state.slot0.sqrt_price_x96.is_zero() {
                PoolError::NotInitialized
            } else {
                PoolError::Locked
            };
            return Err(err.into());
        }

        let checkpoint = (self.state.clone(), self.ledger.clone());
        self.state.slot0.unlocked = false;

        match op(self) {
            Ok(value) => {
                self.state.slot0.unlocked = true;
                Ok(value)
            }
            Err(err) => {
                (self.state, self.ledger) = checkpoint;
                debug!(pool = %self.config.address, error = %err, "call reverted");
                Err(err)
            }
        }
    }

    /// Adds liquidity for `recipient` over `[tick_lower, tick_upper)` and
    /// returns the token amounts the callback had to pay.
    pub fn mint<C: MintCallback<L>>(
        &mut self,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
        callback: &mut C,
        data: &[u8],
    ) -> Result<(U256, U256), Error> {
        self.transact(|pool| {
            if amount == 0 {
                return Err(PoolError::ZeroAmount.into());
            }

            let (amount0, amount1) =
                pool.modify_position(recipient, tick_lower, tick_upper, to_i128(amount)?)?;
            // adding liquidity never yields negative amounts
            let amount0 = amount0.into_raw();
            let amount1 = amount1.into_raw();

            let balance0_before = pool.balance0();
            let balance1_before = pool.balance1();

            callback.mint_callback(pool, amount0, amount1, data)?;

            // checked for both tokens, owed or not
            if balance0_before
                .checked_add(amount0)
                .ok_or(MathError::Overflow)?
                > pool.balance0()
            {
                return Err(PoolError::Mint0NotPaid.into());
            }
            if balance1_before
                .checked_add(amount1)
                .ok_or(MathError::Overflow)?
                > pool.balance1()
            {
                return Err(PoolError::Mint1NotPaid.into());
            }

            debug!(
                pool = %pool.config.address,
                owner = %recipient,
                tick_lower,
                tick_upper,
                amount,
                amount0 = %amount0,
                amount1 = %amount1,
                "mint"
            );
            Ok((amount0, amount1))
        })
    }

    /// Removes liquidity from the caller's position and credits the
    /// released tokens to its owed balances. `amount == 0` only accrues
    /// fees.
    pub fn burn(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> Result<(U256, U256), Error> {
        self.transact(|pool| {
            let liquidity_delta = to_i128(amount)?;
            let (amount0, amount1) =
                pool.modify_position(owner, tick_lower, tick_upper, -liquidity_delta)?;
            let amount0 = amount0.unsigned_abs();
            let amount1 = amount1.unsigned_abs();

            if !amount0.is_zero() || !amount1.is_zero() {
                let key = PositionKey::new(owner, tick_lower, tick_upper);
                if let Some(position) = pool.state.positions.get_mut(&key) {
                    position.tokens_owed0 =
                        position.tokens_owed0.wrapping_add(truncate_u128(amount0));
                    position.tokens_owed1 =
                        position.tokens_owed1.wrapping_add(truncate_u128(amount1));
                }
            }

            debug!(
                pool = %pool.config.address,
                owner = %owner,
                tick_lower,
                tick_upper,
                amount,
                amount0 = %amount0,
                amount1 = %amount1,
                "burn"
            );
            Ok((amount0, amount1))
        })
    }

    /// Transfers up to the requested amounts of owed tokens to `recipient`.
    pub fn collect(
        &mut self,
        owner: Address,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        self.transact(|pool| {
            let key = PositionKey::new(owner, tick_lower, tick_upper);
            let (amount0, amount1) = match pool.state.positions.get_mut(&key) {
                Some(position) => {
                    let amount0 = amount0_requested.min(position.tokens_owed0);
                    let amount1 = amount1_requested.min(position.tokens_owed1);
                    position.tokens_owed0 -= amount0;
                    position.tokens_owed1 -= amount1;
                    (amount0, amount1)
                }
                None => (0, 0),
            };

            let (token0, token1) = (pool.config.token0, pool.config.token1);
            pool.pay_out(token0, recipient, U256::from(amount0))?;
            pool.pay_out(token1, recipient, U256::from(amount1))?;

            debug!(
                pool = %pool.config.address,
                owner = %owner,
                recipient = %recipient,
                tick_lower,
                tick_upper,
                amount0,
                amount1,
                "collect"
            );
            Ok((amount0, amount1))
        })
    }

    /// Sets the protocol's share of swap and flash fees to `1/x` per token,
    /// where `x` is 0 (off) or within `4..=10`.
    pub fn set_fee_protocol(
        &mut self,
        caller: Address,
        fee_protocol0: u8,
        fee_protocol1: u8,
    ) -> Result<(), Error> {
        self.transact(|pool| {
            pool.only_owner(caller)?;
            if !valid_fee_protocol(fee_protocol0) || !valid_fee_protocol(fee_protocol1) {
                return Err(PoolError::InvalidFeeProtocol.into());
            }

            let old = pool.state.slot0.fee_protocol;
            pool.state.slot0.fee_protocol = fee_protocol0 + (fee_protocol1 << 4);

            info!(
                pool = %pool.config.address,
                old_fee_protocol0 = old % 16,
                old_fee_protocol1 = old >> 4,
                fee_protocol0,
                fee_protocol1,
                "protocol fee set"
            );
            Ok(())
        })
    }

    /// Transfers accrued protocol fees, capped at what has accrued.
    pub fn collect_protocol(
        &mut self,
        caller: Address,
        recipient: Address,
        amount0_requested: u128,
        amount1_requested: u128,
    ) -> Result<(u128, u128), Error> {
        self.transact(|pool| {
            pool.only_owner(caller)?;

            let fees = &mut pool.state.protocol_fees;
            let amount0 = amount0_requested.min(fees.token0);
            let amount1 = amount1_requested.min(fees.token1);
            fees.token0 -= amount0;
            fees.token1 -= amount1;

            let (token0, token1) = (pool.config.token0, pool.config.token1);
            pool.pay_out(token0, recipient, U256::from(amount0))?;
            pool.pay_out(token1, recipient, U256::from(amount1))?;

            info!(
                pool = %pool.config.address,
                recipient = %recipient,
                amount0,
                amount1,
                "protocol fees collected"
            );
            Ok((amount0, amount1))
        })
    }

    /// Raises the number of observations the oracle will keep. Takes effect
    /// on the next write that wraps the populated part of the ring.
    pub fn increase_observation_cardinality_next(
        &mut self,
        observation_cardinality_next: u16,
    ) -> Result<(), Error> {
        self.transact(|pool| {
            let old = pool.state.slot0.observation_cardinality_next;
            let new = pool
                .state
                .observations
                .grow(old, observation_cardinality_next)?;
            pool.state.slot0.observation_cardinality_next = new;

            if old != new {
                info!(
                    pool = %pool.config.address,
                    old,
                    new,
                    "observation cardinality next increased"
                );
            }
            Ok(())
        })
    }

    /// Applies a liquidity change to a position and returns the token
    /// amounts owed to (positive) or by (negative) the pool.
    fn modify_position(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> Result<(I256, I256), Error> {
        self.check_ticks(tick_lower, tick_upper)?;

        let slot0 = self.state.slot0;
        self.update_position(owner, tick_lower, tick_upper, liquidity_delta, slot0.tick)?;

        if liquidity_delta == 0 {
            return Ok((I256::ZERO, I256::ZERO));
        }

        let sqrt_ratio_lower = get_sqrt_ratio_at_tick(tick_lower)?;
        let sqrt_ratio_upper = get_sqrt_ratio_at_tick(tick_upper)?;

        if slot0.tick < tick_lower {
            // range entirely above the price, all token0
            let amount0 = get_amount_0_delta(sqrt_ratio_lower, sqrt_ratio_upper, liquidity_delta)?;
            Ok((amount0, I256::ZERO))
        } else if slot0.tick < tick_upper {
            let time = self.block_timestamp();
            let liquidity_before = self.state.liquidity;

            (
                self.state.slot0.observation_index,
                self.state.slot0.observation_cardinality,
            ) = self.state.observations.write(
                slot0.observation_index,
                time,
                slot0.tick,
                liquidity_before,
                slot0.observation_cardinality,
                slot0.observation_cardinality_next,
            );

            let amount0 =
                get_amount_0_delta(slot0.sqrt_price_x96, sqrt_ratio_upper, liquidity_delta)?;
            let amount1 =
                get_amount_1_delta(sqrt_ratio_lower, slot0.sqrt_price_x96, liquidity_delta)?;

            self.state.liquidity = add_delta(liquidity_before, liquidity_delta)?;
            Ok((amount0, amount1))
        } else {
            // range entirely below the price, all token1
            let amount1 = get_amount_1_delta(sqrt_ratio_lower, sqrt_ratio_upper, liquidity_delta)?;
            Ok((I256::ZERO, amount1))
        }
    }

    /// Updates both boundary ticks, the bitmap and the position ledger.
    fn update_position(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
        tick_current: i32,
    ) -> Result<(), Error> {
        let time = self.block_timestamp();
        let tick_spacing = self.config.tick_spacing;
        let max_liquidity = self.max_liquidity_per_tick;
        let state = &mut self.state;

        let fee_growth_global0_x128 = state.fee_growth_global0_x128;
        let fee_growth_global1_x128 = state.fee_growth_global1_x128;

        let mut flipped_lower = false;
        let mut flipped_upper = false;
        if liquidity_delta != 0 {
            let (tick_cumulative, seconds_per_liquidity_cumulative_x128) =
                state.observations.observe_single(
                    time,
                    0,
                    state.slot0.tick,
                    state.slot0.observation_index,
                    state.liquidity,
                    state.slot0.observation_cardinality,
                )?;
            let globals = Accumulators {
                fee_growth_global0_x128,
                fee_growth_global1_x128,
                seconds_per_liquidity_cumulative_x128,
                tick_cumulative,
                time,
            };

            flipped_lower = tick::update(
                &mut state.ticks,
                tick_lower,
                tick_current,
                liquidity_delta,
                &globals,
                false,
                max_liquidity,
            )?;
            flipped_upper = tick::update(
                &mut state.ticks,
                tick_upper,
                tick_current,
                liquidity_delta,
                &globals,
                true,
                max_liquidity,
            )?;

            if flipped_lower {
                flip_tick(&mut state.tick_bitmap, tick_lower, tick_spacing)?;
            }
            if flipped_upper {
                flip_tick(&mut state.tick_bitmap, tick_upper, tick_spacing)?;
            }
        }

        let (fee_growth_inside0_x128, fee_growth_inside1_x128) = tick::get_fee_growth_inside(
            &state.ticks,
            tick_lower,
            tick_upper,
            tick_current,
            fee_growth_global0_x128,
            fee_growth_global1_x128,
        );

        state
            .positions
            .entry(PositionKey::new(owner, tick_lower, tick_upper))
            .or_default()
            .update(liquidity_delta, fee_growth_inside0_x128, fee_growth_inside1_x128)?;

        // a flip while removing liquidity means nobody references the tick
        if liquidity_delta < 0 {
            if flipped_lower {
                tick::clear(&mut state.ticks, tick_lower);
            }
            if flipped_upper {
                tick::clear(&mut state.ticks, tick_upper);
            }
        }
        Ok(())
    }
}
