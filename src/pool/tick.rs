use crate::error::{Error, MathError, PoolError};
use crate::math::liquidity_math::add_delta;
use crate::math::tick_math::{MAX_TICK, MIN_TICK};
use crate::{FastMap, U160_MAX};
use alloy_primitives::U256;

/// Per-tick state. Everything "outside" is relative to the side of the tick
/// the price is not on, and only meaningful as a difference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickInfo {
    /// Total liquidity of positions that reference this tick.
    pub liquidity_gross: u128,
    /// Liquidity added when the tick is crossed left to right, removed right
    /// to left.
    pub liquidity_net: i128,
    pub fee_growth_outside0_x128: U256,
    pub fee_growth_outside1_x128: U256,
    pub tick_cumulative_outside: i64,
    pub seconds_per_liquidity_outside_x128: U256,
    pub seconds_outside: u32,
    /// Equivalent to `liquidity_gross != 0`.
    pub initialized: bool,
}

/// Global values checkpointed into a tick when it is first touched or
/// crossed.
#[derive(Clone, Copy, Debug, Default)]
pub struct Accumulators {
    pub fee_growth_global0_x128: U256,
    pub fee_growth_global1_x128: U256,
    pub seconds_per_liquidity_cumulative_x128: U256,
    pub tick_cumulative: i64,
    pub time: u32,
}

/// Maximum liquidity any single tick may reference, so that the sum over
/// every usable tick still fits a `u128`.
pub fn tick_spacing_to_max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = (MIN_TICK / tick_spacing) * tick_spacing;
    let max_tick = (MAX_TICK / tick_spacing) * tick_spacing;
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;
    u128::MAX / num_ticks
}

/// Fee growth per unit of liquidity inside `[tick_lower, tick_upper)`,
/// as global minus below minus above, all wrapping.
pub fn get_fee_growth_inside(
    ticks: &FastMap<i32, TickInfo>,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    fee_growth_global0_x128: U256,
    fee_growth_global1_x128: U256,
) -> (U256, U256) {
    let lower = ticks.get(&tick_lower).copied().unwrap_or_default();
    let upper = ticks.get(&tick_upper).copied().unwrap_or_default();

    let (below0, below1) = if tick_current >= tick_lower {
        (lower.fee_growth_outside0_x128, lower.fee_growth_outside1_x128)
    } else {
        (
            fee_growth_global0_x128.wrapping_sub(lower.fee_growth_outside0_x128),
            fee_growth_global1_x128.wrapping_sub(lower.fee_growth_outside1_x128),
        )
    };

    let (above0, above1) = if tick_current < tick_upper {
        (upper.fee_growth_outside0_x128, upper.fee_growth_outside1_x128)
    } else {
        (
            fee_growth_global0_x128.wrapping_sub(upper.fee_growth_outside0_x128),
            fee_growth_global1_x128.wrapping_sub(upper.fee_growth_outside1_x128),
        )
    };

    (
        fee_growth_global0_x128
            .wrapping_sub(below0)
            .wrapping_sub(above0),
        fee_growth_global1_x128
            .wrapping_sub(below1)
            .wrapping_sub(above1),
    )
}

/// Applies a liquidity change to one boundary of a position and returns
/// whether the tick flipped between initialized and uninitialized.
///
/// A tick at or below the current tick is assumed to have seen all growth
/// so far below it, so its outside checkpoints start at the global values.
pub fn update(
    ticks: &mut FastMap<i32, TickInfo>,
    tick: i32,
    tick_current: i32,
    liquidity_delta: i128,
    globals: &Accumulators,
    upper: bool,
    max_liquidity: u128,
) -> Result<bool, Error> {
    let info = ticks.entry(tick).or_default();

    let liquidity_gross_before = info.liquidity_gross;
    let liquidity_gross_after = add_delta(liquidity_gross_before, liquidity_delta)?;

    if liquidity_gross_after > max_liquidity {
        return Err(PoolError::LiquidityExceedsMax.into());
    }

    let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

    if liquidity_gross_before == 0 {
        if tick <= tick_current {
            info.fee_growth_outside0_x128 = globals.fee_growth_global0_x128;
            info.fee_growth_outside1_x128 = globals.fee_growth_global1_x128;
            info.seconds_per_liquidity_outside_x128 =
                globals.seconds_per_liquidity_cumulative_x128;
            info.tick_cumulative_outside = globals.tick_cumulative;
            info.seconds_outside = globals.time;
        }
        info.initialized = true;
    }

    info.liquidity_gross = liquidity_gross_after;
    info.liquidity_net = if upper {
        info.liquidity_net.checked_sub(liquidity_delta)
    } else {
        info.liquidity_net.checked_add(liquidity_delta)
    }
    .ok_or(MathError::Overflow)?;

    Ok(flipped)
}

/// Drops all state of a tick that no position references any more.
pub fn clear(ticks: &mut FastMap<i32, TickInfo>, tick: i32) {
    ticks.remove(&tick);
}

/// Moves the price across `tick`, flipping every outside checkpoint to
/// `global - outside`, and returns the tick's net liquidity.
pub fn cross(ticks: &mut FastMap<i32, TickInfo>, tick: i32, globals: &Accumulators) -> i128 {
    let Some(info) = ticks.get_mut(&tick) else {
        return 0;
    };

    info.fee_growth_outside0_x128 = globals
        .fee_growth_global0_x128
        .wrapping_sub(info.fee_growth_outside0_x128);
    info.fee_growth_outside1_x128 = globals
        .fee_growth_global1_x128
        .wrapping_sub(info.fee_growth_outside1_x128);
    info.seconds_per_liquidity_outside_x128 = globals
        .seconds_per_liquidity_cumulative_x128
        .wrapping_sub(info.seconds_per_liquidity_outside_x128)
        & U160_MAX;
    info.tick_cumulative_outside = globals
        .tick_cumulative
        .wrapping_sub(info.tick_cumulative_outside);
    info.seconds_outside = globals.time.wrapping_sub(info.seconds_outside);

    info.liquidity_net
}
