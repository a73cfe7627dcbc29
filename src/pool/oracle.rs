//! Circular buffer of price and liquidity observations.
//!
//! Each observation stores running sums since pool initialization:
//! `tick * seconds` and `seconds / max(liquidity, 1)` in Q128.128, the
//! latter wrapping at 160 bits. Capacity grows lazily: raising the
//! cardinality target only pre-touches slots, and the ring actually widens
//! on the next write that reaches the end of the populated region.

use crate::U160_MAX;
use crate::error::OracleError;
use alloy_primitives::U256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Observation {
    pub block_timestamp: u32,
    pub tick_cumulative: i64,
    pub seconds_per_liquidity_cumulative_x128: U256,
    pub initialized: bool,
}

/// Rolls `last` forward to `time`, assuming `tick` and `liquidity` held for
/// the whole interval.
pub fn transform(last: &Observation, time: u32, tick: i32, liquidity: u128) -> Observation {
    let delta = time.wrapping_sub(last.block_timestamp);
    let spl_increment = (U256::from(delta) << 128) / U256::from(liquidity.max(1));

    Observation {
        block_timestamp: time,
        tick_cumulative: last
            .tick_cumulative
            .wrapping_add(i64::from(tick).wrapping_mul(i64::from(delta))),
        seconds_per_liquidity_cumulative_x128: last
            .seconds_per_liquidity_cumulative_x128
            .wrapping_add(spl_increment)
            & U160_MAX,
        initialized: true,
    }
}

/// `a <= b` for 32-bit timestamps that may have wrapped, both assumed to be
/// chronologically at or before `time`.
pub fn lte(time: u32, a: u32, b: u32) -> bool {
    if a <= time && b <= time {
        return a <= b;
    }

    let a_adjusted = if a > time { u64::from(a) } else { u64::from(a) + (1 << 32) };
    let b_adjusted = if b > time { u64::from(b) } else { u64::from(b) + (1 << 32) };
    a_adjusted <= b_adjusted
}

#[derive(Clone, Debug, Default)]
pub struct Observations {
    slots: Vec<Observation>,
}

impl Observations {
    /// Observation at `index`; never-touched slots read as zeroed.
    pub fn get(&self, index: u16) -> Observation {
        self.slots.get(usize::from(index)).copied().unwrap_or_default()
    }

    fn set(&mut self, index: u16, observation: Observation) {
        let index = usize::from(index);
        if index >= self.slots.len() {
            self.slots.resize(index + 1, Observation::default());
        }
        self.slots[index] = observation;
    }

    /// Writes the first observation and returns `(cardinality, cardinality_next)`.
    pub fn initialize(&mut self, time: u32) -> (u16, u16) {
        self.set(
            0,
            Observation {
                block_timestamp: time,
                tick_cumulative: 0,
                seconds_per_liquidity_cumulative_x128: U256::ZERO,
                initialized: true,
            },
        );
        (1, 1)
    }

    /// Records the state that held since the last observation, at most once
    /// per timestamp. Returns the new `(index, cardinality)`.
    pub fn write(
        &mut self,
        index: u16,
        time: u32,
        tick: i32,
        liquidity: u128,
        cardinality: u16,
        cardinality_next: u16,
    ) -> (u16, u16) {
        let last = self.get(index);

        if last.block_timestamp == time {
            return (index, cardinality);
        }

        // widen once the last populated slot is reached
        let cardinality_updated = if cardinality_next > cardinality && index == cardinality - 1 {
            cardinality_next
        } else {
            cardinality
        };

        let index_updated = ((u32::from(index) + 1) % u32::from(cardinality_updated)) as u16;
        self.set(index_updated, transform(&last, time, tick, liquidity));
        (index_updated, cardinality_updated)
    }

    /// Prepares slots up to `next` and returns the new cardinality target.
    pub fn grow(&mut self, current: u16, next: u16) -> Result<u16, OracleError> {
        if current == 0 {
            return Err(OracleError::NotInitialized);
        }
        if next <= current {
            return Ok(current);
        }

        for i in current..next {
            // timestamp 1 marks the slot as touched but not initialized
            self.set(
                i,
                Observation {
                    block_timestamp: 1,
                    ..Observation::default()
                },
            );
        }
        Ok(next)
    }

    /// Finds the two observations around `target`, assuming it lies between
    /// the oldest and the newest one.
    fn binary_search(
        &self,
        time: u32,
        target: u32,
        index: u16,
        cardinality: u16,
    ) -> (Observation, Observation) {
        let cardinality = u32::from(cardinality);
        let mut l = (u32::from(index) + 1) % cardinality;
        let mut r = l + cardinality - 1;

        loop {
            let i = (l + r) / 2;

            let before_or_at = self.get((i % cardinality) as u16);
            if !before_or_at.initialized {
                l = i + 1;
                continue;
            }

            let at_or_after = self.get(((i + 1) % cardinality) as u16);
            let target_at_or_after = lte(time, before_or_at.block_timestamp, target);

            if target_at_or_after && lte(time, target, at_or_after.block_timestamp) {
                return (before_or_at, at_or_after);
            }

            if target_at_or_after {
                l = i + 1;
            } else {
                r = i - 1;
            }
        }
    }

    fn get_surrounding_observations(
        &self,
        time: u32,
        target: u32,
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(Observation, Observation), OracleError> {
        let newest = self.get(index);

        if lte(time, newest.block_timestamp, target) {
            if newest.block_timestamp == target {
                return Ok((newest, newest));
            }
            return Ok((newest, transform(&newest, target, tick, liquidity)));
        }

        let mut oldest = self.get(((u32::from(index) + 1) % u32::from(cardinality)) as u16);
        if !oldest.initialized {
            // the ring has not wrapped yet
            oldest = self.get(0);
        }

        if !lte(time, oldest.block_timestamp, target) {
            return Err(OracleError::TooOld);
        }

        Ok(self.binary_search(time, target, index, cardinality))
    }

    /// Cumulative values as of `seconds_ago` before `time`, interpolating
    /// between stored observations and extrapolating from the newest one.
    ///
    /// Returns `(tick_cumulative, seconds_per_liquidity_cumulative_x128)`.
    pub fn observe_single(
        &self,
        time: u32,
        seconds_ago: u32,
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(i64, U256), OracleError> {
        if cardinality == 0 {
            return Err(OracleError::NotInitialized);
        }
        if seconds_ago == 0 {
            let mut last = self.get(index);
            if last.block_timestamp != time {
                last = transform(&last, time, tick, liquidity);
            }
            return Ok((
                last.tick_cumulative,
                last.seconds_per_liquidity_cumulative_x128,
            ));
        }

        let target = time.wrapping_sub(seconds_ago);
        let (before_or_at, at_or_after) =
            self.get_surrounding_observations(time, target, tick, index, liquidity, cardinality)?;

        if target == before_or_at.block_timestamp {
            return Ok((
                before_or_at.tick_cumulative,
                before_or_at.seconds_per_liquidity_cumulative_x128,
            ));
        }
        if target == at_or_after.block_timestamp {
            return Ok((
                at_or_after.tick_cumulative,
                at_or_after.seconds_per_liquidity_cumulative_x128,
            ));
        }

        let observation_time_delta = at_or_after
            .block_timestamp
            .wrapping_sub(before_or_at.block_timestamp);
        let target_delta = target.wrapping_sub(before_or_at.block_timestamp);

        let tick_cumulative = before_or_at.tick_cumulative.wrapping_add(
            (at_or_after
                .tick_cumulative
                .wrapping_sub(before_or_at.tick_cumulative)
                / i64::from(observation_time_delta))
            .wrapping_mul(i64::from(target_delta)),
        );

        let spl_delta = at_or_after
            .seconds_per_liquidity_cumulative_x128
            .wrapping_sub(before_or_at.seconds_per_liquidity_cumulative_x128)
            & U160_MAX;
        let spl_increment = (spl_delta * U256::from(target_delta)
            / U256::from(observation_time_delta))
            & U160_MAX;
        let seconds_per_liquidity = before_or_at
            .seconds_per_liquidity_cumulative_x128
            .wrapping_add(spl_increment)
            & U160_MAX;

        Ok((tick_cumulative, seconds_per_liquidity))
    }

    /// [`Observations::observe_single`] for each entry of `seconds_agos`.
    pub fn observe(
        &self,
        time: u32,
        seconds_agos: &[u32],
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(Vec<i64>, Vec<U256>), OracleError> {
        if cardinality == 0 {
            return Err(OracleError::NotInitialized);
        }

        let mut tick_cumulatives = Vec::with_capacity(seconds_agos.len());
        let mut seconds_per_liquidity = Vec::with_capacity(seconds_agos.len());
        for &seconds_ago in seconds_agos {
            let (tc, spl) =
                self.observe_single(time, seconds_ago, tick, index, liquidity, cardinality)?;
            tick_cumulatives.push(tc);
            seconds_per_liquidity.push(spl);
        }
        Ok((tick_cumulatives, seconds_per_liquidity))
    }
}
