use crate::Q128;
use crate::error::{Error, PoolError};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::mul_div;
use crate::math::safe_cast::truncate_u128;
use alloy_primitives::{Address, U256};

/// Positions are keyed by owner and tick range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl PositionKey {
    pub fn new(owner: Address, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            owner,
            tick_lower,
            tick_upper,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PositionInfo {
    pub liquidity: u128,
    /// Fee growth inside the range as of the last update.
    pub fee_growth_inside0_last_x128: U256,
    pub fee_growth_inside1_last_x128: U256,
    /// Fees and burned principal waiting to be collected.
    pub tokens_owed0: u128,
    pub tokens_owed1: u128,
}

impl PositionInfo {
    /// Credits fees earned since the last snapshot, then applies
    /// `liquidity_delta`.
    ///
    /// A zero delta on an empty position fails with `NoLiquidity`, so fees
    /// can only be poked on positions that hold liquidity. Owed amounts are
    /// truncated to `u128` and wrap on overflow; owners have to collect
    /// before that point.
    pub fn update(
        &mut self,
        liquidity_delta: i128,
        fee_growth_inside0_x128: U256,
        fee_growth_inside1_x128: U256,
    ) -> Result<(), Error> {
        let liquidity_next = if liquidity_delta == 0 {
            if self.liquidity == 0 {
                return Err(PoolError::NoLiquidity.into());
            }
            self.liquidity
        } else {
            add_delta(self.liquidity, liquidity_delta)?
        };

        let liquidity = U256::from(self.liquidity);
        let owed0 = mul_div(
            fee_growth_inside0_x128.wrapping_sub(self.fee_growth_inside0_last_x128),
            liquidity,
            Q128,
        )?;
        let owed1 = mul_div(
            fee_growth_inside1_x128.wrapping_sub(self.fee_growth_inside1_last_x128),
            liquidity,
            Q128,
        )?;

        self.liquidity = liquidity_next;
        self.fee_growth_inside0_last_x128 = fee_growth_inside0_x128;
        self.fee_growth_inside1_last_x128 = fee_growth_inside1_x128;
        self.tokens_owed0 = self.tokens_owed0.wrapping_add(truncate_u128(owed0));
        self.tokens_owed1 = self.tokens_owed1.wrapping_add(truncate_u128(owed1));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MathError;

    #[test]
    fn poke_on_empty_position_fails() {
        let mut position = PositionInfo::default();
        assert_eq!(
            position.update(0, U256::ZERO, U256::ZERO),
            Err(Error::PoolError(PoolError::NoLiquidity))
        );
    }

    #[test]
    fn first_update_only_snapshots_fee_growth() {
        let mut position = PositionInfo::default();
        position.update(100, Q128 * U256::from(5u8), U256::ZERO).unwrap();

        assert_eq!(position.liquidity, 100);
        assert_eq!(position.tokens_owed0, 0);
        assert_eq!(position.fee_growth_inside0_last_x128, Q128 * U256::from(5u8));
    }

    #[test]
    fn credits_fees_on_previous_liquidity() {
        let mut position = PositionInfo::default();
        position.update(100, U256::ZERO, U256::ZERO).unwrap();

        // 1.5 token0 and 0.25 token1 per unit of liquidity
        let fg0 = Q128 + (Q128 >> 1);
        let fg1 = Q128 >> 2;
        position.update(-40, fg0, fg1).unwrap();

        assert_eq!(position.liquidity, 60);
        assert_eq!(position.tokens_owed0, 150);
        assert_eq!(position.tokens_owed1, 25);

        // poke accrues nothing new
        position.update(0, fg0, fg1).unwrap();
        assert_eq!(position.tokens_owed0, 150);
    }

    #[test]
    fn fee_growth_wraparound_still_credits_the_difference() {
        let mut position = PositionInfo::default();
        position
            .update(10, U256::MAX - Q128 + U256::ONE, U256::ZERO)
            .unwrap();
        position.update(0, Q128, U256::ZERO).unwrap();
        assert_eq!(position.tokens_owed0, 20);
    }

    #[test]
    fn burning_more_than_held_fails() {
        let mut position = PositionInfo::default();
        position.update(10, U256::ZERO, U256::ZERO).unwrap();
        assert_eq!(
            position.update(-11, U256::ZERO, U256::ZERO),
            Err(Error::MathError(MathError::Underflow))
        );
    }
}
