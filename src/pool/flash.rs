use crate::error::{Error, MathError, PoolError};
use crate::ledger::Ledger;
use crate::math::math_helpers::{mul_div, mul_div_rounding_up};
use crate::math::safe_cast::truncate_u128;
use crate::pool::callback::FlashCallback;
use crate::pool::v3_pool::Pool;
use crate::{Q128, U256_E6};
use alloy_primitives::{Address, U256};
use tracing::debug;

/// Splits a paid fee into the protocol's cut and the part left for
/// liquidity providers.
fn split_fee(paid: U256, fee_protocol: u8) -> (U256, U256) {
    if fee_protocol == 0 {
        return (U256::ZERO, paid);
    }
    let protocol = paid / U256::from(fee_protocol);
    (protocol, paid - protocol)
}

impl<L: Ledger + Clone> Pool<L> {
    /// Lends `amount0` and `amount1` to `recipient` for the duration of the
    /// callback, which must return them plus a fee of `ceil(amount * fee / 1e6)`.
    ///
    /// Anything paid back above the borrowed amounts is distributed to
    /// in-range liquidity as fees. Returns what was actually paid.
    pub fn flash<C: FlashCallback<L>>(
        &mut self,
        recipient: Address,
        amount0: U256,
        amount1: U256,
        callback: &mut C,
        data: &[u8],
    ) -> Result<(U256, U256), Error> {
        self.transact(|pool| {
            let liquidity = pool.state.liquidity;
            if liquidity == 0 {
                return Err(PoolError::NoInRangeLiquidity.into());
            }

            let fee = U256::from(pool.fee());
            let fee0 = mul_div_rounding_up(amount0, fee, U256_E6)?;
            let fee1 = mul_div_rounding_up(amount1, fee, U256_E6)?;
            let balance0_before = pool.balance0();
            let balance1_before = pool.balance1();

            let (token0, token1) = (pool.token0(), pool.token1());
            pool.pay_out(token0, recipient, amount0)?;
            pool.pay_out(token1, recipient, amount1)?;

            callback.flash_callback(pool, fee0, fee1, data)?;

            let balance0_after = pool.balance0();
            let balance1_after = pool.balance1();
            if balance0_before.checked_add(fee0).ok_or(MathError::Overflow)? > balance0_after {
                return Err(PoolError::Flash0NotPaid.into());
            }
            if balance1_before.checked_add(fee1).ok_or(MathError::Overflow)? > balance1_after {
                return Err(PoolError::Flash1NotPaid.into());
            }

            let paid0 = balance0_after - balance0_before;
            let paid1 = balance1_after - balance1_before;
            let fee_protocol = pool.state.slot0.fee_protocol;
            let liquidity = U256::from(liquidity);
            let state = &mut pool.state;

            if !paid0.is_zero() {
                let (protocol, rest) = split_fee(paid0, fee_protocol % 16);
                state.protocol_fees.token0 =
                    state.protocol_fees.token0.wrapping_add(truncate_u128(protocol));
                state.fee_growth_global0_x128 = state
                    .fee_growth_global0_x128
                    .wrapping_add(mul_div(rest, Q128, liquidity)?);
            }
            if !paid1.is_zero() {
                let (protocol, rest) = split_fee(paid1, fee_protocol >> 4);
                state.protocol_fees.token1 =
                    state.protocol_fees.token1.wrapping_add(truncate_u128(protocol));
                state.fee_growth_global1_x128 = state
                    .fee_growth_global1_x128
                    .wrapping_add(mul_div(rest, Q128, liquidity)?);
            }

            debug!(
                pool = %pool.address(),
                recipient = %recipient,
                amount0 = %amount0,
                amount1 = %amount1,
                paid0 = %paid0,
                paid1 = %paid1,
                "flash"
            );
            Ok((paid0, paid1))
        })
    }
}
