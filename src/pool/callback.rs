//! Settlement hooks invoked while the pool is locked.
//!
//! The pool never pulls tokens. It hands control to the caller, which must
//! move what is owed onto the pool's ledger account; the pool then checks
//! its own balances. Callbacks receive the pool itself, so they can read
//! views and pay in through `Pool::pay`. Any state-changing call, and
//! `Pool::ledger_mut`, fails with `PoolError::Locked`.

use crate::error::Error;
use crate::ledger::Ledger;
use crate::pool::v3_pool::Pool;
use alloy_primitives::{Address, I256, U256};

pub trait MintCallback<L: Ledger> {
    /// Pay `amount0_owed` of token0 and `amount1_owed` of token1.
    fn mint_callback(
        &mut self,
        pool: &mut Pool<L>,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &[u8],
    ) -> Result<(), Error>;
}

pub trait SwapCallback<L: Ledger> {
    /// Deltas are from the pool's point of view: positive amounts must be
    /// paid in, negative amounts were already sent to the recipient.
    fn swap_callback(
        &mut self,
        pool: &mut Pool<L>,
        amount0_delta: I256,
        amount1_delta: I256,
        data: &[u8],
    ) -> Result<(), Error>;
}

pub trait FlashCallback<L: Ledger> {
    /// Repay the borrowed amounts plus `fee0` and `fee1`.
    fn flash_callback(
        &mut self,
        pool: &mut Pool<L>,
        fee0: U256,
        fee1: U256,
        data: &[u8],
    ) -> Result<(), Error>;
}

/// Settles mints and swaps in full from a single funded account.
#[derive(Clone, Copy, Debug)]
pub struct Payer {
    pub account: Address,
}

impl Payer {
    pub fn new(account: Address) -> Self {
        Self { account }
    }

    fn pay<L: Ledger>(&self, pool: &mut Pool<L>, token: Address, amount: U256) -> Result<(), Error> {
        pool.pay(token, self.account, amount)
    }
}

impl<L: Ledger> MintCallback<L> for Payer {
    fn mint_callback(
        &mut self,
        pool: &mut Pool<L>,
        amount0_owed: U256,
        amount1_owed: U256,
        _data: &[u8],
    ) -> Result<(), Error> {
        let (token0, token1) = (pool.token0(), pool.token1());
        self.pay(pool, token0, amount0_owed)?;
        self.pay(pool, token1, amount1_owed)
    }
}

impl<L: Ledger> SwapCallback<L> for Payer {
    fn swap_callback(
        &mut self,
        pool: &mut Pool<L>,
        amount0_delta: I256,
        amount1_delta: I256,
        _data: &[u8],
    ) -> Result<(), Error> {
        if amount0_delta.is_positive() {
            let token0 = pool.token0();
            self.pay(pool, token0, amount0_delta.into_raw())?;
        }
        if amount1_delta.is_positive() {
            let token1 = pool.token1();
            self.pay(pool, token1, amount1_delta.into_raw())?;
        }
        Ok(())
    }
}
