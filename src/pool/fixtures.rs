//! Shared pool builders and callbacks for the pool tests.

use crate::config::PoolConfig;
use crate::error::{Error, PoolError};
use crate::ledger::{InMemoryLedger, Ledger};
use crate::pool::callback::{FlashCallback, MintCallback, Payer, SwapCallback};
use crate::pool::swap::{SwapParams, SwapResult};
use crate::pool::v3_pool::Pool;
use alloy_primitives::{Address, I256, U256};

pub const TOKEN0: Address = Address::repeat_byte(0x10);
pub const TOKEN1: Address = Address::repeat_byte(0x20);
pub const POOL: Address = Address::repeat_byte(0x99);
pub const OWNER: Address = Address::repeat_byte(0x0f);
pub const LP: Address = Address::repeat_byte(0x01);
pub const TRADER: Address = Address::repeat_byte(0x02);

pub const START_TIME: u64 = 1_700_000_000;

pub type TestPool = Pool<InMemoryLedger>;

/// Ledger where `LP` and `TRADER` each hold 10^30 of both tokens.
pub fn funded_ledger() -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new(START_TIME);
    let funds = U256::from(10u128.pow(30));
    for account in [LP, TRADER] {
        for token in [TOKEN0, TOKEN1] {
            ledger.mint_tokens(token, account, funds).unwrap();
        }
    }
    ledger
}

pub fn pool(fee: u32, tick_spacing: i32) -> TestPool {
    let config = PoolConfig::new(POOL, TOKEN1, TOKEN0, fee, tick_spacing, OWNER);
    Pool::new(config, funded_ledger()).unwrap()
}

pub fn initialized_pool(fee: u32, tick_spacing: i32, sqrt_price_x96: U256) -> TestPool {
    let mut pool = pool(fee, tick_spacing);
    pool.initialize(sqrt_price_x96).unwrap();
    pool
}

/// `sqrt(reserve1 / reserve0)` as a Q64.96, rounded down.
pub fn encode_price_sqrt(reserve1: u128, reserve0: u128) -> U256 {
    let ratio: U256 = (U256::from(reserve1) << 192) / U256::from(reserve0);
    if ratio.is_zero() {
        return U256::ZERO;
    }
    // Newton iteration from above converges to floor(sqrt)
    let mut x = ratio;
    let mut y = (x + U256::ONE) >> 1;
    while y < x {
        x = y;
        y = (x + ratio / x) >> 1;
    }
    x
}

pub fn exact_in(zero_for_one: bool, amount: u128, sqrt_price_limit_x96: U256) -> SwapParams {
    SwapParams::new(
        TRADER,
        zero_for_one,
        I256::try_from(amount).unwrap(),
        sqrt_price_limit_x96,
    )
}

pub fn exact_out(zero_for_one: bool, amount: u128, sqrt_price_limit_x96: U256) -> SwapParams {
    SwapParams::new(
        TRADER,
        zero_for_one,
        -I256::try_from(amount).unwrap(),
        sqrt_price_limit_x96,
    )
}

/// Accepts every callback without paying anything.
pub struct NoPay;

impl<L: Ledger> MintCallback<L> for NoPay {
    fn mint_callback(&mut self, _: &mut Pool<L>, _: U256, _: U256, _: &[u8]) -> Result<(), Error> {
        Ok(())
    }
}

impl<L: Ledger> SwapCallback<L> for NoPay {
    fn swap_callback(&mut self, _: &mut Pool<L>, _: I256, _: I256, _: &[u8]) -> Result<(), Error> {
        Ok(())
    }
}

impl<L: Ledger> FlashCallback<L> for NoPay {
    fn flash_callback(&mut self, _: &mut Pool<L>, _: U256, _: U256, _: &[u8]) -> Result<(), Error> {
        Ok(())
    }
}

/// Pays like `TRADER`'s [`Payer`] but first tries to swap again from
/// inside the callback, remembering the outcome.
#[derive(Default)]
pub struct Reenter {
    pub inner: Option<Result<SwapResult, Error>>,
}

impl SwapCallback<InMemoryLedger> for Reenter {
    fn swap_callback(
        &mut self,
        pool: &mut TestPool,
        amount0_delta: I256,
        amount1_delta: I256,
        data: &[u8],
    ) -> Result<(), Error> {
        let params = exact_in(true, 1, crate::math::tick_math::MIN_SQRT_RATIO + U256::ONE);
        self.inner = Some(pool.swap(params, &mut Payer::new(TRADER), &[]));
        Payer::new(TRADER).swap_callback(pool, amount0_delta, amount1_delta, data)
    }
}

impl MintCallback<InMemoryLedger> for Reenter {
    fn mint_callback(
        &mut self,
        pool: &mut TestPool,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &[u8],
    ) -> Result<(), Error> {
        let params = exact_in(true, 1, crate::math::tick_math::MIN_SQRT_RATIO + U256::ONE);
        self.inner = Some(pool.swap(params, &mut Payer::new(TRADER), &[]));
        Payer::new(LP).mint_callback(pool, amount0_owed, amount1_owed, data)
    }
}

/// Repays a flash loan of `amount0`/`amount1` from `TRADER`, plus the fee
/// minus `shortfall0` of token0.
pub struct FlashPayer {
    pub amount0: U256,
    pub amount1: U256,
    pub shortfall0: U256,
    pub extra1: U256,
}

impl FlashPayer {
    pub fn new(amount0: u128, amount1: u128) -> Self {
        Self {
            amount0: U256::from(amount0),
            amount1: U256::from(amount1),
            shortfall0: U256::ZERO,
            extra1: U256::ZERO,
        }
    }
}

impl FlashCallback<InMemoryLedger> for FlashPayer {
    fn flash_callback(
        &mut self,
        pool: &mut TestPool,
        fee0: U256,
        fee1: U256,
        _data: &[u8],
    ) -> Result<(), Error> {
        let repay0 = self.amount0 + fee0 - self.shortfall0;
        let repay1 = self.amount1 + fee1 + self.extra1;
        pool.pay(TOKEN0, TRADER, repay0)?;
        pool.pay(TOKEN1, TRADER, repay1)
    }
}

/// Takes `amount` of `token` off the pool's own account before settling in
/// full like a [`Payer`]. Mirrors a host ledger that lets the callback debit
/// the pool; the pool must refuse the result.
pub struct Drain {
    pub token: Address,
    pub amount: U256,
    /// What `Pool::ledger_mut` returned from inside the callback.
    pub ledger_mut: Option<PoolError>,
}

impl Drain {
    pub fn new(token: Address, amount: U256) -> Self {
        Self {
            token,
            amount,
            ledger_mut: None,
        }
    }

    fn drain(&mut self, pool: &mut TestPool) -> Result<(), Error> {
        self.ledger_mut = pool.ledger_mut().err();
        let from = pool.address();
        pool.ledger.transfer(self.token, from, TRADER, self.amount)?;
        Ok(())
    }
}

impl MintCallback<InMemoryLedger> for Drain {
    fn mint_callback(
        &mut self,
        pool: &mut TestPool,
        amount0_owed: U256,
        amount1_owed: U256,
        data: &[u8],
    ) -> Result<(), Error> {
        self.drain(pool)?;
        Payer::new(LP).mint_callback(pool, amount0_owed, amount1_owed, data)
    }
}

impl SwapCallback<InMemoryLedger> for Drain {
    fn swap_callback(
        &mut self,
        pool: &mut TestPool,
        amount0_delta: I256,
        amount1_delta: I256,
        data: &[u8],
    ) -> Result<(), Error> {
        self.drain(pool)?;
        Payer::new(TRADER).swap_callback(pool, amount0_delta, amount1_delta, data)
    }
}
