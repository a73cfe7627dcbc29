use alloy_primitives::Address;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("BitMath error - zero input value")]
    ZeroValue,
    #[error("Math error - value does not fit the target type")]
    UnsafeCast,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - sqrtPrice out of bounds")]
    SqrtPriceOutOfBounds,
    #[error("State error - sqrtPrice is 0")]
    SqrtPriceIsZero,
    #[error("State error - sqrtRatio is 0")]
    SqrtRatioIsZero,

    #[error("State error - tick out of bounds")]
    TickOutOfBounds,

    #[error("State error - liquidity is 0")]
    LiquidityIsZero,

    #[error("State error - requested amount exceeds pool reserves")]
    InsufficientReserves,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool error - pool is locked")]
    Locked,
    #[error("Pool error - pool is not initialized")]
    NotInitialized,
    #[error("Pool error - pool is already initialized")]
    AlreadyInitialized,
    #[error("Pool error - invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Pool error - tick lower must be below tick upper")]
    TickLowerNotBelowUpper,
    #[error("Pool error - tick lower below minimum tick")]
    TickLowerTooLow,
    #[error("Pool error - tick upper above maximum tick")]
    TickUpperTooHigh,
    #[error("Pool error - tick {0} is not a multiple of the tick spacing")]
    TickNotSpaced(i32),
    #[error("Pool error - tick {0} is not initialized")]
    TickNotInitialized(i32),
    #[error("Pool error - tick liquidity exceeds the per-tick maximum")]
    LiquidityExceedsMax,
    #[error("Pool error - position has no liquidity")]
    NoLiquidity,

    #[error("Pool error - amount must be non-zero")]
    ZeroAmount,
    #[error("Pool error - price limit already reached")]
    PriceLimitAlreadyReached,
    #[error("Pool error - price limit on the wrong side of the current price or out of range")]
    InvalidPriceLimit,
    #[error("Pool error - no liquidity available in the swap direction")]
    InsufficientLiquidity,
    #[error("Pool error - no in-range liquidity")]
    NoInRangeLiquidity,

    #[error("Pool error - token0 owed by mint was not paid")]
    Mint0NotPaid,
    #[error("Pool error - token1 owed by mint was not paid")]
    Mint1NotPaid,
    #[error("Pool error - swap input amount was not paid")]
    InsufficientInputAmount,
    #[error("Pool error - pool balance decreased during settlement")]
    BalanceDecreased,
    #[error("Pool error - token0 flash loan was not repaid with fee")]
    Flash0NotPaid,
    #[error("Pool error - token1 flash loan was not repaid with fee")]
    Flash1NotPaid,

    #[error("Pool error - caller is not the pool owner")]
    NotOwner,
    #[error("Pool error - protocol fee denominator must be 0 or within 4..=10")]
    InvalidFeeProtocol,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OracleError {
    #[error("Oracle error - observations are not initialized")]
    NotInitialized,
    #[error("Oracle error - target is older than the oldest observation")]
    TooOld,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger error - {account} holds insufficient balance of token {token}")]
    InsufficientBalance { token: Address, account: Address },
    #[error("Ledger error - balance overflow for token {token}")]
    BalanceOverflow { token: Address },
}

/// Failures loading a [`crate::PoolConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error - failed to parse pool config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] PoolError),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] crate::error::MathError),

    #[error(transparent)]
    StateError(#[from] crate::error::StateError),

    #[error(transparent)]
    PoolError(#[from] crate::error::PoolError),

    #[error(transparent)]
    OracleError(#[from] crate::error::OracleError),

    #[error(transparent)]
    LedgerError(#[from] crate::error::LedgerError),
}
