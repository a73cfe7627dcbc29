//! Concentrated-liquidity pool core in pure Rust.
//!
//! This crate exposes:
//! - Low‑level math primitives (`math::*`) for ticks, prices, swap steps and bitmaps.
//! - A single-pair [`Pool`] that tracks ranged liquidity positions, executes
//!   swaps and flash loans, distributes fees and keeps a TWAP oracle.
//! - A [`Ledger`] abstraction for token balances and the block clock, with an
//!   [`InMemoryLedger`] for simulation and tests.
//!
//! Every state-changing entry point runs behind a reentrancy lock and is
//! atomic: on failure the pool and its ledger are restored to the state they
//! had when the call started.
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use clmm_pool::{math::tick_math, RESOLUTION, U256};
//!
//! let sqrt_price = tick_math::get_sqrt_ratio_at_tick(0).unwrap();
//! assert!(sqrt_price > U256::ZERO);
//! assert_eq!(RESOLUTION, 96);
//! ```
//!
//! ## Minting and swapping
//! ```no_run
//! use clmm_pool::{
//!     math::tick_math::MIN_SQRT_RATIO, Address, I256, InMemoryLedger, Payer, Pool, PoolConfig,
//!     SwapParams, Q96, U256,
//! };
//!
//! let token_a = Address::repeat_byte(0xaa);
//! let token_b = Address::repeat_byte(0xbb);
//! let lp = Address::repeat_byte(0x01);
//! let config = PoolConfig::for_fee_tier(Address::repeat_byte(0x99), token_a, token_b, 3000, lp)
//!     .unwrap();
//!
//! let mut ledger = InMemoryLedger::new(1_000);
//! ledger.mint_tokens(config.token0, lp, U256::from(10u128.pow(24))).unwrap();
//! ledger.mint_tokens(config.token1, lp, U256::from(10u128.pow(24))).unwrap();
//!
//! let mut pool = Pool::new(config, ledger).unwrap();
//! pool.initialize(Q96).unwrap();
//!
//! let mut payer = Payer::new(lp);
//! pool.mint(lp, -600, 600, 10u128.pow(18), &mut payer, &[]).unwrap();
//!
//! let params = SwapParams::new(lp, true, I256::try_from(10u64.pow(15)).unwrap(), MIN_SQRT_RATIO + U256::ONE);
//! let result = pool.swap(params, &mut payer, &[]).unwrap();
//! println!("amount0: {}, amount1: {}", result.amount0, result.amount1);
//! ```

pub use alloy_primitives::{Address, I256, U256};

pub mod config;
pub mod error;
mod hash;
pub mod ledger;
pub mod math;

pub use hash::FastMap;

pub mod pool;

pub use config::PoolConfig;
pub use ledger::{InMemoryLedger, Ledger};
pub use pool::callback::{FlashCallback, MintCallback, Payer, SwapCallback};
pub use pool::swap::{SwapParams, SwapResult};
pub use pool::v3_pool::Pool;

/// `2^160 - 1`, the largest value a sqrt price or a seconds-per-liquidity
/// accumulator may hold.
const U160_MAX: U256 = U256::from_limbs([u64::MAX, u64::MAX, u32::MAX as u64, 0]);
const U256_E6: U256 = U256::from_limbs([1000000, 0, 0, 0]);

pub const RESOLUTION: u8 = 96;
pub const Q96: U256 = U256::from_limbs([0, 4294967296, 0, 0]);
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);
