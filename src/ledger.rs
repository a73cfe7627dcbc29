//! Token balances and the block clock a pool settles against.

use crate::FastMap;
use crate::error::LedgerError;
use alloy_primitives::{Address, U256};

/// Host-side view of token balances and time.
///
/// The pool only ever moves its own funds through [`Ledger::transfer`].
/// Counterparties pay the pool from inside a settlement callback through
/// `Pool::pay`, which can only credit the pool, and the pool verifies both
/// of its balances through [`Ledger::balance_of`] afterwards.
pub trait Ledger {
    /// Current block time in seconds.
    fn block_timestamp(&self) -> u64;

    fn balance_of(&self, token: Address, account: Address) -> U256;

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError>;
}

/// Hash-map backed [`Ledger`] with a settable clock.
#[derive(Clone, Debug, Default)]
pub struct InMemoryLedger {
    balances: FastMap<(Address, Address), U256>,
    timestamp: u64,
}

impl InMemoryLedger {
    pub fn new(timestamp: u64) -> Self {
        Self {
            balances: FastMap::default(),
            timestamp,
        }
    }

    /// Credits `amount` of `token` to `account` out of thin air.
    pub fn mint_tokens(
        &mut self,
        token: Address,
        account: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let balance = self.balances.entry((token, account)).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { token })?;
        Ok(())
    }

    pub fn advance_time(&mut self, seconds: u64) {
        self.timestamp += seconds;
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }
}

impl Ledger for InMemoryLedger {
    fn block_timestamp(&self) -> u64 {
        self.timestamp
    }

    fn balance_of(&self, token: Address, account: Address) -> U256 {
        self.balances
            .get(&(token, account))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        if amount.is_zero() || from == to {
            return Ok(());
        }

        let from_balance = self.balance_of(token, from);
        let to_balance = self.balance_of(token, to);
        let from_after = from_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                token,
                account: from,
            })?;
        let to_after = to_balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { token })?;

        self.balances.insert((token, from), from_after);
        self.balances.insert((token, to), to_after);
        Ok(())
    }
}
