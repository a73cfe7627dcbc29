use crate::error::{ConfigError, PoolError};
use alloy_primitives::{Address, U160};
use serde::{Deserialize, Serialize};

/// Standard fee tiers (hundredths of a bip) and their tick spacings.
pub const FEE_TIERS: [(u32, i32); 4] = [(100, 1), (500, 10), (3000, 60), (10000, 200)];

/// Fees are expressed in hundredths of a bip and must stay below 100%.
const MAX_FEE: u32 = 1_000_000;
/// Largest accepted spacing, keeps the usable tick count above one.
const MAX_TICK_SPACING: i32 = 16384;

/// Immutable parameters a pool is constructed with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Account that holds the pool's token balances on the ledger.
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    /// Swap fee in hundredths of a bip, `3000` = 0.3%.
    pub fee: u32,
    pub tick_spacing: i32,
    /// Only this account may change or collect the protocol fee.
    pub owner: Address,
}

/// Converts an `Address` into its `U160` numeric representation.
#[inline(always)]
pub fn address_to_u160(address: Address) -> U160 {
    address.into()
}

/// Returns the token pair sorted by numeric address.
pub fn sort_tokens(token0: Address, token1: Address) -> (Address, Address) {
    if address_to_u160(token0) < address_to_u160(token1) {
        (token0, token1)
    } else {
        (token1, token0)
    }
}

/// Tick spacing of a standard fee tier.
pub fn fee_tier_tick_spacing(fee: u32) -> Option<i32> {
    FEE_TIERS
        .iter()
        .find(|(tier, _)| *tier == fee)
        .map(|(_, spacing)| *spacing)
}

impl PoolConfig {
    /// Builds a config with the token pair sorted into `(token0, token1)`.
    pub fn new(
        address: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
        tick_spacing: i32,
        owner: Address,
    ) -> Self {
        let (token0, token1) = sort_tokens(token_a, token_b);
        Self {
            address,
            token0,
            token1,
            fee,
            tick_spacing,
            owner,
        }
    }

    /// Like [`PoolConfig::new`], deriving the spacing from a standard fee tier.
    pub fn for_fee_tier(
        address: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
        owner: Address,
    ) -> Result<Self, PoolError> {
        let tick_spacing =
            fee_tier_tick_spacing(fee).ok_or(PoolError::InvalidConfig("unknown fee tier"))?;
        Ok(Self::new(address, token_a, token_b, fee, tick_spacing, owner))
    }

    /// Parses a config from JSON, sorts the token pair and validates it.
    ///
    /// ```
    /// use clmm_pool::PoolConfig;
    ///
    /// let config = PoolConfig::from_json(r#"{
    ///     "address": "0x9999999999999999999999999999999999999999",
    ///     "token0": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
    ///     "token1": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
    ///     "fee": 500,
    ///     "tick_spacing": 10,
    ///     "owner": "0x0101010101010101010101010101010101010101"
    /// }"#).unwrap();
    /// assert!(config.token0 < config.token1);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: Self = serde_json::from_str(json)?;
        let config = Self::new(
            raw.address,
            raw.token0,
            raw.token1,
            raw.fee,
            raw.tick_spacing,
            raw.owner,
        );
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.token0 == self.token1 {
            return Err(PoolError::InvalidConfig("identical tokens"));
        }
        if address_to_u160(self.token0) >= address_to_u160(self.token1) {
            return Err(PoolError::InvalidConfig("token0 must sort below token1"));
        }
        if self.token0 == Address::ZERO {
            return Err(PoolError::InvalidConfig("zero address token"));
        }
        if self.fee >= MAX_FEE {
            return Err(PoolError::InvalidConfig("fee must be below 1_000_000"));
        }
        if self.tick_spacing <= 0 || self.tick_spacing >= MAX_TICK_SPACING {
            return Err(PoolError::InvalidConfig("tick spacing must be within 1..16384"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    // --- Pure helpers: address_to_u160 & sort_tokens -----------------------------

    #[test]
    fn address_to_u160_roundtrip_like() {
        let addr = address!("0x123400000000000000000000000000000000abcd");
        let as_u160: U160 = address_to_u160(addr);

        let back: Address = Address::from(as_u160);
        assert_eq!(addr, back);
    }

    #[test]
    fn sort_tokens_orders_by_numeric_value() {
        let a = address!("0x0000000000000000000000000000000000000001");
        let b = address!("0x0000000000000000000000000000000000000002");

        assert_eq!(sort_tokens(a, b), (a, b));
        assert_eq!(sort_tokens(b, a), (a, b));
    }

    // --- PoolConfig ---------------------------------------------------------------

    #[test]
    fn fee_tiers_map_to_spacings() {
        assert_eq!(fee_tier_tick_spacing(100), Some(1));
        assert_eq!(fee_tier_tick_spacing(500), Some(10));
        assert_eq!(fee_tier_tick_spacing(3000), Some(60));
        assert_eq!(fee_tier_tick_spacing(10000), Some(200));
        assert_eq!(fee_tier_tick_spacing(2500), None);
    }

    #[test]
    fn for_fee_tier_sorts_tokens() {
        let hi = address!("0x0000000000000000000000000000000000000002");
        let lo = address!("0x0000000000000000000000000000000000000001");
        let config = PoolConfig::for_fee_tier(Address::ZERO, hi, lo, 3000, Address::ZERO).unwrap();

        assert_eq!(config.token0, lo);
        assert_eq!(config.token1, hi);
        assert_eq!(config.tick_spacing, 60);
        assert!(config.validate().is_ok());

        assert_eq!(
            PoolConfig::for_fee_tier(Address::ZERO, hi, lo, 42, Address::ZERO),
            Err(PoolError::InvalidConfig("unknown fee tier"))
        );
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);

        let same = PoolConfig::new(Address::ZERO, a, a, 3000, 60, Address::ZERO);
        assert!(matches!(same.validate(), Err(PoolError::InvalidConfig(_))));

        let fee = PoolConfig::new(Address::ZERO, a, b, 1_000_000, 60, Address::ZERO);
        assert!(matches!(fee.validate(), Err(PoolError::InvalidConfig(_))));

        let spacing = PoolConfig::new(Address::ZERO, a, b, 3000, 0, Address::ZERO);
        assert!(matches!(spacing.validate(), Err(PoolError::InvalidConfig(_))));

        let zero = PoolConfig::new(Address::ZERO, Address::ZERO, b, 3000, 60, Address::ZERO);
        assert!(matches!(zero.validate(), Err(PoolError::InvalidConfig(_))));

        let mut unsorted = PoolConfig::new(Address::ZERO, a, b, 3000, 60, Address::ZERO);
        std::mem::swap(&mut unsorted.token0, &mut unsorted.token1);
        assert!(matches!(unsorted.validate(), Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn from_json_parses_and_sorts() {
        let json = r#"{
            "address": "0x9999999999999999999999999999999999999999",
            "token0": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
            "token1": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "fee": 500,
            "tick_spacing": 10,
            "owner": "0x0101010101010101010101010101010101010101"
        }"#;
        let config = PoolConfig::from_json(json).unwrap();
        assert_eq!(config.token0, Address::repeat_byte(0xaa));
        assert_eq!(config.token1, Address::repeat_byte(0xbb));
        assert_eq!(config.fee, 500);
        assert_eq!(config.owner, Address::repeat_byte(0x01));

        let round_trip = PoolConfig::from_json(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(round_trip, config);
    }

    #[test]
    fn from_json_reports_parse_and_validation_errors() {
        assert!(matches!(
            PoolConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));

        let json = r#"{
            "address": "0x9999999999999999999999999999999999999999",
            "token0": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "token1": "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
            "fee": 500,
            "tick_spacing": -10,
            "owner": "0x0101010101010101010101010101010101010101"
        }"#;
        assert!(matches!(
            PoolConfig::from_json(json),
            Err(ConfigError::Invalid(PoolError::InvalidConfig(_)))
        ));
    }
}
