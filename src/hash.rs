//! Hash map flavour used for ticks, bitmap words, positions and ledger
//! balances. Pick one with the `rustc-hash`, `ahash` or `std-hash`
//! features; any ambiguous combination falls back to the std map.

#[cfg(all(
    feature = "rustc-hash",
    not(feature = "ahash"),
    not(feature = "std-hash")
))]
pub type FastMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[cfg(all(
    feature = "ahash",
    not(feature = "rustc-hash"),
    not(feature = "std-hash")
))]
pub type FastMap<K, V> = ahash::AHashMap<K, V>;

#[cfg(not(any(
    all(feature = "rustc-hash", not(feature = "ahash"), not(feature = "std-hash")),
    all(feature = "ahash", not(feature = "rustc-hash"), not(feature = "std-hash")),
)))]
pub type FastMap<K, V> = std::collections::HashMap<K, V>;
