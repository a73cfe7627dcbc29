use crate::error::{Error, MathError, StateError};
use crate::math::bit_math::most_significant_bit;
use alloy_primitives::{I256, U256};

/// The minimum tick that may be passed to [`get_sqrt_ratio_at_tick`],
/// computed from `log base 1.0001 of 2**-128`.
pub const MIN_TICK: i32 = -887272;
/// The maximum tick that may be passed to [`get_sqrt_ratio_at_tick`].
pub const MAX_TICK: i32 = -MIN_TICK;

/// `get_sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4295128739, 0, 0, 0]);
/// `get_sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U256 =
    U256::from_limbs([6743328256752651558, 17280870778742802505, 4294805859, 0]);

// log_sqrt(1.0001)(2) in Q128.128
const SQRT_10001: I256 = I256::from_raw(U256::from_limbs([11745905768312294533, 13863, 0, 0]));
// error bounds of the log approximation, below and above
const TICK_LOW: I256 = I256::from_raw(U256::from_limbs([
    6552757943157144234,
    184476617836266586,
    0,
    0,
]));
const TICK_HIGH: I256 = I256::from_raw(U256::from_limbs([
    4998474450511881007,
    15793544031827761793,
    0,
    0,
]));

/// `1 / sqrt(1.0001)^(2^i)` in Q128.128 for i = 1..=19; bit 0 is handled
/// separately since it seeds the product.
const TICK_MULTIPLIERS: [u128; 19] = [
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

const ODD_TICK_SEED: u128 = 0xfffcb933bd6fad37aa2d162d1a594001;

/// Returns `sqrt(1.0001^tick) * 2^96` rounded up, or
/// `StateError::TickOutOfBounds` if `|tick| > MAX_TICK`.
///
/// The product is built from the binary expansion of `|tick|` against
/// one precomputed factor per bit, giving a relative error well under
/// one part in 2^32 before the final rounding.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, StateError> {
    let abs_tick = tick.unsigned_abs();

    if abs_tick > MAX_TICK as u32 {
        return Err(StateError::TickOutOfBounds);
    }

    let mut ratio = if abs_tick & 1 != 0 {
        U256::from(ODD_TICK_SEED)
    } else {
        U256::ONE << 128
    };

    for (i, multiplier) in TICK_MULTIPLIERS.iter().enumerate() {
        if abs_tick & (2u32 << i) != 0 {
            ratio = ratio.wrapping_mul(U256::from(*multiplier)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q128.96, rounding up so the inverse never undershoots
    let lower_32_bits = ratio.as_limbs()[0] & 0xFFFF_FFFF;
    Ok((ratio >> 32) + U256::from((lower_32_bits != 0) as u64))
}

/// Returns the greatest tick whose sqrt ratio is at most `sqrt_price_x96`.
///
/// Fails with `StateError::SqrtPriceOutOfBounds` unless
/// `MIN_SQRT_RATIO <= sqrt_price_x96 < MAX_SQRT_RATIO`. The result
/// satisfies `ratio(tick) <= sqrt_price_x96 < ratio(tick + 1)`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, Error> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(StateError::SqrtPriceOutOfBounds.into());
    }

    let ratio = sqrt_price_x96 << 32;
    let msb = most_significant_bit(ratio)? as usize;

    // normalize so the leading bit sits at position 127
    let mut r = if msb >= 128 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };

    // integer part of log2, Q64.64
    let mut log_2: i128 = (msb as i128 - 128) << 64;

    // fractional bits by repeated squaring, 14 bits are enough for the
    // error bounds below
    for shift in (50..=63).rev() {
        r = r.wrapping_mul(r) >> 127;
        let f = (r >> 128usize).as_limbs()[0];
        log_2 |= (f as i128) << shift;
        r >>= f as usize;
    }

    let log_sqrt10001 = I256::try_from(log_2)
        .map_err(|_| MathError::Overflow)?
        .wrapping_mul(SQRT_10001);

    let tick_low = log_sqrt10001.wrapping_sub(TICK_LOW).asr(128).low_i32();
    let tick_high = log_sqrt10001.wrapping_add(TICK_HIGH).asr(128).low_i32();

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_ratio_at_tick(tick_high)? <= sqrt_price_x96 {
        tick_high
    } else {
        tick_low
    })
}
