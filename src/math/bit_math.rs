use crate::error::MathError;
use alloy_primitives::U256;

/// Index (0–255) of the most significant set bit, or `MathError::ZeroValue`
/// for zero. Used as the integer part of `log2` when converting prices to
/// ticks and when scanning a bitmap word to the left.
pub fn most_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(255 - x.leading_zeros() as u8)
}

/// Index (0–255) of the least significant set bit, or `MathError::ZeroValue`
/// for zero. Used when scanning a bitmap word to the right.
pub fn least_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(x.trailing_zeros() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Q96;
    use crate::math::tick_math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};

    #[test]
    fn zero_has_no_set_bit() {
        assert_eq!(most_significant_bit(U256::ZERO), Err(MathError::ZeroValue));
        assert_eq!(least_significant_bit(U256::ZERO), Err(MathError::ZeroValue));
    }

    #[test]
    fn mixed_bit_patterns() {
        let cases = [
            (U256::from(0b1001_0100u64), 7, 2),
            (U256::from(0b10_1100_1000u64), 9, 3),
            (U256::MAX, 255, 0),
            (Q96 + U256::ONE, 96, 0),
            (MIN_SQRT_RATIO, 32, 0),
            (MAX_SQRT_RATIO, 159, 1),
        ];
        for (x, msb, lsb) in cases {
            assert_eq!(most_significant_bit(x), Ok(msb), "msb of {x}");
            assert_eq!(least_significant_bit(x), Ok(lsb), "lsb of {x}");
        }
    }

    #[test]
    fn msb_and_lsb_agree_on_every_power_of_two() {
        for i in 0..256usize {
            let x = U256::ONE << i;
            assert_eq!(most_significant_bit(x).unwrap() as usize, i);
            assert_eq!(least_significant_bit(x).unwrap() as usize, i);
        }
    }
}
