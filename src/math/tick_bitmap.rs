use crate::FastMap;
use crate::error::{Error, PoolError};
use crate::math::bit_math::{least_significant_bit, most_significant_bit};
use alloy_primitives::U256;

/// Computes the bitmap word index and bit position for a compressed tick
/// (`tick / tick_spacing`).
///
/// Words hold 256 consecutive compressed ticks; negative ticks land in
/// negative words with the bit position counted from the word's low end.
pub fn position(compressed: i32) -> (i16, u8) {
    ((compressed >> 8) as i16, (compressed & 0xff) as u8)
}

/// Returns the bitmap word stored at `word`, or zero if absent.
pub fn get_word(bitmap: &FastMap<i16, U256>, word: i16) -> U256 {
    bitmap.get(&word).copied().unwrap_or(U256::ZERO)
}

/// Toggles the initialized status of a tick in the bitmap.
///
/// Fails with `PoolError::TickNotSpaced` when `tick` is not a multiple of
/// `tick_spacing`. Words that become empty are removed.
pub fn flip_tick(
    tick_bitmap: &mut FastMap<i16, U256>,
    tick: i32,
    tick_spacing: i32,
) -> Result<(), PoolError> {
    if tick % tick_spacing != 0 {
        return Err(PoolError::TickNotSpaced(tick));
    }

    let (word_pos, bit_pos) = position(tick / tick_spacing);
    let word = get_word(tick_bitmap, word_pos) ^ (U256::ONE << bit_pos);
    if word.is_zero() {
        tick_bitmap.remove(&word_pos);
    } else {
        tick_bitmap.insert(word_pos, word);
    }
    Ok(())
}

/// Searches the 256-bit word containing `tick` for the next initialized
/// tick to the left (`lte`, including `tick` itself) or to the right
/// (strictly greater).
///
/// Returns the next candidate and whether it is initialized. When nothing
/// is found the candidate is the word boundary in the search direction, so
/// callers can step at most one word at a time.
pub fn next_initialized_tick_within_one_word(
    bitmap: &FastMap<i16, U256>,
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> Result<(i32, bool), Error> {
    let mut compressed: i32 = tick / tick_spacing;

    // round towards negative infinity
    if tick < 0 && tick % tick_spacing != 0 {
        compressed -= 1;
    }

    if lte {
        let (word_pos, bit_pos) = position(compressed);

        // all bits at or below bit_pos
        let mask = U256::MAX >> (255 - bit_pos);
        let masked = get_word(bitmap, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            (compressed - (bit_pos - most_significant_bit(masked)?) as i32) * tick_spacing
        } else {
            (compressed - bit_pos as i32) * tick_spacing
        };
        Ok((next, initialized))
    } else {
        let (word_pos, bit_pos) = position(compressed + 1);

        // all bits at or above bit_pos
        let mask = U256::MAX << bit_pos;
        let masked = get_word(bitmap, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            (compressed + 1 + (least_significant_bit(masked)? - bit_pos) as i32) * tick_spacing
        } else {
            (compressed + 1 + (255u8 - bit_pos) as i32) * tick_spacing
        };
        Ok((next, initialized))
    }
}

/// Reports whether any tick at or below `tick` (`lte`) or strictly above it
/// is initialized anywhere in the bitmap.
pub fn has_initialized_tick(
    bitmap: &FastMap<i16, U256>,
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> bool {
    let mut compressed = tick / tick_spacing;
    if tick < 0 && tick % tick_spacing != 0 {
        compressed -= 1;
    }

    // empty words are never stored
    if lte {
        let (word_pos, bit_pos) = position(compressed);
        let mask = U256::MAX >> (255 - bit_pos);
        bitmap
            .iter()
            .any(|(&word, &bits)| word < word_pos || (word == word_pos && !(bits & mask).is_zero()))
    } else {
        let (word_pos, bit_pos) = position(compressed + 1);
        let mask = U256::MAX << bit_pos;
        bitmap
            .iter()
            .any(|(&word, &bits)| word > word_pos || (word == word_pos && !(bits & mask).is_zero()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_test_ticks() -> FastMap<i16, U256> {
        let ticks = [-200, -55, -4, 70, 78, 84, 139, 240, 535];
        let mut bitmap = FastMap::default();
        for t in ticks {
            flip_tick(&mut bitmap, t, 1).unwrap();
        }
        bitmap
    }

    fn next(bm: &FastMap<i16, U256>, tick: i32, lte: bool) -> (i32, bool) {
        next_initialized_tick_within_one_word(bm, tick, 1, lte).unwrap()
    }

    #[test]
    fn test_position_simple() {
        assert_eq!(position(0), (0, 0));
        assert_eq!(position(1), (0, 1));
        assert_eq!(position(255), (0, 255));
        assert_eq!(position(256), (1, 0));
        assert_eq!(position(300), (1, 44));
    }

    #[test]
    fn test_position_negative() {
        assert_eq!(position(-1), (-1, 255));
        assert_eq!(position(-256), (-1, 0));
        assert_eq!(position(-257), (-2, 255));
    }

    // -----------------------------------------------------------------------------
    // TESTS: flip_tick correctness
    // -----------------------------------------------------------------------------
    #[test]
    fn test_flip_tick_roundtrip() {
        let mut bm = FastMap::default();
        flip_tick(&mut bm, 78, 1).unwrap();
        let (word, bit) = position(78);
        assert_eq!(get_word(&bm, word), U256::ONE << bit);
        flip_tick(&mut bm, 78, 1).unwrap();
        assert_eq!(get_word(&bm, word), U256::ZERO);
        assert!(bm.is_empty());
    }

    #[test]
    fn test_flip_tick_only_touches_its_own_bit() {
        let mut bm = FastMap::default();
        flip_tick(&mut bm, -230, 1).unwrap();
        flip_tick(&mut bm, -259, 1).unwrap();
        flip_tick(&mut bm, -229, 1).unwrap();
        flip_tick(&mut bm, 500, 1).unwrap();
        flip_tick(&mut bm, -259, 1).unwrap();
        flip_tick(&mut bm, -229, 1).unwrap();
        flip_tick(&mut bm, -259, 1).unwrap();

        assert_eq!(next(&bm, -230, true), (-230, true));
        assert_eq!(next(&bm, -231, true), (-256, false));
        assert_eq!(next(&bm, -257, true), (-259, true));
        assert_eq!(next(&bm, 499, false), (500, true));
    }

    #[test]
    fn test_flip_tick_rejects_unspaced_tick() {
        let mut bm = FastMap::default();
        assert_eq!(flip_tick(&mut bm, 61, 60), Err(PoolError::TickNotSpaced(61)));
        assert_eq!(flip_tick(&mut bm, -61, 60), Err(PoolError::TickNotSpaced(-61)));
        assert!(bm.is_empty());
    }

    // -----------------------------------------------------------------------------
    // TESTS: Right Search (lte = false)
    // -----------------------------------------------------------------------------
    #[test]
    fn test_right_exact_match() {
        let bm = init_test_ticks();
        assert_eq!(next(&bm, 78, false), (84, true));
        assert_eq!(next(&bm, -55, false), (-4, true));
    }

    #[test]
    fn test_right_between_ticks() {
        let bm = init_test_ticks();
        assert_eq!(next(&bm, 77, false), (78, true));
        assert_eq!(next(&bm, -56, false), (-55, true));
    }

    #[test]
    fn test_right_stops_at_word_boundary() {
        let bm = init_test_ticks();
        assert_eq!(next(&bm, 255, false), (511, false));
        assert_eq!(next(&bm, 383, false), (511, false));
        assert_eq!(next(&bm, 508, false), (511, false));
    }

    #[test]
    fn test_right_find_in_next_word() {
        let mut bm = init_test_ticks();
        flip_tick(&mut bm, 340, 1).unwrap();
        assert_eq!(next(&bm, 328, false), (340, true));
    }

    // -----------------------------------------------------------------------------
    // TESTS: Left Search (lte = true)
    // -----------------------------------------------------------------------------
    #[test]
    fn test_left_includes_current_tick() {
        let bm = init_test_ticks();
        assert_eq!(next(&bm, 78, true), (78, true));
        assert_eq!(next(&bm, 79, true), (78, true));
        assert_eq!(next(&bm, 72, true), (70, true));
    }

    #[test]
    fn test_left_stops_at_word_boundary() {
        let bm = init_test_ticks();
        assert_eq!(next(&bm, 258, true), (256, false));
        assert_eq!(next(&bm, 256, true), (256, false));
        assert_eq!(next(&bm, -257, true), (-512, false));
        assert_eq!(next(&bm, 1023, true), (768, false));
        assert_eq!(next(&bm, 900, true), (768, false));
    }

    #[test]
    fn test_left_boundary_is_initialized() {
        let mut bm = init_test_ticks();
        flip_tick(&mut bm, 329, 1).unwrap();
        assert_eq!(next(&bm, 456, true), (329, true));
    }

    #[test]
    fn test_search_respects_tick_spacing() {
        let mut bm = FastMap::default();
        flip_tick(&mut bm, -60, 60).unwrap();
        flip_tick(&mut bm, 60, 60).unwrap();

        // tick 0 sits alone in its compressed slot
        assert_eq!(next_initialized_tick_within_one_word(&bm, 0, 60, true).unwrap(), (0, false));
        assert_eq!(next_initialized_tick_within_one_word(&bm, -1, 60, true).unwrap(), (-60, true));
        assert_eq!(next_initialized_tick_within_one_word(&bm, 0, 60, false).unwrap(), (60, true));
        assert_eq!(next_initialized_tick_within_one_word(&bm, 59, 60, false).unwrap(), (60, true));
        assert_eq!(next_initialized_tick_within_one_word(&bm, -59, 60, true).unwrap(), (-60, true));
    }

    #[test]
    fn test_has_initialized_tick_scans_every_word() {
        let bm = init_test_ticks();
        assert!(has_initialized_tick(&bm, -200, 1, true));
        assert!(!has_initialized_tick(&bm, -201, 1, true));
        assert!(has_initialized_tick(&bm, 534, 1, false));
        assert!(!has_initialized_tick(&bm, 535, 1, false));
        // across words
        assert!(has_initialized_tick(&bm, -100_000, 1, false));
        assert!(has_initialized_tick(&bm, 100_000, 1, true));
        assert!(!has_initialized_tick(&FastMap::default(), 0, 1, true));
    }
}
