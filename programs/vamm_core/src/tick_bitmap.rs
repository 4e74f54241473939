/// Tick Bitmap Module
///
/// This module implements a space-efficient bitmap for tracking initialized
/// ticks. It allows fast traversal of initialized ticks during swap
/// operations without checking every possible tick value.
///
/// Ticks are first compressed by the vamm's tick spacing, then packed 256 to
/// a word. Words are stored sparsely in a map keyed by word position, so the
/// bitmap only allocates for regions of the grid that carry liquidity. Word
/// positioning uses floor division so negative ticks land in the correct
/// word rather than sharing word 0 with positives.
use crate::constants::BITMAP_WORD_SIZE;
use crate::errors::{Result, VammError};
use primitive_types::U256;
use std::collections::HashMap;

/// Sparse bitmap over spacing-compressed ticks.
#[derive(Debug, Default)]
pub struct TickBitmap {
    words: HashMap<i16, U256>,
}

/// Calculates the word index and bit position for a compressed tick.
///
/// Floor semantics: compressed tick -1 maps to word -1, bit 255.
#[inline]
fn position(compressed: i32) -> (i16, u8) {
    let word_pos = (compressed >> 8) as i16;
    let bit_pos = (compressed & (BITMAP_WORD_SIZE - 1)) as u8;
    (word_pos, bit_pos)
}

/// Compresses a tick by the spacing, flooring toward negative infinity.
#[inline]
fn compress(tick: i32, tick_spacing: u16) -> i32 {
    tick.div_euclid(tick_spacing as i32)
}

impl TickBitmap {
    pub fn new() -> Self {
        Self {
            words: HashMap::new(),
        }
    }

    /// Flips the bit for a tick between initialized and uninitialized.
    ///
    /// # Arguments
    /// * `tick` - The tick being flipped; must be aligned to `tick_spacing`
    /// * `tick_spacing` - The vamm's tick spacing
    pub fn flip_tick(&mut self, tick: i32, tick_spacing: u16) -> Result<()> {
        if tick % tick_spacing as i32 != 0 {
            return Err(VammError::MisalignedTick {
                tick,
                spacing: tick_spacing,
            });
        }

        let (word_pos, bit_pos) = position(compress(tick, tick_spacing));
        let word = self.words.entry(word_pos).or_insert_with(U256::zero);
        *word ^= U256::one() << bit_pos;

        // Drop empty words so the map stays proportional to live liquidity.
        if word.is_zero() {
            self.words.remove(&word_pos);
        }
        Ok(())
    }

    /// Checks whether a tick's bit is set.
    pub fn is_initialized(&self, tick: i32, tick_spacing: u16) -> bool {
        if tick % tick_spacing as i32 != 0 {
            return false;
        }
        let (word_pos, bit_pos) = position(compress(tick, tick_spacing));
        match self.words.get(&word_pos) {
            Some(word) => !(*word & (U256::one() << bit_pos)).is_zero(),
            None => false,
        }
    }

    /// Finds the next initialized tick within one bitmap word, in the given
    /// direction.
    ///
    /// Searching left (`lte` true) includes `tick` itself and scans down to
    /// the start of its word; searching right starts one tick above and
    /// scans to the end of that word. When no bit is set in the scanned
    /// span the word-boundary tick is returned with `initialized` false, so
    /// the swap loop advances at most one word per call regardless of how
    /// sparse the bitmap is.
    ///
    /// # Arguments
    /// * `tick` - The search origin; must be aligned to `tick_spacing`
    /// * `tick_spacing` - The vamm's tick spacing
    /// * `lte` - Search direction
    ///
    /// # Returns
    /// * `Result<(i32, bool)>` - The next candidate tick and whether it is
    ///   initialized; `MisalignedTick` when the origin is not on the grid.
    pub fn next_initialized_tick_within_one_word(
        &self,
        tick: i32,
        tick_spacing: u16,
        lte: bool,
    ) -> Result<(i32, bool)> {
        if tick % tick_spacing as i32 != 0 {
            return Err(VammError::MisalignedTick {
                tick,
                spacing: tick_spacing,
            });
        }
        let spacing = tick_spacing as i32;
        let compressed = compress(tick, tick_spacing);

        if lte {
            let (word_pos, bit_pos) = position(compressed);
            // All bits at or below bit_pos.
            let mask = if bit_pos == 255 {
                U256::MAX
            } else {
                (U256::one() << (bit_pos + 1)) - U256::one()
            };
            let masked = self
                .words
                .get(&word_pos)
                .map_or(U256::zero(), |w| *w & mask);

            if masked.is_zero() {
                // Word start: compressed minus its bit offset.
                Ok(((compressed - bit_pos as i32) * spacing, false))
            } else {
                let msb = 255 - masked.leading_zeros() as i32;
                Ok(((compressed - (bit_pos as i32 - msb)) * spacing, true))
            }
        } else {
            let start = compressed + 1;
            let (word_pos, bit_pos) = position(start);
            // All bits at or above bit_pos.
            let mask = !((U256::one() << bit_pos) - U256::one());
            let masked = self
                .words
                .get(&word_pos)
                .map_or(U256::zero(), |w| *w & mask);

            if masked.is_zero() {
                // Word end: start plus the remaining bits in the word.
                Ok(((start + (255 - bit_pos as i32)) * spacing, false))
            } else {
                let lsb = masked.trailing_zeros() as i32;
                Ok(((start + (lsb - bit_pos as i32)) * spacing, true))
            }
        }
    }
}
