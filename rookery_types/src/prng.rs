/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// A xorshift64* pseudo-random number generator that can be stepped in `const` contexts.
///
/// Each call returns the generated number along with the advanced generator, so tables of
/// random numbers can be filled by a `while` loop inside a `const` block.
///
/// # Example
/// ```
/// # use rookery_types::XoShiRo;
/// const FIRST: u64 = XoShiRo::new(42).get_next_const().0;
/// let mut rng = XoShiRo::new(42);
/// assert_eq!(rng.get_next(), FIRST);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XoShiRo {
    state: u64,
}

impl XoShiRo {
    /// Seeds a new generator. A zero seed is replaced, since xorshift never leaves zero.
    #[inline(always)]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E3779B97F4A7C15 } else { seed },
        }
    }

    /// Returns the next number and the advanced generator.
    #[inline(always)]
    pub const fn get_next_const(self) -> (u64, Self) {
        let mut state = self.state;
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        (state.wrapping_mul(0x2545F4914F6CDD1D), Self { state })
    }

    /// Advances this generator in place and returns the next number.
    #[inline(always)]
    pub fn get_next(&mut self) -> u64 {
        let (n, next) = self.get_next_const();
        *self = next;
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_reproducible() {
        let mut a = XoShiRo::new(7);
        let mut b = XoShiRo::new(7);
        for _ in 0..100 {
            assert_eq!(a.get_next(), b.get_next());
        }
    }

    #[test]
    fn test_zero_seed_does_not_stall() {
        let mut rng = XoShiRo::new(0);
        assert_ne!(rng.get_next(), rng.get_next());
    }
}
