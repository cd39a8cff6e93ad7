/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{
        BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not, Shl, ShlAssign, Shr,
        ShrAssign,
    },
};

use super::{Color, File, Rank, Square};

/// A [`Bitboard`] represents the game board as a set of bits.
///
/// Bit `i` corresponds to the [`Square`] with index `i`, so A1 is the least significant bit and H8
/// is the most significant.
///
/// They are used for various computations, such as fetching a list of all valid squares that a
/// piece can move to or discovering all enemy pieces that a piece attacks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Bitboard(pub(crate) u64);

impl Bitboard {
    pub const FILE_A: Self = Self(0x0101010101010101);
    pub const FILE_B: Self = Self(Self::FILE_A.0 << 1);
    pub const FILE_C: Self = Self(Self::FILE_A.0 << 2);
    pub const FILE_D: Self = Self(Self::FILE_A.0 << 3);
    pub const FILE_E: Self = Self(Self::FILE_A.0 << 4);
    pub const FILE_F: Self = Self(Self::FILE_A.0 << 5);
    pub const FILE_G: Self = Self(Self::FILE_A.0 << 6);
    pub const FILE_H: Self = Self(Self::FILE_A.0 << 7);
    pub const NOT_FILE_A: Self = Self(!Self::FILE_A.0);
    pub const NOT_FILE_H: Self = Self(!Self::FILE_H.0);

    pub const RANK_1: Self = Self(0x00000000000000FF);
    pub const RANK_2: Self = Self(Self::RANK_1.0 << 8);
    pub const RANK_3: Self = Self(Self::RANK_1.0 << 16);
    pub const RANK_4: Self = Self(Self::RANK_1.0 << 24);
    pub const RANK_5: Self = Self(Self::RANK_1.0 << 32);
    pub const RANK_6: Self = Self(Self::RANK_1.0 << 40);
    pub const RANK_7: Self = Self(Self::RANK_1.0 << 48);
    pub const RANK_8: Self = Self(Self::RANK_1.0 << 56);

    pub const EDGES: Self = Self(
        Self::FILE_A.0 | Self::FILE_H.0 | Self::RANK_1.0 | Self::RANK_8.0,
    );
    pub const FULL_BOARD: Self = Self(u64::MAX);
    pub const EMPTY_BOARD: Self = Self(0);

    /// Constructs a new [`Bitboard`] from the provided bit pattern.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::Bitboard;
    /// let board = Bitboard::new(255);
    /// assert_eq!(board, Bitboard::RANK_1);
    /// ```
    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the inner `u64` of this [`Bitboard`].
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Constructs a new [`Bitboard`] with only the bit at `square` set.
    #[inline(always)]
    pub const fn from_square(square: Square) -> Self {
        Self(1 << square.index())
    }

    /// A [`Bitboard`] of every square on `file`.
    #[inline(always)]
    pub const fn from_file(file: File) -> Self {
        Self(Self::FILE_A.0 << file.index())
    }

    /// A [`Bitboard`] of every square on `rank`.
    #[inline(always)]
    pub const fn from_rank(rank: Rank) -> Self {
        Self(Self::RANK_1.0 << (rank.index() * 8))
    }

    /// The rank on which `color`'s Pawns land after a single push from their starting rank.
    #[inline(always)]
    pub const fn third_rank(color: Color) -> Self {
        match color {
            Color::White => Self::RANK_3,
            Color::Black => Self::RANK_6,
        }
    }

    /// The rank on which `color`'s Pawns promote.
    #[inline(always)]
    pub const fn eighth_rank(color: Color) -> Self {
        match color {
            Color::White => Self::RANK_8,
            Color::Black => Self::RANK_1,
        }
    }

    /// Returns `true` if no bits are set.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if at least one bit is set.
    #[inline(always)]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Returns `true` if the bit at `square` is set.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::{Bitboard, Square};
    /// assert!(Bitboard::RANK_1.contains(Square::C1));
    /// assert!(!Bitboard::RANK_1.contains(Square::C2));
    /// ```
    #[inline(always)]
    pub const fn contains(&self, square: Square) -> bool {
        self.0 & (1 << square.index()) != 0
    }

    /// Sets the bit at `square`.
    #[inline(always)]
    pub fn set(&mut self, square: Square) {
        self.0 |= 1 << square.index();
    }

    /// Clears the bit at `square`.
    #[inline(always)]
    pub fn clear(&mut self, square: Square) {
        self.0 &= !(1 << square.index());
    }

    /// Toggles the bit at `square`.
    #[inline(always)]
    pub fn toggle(&mut self, square: Square) {
        self.0 ^= 1 << square.index();
    }

    /// Number of set bits.
    #[inline(always)]
    pub const fn population(&self) -> u32 {
        self.0.count_ones()
    }

    /// The [`Square`] of the least significant set bit, if any.
    #[inline(always)]
    pub const fn lsb(&self) -> Option<Square> {
        if self.is_empty() {
            None
        } else {
            Some(self.lsb_unchecked())
        }
    }

    /// The [`Square`] of the least significant set bit, without checking for emptiness.
    #[inline(always)]
    pub const fn lsb_unchecked(&self) -> Square {
        Square::from_index_unchecked(self.0.trailing_zeros() as usize)
    }

    /// Clears the least significant set bit.
    #[inline(always)]
    pub fn clear_lsb(&mut self) {
        self.0 &= self.0.wrapping_sub(1);
    }

    /// Removes and returns the least significant set bit.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::{Bitboard, Square};
    /// let mut board = Square::B1 | Square::H8;
    /// assert_eq!(board.pop_lsb(), Some(Square::B1));
    /// assert_eq!(board.pop_lsb(), Some(Square::H8));
    /// assert_eq!(board.pop_lsb(), None);
    /// ```
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let square = self.lsb()?;
        self.clear_lsb();
        Some(square)
    }

    #[inline(always)]
    pub const fn and(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline(always)]
    pub const fn or(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline(always)]
    pub const fn xor(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }

    #[inline(always)]
    pub const fn not(self) -> Self {
        Self(!self.0)
    }

    /// Shifts every bit one rank towards rank 8.
    #[inline(always)]
    pub const fn north(self) -> Self {
        Self(self.0 << 8)
    }

    /// Shifts every bit one rank towards rank 1.
    #[inline(always)]
    pub const fn south(self) -> Self {
        Self(self.0 >> 8)
    }

    /// Shifts every bit one file towards the H-file, discarding bits that would wrap.
    #[inline(always)]
    pub const fn east(self) -> Self {
        Self((self.0 & Self::NOT_FILE_H.0) << 1)
    }

    /// Shifts every bit one file towards the A-file, discarding bits that would wrap.
    #[inline(always)]
    pub const fn west(self) -> Self {
        Self((self.0 & Self::NOT_FILE_A.0) >> 1)
    }

    /// Shifts every bit `n` ranks "forward", relative to `color`.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::{Bitboard, Color};
    /// assert_eq!(Bitboard::RANK_2.forward_by(Color::White, 2), Bitboard::RANK_4);
    /// assert_eq!(Bitboard::RANK_7.forward_by(Color::Black, 1), Bitboard::RANK_6);
    /// ```
    #[inline(always)]
    pub const fn forward_by(self, color: Color, n: u32) -> Self {
        match color {
            Color::White => Self(self.0 << (8 * n)),
            Color::Black => Self(self.0 >> (8 * n)),
        }
    }

    /// Shifts every bit `n` ranks "backward", relative to `color`.
    #[inline(always)]
    pub const fn backward_by(self, color: Color, n: u32) -> Self {
        self.forward_by(color.opponent(), n)
    }

    /// Returns an iterator over every subset of this bitboard, starting with the empty set.
    ///
    /// Subsets are enumerated with the carry-rippler trick, `subset = (subset - mask) & mask`,
    /// so a mask with `n` bits yields exactly `2^n` subsets.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::{Bitboard, Square};
    /// let mask = Square::A1 | Square::C1;
    /// let subsets: Vec<_> = mask.subsets().collect();
    /// assert_eq!(subsets, vec![Bitboard::EMPTY_BOARD, Square::A1.bitboard(), Square::C1.bitboard(), mask]);
    /// ```
    #[inline(always)]
    pub const fn subsets(self) -> Subsets {
        Subsets {
            mask: self.0,
            subset: 0,
            done: false,
        }
    }

    /// Formats this bitboard as a hex string, such as `0x000000000000FF00`.
    pub fn to_hex_string(&self) -> String {
        format!("0x{:0>16X}", self.0)
    }

    /// Iterate over the [`Square`]s of every set bit, from least to most significant.
    #[inline(always)]
    pub const fn iter(&self) -> BitboardIter {
        BitboardIter { bitboard: *self }
    }
}

/// Iterator over the squares of a [`Bitboard`].
pub struct BitboardIter {
    bitboard: Bitboard,
}

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.bitboard.pop_lsb()
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.bitboard.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over every subset of a mask. See [`Bitboard::subsets`].
pub struct Subsets {
    mask: u64,
    subset: u64,
    done: bool,
}

impl Iterator for Subsets {
    type Item = Bitboard;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self.subset;
        self.subset = self.subset.wrapping_sub(self.mask) & self.mask;
        self.done = self.subset == 0;

        Some(Bitboard(current))
    }
}

impl From<Square> for Bitboard {
    #[inline(always)]
    fn from(value: Square) -> Self {
        value.bitboard()
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY_BOARD, |acc, square| acc | square)
    }
}

macro_rules! impl_bitwise_op {
    ($op:ident, $fn:ident, $assign_op:ident, $assign_fn:ident) => {
        impl $op for Bitboard {
            type Output = Self;
            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl $op<Square> for Bitboard {
            type Output = Self;
            #[inline(always)]
            fn $fn(self, rhs: Square) -> Self::Output {
                Self(self.0.$fn(rhs.bitboard().0))
            }
        }

        impl $op<Square> for Square {
            type Output = Bitboard;
            #[inline(always)]
            fn $fn(self, rhs: Square) -> Self::Output {
                self.bitboard().$fn(rhs.bitboard())
            }
        }

        impl $op<Bitboard> for Square {
            type Output = Bitboard;
            #[inline(always)]
            fn $fn(self, rhs: Bitboard) -> Self::Output {
                self.bitboard().$fn(rhs)
            }
        }

        impl $assign_op for Bitboard {
            #[inline(always)]
            fn $assign_fn(&mut self, rhs: Self) {
                self.0.$assign_fn(rhs.0);
            }
        }

        impl $assign_op<Square> for Bitboard {
            #[inline(always)]
            fn $assign_fn(&mut self, rhs: Square) {
                self.0.$assign_fn(rhs.bitboard().0);
            }
        }
    };
}

impl_bitwise_op!(BitAnd, bitand, BitAndAssign, bitand_assign);
impl_bitwise_op!(BitOr, bitor, BitOrAssign, bitor_assign);
impl_bitwise_op!(BitXor, bitxor, BitXorAssign, bitxor_assign);

impl Not for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl Shl<u32> for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn shl(self, rhs: u32) -> Self::Output {
        Self(self.0 << rhs)
    }
}

impl ShlAssign<u32> for Bitboard {
    #[inline(always)]
    fn shl_assign(&mut self, rhs: u32) {
        self.0 <<= rhs;
    }
}

impl Shr<u32> for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn shr(self, rhs: u32) -> Self::Output {
        Self(self.0 >> rhs)
    }
}

impl ShrAssign<u32> for Bitboard {
    #[inline(always)]
    fn shr_assign(&mut self, rhs: u32) {
        self.0 >>= rhs;
    }
}

impl fmt::Display for Bitboard {
    /// Prints the board as an 8x8 grid, rank 8 at the top.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                let c = if self.contains(file * rank) { 'X' } else { '.' };
                write!(f, "{c}")?;
                if file != File::H {
                    write!(f, " ")?;
                }
            }
            if rank != Rank::ONE {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{self}", self.to_hex_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifts_do_not_wrap() {
        assert_eq!(Bitboard::FILE_H.east(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_A.west(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_A.east(), Bitboard::FILE_B);
        assert_eq!(Bitboard::RANK_8.north(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_1.south(), Bitboard::EMPTY_BOARD);
    }

    #[test]
    fn test_subset_count_matches_population() {
        let mask = Square::B2 | Square::D4 | Square::F6 | Square::G7 | Square::H8;
        let subsets: Vec<_> = mask.subsets().collect();
        assert_eq!(subsets.len(), 1 << mask.population());

        // Every subset is distinct and contained in the mask
        for (i, subset) in subsets.iter().enumerate() {
            assert_eq!(*subset & !mask, Bitboard::EMPTY_BOARD);
            assert!(!subsets[i + 1..].contains(subset));
        }
    }

    #[test]
    fn test_empty_mask_has_one_subset() {
        assert_eq!(Bitboard::EMPTY_BOARD.subsets().count(), 1);
    }

    #[test]
    fn test_iteration_order() {
        let board = Square::H8 | Square::A1 | Square::E4;
        let squares: Vec<_> = board.into_iter().collect();
        assert_eq!(squares, vec![Square::A1, Square::E4, Square::H8]);
        assert_eq!(board.iter().len(), 3);
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(Bitboard::RANK_2.to_hex_string(), "0x000000000000FF00");
    }
}
