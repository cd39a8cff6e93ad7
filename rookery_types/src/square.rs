/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut, Mul},
    str::FromStr,
};

use anyhow::{anyhow, bail, Result};

use super::{Bitboard, Color};

/// Represents a single vertical column (file) on a chessboard.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct File(u8);

impl File {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);
    pub const E: Self = Self(4);
    pub const F: Self = Self(5);
    pub const G: Self = Self(6);
    pub const H: Self = Self(7);

    /// Number of files on the board.
    pub const COUNT: usize = 8;

    /// Creates a new [`File`] from an index in `0..8`, returning `None` if out of bounds.
    #[inline(always)]
    pub const fn new(file: u8) -> Option<Self> {
        if file < Self::COUNT as u8 {
            Some(Self(file))
        } else {
            None
        }
    }

    /// Creates a new [`File`] without checking bounds.
    #[inline(always)]
    pub const fn new_unchecked(file: u8) -> Self {
        debug_assert!(file < Self::COUNT as u8);
        Self(file)
    }

    /// Parses a [`File`] from a char in `a..=h` (case-insensitive).
    ///
    /// # Example
    /// ```
    /// # use rookery_types::File;
    /// assert_eq!(File::from_char('c').unwrap(), File::C);
    /// assert!(File::from_char('i').is_err());
    /// ```
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_lowercase() {
            c @ 'a'..='h' => Ok(Self(c as u8 - b'a')),
            _ => bail!("Invalid char for File: {c:?}"),
        }
    }

    /// Returns this file as a `usize`, for indexing.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Returns the inner `u8`.
    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    /// Offsets this file by `delta`, returning `None` if that leaves the board.
    #[inline(always)]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        let file = self.0 as i8 + delta;
        if file >= 0 && file < Self::COUNT as i8 {
            Some(Self(file as u8))
        } else {
            None
        }
    }

    /// Absolute distance between two files.
    #[inline(always)]
    pub const fn abs_diff(self, other: Self) -> u8 {
        self.0.abs_diff(other.0)
    }

    /// Iterate over all files, from A to H.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Lowercase char of this file.
    #[inline(always)]
    pub const fn char(&self) -> char {
        (b'a' + self.0) as char
    }
}

/// Represents a single horizontal row (rank) on a chessboard.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Rank(u8);

impl Rank {
    pub const ONE: Self = Self(0);
    pub const TWO: Self = Self(1);
    pub const THREE: Self = Self(2);
    pub const FOUR: Self = Self(3);
    pub const FIVE: Self = Self(4);
    pub const SIX: Self = Self(5);
    pub const SEVEN: Self = Self(6);
    pub const EIGHT: Self = Self(7);

    /// Number of ranks on the board.
    pub const COUNT: usize = 8;

    /// Creates a new [`Rank`] from an index in `0..8`, returning `None` if out of bounds.
    #[inline(always)]
    pub const fn new(rank: u8) -> Option<Self> {
        if rank < Self::COUNT as u8 {
            Some(Self(rank))
        } else {
            None
        }
    }

    /// Creates a new [`Rank`] without checking bounds.
    #[inline(always)]
    pub const fn new_unchecked(rank: u8) -> Self {
        debug_assert!(rank < Self::COUNT as u8);
        Self(rank)
    }

    /// Parses a [`Rank`] from a char in `1..=8`.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '1'..='8' => Ok(Self(c as u8 - b'1')),
            _ => bail!("Invalid char for Rank: {c:?}"),
        }
    }

    /// The back rank of `color`: rank 1 for White, rank 8 for Black.
    #[inline(always)]
    pub const fn first(color: Color) -> Self {
        match color {
            Color::White => Self::ONE,
            Color::Black => Self::EIGHT,
        }
    }

    /// The rank `color`'s Pawns start on.
    #[inline(always)]
    pub const fn second(color: Color) -> Self {
        match color {
            Color::White => Self::TWO,
            Color::Black => Self::SEVEN,
        }
    }

    /// The rank `color`'s Pawns promote on.
    #[inline(always)]
    pub const fn eighth(color: Color) -> Self {
        match color {
            Color::White => Self::EIGHT,
            Color::Black => Self::ONE,
        }
    }

    /// Returns this rank as a `usize`, for indexing.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Returns the inner `u8`.
    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    /// Offsets this rank by `delta`, returning `None` if that leaves the board.
    #[inline(always)]
    pub const fn offset(self, delta: i8) -> Option<Self> {
        let rank = self.0 as i8 + delta;
        if rank >= 0 && rank < Self::COUNT as i8 {
            Some(Self(rank as u8))
        } else {
            None
        }
    }

    /// Absolute distance between two ranks.
    #[inline(always)]
    pub const fn abs_diff(self, other: Self) -> u8 {
        self.0.abs_diff(other.0)
    }

    /// Iterate over all ranks, from 1 to 8.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Char of this rank, `'1'..='8'`.
    #[inline(always)]
    pub const fn char(&self) -> char {
        (b'1' + self.0) as char
    }
}

/// Represents a single square on an `8x8` chessboard.
///
/// Squares are numbered rank-major from A1 (0) to H8 (63).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Square(u8);

macro_rules! square_consts {
    ($($name:ident = $index:expr),* $(,)?) => {
        $(pub const $name: Self = Self($index);)*
    };
}

impl Square {
    #[rustfmt::skip]
    square_consts!(
        A1 = 0,  B1 = 1,  C1 = 2,  D1 = 3,  E1 = 4,  F1 = 5,  G1 = 6,  H1 = 7,
        A2 = 8,  B2 = 9,  C2 = 10, D2 = 11, E2 = 12, F2 = 13, G2 = 14, H2 = 15,
        A3 = 16, B3 = 17, C3 = 18, D3 = 19, E3 = 20, F3 = 21, G3 = 22, H3 = 23,
        A4 = 24, B4 = 25, C4 = 26, D4 = 27, E4 = 28, F4 = 29, G4 = 30, H4 = 31,
        A5 = 32, B5 = 33, C5 = 34, D5 = 35, E5 = 36, F5 = 37, G5 = 38, H5 = 39,
        A6 = 40, B6 = 41, C6 = 42, D6 = 43, E6 = 44, F6 = 45, G6 = 46, H6 = 47,
        A7 = 48, B7 = 49, C7 = 50, D7 = 51, E7 = 52, F7 = 53, G7 = 54, H7 = 55,
        A8 = 56, B8 = 57, C8 = 58, D8 = 59, E8 = 60, F8 = 61, G8 = 62, H8 = 63,
    );

    /// Number of squares on the board.
    pub const COUNT: usize = 64;

    /// Creates a new [`Square`] from a [`File`] and a [`Rank`].
    ///
    /// # Example
    /// ```
    /// # use rookery_types::{File, Rank, Square};
    /// assert_eq!(Square::new(File::E, Rank::FOUR), Square::E4);
    /// ```
    #[inline(always)]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self(rank.0 * 8 + file.0)
    }

    /// Creates a [`Square`] from an index in `0..64`.
    pub fn from_index(index: usize) -> Result<Self> {
        if index < Self::COUNT {
            Ok(Self(index as u8))
        } else {
            Err(anyhow!("Invalid square index {index}: must be in 0..64"))
        }
    }

    /// Creates a [`Square`] from an index without checking bounds.
    #[inline(always)]
    pub const fn from_index_unchecked(index: usize) -> Self {
        debug_assert!(index < Self::COUNT);
        Self(index as u8)
    }

    /// Parses a square from UCI notation, such as `e4`.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::Square;
    /// assert_eq!(Square::from_uci("e4").unwrap(), Square::E4);
    /// assert!(Square::from_uci("e9").is_err());
    /// ```
    pub fn from_uci(uci: &str) -> Result<Self> {
        let mut chars = uci.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Invalid square {uci:?}: must be a file and a rank, such as \"e4\"");
        };

        Ok(Self::new(File::from_char(file)?, Rank::from_char(rank)?))
    }

    /// Formats this square in UCI notation.
    #[inline(always)]
    pub fn to_uci(&self) -> String {
        format!("{}{}", self.file().char(), self.rank().char())
    }

    /// Index of this square, in `0..64`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Returns the inner `u8`.
    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    /// The [`File`] of this square.
    #[inline(always)]
    pub const fn file(&self) -> File {
        File(self.0 & 7)
    }

    /// The [`Rank`] of this square.
    #[inline(always)]
    pub const fn rank(&self) -> Rank {
        Rank(self.0 >> 3)
    }

    /// A [`Bitboard`] with only this square set.
    #[inline(always)]
    pub const fn bitboard(&self) -> Bitboard {
        Bitboard::from_square(*self)
    }

    /// Offsets this square by a number of files and ranks.
    ///
    /// Bounds are checked per axis, so an offset can never wrap around a board edge.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::Square;
    /// assert_eq!(Square::B1.offset(-1, 2), Some(Square::A3));
    /// assert_eq!(Square::A1.offset(-1, 2), None);
    /// ```
    #[inline(always)]
    pub const fn offset(self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        match (self.file().offset(file_delta), self.rank().offset(rank_delta)) {
            (Some(file), Some(rank)) => Some(Self::new(file, rank)),
            _ => None,
        }
    }

    /// Moves this square `n` ranks "forward", relative to `color`.
    #[inline(always)]
    pub const fn forward_by(self, color: Color, n: i8) -> Option<Self> {
        match color {
            Color::White => self.offset(0, n),
            Color::Black => self.offset(0, -n),
        }
    }

    /// Moves this square `n` ranks "backward", relative to `color`.
    #[inline(always)]
    pub const fn backward_by(self, color: Color, n: i8) -> Option<Self> {
        self.forward_by(color, -n)
    }

    /// Mirrors this square's rank for Black, leaving it unchanged for White.
    ///
    /// Useful for writing `Square::E1.rank_relative_to(color)`.
    #[inline(always)]
    pub const fn rank_relative_to(self, color: Color) -> Self {
        match color {
            Color::White => self,
            Color::Black => Self(self.0 ^ 56),
        }
    }

    /// Number of files between `self` and `other`.
    #[inline(always)]
    pub const fn distance_files(&self, other: Self) -> u8 {
        self.file().abs_diff(other.file())
    }

    /// Number of ranks between `self` and `other`.
    #[inline(always)]
    pub const fn distance_ranks(&self, other: Self) -> u8 {
        self.rank().abs_diff(other.rank())
    }

    /// Iterate over all 64 squares, from A1 to H8.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(Self)
    }
}

impl Mul<Rank> for File {
    type Output = Square;
    #[inline(always)]
    fn mul(self, rhs: Rank) -> Self::Output {
        Square::new(self, rhs)
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl<T> Index<Square> for [T; Square::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Square> for [T; Square::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_parts() {
        assert_eq!(Square::E4.file(), File::E);
        assert_eq!(Square::E4.rank(), Rank::FOUR);
        assert_eq!(File::H * Rank::EIGHT, Square::H8);
        assert_eq!(Square::from_index(63).unwrap(), Square::H8);
        assert!(Square::from_index(64).is_err());
    }

    #[test]
    fn test_offsets_never_wrap() {
        // Stepping east off the H-file must not land on the A-file of the next rank
        assert_eq!(Square::H4.offset(1, 0), None);
        assert_eq!(Square::A4.offset(-1, 0), None);
        assert_eq!(Square::H8.offset(0, 1), None);
        assert_eq!(Square::G1.offset(2, 1), None);
        assert_eq!(Square::G1.offset(1, 2), Some(Square::H3));
    }

    #[test]
    fn test_relative_squares() {
        assert_eq!(Square::E1.rank_relative_to(Color::Black), Square::E8);
        assert_eq!(Square::E1.rank_relative_to(Color::White), Square::E1);
        assert_eq!(Square::E2.forward_by(Color::White, 2), Some(Square::E4));
        assert_eq!(Square::E7.forward_by(Color::Black, 2), Some(Square::E5));
        assert_eq!(Square::E3.backward_by(Color::Black, 1), Some(Square::E4));
        assert_eq!(Square::E1.backward_by(Color::White, 1), None);
    }

    #[test]
    fn test_uci_round_trip() {
        for square in Square::iter() {
            assert_eq!(Square::from_uci(&square.to_uci()).unwrap(), square);
        }
    }
}
