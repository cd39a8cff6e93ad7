/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut, Not},
    str::FromStr,
};

use anyhow::{bail, Result};

/// Represents the color of a player, piece, square, etc. within a chess board.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of colors.
    pub const COUNT: usize = 2;

    /// Both colors, White first.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Creates a [`Color`] from a `bool`: `true` is Black, `false` is White.
    #[inline(always)]
    pub const fn from_bool(is_black: bool) -> Self {
        if is_black {
            Self::Black
        } else {
            Self::White
        }
    }

    /// Parses a [`Color`] from `'w'` or `'b'` (case-insensitive).
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_lowercase() {
            'w' => Ok(Self::White),
            'b' => Ok(Self::Black),
            _ => bail!("Invalid char for Color: {c:?}"),
        }
    }

    /// Returns this color's opponent.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    #[inline(always)]
    pub const fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }

    /// `1` for White, `-1` for Black. Multiplying a White-relative score by this gives a
    /// score relative to this color.
    #[inline(always)]
    pub const fn negation_multiplier(&self) -> i32 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// Index of this color, for indexing into arrays of length [`Color::COUNT`].
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// `'w'` or `'b'`.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }
}

impl Not for Color {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        self.opponent()
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => bail!("Invalid Color {s:?}: must be \"w\" or \"b\""),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl<T> Index<Color> for [T; Color::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Color> for [T; Color::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

/// Represents the kind (or "role") that a chess piece can be.
///
/// The discriminants match the ordering used for per-kind [`crate::Bitboard`] arrays.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Number of piece kinds.
    pub const COUNT: usize = 6;

    /// The kinds a Pawn may promote to, weakest first.
    pub const PROMOTIONS: [Self; 4] = [Self::Knight, Self::Bishop, Self::Rook, Self::Queen];

    /// All piece kinds, Pawn first.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Pawn,
            Self::Knight,
            Self::Bishop,
            Self::Rook,
            Self::Queen,
            Self::King,
        ]
    }

    /// Index of this kind, for indexing into arrays of length [`PieceKind::COUNT`].
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Material value of this kind, in decipawns. The King has no material value.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::PieceKind;
    /// assert_eq!(PieceKind::Pawn.value(), 100);
    /// assert_eq!(PieceKind::Bishop.value(), 310);
    /// assert_eq!(PieceKind::King.value(), 0);
    /// ```
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        match self {
            Self::Pawn => 100,
            Self::Knight => 300,
            Self::Bishop => 310,
            Self::Rook => 500,
            Self::Queen => 900,
            Self::King => 0,
        }
    }

    /// Parses a [`PieceKind`] from its (case-insensitive) letter.
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_lowercase() {
            'p' => Ok(Self::Pawn),
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            'k' => Ok(Self::King),
            _ => bail!("Invalid char for PieceKind: {c:?}"),
        }
    }

    /// Lowercase letter of this kind.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    #[inline(always)]
    pub const fn is_pawn(&self) -> bool {
        matches!(self, Self::Pawn)
    }

    #[inline(always)]
    pub const fn is_king(&self) -> bool {
        matches!(self, Self::King)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl<T> Index<PieceKind> for [T; PieceKind::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: PieceKind) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<PieceKind> for [T; PieceKind::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: PieceKind) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

/// A chess piece: a [`Color`] and a [`PieceKind`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Piece {
    /// Number of distinct pieces (colors times kinds).
    pub const COUNT: usize = Color::COUNT * PieceKind::COUNT;

    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Returns the [`Color`] and [`PieceKind`] of this piece.
    #[inline(always)]
    pub const fn parts(&self) -> (Color, PieceKind) {
        (self.color, self.kind)
    }

    /// Index in `0..12`, White pieces first.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.color.index() * PieceKind::COUNT + self.kind.index()
    }

    /// Returns a copy of this piece with its kind replaced by `promotion`.
    #[inline(always)]
    pub const fn promoted(self, promotion: PieceKind) -> Self {
        Self::new(self.color, promotion)
    }

    #[inline(always)]
    pub const fn is_pawn(&self) -> bool {
        self.kind.is_pawn()
    }

    #[inline(always)]
    pub const fn is_king(&self) -> bool {
        self.kind.is_king()
    }

    /// Parses a [`Piece`] from a FEN char: uppercase is White, lowercase is Black.
    ///
    /// # Example
    /// ```
    /// # use rookery_types::{Color, Piece, PieceKind};
    /// assert_eq!(Piece::from_uci('N').unwrap(), Piece::new(Color::White, PieceKind::Knight));
    /// assert_eq!(Piece::from_uci('q').unwrap(), Piece::new(Color::Black, PieceKind::Queen));
    /// assert!(Piece::from_uci('x').is_err());
    /// ```
    pub fn from_uci(c: char) -> Result<Self> {
        let kind = PieceKind::from_char(c)?;
        Ok(Self::new(Color::from_bool(c.is_ascii_lowercase()), kind))
    }

    /// FEN char of this piece.
    #[inline(always)]
    pub const fn char(&self) -> char {
        let c = self.kind.char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_chars_round_trip() {
        for c in "PNBRQKpnbrqk".chars() {
            assert_eq!(Piece::from_uci(c).unwrap().char(), c);
        }
    }

    #[test]
    fn test_piece_indices_are_unique() {
        let mut seen = [false; Piece::COUNT];
        for color in Color::all() {
            for kind in PieceKind::all() {
                let index = Piece::new(color, kind).index();
                assert!(!seen[index]);
                seen[index] = true;
            }
        }
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!("w".parse::<Color>().unwrap(), Color::White);
        assert_eq!("b".parse::<Color>().unwrap(), Color::Black);
        assert!("white".parse::<Color>().is_err());
    }
}
