/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{CastlingRights, Color, File, Piece, Position, Square, XoShiRo};

/// Seed for the Zobrist key table.
const ZOBRIST_SEED: u64 = 0x52_6F_6F_6B_65_72_79_21;

/// Random keys for every hashable feature of a position.
struct ZobristTable {
    pieces: [[u64; Square::COUNT]; Piece::COUNT],
    ep_files: [u64; File::COUNT],
    castling: [[u64; 4]; Color::COUNT],
    side_to_move: u64,
}

/// Keys are generated at compile time from a fixed seed, so they are identical across runs.
static ZOBRIST: ZobristTable = {
    let mut rng = XoShiRo::new(ZOBRIST_SEED);
    let mut pieces = [[0; Square::COUNT]; Piece::COUNT];
    let mut ep_files = [0; File::COUNT];
    let mut castling = [[0; 4]; Color::COUNT];

    let mut i = 0;
    while i < Piece::COUNT {
        let mut j = 0;
        while j < Square::COUNT {
            let (key, next) = rng.get_next_const();
            pieces[i][j] = key;
            rng = next;
            j += 1;
        }
        i += 1;
    }

    let mut i = 0;
    while i < File::COUNT {
        let (key, next) = rng.get_next_const();
        ep_files[i] = key;
        rng = next;
        i += 1;
    }

    let mut i = 0;
    while i < Color::COUNT {
        // No rights hashes to zero, so an empty position keys to zero
        let mut j = 1;
        while j < 4 {
            let (key, next) = rng.get_next_const();
            castling[i][j] = key;
            rng = next;
            j += 1;
        }
        i += 1;
    }

    let (side_to_move, _) = rng.get_next_const();

    ZobristTable {
        pieces,
        ep_files,
        castling,
        side_to_move,
    }
};

/// A Zobrist hash key of a [`Position`].
///
/// Updated incrementally by [`Position::make_move`]; [`ZobristKey::new`] recomputes it from scratch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Computes the key of `position` from scratch.
    pub fn new(position: &Position) -> Self {
        let mut key = Self::default();

        for (square, piece) in position.board() {
            key.hash_piece(square, piece);
        }

        key.hash_optional_ep_square(position.ep_square());
        key.hash_castling_rights(position.castling_rights());

        if position.side_to_move() == Color::Black {
            key.toggle_side_to_move();
        }

        key
    }

    /// The raw key.
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Adds or removes `piece` on `square`.
    #[inline(always)]
    pub fn hash_piece(&mut self, square: Square, piece: Piece) {
        self.0 ^= ZOBRIST.pieces[piece.index()][square.index()];
    }

    /// Adds or removes an en passant square. Only its file is hashed.
    #[inline(always)]
    pub fn hash_ep_square(&mut self, square: Square) {
        self.0 ^= ZOBRIST.ep_files[square.file().index()];
    }

    #[inline(always)]
    pub fn hash_optional_ep_square(&mut self, square: Option<Square>) {
        if let Some(square) = square {
            self.hash_ep_square(square);
        }
    }

    /// Adds or removes both players' castling rights.
    ///
    /// Call once before changing the rights and once after.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, rights: &[CastlingRights; Color::COUNT]) {
        self.0 ^= ZOBRIST.castling[Color::White][rights[Color::White].index()];
        self.0 ^= ZOBRIST.castling[Color::Black][rights[Color::Black].index()];
    }

    /// Flips whose turn it is.
    #[inline(always)]
    pub fn toggle_side_to_move(&mut self) {
        self.0 ^= ZOBRIST.side_to_move;
    }
}

impl fmt::Display for ZobristKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl fmt::Debug for ZobristKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct() {
        let mut keys = ZOBRIST.pieces.iter().flatten().copied().collect::<Vec<_>>();
        keys.extend(ZOBRIST.ep_files);
        keys.extend(ZOBRIST.castling.iter().flat_map(|keys| keys[1..].iter().copied()));
        keys.push(ZOBRIST.side_to_move);

        let count = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), count);
        assert!(!keys.contains(&0));
    }

    #[test]
    fn test_empty_position_keys_to_zero() {
        assert_eq!(ZobristKey::new(&Position::new()).inner(), 0);
    }
}
