/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{MoveError, PieceKind, Position, Square};

/// Represents a move made on a chess board.
///
/// A move is fully described by where it starts, where it ends, what moved, and what (if anything)
/// a Pawn promoted to. Castling, en passant, and double pushes are not stored; they are implied by
/// those fields (see [`Move::is_castle`], [`Move::is_en_passant`], [`Move::is_pawn_double_push`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    piece: PieceKind,
    promotion: Option<PieceKind>,
}

impl Move {
    /// The "empty" move. Never produced by move generation.
    ///
    /// Useful for initializing arrays of moves and for marking "no move played yet".
    pub const NULL: Self = Self {
        from: Square::A1,
        to: Square::A1,
        piece: PieceKind::Pawn,
        promotion: None,
    };

    /// Creates a new [`Move`] of `piece` from `from` to `to`.
    ///
    /// # Example
    /// ```
    /// # use rookery::*;
    /// let e2e4 = Move::new(Square::E2, Square::E4, PieceKind::Pawn);
    /// assert_eq!(e2e4.to_string(), "e2e4");
    /// ```
    #[inline(always)]
    pub const fn new(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            piece,
            promotion: None,
        }
    }

    /// Creates a new Pawn [`Move`] that promotes to `promotion` on arrival.
    #[inline(always)]
    pub const fn new_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            from,
            to,
            piece: PieceKind::Pawn,
            promotion: Some(promotion),
        }
    }

    /// Parses a move in long algebraic notation (`e2e4`, `e7e8q`) in the context of `position`.
    ///
    /// The moved piece is read from `position`, so the origin must hold a piece of the side to
    /// move. This does _not_ check that the move is legal.
    ///
    /// # Example
    /// ```
    /// # use rookery::*;
    /// let position = Position::default();
    /// let mv = Move::from_uci(&position, "g1f3").unwrap();
    /// assert_eq!(mv.piece(), PieceKind::Knight);
    /// assert!(Move::from_uci(&position, "e3e4").is_err());
    /// ```
    pub fn from_uci(position: &Position, uci: &str) -> Result<Self, MoveError> {
        let invalid = || MoveError::InvalidUci(uci.to_string());

        // Squares are ASCII, so anything else is garbage anyway
        if !uci.is_ascii() || !(4..=5).contains(&uci.len()) {
            return Err(invalid());
        }

        let from = Square::from_uci(&uci[0..2]).map_err(|_| invalid())?;
        let to = Square::from_uci(&uci[2..4]).map_err(|_| invalid())?;

        let color = position.side_to_move();
        let piece = match position.board().piece_at(from) {
            Some(piece) if piece.color() == color => piece,
            _ => return Err(MoveError::NoPieceAt { square: from, color }),
        };

        let promotion = match uci[4..].chars().next() {
            None => None,
            Some(c) => match PieceKind::from_char(c) {
                Ok(kind) if PieceKind::PROMOTIONS.contains(&kind) && piece.is_pawn() => {
                    Some(kind)
                }
                _ => return Err(invalid()),
            },
        };

        Ok(Self {
            from,
            to,
            piece: piece.kind(),
            promotion,
        })
    }

    /// Formats this move in long algebraic notation. The null move is `0000`.
    pub fn to_uci(&self) -> String {
        if self.is_null() {
            return String::from("0000");
        }

        match self.promotion {
            Some(promotion) => format!("{}{}{}", self.from, self.to, promotion.char()),
            None => format!("{}{}", self.from, self.to),
        }
    }

    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    /// The kind of piece being moved (a Pawn, for promotions).
    #[inline(always)]
    pub const fn piece(&self) -> PieceKind {
        self.piece
    }

    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    /// Returns `true` if this is [`Move::NULL`].
    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        self.from.index() == self.to.index()
    }

    /// A King moving two files is castling.
    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        self.piece.is_king() && self.from.distance_files(self.to) == 2
    }

    /// Castling towards the H-file.
    #[inline(always)]
    pub const fn is_short_castle(&self) -> bool {
        self.is_castle() && self.to.file().inner() > self.from.file().inner()
    }

    /// Castling towards the A-file.
    #[inline(always)]
    pub const fn is_long_castle(&self) -> bool {
        self.is_castle() && self.to.file().inner() < self.from.file().inner()
    }

    #[inline(always)]
    pub const fn is_pawn_double_push(&self) -> bool {
        self.piece.is_pawn() && self.from.distance_ranks(self.to) == 2
    }

    /// A Pawn moving diagonally onto the en passant square captures en passant.
    #[inline(always)]
    pub fn is_en_passant(&self, ep_square: Option<Square>) -> bool {
        self.piece.is_pawn() && Some(self.to) == ep_square && self.from.file() != self.to.file()
    }
}

impl Default for Move {
    #[inline(always)]
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.to_uci(), self.piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_flags() {
        let castle = Move::new(Square::E8, Square::C8, PieceKind::King);
        assert!(castle.is_castle());
        assert!(castle.is_long_castle());
        assert!(!castle.is_short_castle());

        let step = Move::new(Square::E1, Square::F1, PieceKind::King);
        assert!(!step.is_castle());

        let push = Move::new(Square::D7, Square::D5, PieceKind::Pawn);
        assert!(push.is_pawn_double_push());
        assert!(!Move::new(Square::D1, Square::D3, PieceKind::Rook).is_pawn_double_push());

        let ep = Move::new(Square::E5, Square::D6, PieceKind::Pawn);
        assert!(ep.is_en_passant(Some(Square::D6)));
        assert!(!ep.is_en_passant(None));
    }

    #[test]
    fn test_from_uci() {
        let position = Position::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();

        let promote = Move::from_uci(&position, "b7b8q").unwrap();
        assert_eq!(promote, Move::new_promotion(Square::B7, Square::B8, PieceKind::Queen));
        assert_eq!(promote.to_string(), "b7b8q");

        assert_eq!(
            Move::from_uci(&position, "e8e7"),
            Err(MoveError::NoPieceAt {
                square: Square::E8,
                color: position.side_to_move()
            })
        );
        assert!(matches!(
            Move::from_uci(&position, "b7b8k"),
            Err(MoveError::InvalidUci(_))
        ));
        assert!(matches!(
            Move::from_uci(&position, "e1e2q"),
            Err(MoveError::InvalidUci(_))
        ));
        assert!(matches!(
            Move::from_uci(&position, "z9e2"),
            Err(MoveError::InvalidUci(_))
        ));
    }

    #[test]
    fn test_null_move() {
        assert!(Move::NULL.is_null());
        assert_eq!(Move::default(), Move::NULL);
        assert_eq!(Move::NULL.to_uci(), "0000");
    }
}
