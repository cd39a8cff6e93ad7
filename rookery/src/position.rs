/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Deref, DerefMut, Index},
    str::FromStr,
};

use anyhow::{anyhow, bail, Result};

use super::{Bitboard, Color, File, Move, Piece, PieceKind, Rank, Square, ZobristKey};

/// Piece kinds on the back rank of the standard starting position, A-file first.
const BACK_RANK: [PieceKind; File::COUNT] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Represents the castling rights of a single player
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub struct CastlingRights {
    pub(crate) kingside: bool,
    pub(crate) queenside: bool,
}

impl CastlingRights {
    /// Creates a new [`CastlingRights`] that permits castling to the provided sides.
    #[inline(always)]
    pub const fn new(kingside: bool, queenside: bool) -> Self {
        Self {
            kingside,
            queenside,
        }
    }

    /// Returns `true` if castling towards the H-file is still permitted.
    #[inline(always)]
    pub const fn kingside(&self) -> bool {
        self.kingside
    }

    /// Returns `true` if castling towards the A-file is still permitted.
    #[inline(always)]
    pub const fn queenside(&self) -> bool {
        self.queenside
    }

    /// Creates a `usize` for indexing into lists of 4 elements.
    ///
    /// Only used internally for Zobrist hashing.
    #[inline(always)]
    pub(crate) const fn index(&self) -> usize {
        (self.kingside as usize) | (self.queenside as usize) << 1
    }
}

/// Everything needed to take back a move applied by [`Position::make_move`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[must_use = "a position can only be restored with the `Undo` returned by `make_move`"]
pub struct Undo {
    mv: Move,
    captured: Option<Piece>,
    castling_rights: [CastlingRights; Color::COUNT],
    ep_square: Option<Square>,
    halfmove: usize,
    fullmove: usize,
    last_move: Move,
    key: ZobristKey,
}

impl Undo {
    /// The move this snapshot takes back.
    #[inline(always)]
    pub const fn mv(&self) -> Move {
        self.mv
    }

    /// The piece the move captured, if any.
    #[inline(always)]
    pub const fn captured(&self) -> Option<Piece> {
        self.captured
    }
}

/// A move applied to a [`Position`] that is taken back when this guard is dropped.
///
/// Dereferences to the [`Position`] *after* the move, so the child position can be inspected
/// and searched through the guard. Every way out of the guard's scope (falling off the end,
/// `continue`, `return`, `?`) restores the position.
pub struct MoveGuard<'a> {
    position: &'a mut Position,
    undo: Undo,
}

impl MoveGuard<'_> {
    /// The move held by this guard.
    #[inline(always)]
    pub const fn mv(&self) -> Move {
        self.undo.mv
    }
}

impl Deref for MoveGuard<'_> {
    type Target = Position;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &*self.position
    }
}

impl DerefMut for MoveGuard<'_> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.position
    }
}

impl Drop for MoveGuard<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        self.position.unmake_move(self.undo);
    }
}

/// Represents the current state of the game, including move counters.
///
/// Analogous to a FEN string.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Bitboard representation of the game board.
    pub(crate) board: Board,

    /// The [`Color`] of the current player.
    side_to_move: Color,

    /// Castling rights for each player.
    castling_rights: [CastlingRights; Color::COUNT],

    /// Optional attack square for en passant.
    ep_square: Option<Square>,

    /// Used to enforce the fifty-move rule.
    ///
    /// - Incremented after each move.
    /// - Reset after a capture or a pawn moves.
    halfmove: usize,

    /// Number of moves since the beginning of the game.
    ///
    /// A fullmove is a complete turn by white and then by black.
    fullmove: usize,

    /// The move that produced this position, or [`Move::NULL`] if none has been played.
    last_move: Move,

    /// Zobrist hash key of this position
    key: ZobristKey,
}

impl Position {
    /// Creates a new, empty [`Position`] with the following properties:
    /// * No pieces on the board
    /// * White moves first
    /// * No castling rights
    /// * No en passant square available
    /// * Halfmove counter set to 0
    /// * Fullmove counter set to 1
    ///
    /// # Example
    /// ```
    /// # use rookery::Position;
    /// let state = Position::new();
    /// assert_eq!(state.to_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
    /// ```
    pub fn new() -> Self {
        let mut pos = Self {
            board: Board::new(),
            side_to_move: Color::White,
            castling_rights: [CastlingRights::default(); Color::COUNT],
            ep_square: None,
            halfmove: 0,
            fullmove: 1,
            last_move: Move::NULL,
            key: ZobristKey::default(),
        };
        pos.key = ZobristKey::new(&pos);
        pos
    }

    /// Creates a new [`Position`] from the provided FEN string.
    ///
    /// Missing trailing fields default to `w KQkq - 0 1`.
    ///
    /// # Example
    /// ```
    /// # use rookery::*;
    /// let pos = Position::from_fen(FEN_KIWIPETE).unwrap();
    /// assert_eq!(pos.to_fen(), FEN_KIWIPETE);
    /// assert!(Position::from_fen("8/8/8/8/8/8/8/9 w - - 0 1").is_err());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut pos = Self::new();
        let mut split = fen.split_whitespace();
        let placements = split.next().ok_or(anyhow!(
            "Invalid FEN string: FEN string must have piece placements."
        ))?;
        pos.board = Board::from_fen(placements)?;

        let active_color = split.next().unwrap_or("w");
        pos.side_to_move = Color::from_str(active_color)?;

        let castling = split.next().unwrap_or("KQkq");
        if castling.contains(['K', 'k', 'Q', 'q']) {
            pos.castling_rights[Color::White] =
                CastlingRights::new(castling.contains('K'), castling.contains('Q'));
            pos.castling_rights[Color::Black] =
                CastlingRights::new(castling.contains('k'), castling.contains('q'));
        } else if castling.chars().any(|c| File::from_char(c).is_ok()) {
            tracing::warn!(castling, "Chess960 castling rights are not supported; ignoring them");
        } else if castling != "-" {
            bail!("Invalid FEN string: invalid castling rights {castling:?}");
        }

        let en_passant_target = split.next().unwrap_or("-");
        pos.ep_square = match en_passant_target {
            "-" => None,
            square => Some(Square::from_uci(square)?),
        };

        let halfmove = split.next().unwrap_or("0");
        pos.halfmove = halfmove.parse().or(Err(anyhow!(
            "Invalid FEN string: FEN string must have valid halfmove counter. Got {halfmove}"
        )))?;

        let fullmove = split.next().unwrap_or("1");
        pos.fullmove = fullmove.parse().or(Err(anyhow!(
            "Invalid FEN string: FEN string must have valid fullmove counter. Got {fullmove}"
        )))?;

        pos.key = ZobristKey::new(&pos);

        Ok(pos)
    }

    /// Generates a FEN string from this [`Position`].
    pub fn to_fen(&self) -> String {
        let placements = self.board().to_fen();
        let active_color = self.side_to_move();

        let castling = self.castling_rights_uci();

        let en_passant_target = if let Some(square) = self.ep_square {
            square.to_string()
        } else {
            String::from("-")
        };

        let halfmove = self.halfmove;
        let fullmove = self.fullmove;

        format!("{placements} {active_color} {castling} {en_passant_target} {halfmove} {fullmove}")
    }

    /// Returns the current player as a [`Color`].
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// If en passant can be performed, returns the en passant [`Square`].
    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    /// Returns the [`CastlingRights`] of the current position.
    #[inline(always)]
    pub const fn castling_rights(&self) -> &[CastlingRights; Color::COUNT] {
        &self.castling_rights
    }

    /// Returns the [`CastlingRights`] for `color` in the current position.
    #[inline(always)]
    pub const fn castling_rights_for(&self, color: Color) -> &CastlingRights {
        &self.castling_rights[color.index()]
    }

    /// Formats the castling rights as they appear in a FEN string.
    pub fn castling_rights_uci(&self) -> String {
        let mut castling = String::with_capacity(4);

        if self.castling_rights[Color::White].kingside {
            castling.push('K');
        }
        if self.castling_rights[Color::White].queenside {
            castling.push('Q');
        }
        if self.castling_rights[Color::Black].kingside {
            castling.push('k');
        }
        if self.castling_rights[Color::Black].queenside {
            castling.push('q');
        }

        // If no side can castle, use a hyphen
        if castling.is_empty() {
            castling = String::from("-");
        }
        castling
    }

    /// Returns the half-move counter of the current position.
    #[inline(always)]
    pub const fn halfmove(&self) -> usize {
        self.halfmove
    }

    /// Returns the full-move counter of the current position.
    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    /// The move that led to this position, or [`Move::NULL`].
    #[inline(always)]
    pub const fn last_move(&self) -> Move {
        self.last_move
    }

    /// Fetch the Zobrist hash key of this position.
    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// Fetches this position's [`Board`]
    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Copies `self` and passes the turn to the opponent without moving a piece.
    ///
    /// The en passant square is cleared, since it only ever belongs to the player who was to move.
    ///
    /// # Example
    /// ```
    /// # use rookery::*;
    /// let pos = Position::default().with_nullmove();
    /// assert_eq!(pos.side_to_move(), Color::Black);
    /// assert_eq!(pos.key(), ZobristKey::new(&pos));
    /// ```
    pub fn with_nullmove(&self) -> Self {
        let mut copied = *self;

        if let Some(ep_square) = copied.ep_square.take() {
            copied.key.hash_ep_square(ep_square);
        }

        copied.side_to_move = copied.side_to_move.opponent();
        copied.key.toggle_side_to_move();
        copied.last_move = Move::NULL;

        copied
    }

    /// Applies the move in place and returns the [`Undo`] that takes it back. No enforcement of legality.
    ///
    /// # Panics
    ///
    /// If there is no piece on the move's origin square.
    pub fn make_move(&mut self, mv: Move) -> Undo {
        let mut undo = Undo {
            mv,
            captured: None,
            castling_rights: self.castling_rights,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            fullmove: self.fullmove,
            last_move: self.last_move,
            key: self.key,
        };

        let (from, to) = (mv.from(), mv.to());
        let color = self.side_to_move();

        let Some(mut piece) = self.board.take(from) else {
            panic!("Failed to apply {mv} to {self}: No piece found at {from}");
        };

        // Un-hash the piece at `from`.
        self.key.hash_piece(from, piece);

        // Clear the EP square from the last move (and un-hash it)
        if let Some(ep_square) = self.ep_square.take() {
            self.key.hash_ep_square(ep_square);
        }

        // Increment move counters
        self.halfmove += 1; // This is reset if a capture occurs or a pawn moves
        self.fullmove += color.index();

        // If this move was en passant, the piece we captured isn't at `to`, it's one square behind
        let captured_square = if mv.is_en_passant(undo.ep_square) {
            to.backward_by(color, 1).unwrap_or(to)
        } else {
            to
        };

        if let Some(captured) = self.board.take(captured_square) {
            self.key.hash_piece(captured_square, captured);
            undo.captured = Some(captured);

            // A capture on a rook's starting corner removes that side's castling
            let captured_color = captured.color();
            if to == Square::A1.rank_relative_to(captured_color) {
                self.set_castling_rights(captured_color, |rights| rights.queenside = false);
            } else if to == Square::H1.rank_relative_to(captured_color) {
                self.set_castling_rights(captured_color, |rights| rights.kingside = false);
            }

            self.halfmove = 0;
        }

        if mv.is_pawn_double_push() {
            self.ep_square = from.forward_by(color, 1);
            self.key.hash_optional_ep_square(self.ep_square);
        } else if mv.is_castle() {
            let (old_rook_square, new_rook_square) = castling_rook_squares(mv, color);

            // Move the rook. The King is handled below.
            if let Some(rook) = self.board.take(old_rook_square) {
                self.key.hash_piece(old_rook_square, rook);
                self.board.place(rook, new_rook_square);
                self.key.hash_piece(new_rook_square, rook);
            }
        }

        match piece.kind() {
            PieceKind::Pawn => self.halfmove = 0,

            PieceKind::Rook => {
                if from == Square::A1.rank_relative_to(color) {
                    self.set_castling_rights(color, |rights| rights.queenside = false);
                } else if from == Square::H1.rank_relative_to(color) {
                    self.set_castling_rights(color, |rights| rights.kingside = false);
                }
            }

            PieceKind::King => self.set_castling_rights(color, |rights| {
                *rights = CastlingRights::default();
            }),

            _ => {}
        }

        // Now we check for promotions, since all special cases for Pawns and Rooks have been dealt with
        if let Some(promotion) = mv.promotion() {
            piece = piece.promoted(promotion);
        }

        self.board.place(piece, to);
        self.key.hash_piece(to, piece);

        self.last_move = mv;
        self.side_to_move = color.opponent();
        self.key.toggle_side_to_move();

        undo
    }

    /// Takes back the move recorded in `undo`, restoring the position exactly as it was before
    /// the matching [`Position::make_move`].
    ///
    /// `undo` must come from the most recent move applied to this position.
    pub fn unmake_move(&mut self, undo: Undo) {
        let mv = undo.mv;
        let color = self.side_to_move.opponent();
        self.side_to_move = color;

        // The piece on `to` is the mover (possibly promoted)
        if let Some(piece) = self.board.take(mv.to()) {
            let original = if mv.promotion().is_some() {
                Piece::new(color, PieceKind::Pawn)
            } else {
                piece
            };
            self.board.place(original, mv.from());
        }

        if mv.is_castle() {
            let (old_rook_square, new_rook_square) = castling_rook_squares(mv, color);
            if let Some(rook) = self.board.take(new_rook_square) {
                self.board.place(rook, old_rook_square);
            }
        }

        if let Some(captured) = undo.captured {
            let captured_square = if mv.is_en_passant(undo.ep_square) {
                mv.to().backward_by(color, 1).unwrap_or(mv.to())
            } else {
                mv.to()
            };
            self.board.place(captured, captured_square);
        }

        self.castling_rights = undo.castling_rights;
        self.ep_square = undo.ep_square;
        self.halfmove = undo.halfmove;
        self.fullmove = undo.fullmove;
        self.last_move = undo.last_move;
        self.key = undo.key;
    }

    /// Applies `mv` and returns a guard that takes it back when dropped.
    ///
    /// # Example
    /// ```
    /// # use rookery::*;
    /// let mut pos = Position::default();
    /// let original = pos;
    /// {
    ///     let child = pos.play(Move::new(Square::E2, Square::E4, PieceKind::Pawn));
    ///     assert_eq!(child.side_to_move(), Color::Black);
    ///     assert_eq!(child.ep_square(), Some(Square::E3));
    /// }
    /// assert_eq!(pos, original);
    /// ```
    #[inline(always)]
    pub fn play(&mut self, mv: Move) -> MoveGuard<'_> {
        let undo = self.make_move(mv);
        MoveGuard {
            position: self,
            undo,
        }
    }

    /// Checks that every redundant piece of state agrees with every other:
    /// the color unions, the mailbox, the king squares, and the Zobrist key.
    pub fn is_consistent(&self) -> bool {
        self.board.is_consistent() && self.key == ZobristKey::new(self)
    }

    /// Updates the castling rights of `color` with `f`, keeping the key in sync.
    #[inline(always)]
    fn set_castling_rights(&mut self, color: Color, f: impl FnOnce(&mut CastlingRights)) {
        self.key.hash_castling_rights(&self.castling_rights);
        f(&mut self.castling_rights[color]);
        self.key.hash_castling_rights(&self.castling_rights);
    }
}

/// Where the rook starts and ends when `color` castles with `mv`.
#[inline(always)]
fn castling_rook_squares(mv: Move, color: Color) -> (Square, Square) {
    if mv.is_short_castle() {
        (
            Square::H1.rank_relative_to(color),
            Square::F1.rank_relative_to(color),
        )
    } else {
        (
            Square::A1.rank_relative_to(color),
            Square::D1.rank_relative_to(color),
        )
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Deref for Position {
    type Target = Board;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.board()
    }
}

impl Default for Position {
    /// The standard starting position.
    fn default() -> Self {
        let mut pos = Self::new();
        pos.board = Board::default();
        pos.castling_rights = [CastlingRights::new(true, true); Color::COUNT];
        pos.key = ZobristKey::new(&pos);
        pos
    }
}

impl fmt::Display for Position {
    /// Display this position's FEN string
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}|")?;
            for file in File::iter() {
                let piece_char = self.board().piece_at(file * rank).map_or('.', |p| p.char());
                write!(f, " {piece_char}")?;
            }

            if rank == Rank::SEVEN {
                write!(f, "           FEN: {}", self.to_fen())?;
            } else if rank == Rank::SIX {
                write!(f, "          Side: {}", self.side_to_move())?;
            } else if rank == Rank::FIVE {
                write!(f, "      Castling: {}", self.castling_rights_uci())?;
            } else if rank == Rank::FOUR {
                let ep = self.ep_square().map_or(String::from("-"), |t| t.to_uci());
                write!(f, "            EP: {ep}")?;
            } else if rank == Rank::THREE {
                write!(f, "     Last move: {}", self.last_move())?;
            } else if rank == Rank::TWO {
                write!(f, "           Key: {}", self.key())?;
            }
            writeln!(f)?;
        }
        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "--")?;
        }
        write!(f, "\n   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }

        Ok(())
    }
}

/// Represents all pieces and their locations on a chess board.
///
/// Has no knowledge of castling rights, en passant, or move counters. If you need those, see [`Position`].
///
/// Internally uses one [`Bitboard`] per (color, kind) pair, a union per color, and a mailbox.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    /// All squares occupied by a specific piece of a specific color.
    pieces: [[Bitboard; PieceKind::COUNT]; Color::COUNT],

    /// All squares occupied by a specific color.
    colors: [Bitboard; Color::COUNT],

    /// Redundant mailbox to speed up the [`Board::piece_at`] functions.
    mailbox: [Option<Piece>; Square::COUNT],

    /// Square of each color's King, if it has one.
    king_squares: [Option<Square>; Color::COUNT],
}

impl Board {
    /// Creates a new, empty [`Board`] containing no pieces.
    ///
    /// # Example
    /// ```
    /// # use rookery::Board;
    /// let board = Board::new();
    /// assert_eq!(board.to_fen(), "8/8/8/8/8/8/8/8");
    /// ```
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            pieces: [[Bitboard::EMPTY_BOARD; PieceKind::COUNT]; Color::COUNT],
            colors: [Bitboard::EMPTY_BOARD; Color::COUNT],
            mailbox: [None; Square::COUNT],
            king_squares: [None; Color::COUNT],
        }
    }

    /// Constructs a [`Board`] from the placement field of a FEN string.
    ///
    /// At most one King per color is accepted; a board with no Kings is fine.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut board = Self::new();

        // If this FEN string contains more than just the initial placements, extract the placements
        let placements = fen.split_whitespace().next().unwrap_or_default();

        // Check if the placements string is the correct length
        if placements.matches('/').count() != 7 {
            bail!("Missing placements for all 8 ranks.");
        }

        // Need to reverse this so that White pieces are at the "bottom" of the board
        for (rank, placements) in placements.split('/').rev().enumerate() {
            let mut file = 0;
            let rank = Rank::new_unchecked(rank as u8);

            for piece_char in placements.chars() {
                if let Ok(piece) = Piece::from_uci(piece_char) {
                    let Some(file) = File::new(file) else {
                        bail!("Too many squares on rank {rank} when parsing FEN.");
                    };
                    let square = Square::new(file, rank);

                    if piece.is_king() && board.king_squares[piece.color()].is_some() {
                        bail!("Found more than one {} King when parsing FEN.", piece.color());
                    }
                    board.place(piece, square);
                } else {
                    // If the next char was not a piece, increment our File counter, checking for errors along the way
                    let Some(empty) = piece_char.to_digit(10).filter(|n| (1..=8).contains(n))
                    else {
                        bail!("Found non-piece, non-numeric char {piece_char:?} when parsing FEN.");
                    };
                    file += empty as u8 - 1;
                }

                file += 1;
                if file > File::COUNT as u8 {
                    bail!("Too many squares on rank {rank} when parsing FEN.");
                }
            }

            if file != File::COUNT as u8 {
                bail!("Rank {rank} must describe exactly 8 squares when parsing FEN.");
            }
        }

        Ok(board)
    }

    /// Returns `true` if there is a piece at the given [`Square`], else `false`.
    ///
    /// # Example
    /// ```
    /// # use rookery::{Board, Square};
    /// let board = Board::default();
    /// assert_eq!(board.has(Square::B1), true);
    /// ```
    #[inline(always)]
    pub const fn has(&self, square: Square) -> bool {
        self.mailbox[square.index()].is_some()
    }

    /// Places the provided [`Piece`] on the supplied [`Square`].
    ///
    /// If another piece occupies this square, this does *not* remove that piece.
    /// Use [`Board::take`] first.
    ///
    /// # Example
    /// ```
    /// # use rookery::{Board, Piece, PieceKind, Color, Square};
    /// let white_knight = Piece::new(Color::White, PieceKind::Knight);
    /// let mut board = Board::new();
    /// board.place(white_knight, Square::C4);
    /// assert_eq!(board.to_fen(), "8/8/8/8/2N5/8/8/8");
    /// ```
    #[inline(always)]
    pub fn place(&mut self, piece: Piece, square: Square) {
        let (color, kind) = piece.parts();
        self.pieces[color][kind].set(square);
        self.colors[color].set(square);
        self.mailbox[square] = Some(piece);

        if kind == PieceKind::King {
            self.king_squares[color] = Some(square);
        }
    }

    /// Takes the [`Piece`] from a given [`Square`], if there is one present.
    ///
    /// # Example
    /// ```
    /// # use rookery::{Board, Piece, PieceKind, Color, Square};
    /// let mut board = Board::from_fen("k7/8/8/8/2N5/8/8/7K").unwrap();
    /// let white_knight = Piece::new(Color::White, PieceKind::Knight);
    /// let taken = board.take(Square::C4);
    /// assert_eq!(board.to_fen(), "k7/8/8/8/8/8/8/7K");
    /// assert_eq!(taken, Some(white_knight));
    /// ```
    #[inline(always)]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        // Take the piece from the mailbox, exiting early if there is none
        let piece = self.mailbox[square].take()?;
        let (color, kind) = piece.parts();

        self.pieces[color][kind].clear(square);
        self.colors[color].clear(square);

        if kind == PieceKind::King {
            self.king_squares[color] = None;
        }

        Some(piece)
    }

    /// Fetches the [`Color`] of the piece at the provided [`Square`], if there is one.
    ///
    /// # Example
    /// ```
    /// # use rookery::{Board, Color, Square};
    /// let board = Board::default();
    /// assert_eq!(board.color_at(Square::A2), Some(Color::White));
    /// assert_eq!(board.color_at(Square::E8), Some(Color::Black));
    /// assert!(board.color_at(Square::E4).is_none());
    /// ```
    #[inline(always)]
    pub fn color_at(&self, square: Square) -> Option<Color> {
        self.mailbox[square].map(|piece| piece.color())
    }

    /// Fetches the [`Piece`] at the provided [`Square`], if there is one.
    ///
    /// # Example
    /// ```
    /// # use rookery::{Board, PieceKind, Color, Square};
    /// let board = Board::default();
    /// assert_eq!(board.piece_at(Square::A2).unwrap().kind(), PieceKind::Pawn);
    /// assert_eq!(board.piece_at(Square::A2).unwrap().color(), Color::White);
    /// assert!(board.piece_at(Square::E4).is_none());
    /// ```
    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()]
    }

    /// Fetches the [`Bitboard`] of every `color` piece of kind `kind`.
    ///
    /// # Example
    /// ```
    /// # use rookery::{Board, PieceKind, Color, Bitboard};
    /// let board = Board::default();
    /// assert_eq!(board.pieces(Color::White, PieceKind::Pawn), Bitboard::RANK_2);
    /// ```
    #[inline(always)]
    pub const fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[color.index()][kind.index()]
    }

    /// Fetches the [`Bitboard`] of every piece of `color`.
    ///
    /// # Example
    /// ```
    /// # use rookery::{Board, Color, Bitboard};
    /// let board = Board::default();
    /// let white_pieces = board.color(Color::White);
    /// assert_eq!(white_pieces, Bitboard::RANK_1 | Bitboard::RANK_2);
    /// ```
    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// Fetches a [`Bitboard`] of all occupied squares on the board.
    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        self.color(Color::White).or(self.color(Color::Black))
    }

    /// Fetches a [`Bitboard`] of all non-occupied squares on the board.
    #[inline(always)]
    pub const fn empty(&self) -> Bitboard {
        self.occupied().not()
    }

    /// Fetches a [`Bitboard`] containing the locations of all orthogonal sliding pieces (Rook, Queen).
    #[inline(always)]
    pub const fn orthogonal_sliders(&self, color: Color) -> Bitboard {
        self.pieces(color, PieceKind::Rook)
            .or(self.pieces(color, PieceKind::Queen))
    }

    /// Fetches a [`Bitboard`] containing the locations of all diagonal sliding pieces (Bishop, Queen).
    #[inline(always)]
    pub const fn diagonal_sliders(&self, color: Color) -> Bitboard {
        self.pieces(color, PieceKind::Bishop)
            .or(self.pieces(color, PieceKind::Queen))
    }

    /// Fetches the [`Bitboard`] for the King of the provided color.
    #[inline(always)]
    pub const fn king(&self, color: Color) -> Bitboard {
        self.pieces(color, PieceKind::King)
    }

    /// Fetches the [`Square`] of the King of the provided color, if it has one.
    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Option<Square> {
        self.king_squares[color.index()]
    }

    /// Fetches the [`Bitboard`] for the Pawns of the provided color.
    #[inline(always)]
    pub const fn pawns(&self, color: Color) -> Bitboard {
        self.pieces(color, PieceKind::Pawn)
    }

    /// Fetches the [`Bitboard`] for the Knights of the provided color.
    #[inline(always)]
    pub const fn knights(&self, color: Color) -> Bitboard {
        self.pieces(color, PieceKind::Knight)
    }

    /// Get all squares that are either empty or occupied by the enemy
    ///
    /// # Example
    /// ```
    /// # use rookery::{Bitboard, Board, Color};
    /// let board = Board::default();
    /// let not_white = board.enemy_or_empty(Color::White);
    /// assert_eq!(not_white.to_hex_string(), "0xFFFFFFFFFFFF0000");
    /// ```
    #[inline(always)]
    pub const fn enemy_or_empty(&self, color: Color) -> Bitboard {
        self.color(color).not()
    }

    /// Creates a [`BoardIter`] to iterate over all occupied [`Square`]s in this [`Board`].
    #[inline(always)]
    pub const fn iter(&self) -> BoardIter<'_> {
        BoardIter {
            board: self,
            occupancy: self.occupied(),
        }
    }

    /// Generates the placement field of a [FEN](https://www.chess.com/terms/fen-chess) string of this [`Board`].
    pub fn to_fen(&self) -> String {
        let mut placements: [String; 8] = Default::default();

        for rank in Rank::iter() {
            let mut empty_spaces = 0;
            for file in File::iter() {
                if let Some(piece) = self.piece_at(file * rank) {
                    if empty_spaces != 0 {
                        placements[rank.index()] += &empty_spaces.to_string();
                        empty_spaces = 0;
                    }
                    placements[rank.index()].push(piece.char());
                } else {
                    empty_spaces += 1;
                }
            }

            if empty_spaces != 0 {
                placements[rank.index()] += &empty_spaces.to_string();
            }
        }
        placements.reverse();

        placements.join("/")
    }

    /// Checks the bitboards, color unions, mailbox, and king squares against each other.
    pub fn is_consistent(&self) -> bool {
        let mut seen = Bitboard::EMPTY_BOARD;

        for color in Color::all() {
            let mut union = Bitboard::EMPTY_BOARD;

            for kind in PieceKind::all() {
                let bb = self.pieces(color, kind);

                // No square may hold two pieces
                if (seen & bb).is_nonempty() {
                    return false;
                }
                seen |= bb;
                union |= bb;

                if bb.iter().any(|sq| self.piece_at(sq) != Some(Piece::new(color, kind))) {
                    return false;
                }
            }

            if union != self.color(color) || self.king(color).lsb() != self.king_square(color) {
                return false;
            }
        }

        // Every occupied mailbox entry must be backed by a bitboard
        Square::iter().all(|sq| self.has(sq) == seen.contains(sq))
    }
}

impl Default for Board {
    /// The piece layout of the standard starting position.
    fn default() -> Self {
        let mut board = Self::new();

        for color in Color::all() {
            for (file, kind) in File::iter().zip(BACK_RANK) {
                board.place(Piece::new(color, kind), file * Rank::first(color));
                board.place(
                    Piece::new(color, PieceKind::Pawn),
                    file * Rank::second(color),
                );
            }
        }

        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}| ")?;

            for file in File::iter() {
                let occupant = self.piece_at(file * rank).map_or('.', |piece| piece.char());
                write!(f, "{occupant} ")?;
            }

            writeln!(f)?;
        }
        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "--")?;
        }
        write!(f, "\n   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl Index<Square> for Board {
    type Output = Option<Piece>;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self.mailbox[index]
    }
}

impl<'a> IntoIterator for &'a Board {
    type IntoIter = BoardIter<'a>;
    type Item = <BoardIter<'a> as Iterator>::Item;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over a set of squares on a [`Board`].
///
/// Calls to [`Iterator::next`] will yield a tuple of a [`Square`] and a [`Piece`].
pub struct BoardIter<'a> {
    /// The board to retrieve pieces from.
    board: &'a Board,

    /// The list of squares to iterate over.
    occupancy: Bitboard,
}

impl Iterator for BoardIter<'_> {
    type Item = (Square, Piece);

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        // Occupied squares always have a mailbox entry; skip any that don't rather than panic
        loop {
            let square = self.occupancy.pop_lsb()?;
            if let Some(piece) = self.board.piece_at(square) {
                return Some((square, piece));
            }
        }
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.occupancy.population() as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{legal_moves, FEN_KIWIPETE, FEN_POSITION_4};

    fn play_uci(pos: &mut Position, uci: &str) {
        let mv = Move::from_uci(pos, uci).unwrap();
        let _ = pos.make_move(mv);
        assert!(pos.is_consistent(), "{pos:?}");
    }

    #[test]
    fn test_default_is_startpos() {
        let pos = Position::default();
        assert_eq!(pos.to_fen(), crate::FEN_STARTPOS);
        assert_eq!(pos, Position::from_fen(crate::FEN_STARTPOS).unwrap());
        assert!(pos.is_consistent());
        assert_eq!(pos.king_square(Color::White), Some(Square::E1));
        assert_eq!(pos.last_move(), Move::NULL);
    }

    #[test]
    fn test_fen_rejects_garbage() {
        assert!(Position::from_fen("").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/7x w - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8p w - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/7 w - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/K6K w - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 x - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - z9 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - x 1").is_err());
    }

    #[test]
    fn test_kingless_board_is_accepted() {
        let pos = Position::from_fen("8/8/8/8/8/8/8/Rr6 w - - 0 1").unwrap();
        assert_eq!(pos.king_square(Color::White), None);
        assert_eq!(pos.king_square(Color::Black), None);
        assert!(pos.is_consistent());
    }

    #[test]
    fn test_make_unmake_round_trip() {
        let fens = [
            crate::FEN_STARTPOS,
            FEN_KIWIPETE,
            FEN_POSITION_4,
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1",
        ];

        for fen in fens {
            let mut pos = Position::from_fen(fen).unwrap();
            let original = pos;

            for mv in legal_moves(&pos) {
                let undo = pos.make_move(mv);
                assert!(pos.is_consistent(), "{mv} broke consistency in {fen}");
                assert_ne!(pos.key(), original.key());
                pos.unmake_move(undo);
                assert_eq!(pos, original, "{mv} was not restored in {fen}");
            }
        }
    }

    #[test]
    fn test_guard_restores_on_early_exit() {
        fn first_capture(pos: &mut Position) -> Option<Move> {
            for mv in legal_moves(pos) {
                let child = pos.play(mv);
                if child.last_move() == mv && pos_has_fewer_pieces(&child) {
                    return Some(mv);
                }
            }
            None
        }

        fn pos_has_fewer_pieces(pos: &Position) -> bool {
            pos.occupied().population() < 32
        }

        let mut pos =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
                .unwrap();
        let original = pos;
        assert_eq!(
            first_capture(&mut pos),
            Some(Move::new(Square::E4, Square::D5, PieceKind::Pawn))
        );
        assert_eq!(pos, original);
    }

    #[test]
    fn test_en_passant_capture_and_restore() {
        let mut pos =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let original = pos;

        let mv = Move::from_uci(&pos, "e5f6").unwrap();
        let undo = pos.make_move(mv);
        assert_eq!(
            undo.captured(),
            Some(Piece::new(Color::Black, PieceKind::Pawn))
        );
        assert!(!pos.has(Square::F5));
        assert_eq!(pos.halfmove(), 0);
        assert!(pos.is_consistent());

        pos.unmake_move(undo);
        assert_eq!(pos, original);
    }

    #[test]
    fn test_zobrist_key_side_to_move() {
        let fen = "r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R w KQkq e6 0 1";
        let pos = Position::from_fen(fen).unwrap();

        let fen_black = "r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R b KQkq - 0 1";
        let pos_black = Position::from_fen(fen_black).unwrap();

        assert_ne!(pos.key(), pos_black.key());
    }

    #[test]
    fn test_zobrist_key_ep() {
        let fen = "r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R w KQkq e6 0 1";
        let pos = Position::from_fen(fen).unwrap();

        let fen_without_ep = "r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        let pos_without_ep = Position::from_fen(fen_without_ep).unwrap();

        assert_ne!(pos.key(), pos_without_ep.key());
    }

    #[test]
    fn test_zobrist_key_castling() {
        let fen = "r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R w KQkq e6 0 1";
        let pos = Position::from_fen(fen).unwrap();

        let fen_without_k = "r3k2r/pppp1ppp/8/4p3/8/8/PPPPPPPP/R3K2R w KQq - 0 1";
        let pos_without_k = Position::from_fen(fen_without_k).unwrap();

        assert_ne!(pos.key(), pos_without_k.key());
    }

    #[test]
    fn test_zobrist_key_updates_on_quiet_moves() {
        let mut pos = Position::default();
        let original_key = pos.key();
        assert_ne!(original_key.inner(), 0);

        play_uci(&mut pos, "b1a3");
        assert_ne!(pos.key(), original_key);
        play_uci(&mut pos, "b8a6");
        assert_ne!(pos.key(), original_key);
        play_uci(&mut pos, "a3b1");
        assert_ne!(pos.key(), original_key);
        play_uci(&mut pos, "a6b8");
        assert_eq!(pos.key(), original_key);
    }

    #[test]
    fn test_incremental_key_matches_recomputed_over_a_game() {
        let mut pos = Position::default();
        for uci in [
            "e2e4", "d7d5", "e4d5", "c7c5", "d5c6", "g8f6", "c6b7", "e7e5", "b7a8q", "f8c5",
            "g1f3", "e8g8", "f1c4", "b8c6", "e1g1",
        ] {
            play_uci(&mut pos, uci);
        }
        assert_eq!(pos.castling_rights_uci(), "-");
        assert_eq!(pos.key(), ZobristKey::new(&pos));
    }

    // There are four cases in which castling rights can be lost:
    //  1. The King was moved
    //  2. A Rook was moved
    //  3. A Rook was captured
    //  4. Castling was performed

    #[test]
    fn test_castling_rights_update_on_king_move() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mut pos = Position::from_fen(fen).unwrap();
        let original_key = pos.key();

        // Moving the White King should remove White's castling rights
        play_uci(&mut pos, "e1d1");
        assert_ne!(pos.key(), original_key);
        assert_eq!(pos.castling_rights_uci(), "kq");

        // Same for Black
        play_uci(&mut pos, "e8f8");
        assert_eq!(pos.castling_rights_uci(), "-");

        // Moving the Kings back should NOT restore castling rights
        play_uci(&mut pos, "d1e1");
        play_uci(&mut pos, "f8e8");
        assert_ne!(pos.key(), original_key);
        assert_eq!(pos.castling_rights_uci(), "-");
    }

    #[test]
    fn test_castling_rights_update_on_rook_move() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mut pos = Position::from_fen(fen).unwrap();
        let original_key = pos.key();

        // Moving a Rook should disable castling for that side
        play_uci(&mut pos, "a1b1");
        assert_eq!(pos.castling_rights_uci(), "Kkq");

        // Same for Black
        play_uci(&mut pos, "a8b8");
        assert_eq!(pos.castling_rights_uci(), "Kk");

        // Moving the Rooks back should NOT re-enable castling for that side
        play_uci(&mut pos, "b1a1");
        play_uci(&mut pos, "b8a8");
        assert_ne!(pos.key(), original_key);
        assert_eq!(pos.castling_rights_uci(), "Kk");
    }

    #[test]
    fn test_castling_rights_update_on_rook_captured() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mut pos = Position::from_fen(fen).unwrap();

        // White's A1 Rook takes on A8, costing both sides their queenside rights
        play_uci(&mut pos, "a1a8");
        assert_eq!(pos.castling_rights_uci(), "Kk");

        // Black's H8 Rook takes on H1
        play_uci(&mut pos, "h8h1");
        assert_eq!(pos.castling_rights_uci(), "-");
    }

    #[test]
    fn test_castling_moves_the_rook() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        let mut pos = Position::from_fen(fen).unwrap();
        let original = pos;

        let short = Move::from_uci(&pos, "e1g1").unwrap();
        let undo = pos.make_move(short);
        assert_eq!(pos.to_fen(), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1");

        play_uci(&mut pos, "e8c8");
        assert_eq!(pos.to_fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2");

        let mut pos = original;
        let _ = pos.make_move(short);
        assert!(pos.is_consistent());
        pos.unmake_move(undo);
        assert_eq!(pos, original);
    }

    #[test]
    fn test_castling_rights_update_on_promote_to_rook() {
        // Black captures White's A1 Rook, White promotes a Pawn to a Rook and recaptures on A1.
        // Queenside castling rights for White must NOT come back.
        let fen = "4k2r/P7/8/8/r7/8/8/RB2K2R b KQk - 0 1";
        let mut pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.castling_rights_uci(), "KQk");

        play_uci(&mut pos, "a4a1");
        assert_eq!(pos.castling_rights_uci(), "Kk");

        play_uci(&mut pos, "a7a8r");
        assert_eq!(pos.castling_rights_uci(), "Kk");

        // Black moves its King out of check
        play_uci(&mut pos, "e8e7");
        assert_eq!(pos.castling_rights_uci(), "K");

        play_uci(&mut pos, "a8a1");
        assert_eq!(pos.castling_rights_uci(), "K");
    }

    #[test]
    fn test_promotion_round_trip() {
        let fen = "1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        let mut pos = Position::from_fen(fen).unwrap();
        let original = pos;

        let mv = Move::from_uci(&pos, "a7b8n").unwrap();
        let undo = pos.make_move(mv);
        assert_eq!(pos.to_fen(), "1N2k3/8/8/8/8/8/8/4K3 b - - 0 1");
        assert_eq!(pos.last_move(), mv);

        pos.unmake_move(undo);
        assert_eq!(pos, original);
    }

    #[test]
    fn test_nullmove_clears_ep() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        let pos = Position::from_fen(fen).unwrap().with_nullmove();
        assert_eq!(pos.ep_square(), None);
        assert_eq!(pos.side_to_move(), Color::Black);
        assert!(pos.is_consistent());
    }
}
