/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use anyhow::Result;

use super::{
    legal_moves, Line, Move, MoveError, Position, SearchError, Searcher, TTable, Undo, MAX_DEPTH,
};

/// Tunable parameters of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Size of the transposition table, in megabytes.
    pub hash_mb: usize,

    /// Requested depths are clamped to this.
    pub max_depth: u8,
}

impl Default for EngineConfig {
    /// A 16 MB table, searching as deep as a [`Line`] can hold.
    #[inline(always)]
    fn default() -> Self {
        Self {
            hash_mb: 16,
            max_depth: MAX_DEPTH,
        }
    }
}

/// The result of [`Engine::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found during the search.
    ///
    /// `None` only if the side to move has no legal moves.
    pub bestmove: Option<Move>,

    /// Evaluation of the searched position, from the side to move's perspective.
    pub score: i32,

    /// The depth of the search that produced this result.
    pub depth: u8,

    /// Expected line of play, starting with `bestmove`.
    pub pv: Line,
}

/// Owns the transposition table and runs searches against it.
///
/// The table persists between searches until [`Engine::clear`] is called.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    ttable: TTable,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            ttable: TTable::new(config.hash_mb),
            config,
        }
    }

    #[inline(always)]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline(always)]
    pub const fn ttable(&self) -> &TTable {
        &self.ttable
    }

    /// Searches `position` by iterative deepening to `depth` plies.
    ///
    /// The position is restored before returning, whether or not the search succeeds.
    ///
    /// # Example
    /// ```
    /// # use rookery::*;
    /// let mut engine = Engine::new(EngineConfig { hash_mb: 1, ..Default::default() });
    /// let mut position = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    /// let result = engine.search(&mut position, 2).unwrap();
    /// assert_eq!(result.bestmove.unwrap().to_string(), "a1a8");
    /// assert_eq!(result.score, MATE);
    /// ```
    pub fn search(&mut self, position: &mut Position, depth: u8) -> Result<SearchResult, SearchError> {
        let depth = depth.min(self.config.max_depth).min(MAX_DEPTH);
        self.ttable.new_search();

        let mut searcher = Searcher::new(&mut self.ttable);
        let node = searcher
            .iterative_deepening(position, depth)
            .inspect_err(|err| tracing::error!(%err, "search aborted"))?;
        let nodes = searcher.nodes();
        self.ttable.log_stats();

        // When every move loses, none raises alpha; any legal move is as good as another
        let bestmove = match (depth, node.bestmove) {
            (0, _) | (_, None) => legal_moves(position).first().copied(),
            (_, bestmove) => bestmove,
        };

        Ok(SearchResult {
            nodes,
            bestmove,
            score: node.score,
            depth,
            pv: node.line,
        })
    }

    /// Empties the transposition table, as between games.
    pub fn clear(&mut self) {
        self.ttable.clear();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Creates a [`Position`] with the standard starting layout.
#[inline(always)]
pub fn new_position() -> Position {
    Position::default()
}

/// Parses a FEN string into a [`Position`].
///
/// # Example
/// ```
/// # use rookery::*;
/// assert_eq!(position_from_description(FEN_STARTPOS).unwrap(), new_position());
/// assert!(position_from_description("not a position").is_err());
/// ```
pub fn position_from_description(fen: &str) -> Result<Position> {
    Position::from_str(fen)
}

/// Plays `mv` on `position` after checking that it belongs to the side to move and is legal.
///
/// On error, `position` is unchanged.
///
/// # Example
/// ```
/// # use rookery::*;
/// let mut position = new_position();
/// let e4 = Move::from_uci(&position, "e2e4").unwrap();
/// let undo = apply_move(&mut position, e4).unwrap();
/// assert_eq!(position.side_to_move(), Color::Black);
///
/// position.unmake_move(undo);
/// assert_eq!(position, new_position());
/// ```
pub fn apply_move(position: &mut Position, mv: Move) -> Result<Undo, MoveError> {
    let color = position.side_to_move();
    match position.board().piece_at(mv.from()) {
        Some(piece) if piece.color() == color && piece.kind() == mv.piece() => {}
        _ => {
            return Err(MoveError::NoPieceAt {
                square: mv.from(),
                color,
            })
        }
    }

    if !legal_moves(position).contains(&mv) {
        return Err(MoveError::Illegal(mv));
    }

    Ok(position.make_move(mv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, PieceKind, Square, MATE};

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            hash_mb: 1,
            ..Default::default()
        })
    }

    #[test]
    fn test_search_finds_back_rank_mate() {
        let mut engine = engine();
        let mut pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let result = engine.search(&mut pos, 2).unwrap();

        assert_eq!(
            result.bestmove,
            Some(Move::new(Square::A1, Square::A8, PieceKind::Rook))
        );
        assert_eq!(result.score, MATE);
        assert_eq!(result.depth, 2);
        assert!(result.nodes > 0);
    }

    #[test]
    fn test_search_checkmated_position() {
        let mut engine = engine();
        let fen = "r2qk2r/pb4p1/1n2PbB1/2B5/p1p5/2P5/5PPP/RN2R1K1 b - - 1 0";
        let mut pos = Position::from_fen(fen).unwrap();

        for depth in [0, 1] {
            let result = engine.search(&mut pos, depth).unwrap();
            assert_eq!(result.score, -MATE);
            assert_eq!(result.bestmove, None);
        }
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_depth_is_clamped() {
        let mut engine = Engine::new(EngineConfig {
            hash_mb: 1,
            max_depth: 1,
        });
        let mut pos = new_position();
        let result = engine.search(&mut pos, 9).unwrap();
        assert_eq!(result.depth, 1);
        assert_eq!(result.pv.len(), 1);
        assert_eq!(pos, new_position());
    }

    #[test]
    fn test_clear_empties_table() {
        let mut engine = engine();
        let mut pos = new_position();
        engine.search(&mut pos, 2).unwrap();
        assert!(!engine.ttable().is_empty());

        engine.clear();
        assert!(engine.ttable().is_empty());
    }

    #[test]
    fn test_apply_move_errors() {
        let mut pos = new_position();

        // Empty origin
        let ghost = Move::new(Square::E4, Square::E5, PieceKind::Pawn);
        assert_eq!(
            apply_move(&mut pos, ghost),
            Err(MoveError::NoPieceAt {
                square: Square::E4,
                color: Color::White
            })
        );

        // Wrong color
        let black = Move::new(Square::E7, Square::E5, PieceKind::Pawn);
        assert!(matches!(
            apply_move(&mut pos, black),
            Err(MoveError::NoPieceAt { .. })
        ));

        // Right piece, impossible move
        let jump = Move::new(Square::E2, Square::E5, PieceKind::Pawn);
        assert_eq!(apply_move(&mut pos, jump), Err(MoveError::Illegal(jump)));

        assert_eq!(pos, new_position());
    }

    #[test]
    fn test_apply_move_rejects_self_check() {
        let mut pos = Position::from_fen("4k3/8/8/8/1b6/8/3N4/4K3 w - - 0 1").unwrap();
        let pinned = Move::from_uci(&pos, "d2f3").unwrap();
        assert_eq!(apply_move(&mut pos, pinned), Err(MoveError::Illegal(pinned)));

        let king = Move::from_uci(&pos, "e1f2").unwrap();
        assert!(apply_move(&mut pos, king).is_ok());
        assert_eq!(pos.side_to_move(), Color::Black);
    }

    #[test]
    fn test_position_from_description() {
        let pos = position_from_description(crate::FEN_KIWIPETE).unwrap();
        assert_eq!(pos.to_fen(), crate::FEN_KIWIPETE);
        assert!(position_from_description("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x").is_err());
    }
}
