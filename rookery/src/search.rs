/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use arrayvec::ArrayVec;

use super::{
    evaluate, generate_all_moves, left_king_in_check, Move, NodeKind, PieceKind, Position,
    SearchError, TTable, TTableEntry, MATE,
};

/// Deepest search supported, in plies.
pub const MAX_DEPTH: u8 = 64;

/// Margin added to a victim's value when deciding whether a capture is worth searching.
const DELTA_MARGIN: i32 = 20;

/// A sequence of moves, starting from the searched position.
pub type Line = ArrayVec<Move, { MAX_DEPTH as usize }>;

/// The principal variation found by the previous iterative deepening pass.
///
/// Each ply's move is promoted to the front of that ply's move list exactly once per pass.
#[derive(Clone, PartialEq, Eq)]
pub struct PrincipalVariation {
    line: Line,
    consumed: [bool; MAX_DEPTH as usize],
}

impl PrincipalVariation {
    pub fn new(line: Line) -> Self {
        Self {
            line,
            consumed: [false; MAX_DEPTH as usize],
        }
    }

    /// Marks every move as not yet tried, ready for the next pass.
    pub fn reset(&mut self) {
        self.consumed = [false; MAX_DEPTH as usize];
    }

    /// Takes the move for `ply`, if the line is long enough and it hasn't been taken already.
    pub fn take(&mut self, ply: usize) -> Option<Move> {
        let mv = self.line.get(ply).copied()?;
        if self.consumed[ply] {
            return None;
        }

        self.consumed[ply] = true;
        Some(mv)
    }

    /// Marks every move past `ply` as taken.
    ///
    /// Once the principal move at `ply` has been handled, no other node can be on the line.
    fn retire_after(&mut self, ply: usize) {
        for consumed in self.consumed.iter_mut().skip(ply + 1) {
            *consumed = true;
        }
    }

    #[inline(always)]
    pub fn line(&self) -> &[Move] {
        &self.line
    }
}

impl Default for PrincipalVariation {
    fn default() -> Self {
        Self::new(Line::new())
    }
}

impl fmt::Display for PrincipalVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_line(&self.line))
    }
}

impl fmt::Debug for PrincipalVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Formats `line` as space-separated UCI moves.
pub fn format_line(line: &[Move]) -> String {
    line.iter()
        .map(Move::to_uci)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The outcome of searching a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Score from the perspective of the side to move at this node.
    pub score: i32,
    /// The move that produced `score`, if any move raised alpha.
    pub bestmove: Option<Move>,
    /// The expected continuation, starting with `bestmove`.
    pub line: Line,
}

/// What a child's transposition table entry lets its parent skip.
enum Shortcut {
    /// The child's exact score (already negated) and its best reply.
    Exact(i32, Move),
    /// The child's lower bound proves this move cannot raise alpha.
    Refuted,
    /// Nothing usable; search the child.
    Search,
}

/// A depth-first negamax searcher.
///
/// Borrows the transposition table for the duration of one search.
pub struct Searcher<'a> {
    ttable: &'a mut TTable,
    nodes: u64,
}

impl<'a> Searcher<'a> {
    pub fn new(ttable: &'a mut TTable) -> Self {
        Self { ttable, nodes: 0 }
    }

    /// Nodes visited so far, quiescence nodes included.
    #[inline(always)]
    pub const fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Runs [`Searcher::negamax`] at depths `1..=max_depth`, each pass seeded with the previous
    /// pass's principal variation, and returns the final pass's result.
    ///
    /// A `max_depth` of 0 runs a single depth-0 search.
    pub fn iterative_deepening(
        &mut self,
        position: &mut Position,
        max_depth: u8,
    ) -> Result<Node, SearchError> {
        let mut pv = PrincipalVariation::default();
        let mut result = self.negamax(-MATE, MATE, 0, position, 0, &mut pv)?;

        for depth in 1..=max_depth.min(MAX_DEPTH) {
            pv.reset();
            let node = self.negamax(-MATE, MATE, depth, position, depth, &mut pv)?;

            tracing::debug!(
                depth,
                score = node.score,
                nodes = self.nodes,
                pv = %format_line(&node.line),
                "completed pass"
            );

            pv = PrincipalVariation::new(node.line.clone());
            result = node;
        }

        Ok(result)
    }

    /// Fail-hard alpha-beta search of `position`, `depth` plies deep.
    ///
    /// `root_depth` is the depth the pass started at, so `root_depth - depth` is the current ply.
    /// The position is restored before returning, including when an error is returned.
    pub fn negamax(
        &mut self,
        mut alpha: i32,
        beta: i32,
        depth: u8,
        position: &mut Position,
        root_depth: u8,
        pv: &mut PrincipalVariation,
    ) -> Result<Node, SearchError> {
        self.nodes += 1;

        if depth == 0 {
            let last_move = position.last_move();
            return Ok(Node {
                score: self.quiescence(alpha, beta, position),
                bestmove: (!last_move.is_null()).then_some(last_move),
                line: Line::new(),
            });
        }

        let mut moves = generate_all_moves(position);
        if moves.is_empty() {
            return Ok(Node {
                score: -MATE,
                bestmove: None,
                line: Line::new(),
            });
        }

        let ply = usize::from(root_depth.saturating_sub(depth));

        let pv_move = pv.take(ply);
        if let Some(mv) = pv_move {
            let index = moves
                .iter()
                .position(|candidate| *candidate == mv)
                .ok_or(SearchError::MissingPvMove { mv, ply })?;
            moves[..=index].rotate_right(1);
        }

        let mut bestmove = None;
        let mut line = Line::new();

        for (i, mv) in moves.into_iter().enumerate() {
            if mv.is_null() {
                return Err(SearchError::NullMove { ply });
            }

            let outcome = self.search_move(mv, alpha, beta, depth, position, root_depth, pv);

            if i == 0 && pv_move.is_some() {
                pv.retire_after(ply);
            }

            let Some((score, continuation)) = outcome? else {
                continue;
            };

            if score >= beta {
                self.store(position, beta, Some(mv), NodeKind::Cut, depth);
                let mut line = Line::new();
                line.push(mv);
                return Ok(Node {
                    score: beta,
                    bestmove: Some(mv),
                    line,
                });
            }

            if score > alpha {
                alpha = score;
                bestmove = Some(mv);

                line.clear();
                line.push(mv);
                line.extend(continuation.into_iter().take(MAX_DEPTH as usize - 1));
            }
        }

        let kind = if bestmove.is_some() {
            NodeKind::Pv
        } else {
            NodeKind::All
        };
        self.store(position, alpha, bestmove, kind, depth);

        Ok(Node {
            score: alpha,
            bestmove,
            line,
        })
    }

    /// Plays `mv` and scores it from the perspective of the side that played it.
    ///
    /// Returns `None` if the move is illegal or was refuted by the transposition table.
    #[allow(clippy::too_many_arguments)]
    fn search_move(
        &mut self,
        mv: Move,
        alpha: i32,
        beta: i32,
        depth: u8,
        position: &mut Position,
        root_depth: u8,
        pv: &mut PrincipalVariation,
    ) -> Result<Option<(i32, Line)>, SearchError> {
        let mut child = position.play(mv);

        if mv.piece() != PieceKind::King && left_king_in_check(&child) {
            return Ok(None);
        }

        match self.probe(&child, alpha, depth - 1)? {
            Shortcut::Exact(score, reply) => {
                let mut continuation = Line::new();
                continuation.push(reply);
                Ok(Some((score, continuation)))
            }
            Shortcut::Refuted => Ok(None),
            Shortcut::Search => {
                let node = self.negamax(-beta, -alpha, depth - 1, &mut child, root_depth, pv)?;
                Ok(Some((-node.score, node.line)))
            }
        }
    }

    /// Checks the transposition table for `child`, which must have been searched `depth` deep.
    fn probe(&mut self, child: &Position, alpha: i32, depth: u8) -> Result<Shortcut, SearchError> {
        let key = child.key();
        let Some(entry) = self.ttable.lookup(key).copied() else {
            return Ok(Shortcut::Search);
        };

        if !entry.is_usable_at(depth) {
            return Ok(Shortcut::Search);
        }

        let shortcut = match entry.kind {
            NodeKind::Pv => match entry.bestmove {
                Some(reply) if !reply.is_null() => Shortcut::Exact(-entry.score, reply),
                _ => return Err(SearchError::CorruptEntry { key: key.inner() }),
            },
            // The child scores at least `entry.score`, so this move scores at most its negation
            NodeKind::Cut if -entry.score <= alpha => Shortcut::Refuted,
            NodeKind::Cut | NodeKind::All => Shortcut::Search,
        };

        if !matches!(shortcut, Shortcut::Search) {
            tracing::trace!(%key, kind = ?entry.kind, score = entry.score, "transposition table shortcut");
        }

        Ok(shortcut)
    }

    fn store(
        &mut self,
        position: &Position,
        score: i32,
        bestmove: Option<Move>,
        kind: NodeKind,
        depth: u8,
    ) {
        let age = self.ttable.age();
        self.ttable.store(TTableEntry {
            key: position.key(),
            score,
            bestmove,
            kind,
            age,
            depth,
        });
    }

    /// Searches captures until the position is quiet, returning a score within `alpha..=beta`.
    pub fn quiescence(&mut self, mut alpha: i32, beta: i32, position: &mut Position) -> i32 {
        self.nodes += 1;

        let stand_pat = evaluate(position);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        // Not even winning a Queen would help
        if alpha > stand_pat + PieceKind::Queen.value() {
            return alpha;
        }

        let mut captures = generate_all_moves(position);
        let enemies = position
            .board()
            .color(position.side_to_move().opponent());

        let mut i = 0;
        while i < captures.len() {
            if enemies.contains(captures[i].to()) {
                i += 1;
            } else {
                captures.swap_remove(i);
            }
        }

        for mv in captures {
            let victim = position
                .board()
                .piece_at(mv.to())
                .map_or(0, |piece| piece.kind().value());

            if alpha > stand_pat + victim + DELTA_MARGIN {
                continue;
            }

            let mut child = position.play(mv);
            if mv.piece() != PieceKind::King && left_king_in_check(&child) {
                continue;
            }

            let score = -self.quiescence(-beta, -alpha, &mut child);
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Square;

    const FEN_MATED: &str = "r2qk2r/pb4p1/1n2PbB1/2B5/p1p5/2P5/5PPP/RN2R1K1 b - - 1 0";

    /// White's Queen can take Black's undefended Queen.
    const FEN_HANGING_QUEEN: &str = "4k3/8/8/3q4/8/8/3Q4/4K3 w - - 0 1";

    fn search_direct(fen: &str, depth: u8) -> Node {
        let mut pos = Position::from_fen(fen).unwrap();
        let mut tt = TTable::with_capacity(1 << 16);
        let mut pv = PrincipalVariation::default();
        Searcher::new(&mut tt)
            .negamax(-MATE, MATE, depth, &mut pos, depth, &mut pv)
            .unwrap()
    }

    fn search_iterative(fen: &str, depth: u8) -> Node {
        let mut pos = Position::from_fen(fen).unwrap();
        let mut tt = TTable::with_capacity(1 << 16);
        Searcher::new(&mut tt)
            .iterative_deepening(&mut pos, depth)
            .unwrap()
    }

    #[test]
    fn test_checkmate_at_depth_zero_and_one() {
        assert_eq!(search_direct(FEN_MATED, 0).score, -MATE);
        assert_eq!(search_direct(FEN_MATED, 1).score, -MATE);
        assert_eq!(search_iterative(FEN_MATED, 1).score, -MATE);
        assert_eq!(search_direct(FEN_MATED, 1).bestmove, None);
    }

    #[test]
    fn test_quiescence_trades_down() {
        // Either Rook capture leaves Black in check, 500 material and 22 moves behind
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let original = pos;
        let mut tt = TTable::with_capacity(1);
        let score = Searcher::new(&mut tt).quiescence(-MATE, MATE, &mut pos);
        assert_eq!(score, 720);
        assert_eq!(pos, original);
    }

    #[test]
    fn test_quiescence_stands_pat_in_quiet_positions() {
        let mut pos = Position::default();
        let mut tt = TTable::with_capacity(1);
        assert_eq!(Searcher::new(&mut tt).quiescence(-MATE, MATE, &mut pos), 0);
    }

    #[test]
    fn test_finds_hanging_queen() {
        let node = search_iterative(FEN_HANGING_QUEEN, 2);
        let capture = Move::new(Square::D2, Square::D5, PieceKind::Queen);
        assert_eq!(node.bestmove, Some(capture));
        assert_eq!(node.line.first(), Some(&capture));
        assert!(node.score > 800);
    }

    #[test]
    fn test_iterative_deepening_matches_direct_search() {
        for depth in 1..=3 {
            let direct = search_direct(FEN_HANGING_QUEEN, depth);
            let iterative = search_iterative(FEN_HANGING_QUEEN, depth);
            assert_eq!(
                (direct.score, direct.bestmove),
                (iterative.score, iterative.bestmove),
                "depth {depth}"
            );
        }
    }

    #[test]
    fn test_search_restores_position() {
        let mut pos = Position::from_fen(crate::FEN_KIWIPETE).unwrap();
        let original = pos;
        let mut tt = TTable::with_capacity(1 << 12);
        let result = Searcher::new(&mut tt).iterative_deepening(&mut pos, 2);
        assert!(result.is_ok());
        assert_eq!(pos, original);
    }

    #[test]
    fn test_missing_pv_move_is_an_error() {
        let mut pos = Position::default();
        let original = pos;
        let mut bogus = Line::new();
        bogus.push(Move::new(Square::E2, Square::E5, PieceKind::Pawn));
        let mut pv = PrincipalVariation::new(bogus);

        let mut tt = TTable::with_capacity(1);
        let result = Searcher::new(&mut tt).negamax(-MATE, MATE, 1, &mut pos, 1, &mut pv);
        assert_eq!(
            result,
            Err(SearchError::MissingPvMove {
                mv: Move::new(Square::E2, Square::E5, PieceKind::Pawn),
                ply: 0
            })
        );
        assert_eq!(pos, original);
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let mut pos = Position::default();
        let mut tt = TTable::with_capacity(1 << 12);

        // Claim an exact score for the position after 1. e4 without a reply
        let e4 = Move::new(Square::E2, Square::E4, PieceKind::Pawn);
        let key = pos.play(e4).key();
        tt.store(TTableEntry {
            key,
            score: 0,
            bestmove: None,
            kind: NodeKind::Pv,
            age: 0,
            depth: 5,
        });

        let mut pv = PrincipalVariation::default();
        let result = Searcher::new(&mut tt).negamax(-MATE, MATE, 1, &mut pos, 1, &mut pv);
        assert_eq!(result, Err(SearchError::CorruptEntry { key: key.inner() }));
        assert_eq!(pos, Position::default());
    }

    #[test]
    fn test_pv_take_once_per_pass() {
        let mut line = Line::new();
        line.push(Move::new(Square::E2, Square::E4, PieceKind::Pawn));
        let mut pv = PrincipalVariation::new(line);

        assert!(pv.take(0).is_some());
        assert!(pv.take(0).is_none());
        assert!(pv.take(1).is_none());

        pv.reset();
        assert!(pv.take(0).is_some());
        assert_eq!(pv.to_string(), "e2e4");
    }
}
