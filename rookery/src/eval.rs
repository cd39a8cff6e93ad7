/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    generate_all_moves, is_in_check, legal_moves, Bitboard, Board, Color, File, PieceKind,
    Position,
};

/// Score of a checkmated side to move. Far outside any static evaluation.
pub const MATE: i32 = 1 << 20;

/// Penalty applied once per blocked, doubled, or isolated pawn.
const PAWN_STRUCTURE_PENALTY: i32 = 50;

/// Value of each move of mobility advantage.
const MOBILITY_WEIGHT: i32 = 10;

/// Statically evaluates `position` from the perspective of the side to move.
///
/// The score is material, minus pawn structure penalties, plus a mobility term. A checkmated side
/// to move scores [`-MATE`](MATE); a stalemated side to move gets no mobility term.
///
/// When the side to move is not in check, mobility counts pseudo-legal moves, so a stalemate where
/// every pseudo-legal move is illegal goes unnoticed.
///
/// # Example
/// ```
/// # use rookery::*;
/// assert_eq!(evaluate(&Position::default()), 0);
///
/// let rooks = Position::from_fen("8/8/8/8/8/8/8/Rr6 w - - 0 1").unwrap();
/// assert_eq!(evaluate(&rooks), -60);
/// ```
pub fn evaluate(position: &Position) -> i32 {
    let board = position.board();
    let color = position.side_to_move();

    let absolute = material(board, Color::White) - material(board, Color::Black)
        - pawn_structure(board, Color::White)
        + pawn_structure(board, Color::Black);

    let in_check = is_in_check(position);
    let own_moves = if in_check {
        legal_moves(position).len() as i32
    } else {
        generate_all_moves(position).len() as i32
    };

    let mobility = if own_moves == 0 && board.color(color).is_nonempty() {
        if in_check {
            return -MATE;
        }

        0
    } else {
        let their_moves = generate_all_moves(&position.with_nullmove()).len() as i32;
        MOBILITY_WEIGHT * (own_moves - their_moves)
    };

    absolute * color.negation_multiplier() + mobility
}

/// Sum of the values of all of `color`'s pieces.
pub fn material(board: &Board, color: Color) -> i32 {
    PieceKind::all()
        .into_iter()
        .map(|kind| kind.value() * board.pieces(color, kind).population() as i32)
        .sum()
}

/// Total penalty for `color`'s blocked, doubled, and isolated pawns.
///
/// # Example
/// ```
/// # use rookery::*;
/// // Both pawns are doubled and isolated, and the one on A2 is blocked
/// let pos = Position::from_fen("4k3/8/8/8/8/P7/P7/4K3 w - - 0 1").unwrap();
/// assert_eq!(pawn_structure(pos.board(), Color::White), 250);
/// assert_eq!(pawn_structure(pos.board(), Color::Black), 0);
/// ```
pub fn pawn_structure(board: &Board, color: Color) -> i32 {
    let pawns = board.pawns(color);

    // Anything directly in front of a pawn blocks it
    let blocked = (pawns.forward_by(color, 1) & board.occupied()).population();

    let mut doubled = 0;
    let mut isolated = 0;
    for file in File::iter() {
        let on_file = (pawns & Bitboard::from_file(file)).population();
        if on_file >= 2 {
            doubled += on_file;
        }

        let neighbors = [file.offset(-1), file.offset(1)]
            .into_iter()
            .flatten()
            .fold(Bitboard::EMPTY_BOARD, |acc, adjacent| {
                acc | Bitboard::from_file(adjacent)
            });
        if (pawns & neighbors).is_empty() {
            isolated += on_file;
        }
    }

    PAWN_STRUCTURE_PENALTY * (blocked + doubled + isolated) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_fen(fen: &str) -> i32 {
        evaluate(&Position::from_fen(fen).unwrap())
    }

    #[test]
    fn test_startpos_is_balanced() {
        let pos = Position::default();
        assert_eq!(evaluate(&pos), 0);
        assert_eq!(evaluate(&pos.with_nullmove()), 0);
        assert_eq!(material(pos.board(), Color::White), 3_920);
        assert_eq!(material(pos.board(), Color::White), material(pos.board(), Color::Black));
    }

    #[test]
    fn test_bare_rooks() {
        // White's Rook has 8 moves, Black's has 14
        assert_eq!(eval_fen("8/8/8/8/8/8/8/Rr6 w - - 0 1"), -60);
    }

    #[test]
    fn test_score_is_from_side_to_move() {
        // 200 material, -250 pawn structure, +10 mobility
        assert_eq!(eval_fen("4k3/8/8/8/8/P7/P7/4K3 w - - 0 1"), -40);
        // Black has 5 moves to White's 6
        assert_eq!(eval_fen("4k3/8/8/8/8/P7/P7/4K3 b - - 0 1"), 40);
    }

    #[test]
    fn test_checkmate_scores_mate() {
        assert_eq!(eval_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1"), -MATE);
        assert_eq!(
            eval_fen("r2qk2r/pb4p1/1n2PbB1/2B5/p1p5/2P5/5PPP/RN2R1K1 b - - 1 0"),
            -MATE
        );
    }

    #[test]
    fn test_stalemate_drops_mobility() {
        // Only material counts: Black is down a Queen
        assert_eq!(eval_fen("k7/8/1Q6/8/8/8/8/7K b - - 0 1"), -900);
    }

    #[test]
    fn test_pawn_structure() {
        let pos = Position::default();
        assert_eq!(pawn_structure(pos.board(), Color::White), 0);

        // Tripled on the E-file: 3 doubled, 3 isolated, 2 blocked
        let pos = Position::from_fen("4k3/8/8/8/4P3/4P3/4P3/K7 w - - 0 1").unwrap();
        assert_eq!(pawn_structure(pos.board(), Color::White), 400);

        // Connected pawns on D and E are neither doubled nor isolated
        let pos = Position::from_fen("4k3/8/8/8/8/8/3PP3/4K3 w - - 0 1").unwrap();
        assert_eq!(pawn_structure(pos.board(), Color::White), 0);
    }
}
