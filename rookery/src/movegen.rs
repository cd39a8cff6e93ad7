/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
    Bitboard, Board, Color, Move, PieceKind, Position, Rank, Square, MAX_NUM_MOVES,
};

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// Generates every pseudo-legal move for the side to move.
///
/// Moves may leave the mover's King attacked (pins and checks are not resolved), with one
/// exception: King moves, including castling, are only generated to squares the opponent does not
/// attack. Captures of the enemy King are never generated.
///
/// # Example
/// ```
/// # use rookery::*;
/// assert_eq!(generate_all_moves(&Position::default()).len(), 20);
/// ```
pub fn generate_all_moves(position: &Position) -> MoveList {
    let mut moves = MoveList::new();
    let board = position.board();
    let color = position.side_to_move();
    let opponent = color.opponent();
    let occupied = board.occupied();

    // Never land on a friendly piece or the enemy King
    let targets = board.enemy_or_empty(color) & !board.king(opponent);

    generate_pawn_moves(position, targets, &mut moves);

    for from in board.knights(color) {
        push_moves(from, knight_attacks(from) & targets, PieceKind::Knight, &mut moves);
    }
    for from in board.pieces(color, PieceKind::Bishop) {
        let attacks = bishop_attacks(from, occupied);
        push_moves(from, attacks & targets, PieceKind::Bishop, &mut moves);
    }
    for from in board.pieces(color, PieceKind::Rook) {
        let attacks = rook_attacks(from, occupied);
        push_moves(from, attacks & targets, PieceKind::Rook, &mut moves);
    }
    for from in board.pieces(color, PieceKind::Queen) {
        let attacks = queen_attacks(from, occupied);
        push_moves(from, attacks & targets, PieceKind::Queen, &mut moves);
    }

    generate_king_moves(position, targets, &mut moves);

    moves
}

#[inline(always)]
fn push_moves(from: Square, destinations: Bitboard, piece: PieceKind, moves: &mut MoveList) {
    for to in destinations {
        moves.push(Move::new(from, to, piece));
    }
}

/// Single and double pushes, captures, en passant, and all four promotions.
fn generate_pawn_moves(position: &Position, targets: Bitboard, moves: &mut MoveList) {
    let board = position.board();
    let color = position.side_to_move();
    let opponent = color.opponent();
    let empty = board.empty();
    let enemies = board.color(opponent) & targets;

    // En passant only counts if the pawn that just double-pushed is actually there
    let ep_target = position.ep_square().filter(|ep| {
        ep.backward_by(color, 1)
            .is_some_and(|behind| board.pawns(opponent).contains(behind))
    });

    for from in board.pawns(color) {
        let mut destinations = pawn_attacks(from, color) & enemies;

        if let Some(ep) = ep_target {
            if pawn_attacks(from, color).contains(ep) {
                destinations |= ep;
            }
        }

        if let Some(single) = from.forward_by(color, 1).filter(|sq| empty.contains(*sq)) {
            destinations |= single;

            if from.rank() == Rank::second(color) {
                if let Some(double) = from.forward_by(color, 2).filter(|sq| empty.contains(*sq)) {
                    destinations |= double;
                }
            }
        }

        for to in destinations {
            if to.rank() == Rank::eighth(color) {
                for promotion in PieceKind::PROMOTIONS {
                    moves.push(Move::new_promotion(from, to, promotion));
                }
            } else {
                moves.push(Move::new(from, to, PieceKind::Pawn));
            }
        }
    }
}

/// King steps to unattacked squares, plus castling.
fn generate_king_moves(position: &Position, targets: Bitboard, moves: &mut MoveList) {
    let board = position.board();
    let color = position.side_to_move();
    let Some(king) = board.king_square(color) else {
        return;
    };

    // Compute attacks with the King removed, so it cannot "hide" behind itself along a slider's ray
    let blockers = board.occupied() ^ king;
    let danger = compute_attacks_by(board, color.opponent(), blockers);

    push_moves(king, king_attacks(king) & targets & !danger, PieceKind::King, moves);

    // Castling is only possible from the King's home square, and never out of check
    if king != Square::E1.rank_relative_to(color) || danger.contains(king) {
        return;
    }

    let rights = position.castling_rights_for(color);
    let rooks = board.pieces(color, PieceKind::Rook);
    let occupied = board.occupied();

    if rights.kingside() && rooks.contains(Square::H1.rank_relative_to(color)) {
        let transit = Square::F1.rank_relative_to(color);
        let dest = Square::G1.rank_relative_to(color);
        let path = transit | dest;

        if (path & occupied).is_empty() && (path & danger).is_empty() {
            moves.push(Move::new(king, dest, PieceKind::King));
        }
    }

    if rights.queenside() && rooks.contains(Square::A1.rank_relative_to(color)) {
        let transit = Square::D1.rank_relative_to(color);
        let dest = Square::C1.rank_relative_to(color);
        let between = transit | dest | Square::B1.rank_relative_to(color);

        // B1 must be empty, but may be attacked
        if (between & occupied).is_empty() && ((transit | dest) & danger).is_empty() {
            moves.push(Move::new(king, dest, PieceKind::King));
        }
    }
}

/// Generates the moves of [`generate_all_moves`] that do not leave the mover's King attacked.
///
/// # Example
/// ```
/// # use rookery::*;
/// // The Knight on D2 is pinned by the Bishop on B4
/// let pos = Position::from_fen("4k3/8/8/8/1b6/8/3N4/4K3 w - - 0 1").unwrap();
/// assert_eq!(generate_all_moves(&pos).len(), 10);
/// assert_eq!(legal_moves(&pos).len(), 4);
/// ```
pub fn legal_moves(position: &Position) -> MoveList {
    let mut scratch = *position;
    let mut moves = generate_all_moves(position);
    moves.retain(|mv| is_legal_after_move(&mut scratch, *mv));
    moves
}

/// Returns `true` if playing `mv` does not leave the mover's King attacked.
///
/// King moves are already filtered by [`generate_all_moves`] and are always accepted. Any other
/// move is applied, tested, and taken back, so `position` is unchanged on return.
pub fn is_legal_after_move(position: &mut Position, mv: Move) -> bool {
    if mv.piece().is_king() {
        return true;
    }

    let child = position.play(mv);
    !left_king_in_check(&child)
}

/// Returns `true` if the side that just moved (the side *not* to move) has its King attacked.
///
/// Positions without that King are never in check.
#[inline(always)]
pub fn left_king_in_check(position: &Position) -> bool {
    let mover = position.side_to_move().opponent();
    position.king_square(mover).is_some_and(|king| {
        compute_attackers_to(position.board(), king, position.side_to_move()).is_nonempty()
    })
}

/// Every square attacked by the side *not* to move.
#[inline(always)]
pub fn attacked_squares(position: &Position) -> Bitboard {
    let board = position.board();
    compute_attacks_by(board, position.side_to_move().opponent(), board.occupied())
}

/// The enemy pieces currently checking the side to move, and how many there are.
///
/// # Example
/// ```
/// # use rookery::*;
/// let pos = Position::from_fen("4k3/8/8/8/8/3n4/8/r3K3 w - - 0 1").unwrap();
/// assert_eq!(checking_squares(&pos), (Square::A1 | Square::D3, 2));
/// ```
#[inline(always)]
pub fn checking_squares(position: &Position) -> (Bitboard, u32) {
    let color = position.side_to_move();
    let checkers = position.king_square(color).map_or(Bitboard::EMPTY_BOARD, |king| {
        compute_attackers_to(position.board(), king, color.opponent())
    });

    (checkers, checkers.population())
}

/// Returns `true` if the side to move is in check.
#[inline(always)]
pub fn is_in_check(position: &Position) -> bool {
    checking_squares(position).1 > 0
}

/// Computes a [`Bitboard`] of all the `color` pieces that attack `square`.
///
/// This _only_ includes the attacker itself, not the ray of attack.
/// It is useful for finding checkers.
#[inline(always)]
pub fn compute_attackers_to(board: &Board, square: Square, color: Color) -> Bitboard {
    let occupied = board.occupied();

    (pawn_attacks(square, color.opponent()) & board.pawns(color))
        | (knight_attacks(square) & board.knights(color))
        | (bishop_attacks(square, occupied) & board.diagonal_sliders(color))
        | (rook_attacks(square, occupied) & board.orthogonal_sliders(color))
        | (king_attacks(square) & board.king(color))
}

/// Computes a [`Bitboard`] of all squares attacked by `color`, with sliders stopped by `blockers`.
///
/// This is a raw attack map, meaning the squares on this map are unsafe for the enemy King to occupy.
#[inline(always)]
pub fn compute_attacks_by(board: &Board, color: Color, blockers: Bitboard) -> Bitboard {
    let mut attacks = pawn_attack_map(board, color);
    for square in board.knights(color) {
        attacks |= knight_attacks(square);
    }
    for square in board.diagonal_sliders(color) {
        attacks |= bishop_attacks(square, blockers);
    }
    for square in board.orthogonal_sliders(color) {
        attacks |= rook_attacks(square, blockers);
    }
    for square in board.king(color) {
        attacks |= king_attacks(square);
    }

    attacks
}

/// Computes a [`Bitboard`] of all squares attacked by `color` Pawns, excluding En Passant for convenience.
#[inline(always)]
pub fn pawn_attack_map(board: &Board, color: Color) -> Bitboard {
    let pushes = board.pawns(color).forward_by(color, 1);
    pushes.east() | pushes.west()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{perft, FEN_KIWIPETE};

    fn uci_moves(moves: &MoveList) -> Vec<String> {
        let mut ucis: Vec<_> = moves.iter().map(|mv| mv.to_uci()).collect();
        ucis.sort();
        ucis
    }

    #[test]
    fn test_startpos_moves() {
        let moves = generate_all_moves(&Position::default());
        assert_eq!(moves.len(), 20);
        assert!(moves.iter().all(|mv| !mv.is_null()));
    }

    #[test]
    fn test_promotions_generate_all_four_kinds() {
        let pos = Position::from_fen("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let moves = legal_moves(&pos);
        let promotions: Vec<_> = moves.iter().filter(|mv| mv.promotion().is_some()).collect();

        // Four pushes to A8 and four captures on B8
        assert_eq!(promotions.len(), 8);
        for kind in PieceKind::PROMOTIONS {
            assert!(moves.contains(&Move::new_promotion(Square::A7, Square::B8, kind)));
        }
    }

    #[test]
    fn test_en_passant_is_generated() {
        let pos =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let moves = generate_all_moves(&pos);
        assert!(moves.contains(&Move::new(Square::E5, Square::F6, PieceKind::Pawn)));
        assert!(!moves.contains(&Move::new(Square::E5, Square::D6, PieceKind::Pawn)));
    }

    #[test]
    fn test_castling_requires_safe_path() {
        // Black Rook on F8 covers F1, so kingside castling is illegal; queenside is fine
        let pos = Position::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = generate_all_moves(&pos);
        assert!(!moves.contains(&Move::new(Square::E1, Square::G1, PieceKind::King)));
        assert!(moves.contains(&Move::new(Square::E1, Square::C1, PieceKind::King)));

        // An attacked B1 does not prevent queenside castling
        let pos = Position::from_fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        let moves = generate_all_moves(&pos);
        assert!(moves.contains(&Move::new(Square::E1, Square::C1, PieceKind::King)));

        // No castling out of check
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K2r w Q - 0 1").unwrap();
        let moves = generate_all_moves(&pos);
        assert!(!moves.contains(&Move::new(Square::E1, Square::C1, PieceKind::King)));

        // No castling without the rook
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w KQ - 0 1").unwrap();
        let moves = generate_all_moves(&pos);
        assert!(!moves.contains(&Move::new(Square::E1, Square::C1, PieceKind::King)));
        assert!(moves.contains(&Move::new(Square::E1, Square::G1, PieceKind::King)));
    }

    #[test]
    fn test_king_cannot_retreat_along_checking_ray() {
        // The Rook on A1 checks along the first rank; F1 is on the same ray behind the King
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/r3K3 w - - 0 1").unwrap();
        let moves = uci_moves(&generate_all_moves(&pos));
        assert_eq!(moves, vec!["e1d2", "e1e2", "e1f2"]);
    }

    #[test]
    fn test_enemy_king_is_never_captured() {
        // Illegal position with Black in check and White to move
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4R1K1 w - - 0 1").unwrap();
        let moves = generate_all_moves(&pos);
        assert!(moves.iter().all(|mv| mv.to() != Square::E8));
    }

    #[test]
    fn test_checking_squares() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/r3K3 w - - 0 1").unwrap();
        assert_eq!(checking_squares(&pos), (Square::A1.bitboard(), 1));
        assert!(is_in_check(&pos));
        assert!(attacked_squares(&pos).contains(Square::D1));

        let pos = Position::default();
        assert_eq!(checking_squares(&pos), (Bitboard::EMPTY_BOARD, 0));
    }

    #[test]
    fn test_pinned_piece_is_illegal_to_move() {
        let mut pos = Position::from_fen("4k3/8/8/8/1b6/8/3N4/4K3 w - - 0 1").unwrap();
        let original = pos;
        let pinned = Move::new(Square::D2, Square::F3, PieceKind::Knight);
        assert!(!is_legal_after_move(&mut pos, pinned));
        assert_eq!(pos, original);
    }

    /// Walks the legal move tree and asserts that no move leaves the mover's King attacked.
    fn assert_no_self_check(position: &mut Position, depth: usize) {
        if depth == 0 {
            return;
        }

        for mv in legal_moves(position) {
            let mut child = position.play(mv);
            assert!(
                !left_king_in_check(&child),
                "{mv} leaves the King attacked in {}",
                *child
            );
            assert!(child.is_consistent());
            assert_no_self_check(&mut child, depth - 1);
        }
    }

    #[test]
    fn test_legal_moves_never_leave_king_in_check() {
        for fen in [
            crate::FEN_STARTPOS,
            FEN_KIWIPETE,
            crate::FEN_POSITION_3,
            crate::FEN_POSITION_4,
        ] {
            let mut pos = Position::from_fen(fen).unwrap();
            assert_no_self_check(&mut pos, 3);
        }
    }

    #[test]
    fn test_perft_matches_known_counts() {
        let startpos = Position::default();
        assert_eq!(perft(&startpos, 1), 20);
        assert_eq!(perft(&startpos, 2), 400);
        assert_eq!(perft(&startpos, 3), 8_902);
        assert_eq!(perft(&startpos, 4), 197_281);

        let kiwipete = Position::from_fen(FEN_KIWIPETE).unwrap();
        assert_eq!(perft(&kiwipete, 1), 48);
        assert_eq!(perft(&kiwipete, 2), 2_039);
        assert_eq!(perft(&kiwipete, 3), 97_862);

        let position_3 = Position::from_fen(crate::FEN_POSITION_3).unwrap();
        assert_eq!(perft(&position_3, 1), 14);
        assert_eq!(perft(&position_3, 2), 191);
        assert_eq!(perft(&position_3, 3), 2_812);
        assert_eq!(perft(&position_3, 4), 43_238);

        let position_4 = Position::from_fen(crate::FEN_POSITION_4).unwrap();
        assert_eq!(perft(&position_4, 1), 6);
        assert_eq!(perft(&position_4, 2), 264);
        assert_eq!(perft(&position_4, 3), 9_467);
    }
}
