/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{generate_all_moves, left_king_in_check, Move, Position};

/// Counts the leaf nodes of the legal move tree of `position`, `depth` plies deep.
///
/// Moves are generated pseudo-legally, played, and rejected if they leave the mover in check.
///
/// # Example
/// ```
/// # use rookery::*;
/// assert_eq!(perft(&Position::default(), 2), 400);
/// ```
pub fn perft(position: &Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut scratch = *position;
    perft_recursive(&mut scratch, depth)
}

/// Like [`perft`], but returns the node count beneath each legal root move.
///
/// The counts sum to `perft(position, depth)`. Useful for diffing against another engine.
pub fn splitperft(position: &Position, depth: usize) -> Vec<(Move, u64)> {
    let mut scratch = *position;
    let mut counts = Vec::new();

    for mv in generate_all_moves(position) {
        let mut child = scratch.play(mv);
        if left_king_in_check(&child) {
            continue;
        }

        let nodes = if depth <= 1 {
            1
        } else {
            perft_recursive(&mut child, depth - 1)
        };
        counts.push((mv, nodes));
    }

    counts
}

fn perft_recursive(position: &mut Position, depth: usize) -> u64 {
    let moves = generate_all_moves(position);
    let mut nodes = 0;

    for mv in moves {
        let mut child = position.play(mv);
        if left_king_in_check(&child) {
            continue;
        }

        nodes += if depth == 1 {
            1
        } else {
            perft_recursive(&mut child, depth - 1)
        };
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ZobristKey, FEN_KIWIPETE};

    #[test]
    fn test_splitperft_sums_to_perft() {
        let pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        let split = splitperft(&pos, 2);
        assert_eq!(split.len(), 48);
        assert_eq!(split.iter().map(|(_, n)| n).sum::<u64>(), perft(&pos, 2));
    }

    #[test]
    fn test_perft_depth_zero() {
        assert_eq!(perft(&Position::default(), 0), 1);
    }

    /// Walks every legal line and checks the incrementally updated key against a fresh one.
    fn assert_keys_match(position: &mut Position, depth: usize) {
        assert_eq!(position.key(), ZobristKey::new(position), "{position:?}");
        if depth == 0 {
            return;
        }

        for mv in generate_all_moves(position) {
            let mut child = position.play(mv);
            if !left_king_in_check(&child) {
                assert_keys_match(&mut child, depth - 1);
            }
        }
    }

    #[test]
    fn test_incremental_keys_across_tree() {
        let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        assert_keys_match(&mut pos, 3);

        let mut pos = Position::from_fen(crate::FEN_POSITION_4).unwrap();
        assert_keys_match(&mut pos, 3);
    }
}
