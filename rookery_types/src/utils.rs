/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// FEN string for the starting position of chess.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A popular FEN string for debugging move generation.
///
/// <https://www.chessprogramming.org/Perft_Results#Position_2>
pub const FEN_KIWIPETE: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

/// Endgame position rich in en passant and check edge cases.
///
/// <https://www.chessprogramming.org/Perft_Results#Position_3>
pub const FEN_POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

/// Position with promotions and castling under attack.
///
/// <https://www.chessprogramming.org/Perft_Results#Position_4>
pub const FEN_POSITION_4: &str =
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";

/// Maximum number of moves that can be generated in a single position.
///
/// The most moves known in a legal position is 218; pseudo-legal generation can exceed that.
pub const MAX_NUM_MOVES: usize = 256;
