/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![doc = include_str!("../README.md")]

pub use rookery_types::*;

/// The engine facade: configuration, searching, and validated move application.
mod engine;
/// Errors raised by move parsing, searching, and table construction.
mod error;
/// Static evaluation of positions.
mod eval;
/// All code related to generating moves (legal and pseudo-legal) for pieces on a board.
mod movegen;
/// Enums and structs for modeling the movement of a piece on a chessboard.
mod moves;
/// Utility function for performance testing.
mod perft;
/// A chessboard, complete with piece placements, turn counters, and game state information.
mod position;
/// Negamax, quiescence search, and iterative deepening.
mod search;
/// Precomputed attack tables, including magic bitboards for sliding pieces.
mod tables;
/// Transposition table for caching search results.
mod ttable;
/// Zobrist keys for hashing chess positions.
mod zobrist;

pub use engine::*;
pub use error::*;
pub use eval::*;
pub use movegen::*;
pub use moves::*;
pub use perft::*;
pub use position::*;
pub use search::*;
pub use tables::*;
pub use ttable::*;
pub use zobrist::*;

/// Re-exports all the things you'll need.
pub mod prelude {
    pub use crate::engine::*;
    pub use crate::error::*;
    pub use crate::eval::*;
    pub use crate::movegen::*;
    pub use crate::moves::*;
    pub use crate::perft::*;
    pub use crate::position::*;
    pub use crate::search::*;
    pub use crate::tables::*;
    pub use crate::ttable::*;
    pub use crate::zobrist::*;
    pub use rookery_types::*;
}
