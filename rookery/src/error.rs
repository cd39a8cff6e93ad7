/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use thiserror::Error;

use super::{Color, Move, Square};

/// Errors raised when a move cannot be identified or applied in a given position.
///
/// These are recoverable: the position is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The origin square does not hold a piece belonging to the side to move.
    #[error("no {color} piece on {square} to move")]
    NoPieceAt { square: Square, color: Color },

    /// The text could not be parsed as a long-algebraic move.
    #[error("invalid UCI move {0:?}")]
    InvalidUci(String),

    /// The move is well-formed but not legal in the position.
    #[error("{0} is not legal in this position")]
    Illegal(Move),
}

/// Internal invariant violations detected while searching.
///
/// A search that hits one of these is aborted; the position is still restored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The null move turned up in a generated move list.
    #[error("null move encountered in move loop at ply {ply}")]
    NullMove { ply: usize },

    /// The principal variation promised a move that the generator did not produce.
    #[error("principal variation move {mv} missing from move list at ply {ply}")]
    MissingPvMove { mv: Move, ply: usize },

    /// A transposition table entry claimed an exact score but held no usable move.
    #[error("transposition table entry for key {key:#018x} has no best move")]
    CorruptEntry { key: u64 },
}

/// Failures while building the sliding attack tables.
///
/// No move can be generated without the tables, so these abort the process on first use.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Subset enumeration of a relevant-occupancy mask produced the wrong number of subsets.
    #[error("expected {expected} occupancy permutations on {square}, found {found}")]
    PermutationCount {
        square: Square,
        expected: usize,
        found: usize,
    },

    /// Two occupancies with different attack sets hashed to the same slot.
    #[error("magic collision on {square} at index {index}")]
    MagicCollision { square: Square, index: usize },
}
