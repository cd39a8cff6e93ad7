/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::LazyLock;

use super::{Bitboard, Color, Square, TableError};

// Include the pre-generated magics
include!("magics.rs");

/// Number of attack slots reserved per square in the Rook table (`2^12`).
const ROOK_SLOTS: usize = 4096;

/// Number of attack slots reserved per square in the Bishop table (`2^9`).
const BISHOP_SLOTS: usize = 512;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const WHITE_PAWN_OFFSETS: [(i8, i8); 2] = [(-1, 1), (1, 1)];
const BLACK_PAWN_OFFSETS: [(i8, i8); 2] = [(-1, -1), (1, -1)];

static TABLES: LazyLock<AttackTables> = LazyLock::new(|| match AttackTables::build() {
    Ok(tables) => tables,
    Err(err) => panic!("Failed to build attack tables: {err}"),
});

/// One of the eight compass directions a ray can travel in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const COUNT: usize = 8;

    pub const ALL: [Self; Self::COUNT] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    /// Directions a Rook slides in.
    pub const ORTHOGONAL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Directions a Bishop slides in.
    pub const DIAGONAL: [Self; 4] = [
        Self::NorthEast,
        Self::SouthEast,
        Self::SouthWest,
        Self::NorthWest,
    ];

    /// The `(file, rank)` step taken by one move in this direction.
    #[inline(always)]
    pub const fn delta(&self) -> (i8, i8) {
        match self {
            Self::North => (0, 1),
            Self::NorthEast => (1, 1),
            Self::East => (1, 0),
            Self::SouthEast => (1, -1),
            Self::South => (0, -1),
            Self::SouthWest => (-1, -1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, 1),
        }
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

/// Per-square hashing parameters for a sliding piece.
#[derive(Clone, Copy, Default)]
struct MagicEntry {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl MagicEntry {
    #[inline(always)]
    const fn index(&self, blockers: Bitboard) -> usize {
        let blockers = blockers.inner() & self.mask.inner();
        let hash = blockers.wrapping_mul(self.magic);
        self.offset + (hash >> self.shift) as usize
    }
}

/// Magic-indexed attack sets for one kind of sliding piece.
struct SliderTable {
    entries: [MagicEntry; Square::COUNT],
    attacks: Box<[Bitboard]>,
}

impl SliderTable {
    /// Fills the table for every square by enumerating each relevant-occupancy mask.
    fn build(
        magics: &[u64; Square::COUNT],
        directions: &[Direction],
        slots: usize,
    ) -> Result<Self, TableError> {
        let mut entries = [MagicEntry::default(); Square::COUNT];
        let mut attacks = vec![Bitboard::EMPTY_BOARD; Square::COUNT * slots];
        let mut filled = vec![false; Square::COUNT * slots];

        for square in Square::iter() {
            let mask = relevant_occupancy(square, directions);
            let entry = MagicEntry {
                mask,
                magic: magics[square],
                shift: 64 - mask.population(),
                offset: square.index() * slots,
            };

            let expected = 1 << mask.population();
            let mut found = 0;

            for subset in mask.subsets() {
                found += 1;
                let index = entry.index(subset);
                let attack = sliding_attacks(square, subset, directions);

                // Constructive collisions (same attack set) are fine
                if filled[index] && attacks[index] != attack {
                    return Err(TableError::MagicCollision {
                        square,
                        index: index - entry.offset,
                    });
                }

                filled[index] = true;
                attacks[index] = attack;
            }

            if found != expected {
                return Err(TableError::PermutationCount {
                    square,
                    expected,
                    found,
                });
            }

            entries[square] = entry;
        }

        Ok(Self {
            entries,
            attacks: attacks.into_boxed_slice(),
        })
    }

    #[inline(always)]
    fn attacks(&self, square: Square, blockers: Bitboard) -> Bitboard {
        self.attacks[self.entries[square].index(blockers)]
    }
}

/// Every precomputed attack lookup used by move generation.
struct AttackTables {
    pawn: [[Bitboard; Square::COUNT]; Color::COUNT],
    knight: [Bitboard; Square::COUNT],
    king: [Bitboard; Square::COUNT],
    rays: [[Bitboard; Square::COUNT]; Direction::COUNT],
    between: Box<[[Bitboard; Square::COUNT]; Square::COUNT]>,
    rook: SliderTable,
    bishop: SliderTable,
}

impl AttackTables {
    fn build() -> Result<Self, TableError> {
        let mut pawn = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Color::COUNT];
        let mut knight = [Bitboard::EMPTY_BOARD; Square::COUNT];
        let mut king = [Bitboard::EMPTY_BOARD; Square::COUNT];
        let mut rays = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Direction::COUNT];

        for square in Square::iter() {
            pawn[Color::White][square] = step_attacks(square, &WHITE_PAWN_OFFSETS);
            pawn[Color::Black][square] = step_attacks(square, &BLACK_PAWN_OFFSETS);
            knight[square] = step_attacks(square, &KNIGHT_OFFSETS);
            king[square] = step_attacks(square, &KING_OFFSETS);

            for direction in Direction::ALL {
                rays[direction.index()][square] = sliding_attacks(
                    square,
                    Bitboard::EMPTY_BOARD,
                    &[direction],
                );
            }
        }

        // The squares strictly between `from` and `to` are the ray from `from` minus the ray from `to` (and `to` itself)
        let mut between = Box::new([[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT]);
        for from in Square::iter() {
            for direction in Direction::ALL {
                let ray = rays[direction.index()][from];
                for to in ray {
                    between[from][to] = ray & !rays[direction.index()][to] & !to.bitboard();
                }
            }
        }

        let rook = SliderTable::build(&ROOK_MAGICS, &Direction::ORTHOGONAL, ROOK_SLOTS)?;
        let bishop = SliderTable::build(&BISHOP_MAGICS, &Direction::DIAGONAL, BISHOP_SLOTS)?;

        tracing::debug!(
            rook_slots = rook.attacks.len(),
            bishop_slots = bishop.attacks.len(),
            "attack tables built"
        );

        Ok(Self {
            pawn,
            knight,
            king,
            rays,
            between,
            rook,
            bishop,
        })
    }
}

/// Unions every `(file, rank)` offset from `square` that stays on the board.
fn step_attacks(square: Square, offsets: &[(i8, i8)]) -> Bitboard {
    offsets
        .iter()
        .filter_map(|&(df, dr)| square.offset(df, dr))
        .collect()
}

/// Forces the attack tables to be built now, rather than on first lookup.
#[inline(always)]
pub fn init_tables() {
    LazyLock::force(&TABLES);
}

/// Computes sliding attacks from `square` by walking each of `directions` until the edge or the
/// first square in `blockers`, which is included.
///
/// This is the slow reference the magic tables are built from and tested against.
///
/// # Example
/// ```
/// # use rookery::*;
/// let attacks = sliding_attacks(Square::A1, Square::A3.bitboard(), &[Direction::North]);
/// assert_eq!(attacks, Square::A2 | Square::A3);
/// ```
pub fn sliding_attacks(square: Square, blockers: Bitboard, directions: &[Direction]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY_BOARD;

    for direction in directions {
        let (df, dr) = direction.delta();
        let mut current = square;

        while let Some(next) = current.offset(df, dr) {
            attacks |= next;
            if blockers.contains(next) {
                break;
            }
            current = next;
        }
    }

    attacks
}

/// The squares whose occupancy can change a slider's attacks from `square`: each ray in
/// `directions`, minus its final edge square.
///
/// # Example
/// ```
/// # use rookery::*;
/// assert_eq!(relevant_occupancy(Square::A1, &Direction::ORTHOGONAL).population(), 12);
/// assert_eq!(relevant_occupancy(Square::D4, &Direction::DIAGONAL).population(), 9);
/// ```
pub fn relevant_occupancy(square: Square, directions: &[Direction]) -> Bitboard {
    let mut mask = Bitboard::EMPTY_BOARD;

    for direction in directions {
        let (df, dr) = direction.delta();
        let mut current = square;

        // Only keep a square if there is another one beyond it
        while let Some(next) = current.offset(df, dr) {
            if next.offset(df, dr).is_some() {
                mask |= next;
            }
            current = next;
        }
    }

    mask
}

/// Fetch the raw, unblocked attacks for a pawn of the provided color on the provided square.
#[inline(always)]
pub fn pawn_attacks(square: Square, color: Color) -> Bitboard {
    TABLES.pawn[color][square]
}

/// Fetch the raw, unblocked attacks for a knight on the provided square.
#[inline(always)]
pub fn knight_attacks(square: Square) -> Bitboard {
    TABLES.knight[square]
}

/// Fetch the raw, unblocked attacks for a king on the provided square.
#[inline(always)]
pub fn king_attacks(square: Square) -> Bitboard {
    TABLES.king[square]
}

/// Computes the possible moves for a Rook at a given [`Square`] with the provided blockers.
///
/// This will yield a [`Bitboard`] that allows the Rook to capture the first blocker.
#[inline(always)]
pub fn rook_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    TABLES.rook.attacks(square, blockers)
}

/// Computes the possible moves for a Bishop at a given [`Square`] with the provided blockers.
///
/// This will yield a [`Bitboard`] that allows the Bishop to capture the first blocker.
#[inline(always)]
pub fn bishop_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    TABLES.bishop.attacks(square, blockers)
}

/// Computes the possible moves for a Queen at a given [`Square`] with the provided blockers.
#[inline(always)]
pub fn queen_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    rook_attacks(square, blockers) | bishop_attacks(square, blockers)
}

/// Fetches every square from `square` to the edge of the board in `direction`, edge included.
///
/// # Example
/// ```
/// # use rookery::*;
/// assert_eq!(ray(Direction::East, Square::E1), Square::F1 | Square::G1 | Square::H1);
/// ```
#[inline(always)]
pub fn ray(direction: Direction, square: Square) -> Bitboard {
    TABLES.rays[direction.index()][square]
}

/// Fetches a [`Bitboard`] with all of the bits along the ray between `from` and `to` (exclusive) set to `1`.
///
/// Empty if the squares do not share a rank, file, or diagonal.
///
/// # Example
/// ```
/// # use rookery::*;
/// assert_eq!(ray_between(Square::A1, Square::A8), Bitboard::FILE_A ^ Square::A1 ^ Square::A8);
/// assert_eq!(ray_between(Square::A1, Square::B3), Bitboard::EMPTY_BOARD);
/// ```
#[inline(always)]
pub fn ray_between(from: Square, to: Square) -> Bitboard {
    TABLES.between[from][to]
}
