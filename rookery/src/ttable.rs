/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::mem;

use super::{Move, ZobristKey};

/// What kind of bound a stored score represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Every move was searched inside the window; the score is exact.
    Pv,
    /// No move raised alpha; the score is an upper bound.
    All,
    /// A move failed high; the score is a lower bound.
    Cut,
}

/// A single search result cached in a [`TTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTableEntry {
    pub key: ZobristKey,
    pub score: i32,
    pub bestmove: Option<Move>,
    pub kind: NodeKind,
    /// The [`TTable::age`] at the time of storing.
    pub age: u8,
    /// Remaining depth of the search that produced this entry.
    pub depth: u8,
}

impl TTableEntry {
    /// Returns `true` if this entry was searched at least `depth` plies deep.
    #[inline(always)]
    pub const fn is_usable_at(&self, depth: u8) -> bool {
        self.depth >= depth
    }
}

/// A direct-mapped transposition table.
///
/// Each key maps to exactly one slot (`key % capacity`). Storing always overwrites that slot, and
/// a lookup only hits when the stored key equals the probed key.
///
/// # Example
/// ```
/// # use rookery::*;
/// let mut tt = TTable::new(1);
/// let key = Position::default().key();
/// assert!(tt.lookup(key).is_none());
///
/// tt.store(TTableEntry { key, score: 35, bestmove: None, kind: NodeKind::Pv, age: tt.age(), depth: 3 });
/// assert_eq!(tt.lookup(key).map(|entry| entry.score), Some(35));
/// ```
#[derive(Debug)]
pub struct TTable {
    entries: Box<[Option<TTableEntry>]>,
    age: u8,
    hits: u64,
    accesses: u64,
    collisions: u64,
}

impl TTable {
    /// Creates a table occupying roughly `megabytes` MB of memory, with at least one slot.
    pub fn new(megabytes: usize) -> Self {
        let slot_size = mem::size_of::<Option<TTableEntry>>();
        let capacity = (megabytes * 1024 * 1024 / slot_size).max(1);
        Self::with_capacity(capacity)
    }

    /// Creates a table with exactly `capacity` slots, with at least one slot.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![None; capacity.max(1)].into_boxed_slice(),
            age: 0,
            hits: 0,
            accesses: 0,
            collisions: 0,
        }
    }

    #[inline(always)]
    fn index(&self, key: ZobristKey) -> usize {
        (key.inner() % self.entries.len() as u64) as usize
    }

    /// Fetches the entry stored for `key`, if there is one.
    pub fn lookup(&mut self, key: ZobristKey) -> Option<&TTableEntry> {
        self.accesses += 1;
        let index = self.index(key);

        match &self.entries[index] {
            Some(entry) if entry.key == key => {
                self.hits += 1;
                Some(entry)
            }
            Some(_) => {
                self.collisions += 1;
                None
            }
            None => None,
        }
    }

    /// Stores `entry`, replacing whatever occupied its slot.
    pub fn store(&mut self, entry: TTableEntry) {
        let index = self.index(entry.key);
        self.entries[index] = Some(entry);
    }

    /// Empties every slot and resets the age and counters.
    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.age = 0;
        self.reset_stats();
    }

    /// Marks the start of a new search, so entries from older searches can be told apart.
    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
        self.reset_stats();
    }

    fn reset_stats(&mut self) {
        self.hits = 0;
        self.accesses = 0;
        self.collisions = 0;
    }

    #[inline(always)]
    pub const fn age(&self) -> u8 {
        self.age
    }

    /// Number of slots.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Lookups that found their key since the last [`TTable::new_search`].
    #[inline(always)]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    #[inline(always)]
    pub const fn accesses(&self) -> u64 {
        self.accesses
    }

    /// Lookups that found a different key in their slot.
    #[inline(always)]
    pub const fn collisions(&self) -> u64 {
        self.collisions
    }

    /// Logs the hit, access, and collision counters at debug level.
    pub fn log_stats(&self) {
        tracing::debug!(
            hits = self.hits,
            accesses = self.accesses,
            collisions = self.collisions,
            occupied = self.len(),
            capacity = self.capacity(),
            "transposition table statistics"
        );
    }
}

impl Default for TTable {
    /// A 16 MB table.
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, Square, FEN_KIWIPETE};

    fn entry(key: ZobristKey, score: i32, depth: u8) -> TTableEntry {
        TTableEntry {
            key,
            score,
            bestmove: None,
            kind: NodeKind::All,
            age: 0,
            depth,
        }
    }

    #[test]
    fn test_store_and_lookup() {
        let mut tt = TTable::with_capacity(1024);
        let key = Position::default().key();
        assert!(tt.lookup(key).is_none());
        assert!(tt.is_empty());

        tt.store(entry(key, -40, 2));
        let found = tt.lookup(key).copied().unwrap();
        assert_eq!(found.score, -40);
        assert!(found.is_usable_at(2));
        assert!(!found.is_usable_at(3));
        assert_eq!(tt.hits(), 1);
        assert_eq!(tt.accesses(), 2);
        assert_eq!(tt.len(), 1);
    }

    #[test]
    fn test_store_overwrites_slot() {
        // A single slot forces every key to collide
        let mut tt = TTable::with_capacity(1);
        let first = Position::default().key();
        let second = Position::from_fen(FEN_KIWIPETE).unwrap().key();

        tt.store(entry(first, 1, 1));
        tt.store(entry(second, 2, 1));

        assert!(tt.lookup(first).is_none());
        assert_eq!(tt.collisions(), 1);
        assert_eq!(tt.lookup(second).map(|e| e.score), Some(2));
    }

    #[test]
    fn test_clear_and_new_search() {
        let mut tt = TTable::new(1);
        assert!(tt.capacity() > 1);

        let key = Position::default().key();
        let mut stored = entry(key, 0, 1);
        stored.bestmove = Some(Move::new(Square::E2, Square::E4, crate::PieceKind::Pawn));
        tt.store(stored);
        let _ = tt.lookup(key);

        tt.new_search();
        assert_eq!(tt.age(), 1);
        assert_eq!(tt.hits(), 0);
        assert!(tt.lookup(key).is_some());

        tt.clear();
        assert_eq!(tt.age(), 0);
        assert!(tt.lookup(key).is_none());
        assert!(tt.is_empty());
    }
}
