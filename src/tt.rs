//! This module contains the transposition table: a bounded, Zobrist-keyed
//! cache of previously searched nodes.  Eviction is age based, so entries
//! from long-finished searches make room for the current one.

use rustc_hash::FxHashMap;

use crate::movegen::ChessMove;

// Approximate size of one record, used to translate the configured
// megabyte budget into an entry budget.
const TT_ENTRY_SIZE: usize = 64;

// Entries this much older than the running search are considered stale
const TT_STALE_AGE: u32 = 2;

// Bound classification of a stored value, according to the alpha-beta
// window at the time the node was searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {

    // An exact value is one that falls between alpha and beta and
    // represents a PV move
    Exact,

    // A lower bound value is one that failed high and caused a
    // beta-cutoff -- the move was too good
    Lower,

    // An upper bound value is one that failed low, meaning it didn't
    // rise to the level of an already found acceptable move.
    Upper,
}

// One transposition table record
#[derive(Debug, Clone)]
pub struct TTEntry {

    // Zobrist hash of the board state at this node, kept in the record
    // so a mismatched lookup is never trusted
    pub key: u64,

    // Remaining search depth at the time the node was stored
    pub depth: u8,

    // The score at this node (caveated by the bound)
    pub value: i32,

    // Whether the score is exact, a lower bound, or an upper bound
    pub bound: Bound,

    // The best move discovered at this node, if any.  Usable as an
    // ordering hint regardless of the stored depth.
    pub best_move: Option<ChessMove>,

    // Search number that stored this record
    pub age: u32,
}

pub struct TranspositionTable {
    entries: FxHashMap<u64, TTEntry>,
    capacity: usize,
}

impl TranspositionTable {

    // Construct a table sized to the given megabyte budget
    pub fn new(size_mb: usize) -> TranspositionTable {
        TranspositionTable {
            entries: FxHashMap::default(),
            capacity: size_mb * 1024 * 1024 / TT_ENTRY_SIZE,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // Look up a position.  A value is only returned when the stored
    // depth is at least the requested depth and the bound admits it
    // within the (alpha, beta) window; the stored move is returned as an
    // ordering hint whenever the entry matches, regardless of depth.
    pub fn probe(&self, key: u64, depth: u8, alpha: i32, beta: i32) -> (Option<i32>, Option<ChessMove>) {
        let entry = match self.entries.get(&key) {
            Some(e) => e,
            None => return (None, None),
        };
        if entry.key != key {
            // A record that does not match its key is never trusted
            return (None, None);
        }
        if entry.depth < depth {
            return (None, entry.best_move);
        }
        match entry.bound {
            Bound::Exact => (Some(entry.value), entry.best_move),
            Bound::Lower if entry.value >= beta => (Some(entry.value), entry.best_move),
            Bound::Upper if entry.value <= alpha => (Some(entry.value), entry.best_move),
            _ => (None, entry.best_move),
        }
    }

    // Insert or overwrite a record.  At capacity, at least half of the
    // entries older than the stale threshold are evicted first;
    // insertion itself is never refused.
    pub fn store(&mut self, key: u64, depth: u8, value: i32, bound: Bound, best_move: Option<ChessMove>, age: u32) {
        if self.entries.len() >= self.capacity {
            let stale_keys: Vec<u64> = self.entries.iter()
                .filter(|(_, e)| e.age + TT_STALE_AGE < age)
                .map(|(k, _)| *k)
                .collect();
            for k in stale_keys.iter().take((stale_keys.len() + 1) / 2) {
                self.entries.remove(k);
            }
        }
        self.entries.insert(key, TTEntry { key, depth, value, bound, best_move, age });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

}

// =====================================
//             UNIT TESTS
// =====================================
