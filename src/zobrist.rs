//! This module implements Zobrist hashing for use in transposition tables.
//! See https://en.wikipedia.org/wiki/Zobrist_hashing for more information.
//!
//! The random stream is seeded with a fixed constant so that any two
//! processes compute identical keys for identical positions.  The tables
//! are built once per process and shared.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board;
use crate::bitboard;

// Seed for the deterministic Zobrist stream.
const ZOBRIST_SEED: u64 = 12345;

// Process-wide tables, built on first use.
static TABLES: Lazy<ZobristHasher> = Lazy::new(ZobristHasher::new);

pub fn tables() -> &'static ZobristHasher {
    &TABLES
}

pub struct ZobristHasher {

    // 3D array containing a random 64-bit value for [square][color][piece].
    // This is stack-allocated and takes 8B * 64*6*2 = ~6KB of memory.
    pub hash_piece: [[[u64; 6]; 2]; 64],

    // Hash applied when it's black's turn
    pub hash_blacks_turn: u64,

    // Hash applied for various castling rights
    pub hash_white_ks_castling_rights: u64,
    pub hash_white_qs_castling_rights: u64,
    pub hash_black_ks_castling_rights: u64,
    pub hash_black_qs_castling_rights: u64,

    // Hash applied for the en passant square.  Note that we only have
    // to apply the file to make this disambiguous (so, 8 total values).
    pub hash_en_passant: [u64; 8],
}

impl ZobristHasher {

    // Construct a ZobristHasher from the fixed-seed stream
    fn new() -> ZobristHasher {

        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        let mut hash_piece = [[[0; 6]; 2]; 64];
        for square in 0..64 {
            for color in 0..2 {
                for piece in 0..6 {
                    hash_piece[square][color][piece] = rng.gen::<u64>();
                }
            }
        }
        let mut hash_en_passant: [u64; 8] = [0; 8];
        for e in 0..8 {
            hash_en_passant[e] = rng.gen::<u64>();
        }
        ZobristHasher {
            hash_piece,
            hash_blacks_turn: rng.gen::<u64>(),
            hash_white_ks_castling_rights: rng.gen::<u64>(),
            hash_white_qs_castling_rights: rng.gen::<u64>(),
            hash_black_ks_castling_rights: rng.gen::<u64>(),
            hash_black_qs_castling_rights: rng.gen::<u64>(),
            hash_en_passant,
        }

    }

    // This is the reference definition of the position key.  It is only
    // called when a position is set up from scratch; during a search the
    // hash is incrementally updated on the board fields, which must stay
    // referentially equivalent to this function.
    pub fn full_hash(&self, board: &board::ChessBoard) -> u64 {

        // Hash the state of the board with our saved random values
        let mut h: u64 = 0;
        if !board.whites_turn {
            h ^= self.hash_blacks_turn;
        }
        for (color, _) in board.bb_pieces.iter().enumerate() {
            for (piece, bb) in board.bb_pieces[color].iter().enumerate() {
                for square in bitboard::occupied_squares(*bb) {
                    h ^= self.hash_piece[square][color][piece];
                }
            }
        }
        if board.white_ks_castling_rights {
            h ^= self.hash_white_ks_castling_rights;
        }
        if board.white_qs_castling_rights {
            h ^= self.hash_white_qs_castling_rights;
        }
        if board.black_ks_castling_rights {
            h ^= self.hash_black_ks_castling_rights;
        }
        if board.black_qs_castling_rights {
            h ^= self.hash_black_qs_castling_rights;
        }
        if let Some(s) = board.en_passant_rights {
            h ^= self.hash_en_passant[s % 8];
        }
        h
    }

}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::board::ChessBoard;

    #[test]
    fn test_stream_is_deterministic() {
        // Two independently built tables must be identical, since the
        // stream is seeded with a fixed constant.
        let a = ZobristHasher::new();
        let b = ZobristHasher::new();
        assert_eq!(a.hash_piece, b.hash_piece);
        assert_eq!(a.hash_blacks_turn, b.hash_blacks_turn);
        assert_eq!(a.hash_en_passant, b.hash_en_passant);
        assert_eq!(a.hash_white_ks_castling_rights, b.hash_white_ks_castling_rights);
    }

    #[test]
    fn test_full_hash_distinguishes_side_to_move() {
        let mut board = ChessBoard::new();
        board.new_game();
        let white_hash = tables().full_hash(&board);
        board.whites_turn = false;
        let black_hash = tables().full_hash(&board);
        assert_eq!(white_hash ^ tables().hash_blacks_turn, black_hash);
    }

    #[test]
    fn test_full_hash_castling_rights() {
        let mut board = ChessBoard::new();
        board.new_game();
        let all_rights = tables().full_hash(&board);
        board.white_ks_castling_rights = false;
        let fewer_rights = tables().full_hash(&board);
        assert_eq!(all_rights ^ tables().hash_white_ks_castling_rights, fewer_rights);
    }
}
