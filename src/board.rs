//! This module contains the entire state of the game board and past moves.
//! This does not generate or validate any moves; it assumes all moves
//! passed through "make_move" have already been validated.
//!
//! This uses the "Least Significant File Mapping" representation:
//! 56 57 58 59 60 61 62 63
//! 48 49 50 51 52 53 54 55
//! 40 41 42 43 44 45 46 47
//! 32 33 34 35 36 37 38 39
//! 24 25 26 27 28 29 30 31
//! 16 17 18 19 20 21 22 23
//!  8  9 10 11 12 13 14 15
//!  0  1  2  3  4  5  6  7

use crate::bitboard;
use crate::zobrist;
use crate::pieces;

// FEN string describing the standard starting position.
pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Convert a file in 0-7 and rank in 0-7 to a square ID
pub fn file_rank_to_square(file: usize, rank: usize) -> usize {
    rank * 8 + file
}

#[derive(Debug)]
struct MoveRecord {

    // Starting square from 0 to 63
    start_square: usize,

    // Ending square from 0 to 63
    end_square: usize,

    // Piece that was moved
    piece: usize,

    // Captured piece, if applicable
    captured_piece: Option<usize>,

    // Is this move an en passant capture?
    is_en_passant: bool,

    // If a promotion occured, the piece the pawn became
    promoted_piece: Option<usize>,

    // Game state from before the move, for unmake_move purposes
    prior_white_ks_castling_rights: bool,
    prior_white_qs_castling_rights: bool,
    prior_black_ks_castling_rights: bool,
    prior_black_qs_castling_rights: bool,
    prior_en_passant_rights: Option<usize>,
    prior_halfmove_clock: u32,
}

pub struct ChessBoard {

    // Bitboards representing occupied squares for a [color][piece]
    // for a total of 12
    pub bb_pieces: [[u64; 6]; 2],

    // Bitboards representing all occupied squares for a side (white
    // and black)
    pub bb_side: [u64; 2],

    // Bitboard representing all occupied squares for the entire board
    pub bb_occupied_squares: u64,

    // Bitboard representing all empty squares for the entire board
    pub bb_empty_squares: u64,

    // List of all moves from the start of the game
    move_history: Vec<MoveRecord>,

    // En passant rights from before each null move, for unmake purposes
    null_move_history: Vec<Option<usize>>,

    // Zobrist hash cooresponding to the board after each move in the history
    pub zobrist_history: Vec<u64>,

    // True if white's turn, false if black's turn
    pub whites_turn: bool,

    // Castling rights (whether a castle is still possible or not)
    // ks = king side, qs = queen side
    pub white_ks_castling_rights: bool,
    pub white_qs_castling_rights: bool,
    pub black_ks_castling_rights: bool,
    pub black_qs_castling_rights: bool,

    // If not None, this indicates the active en passant square.
    // This is the square the opposing pawn just moved through on a two-row
    // move, if the current player can capture en passant to that square.
    pub en_passant_rights: Option<usize>,

    // Number of half moves since the last capture or pawn move
    pub halfmove_clock: u32,

    // Zobrist hash of the current board state
    pub zobrist_hash: u64,
}

impl ChessBoard {

    // Construct a new ChessBoard
    pub fn new() -> ChessBoard {
        ChessBoard {
            bb_pieces: [[0; 6]; 2],
            bb_side: [0; 2],
            bb_occupied_squares: 0,
            bb_empty_squares: 0,
            move_history: Vec::new(),
            null_move_history: Vec::new(),
            zobrist_history: Vec::new(),
            whites_turn: true,
            white_ks_castling_rights: true,
            white_qs_castling_rights: true,
            black_ks_castling_rights: true,
            black_qs_castling_rights: true,
            en_passant_rights: None,
            halfmove_clock: 0,
            zobrist_hash: 0,
        }
    }

    // Set / reset the game state to the starting point.
    pub fn new_game(&mut self) {
        // The starting position is just another FEN; this cannot fail.
        self.set_from_fen(STARTPOS_FEN).expect("starting FEN must parse");
    }

    // Set the game state from a FEN string, clearing all history.
    // On error, the board is left untouched.
    pub fn set_from_fen(&mut self, fen: &str) -> Result<(), String> {

        let fen_parts: Vec<&str> = fen.split_whitespace().collect();
        if fen_parts.len() != 6 {
            return Err("FEN must have 6 fields".to_string());
        }

        // Piece placement
        let mut bb_pieces = [[0u64; 6]; 2];
        let rows: Vec<&str> = fen_parts[0].split('/').collect();
        if rows.len() != 8 {
            return Err("FEN board must have 8 ranks".to_string());
        }
        for (row_i, row) in rows.iter().enumerate() {
            let rank = 7 - row_i;
            let mut file = 0;
            for c in row.chars() {
                if let Some(d) = c.to_digit(10) {
                    file += d as usize;
                } else if let Some((color, piece)) = pieces::char_to_color_and_piece(c) {
                    if file > 7 {
                        return Err(format!("FEN rank {} is too long", rank + 1));
                    }
                    bb_pieces[color][piece] |= bitboard::to_bb(file_rank_to_square(file, rank));
                    file += 1;
                } else {
                    return Err(format!("invalid FEN board character '{}'", c));
                }
            }
            if file != 8 {
                return Err(format!("FEN rank {} does not describe 8 files", rank + 1));
            }
        }
        if bb_pieces[pieces::COLOR_WHITE][pieces::KING] == 0 || bb_pieces[pieces::COLOR_BLACK][pieces::KING] == 0 {
            return Err("FEN board must contain both kings".to_string());
        }

        // Side to move
        let whites_turn = match fen_parts[1] {
            "w" => true,
            "b" => false,
            x => return Err(format!("invalid FEN side to move '{}'", x)),
        };

        // Castling rights
        let mut wks = false;
        let mut wqs = false;
        let mut bks = false;
        let mut bqs = false;
        for c in fen_parts[2].chars() {
            match c {
                'K' => wks = true,
                'Q' => wqs = true,
                'k' => bks = true,
                'q' => bqs = true,
                '-' => {},
                x => return Err(format!("invalid FEN castling character '{}'", x)),
            }
        }

        // En passant target square.  Rights are only kept when a pawn of
        // the side to move can actually capture onto the square, which is
        // the board's internal normalization.
        let mut en_passant_rights = None;
        if fen_parts[3] != "-" {
            let square = square_str_to_id(fen_parts[3])?;
            let my_color = if whites_turn {pieces::COLOR_WHITE} else {pieces::COLOR_BLACK};
            let opp_color = 1 - my_color;
            if bitboard::BB_PAWN_ATTACKS[opp_color][square] & bb_pieces[my_color][pieces::PAWN] != 0 {
                en_passant_rights = Some(square);
            }
        }

        // Halfmove clock and fullmove number.  The fullmove number is
        // validated but not tracked.
        let halfmove_clock: u32 = fen_parts[4].parse().map_err(|_| "invalid FEN halfmove clock".to_string())?;
        let _fullmoves: u32 = fen_parts[5].parse().map_err(|_| "invalid FEN fullmove number".to_string())?;

        // All fields parsed; commit the new state
        self.bb_pieces = bb_pieces;
        for c in 0..2 {
            self.bb_side[c] = 0;
            for p in self.bb_pieces[c].iter() {
                self.bb_side[c] |= p;
            }
        }
        self.bb_occupied_squares = self.bb_side[pieces::COLOR_WHITE] | self.bb_side[pieces::COLOR_BLACK];
        self.bb_empty_squares = !self.bb_occupied_squares;
        self.move_history.clear();
        self.null_move_history.clear();
        self.zobrist_history.clear();
        self.whites_turn = whites_turn;
        self.white_ks_castling_rights = wks;
        self.white_qs_castling_rights = wqs;
        self.black_ks_castling_rights = bks;
        self.black_qs_castling_rights = bqs;
        self.en_passant_rights = en_passant_rights;
        self.halfmove_clock = halfmove_clock;
        self.zobrist_hash = zobrist::tables().full_hash(self);
        Ok(())
    }

    // Perform a move and update the game state accordingly.  This assumes
    // that the move has already been verified to be legal.  This function
    // will be called a large number of times during a search, and so the
    // performance of this function is critical to the speed of the engine.
    // IMPORTANT: The caller must ensure moves are legal.  If illegal moves
    // are passed into this function, the program may crash/panic or have
    // corrupt board state.
    pub fn make_move(&mut self, start_square: usize, end_square: usize, promotion: Option<usize>) {

        let hasher = zobrist::tables();

        // Get rank (0-7) and file (0-7) for important squares
        let start_rank = start_square / 8;
        let end_rank = end_square / 8;
        let end_file = end_square % 8;

        // Get colors
        let my_color = if self.whites_turn {pieces::COLOR_WHITE} else {pieces::COLOR_BLACK};
        let opp_color = if self.whites_turn {pieces::COLOR_BLACK} else {pieces::COLOR_WHITE};

        // Get piece
        let piece = match self.get_color_and_piece_on_square(start_square) {
            Some((_,p)) => p,
            None => panic!("No piece on starting square passed to make_move"),
        };

        // Get capture if available (note en passant is handled later)
        let mut captured_piece: Option<usize> = None;
        if let Some((_, p)) = self.get_color_and_piece_on_square(end_square) {
            captured_piece = Some(p);
        }

        // Check whether this is an en passant capture, and resolve the
        // promotion piece if the pawn is reaching the last rank.
        let mut is_en_passant = false;
        let mut promoted_piece = None;
        if piece == pieces::PAWN {
            if let Some(e) = self.en_passant_rights {
                if e == end_square {
                    is_en_passant = true;
                    captured_piece = Some(pieces::PAWN)
                }
            }
            if end_rank == 0 || end_rank == 7 {
                // The only way for a pawn (of any color) to end up on
                // rank 0 or 7 is if they are promoting.
                promoted_piece = Some(promotion.unwrap_or(pieces::QUEEN));
            }
        }

        // Create and store a move record for this move
        let move_record = MoveRecord {
            start_square,
            end_square,
            piece,
            captured_piece,
            is_en_passant,
            promoted_piece,
            prior_white_ks_castling_rights: self.white_ks_castling_rights,
            prior_white_qs_castling_rights: self.white_qs_castling_rights,
            prior_black_ks_castling_rights: self.black_ks_castling_rights,
            prior_black_qs_castling_rights: self.black_qs_castling_rights,
            prior_en_passant_rights: self.en_passant_rights,
            prior_halfmove_clock: self.halfmove_clock,
        };
        self.move_history.push(move_record);

        // Check if we have to give our opponent en passant rights
        let mut give_en_passant_rights = false;
        if piece == pieces::PAWN && (start_rank == 1 && end_rank == 3 || start_rank == 6 && end_rank == 4) {
            // This is a double-square pawn push; rights are only given if
            // an opposing pawn sits next to the landing square
            let opponent_pawns = self.bb_pieces[opp_color][pieces::PAWN];
            if end_file > 0 && opponent_pawns & bitboard::to_bb(end_square - 1) != 0 ||
                end_file < 7 && opponent_pawns & bitboard::to_bb(end_square + 1) != 0 {
                give_en_passant_rights = true;
                // Hash - undo old en passant rights if needed
                if let Some(e) = self.en_passant_rights {
                    self.zobrist_hash ^= hasher.hash_en_passant[e % 8];
                }
                // Hash - update new en passant rights
                self.zobrist_hash ^= hasher.hash_en_passant[end_file];
                if self.whites_turn {
                    self.en_passant_rights = Some(file_rank_to_square(end_file, end_rank-1));
                } else {
                    self.en_passant_rights = Some(file_rank_to_square(end_file, end_rank+1));
                }
            }
        }
        if !give_en_passant_rights {
            // Hash - undo old en passant rights, if needed
            if let Some(e) = self.en_passant_rights {
                self.zobrist_hash ^= hasher.hash_en_passant[e % 8];
            }
            self.en_passant_rights = None;
        }

        // Bitboards representing to and from squares
        let from_bb = bitboard::to_bb(start_square);
        let to_bb = bitboard::to_bb(end_square);
        let from_to_bb = from_bb ^ to_bb;

        // Move source to dest
        self.bb_pieces[my_color][piece] ^= from_to_bb;
        self.bb_side[my_color] ^= from_to_bb;
        // Hash - place the source on dest, and revert the source square
        self.zobrist_hash ^= hasher.hash_piece[end_square][my_color][piece];
        self.zobrist_hash ^= hasher.hash_piece[start_square][my_color][piece];

        // Handle potential captures
        if let Some(cp) = captured_piece {
            // A capture occured
            if is_en_passant {
                // Remove captured pawn from board
                let captured_pawn_square: usize = if self.whites_turn {file_rank_to_square(end_file, end_rank-1)} else {file_rank_to_square(end_file, end_rank+1)};
                let captured_pawn_square_bb = bitboard::to_bb(captured_pawn_square);
                self.bb_pieces[opp_color][cp] ^= captured_pawn_square_bb;
                self.bb_side[opp_color] ^= captured_pawn_square_bb;
                self.bb_occupied_squares ^= from_to_bb;
                self.bb_empty_squares ^= from_to_bb;
                self.bb_occupied_squares ^= captured_pawn_square_bb;
                self.bb_empty_squares ^= captured_pawn_square_bb;
                // Hash - remove the captured pawn from its square hash
                self.zobrist_hash ^= hasher.hash_piece[captured_pawn_square][opp_color][cp];
            } else {
                // Remove captured piece from board
                self.bb_pieces[opp_color][cp] ^= to_bb;
                self.bb_side[opp_color] ^= to_bb;
                self.bb_occupied_squares ^= from_bb;
                self.bb_empty_squares ^= from_bb;
                // Hash - remove the captured piece from the square hash
                self.zobrist_hash ^= hasher.hash_piece[end_square][opp_color][cp];
            }
        } else {
            // There was no capture; this is a "quiet" move
            self.bb_occupied_squares ^= from_to_bb;
            self.bb_empty_squares ^= from_to_bb;
        }

        // Handle promotion.  By the time we get here the pawn bitboard
        // will have been updated already, with the pawn on the promotion
        // square.  Therefore, we don't have to change the bb_side or
        // bb_occupied_squares bitboards.
        if let Some(promo) = promoted_piece {
            self.bb_pieces[my_color][pieces::PAWN] ^= to_bb;
            self.bb_pieces[my_color][promo] ^= to_bb;
            // Hash - remove the pawn from the square hash and add the
            // promoted piece
            self.zobrist_hash ^= hasher.hash_piece[end_square][my_color][pieces::PAWN];
            self.zobrist_hash ^= hasher.hash_piece[end_square][my_color][promo];
        }

        // If this was a castling move, we now have to take care to move
        // the rook around the king.
        // Square 4 -> 6 is white kingside castling.  Rook 7 -> 5.
        // Square 4 -> 2 is white queenside castling.  Rook 0 -> 3.
        // Square 60 -> 62 is black kingside castling.  Rook 63 -> 61.
        // Square 60 -> 58 is black queenside castling.  Rook 56 -> 59.
        if piece == pieces::KING {
            if start_square == 4 && end_square == 6 {
                self.bb_pieces[my_color][pieces::ROOK] ^= bitboard::BB_WKS_CASTLING_ROOKS_FROM_TO;
                self.bb_side[my_color] ^= bitboard::BB_WKS_CASTLING_ROOKS_FROM_TO;
                self.bb_occupied_squares ^= bitboard::BB_WKS_CASTLING_ROOKS_FROM_TO;
                self.bb_empty_squares ^= bitboard::BB_WKS_CASTLING_ROOKS_FROM_TO;
                // Hash - apply rook to new square and revert it from old square
                self.zobrist_hash ^= hasher.hash_piece[7][my_color][pieces::ROOK];
                self.zobrist_hash ^= hasher.hash_piece[5][my_color][pieces::ROOK];
            } else if start_square == 4 && end_square == 2 {
                self.bb_pieces[my_color][pieces::ROOK] ^= bitboard::BB_WQS_CASTLING_ROOKS_FROM_TO;
                self.bb_side[my_color] ^= bitboard::BB_WQS_CASTLING_ROOKS_FROM_TO;
                self.bb_occupied_squares ^= bitboard::BB_WQS_CASTLING_ROOKS_FROM_TO;
                self.bb_empty_squares ^= bitboard::BB_WQS_CASTLING_ROOKS_FROM_TO;
                // Hash - apply rook to new square and revert it from old square
                self.zobrist_hash ^= hasher.hash_piece[0][my_color][pieces::ROOK];
                self.zobrist_hash ^= hasher.hash_piece[3][my_color][pieces::ROOK];
            } else if start_square == 60 && end_square == 62 {
                self.bb_pieces[my_color][pieces::ROOK] ^= bitboard::BB_BKS_CASTLING_ROOKS_FROM_TO;
                self.bb_side[my_color] ^= bitboard::BB_BKS_CASTLING_ROOKS_FROM_TO;
                self.bb_occupied_squares ^= bitboard::BB_BKS_CASTLING_ROOKS_FROM_TO;
                self.bb_empty_squares ^= bitboard::BB_BKS_CASTLING_ROOKS_FROM_TO;
                // Hash - apply rook to new square and revert it from old square
                self.zobrist_hash ^= hasher.hash_piece[63][my_color][pieces::ROOK];
                self.zobrist_hash ^= hasher.hash_piece[61][my_color][pieces::ROOK];
            } else if start_square == 60 && end_square == 58 {
                self.bb_pieces[my_color][pieces::ROOK] ^= bitboard::BB_BQS_CASTLING_ROOKS_FROM_TO;
                self.bb_side[my_color] ^= bitboard::BB_BQS_CASTLING_ROOKS_FROM_TO;
                self.bb_occupied_squares ^= bitboard::BB_BQS_CASTLING_ROOKS_FROM_TO;
                self.bb_empty_squares ^= bitboard::BB_BQS_CASTLING_ROOKS_FROM_TO;
                // Hash - apply rook to new square and revert it from old square
                self.zobrist_hash ^= hasher.hash_piece[56][my_color][pieces::ROOK];
                self.zobrist_hash ^= hasher.hash_piece[59][my_color][pieces::ROOK];
            }
        }

        // Update castling rights based on a king being moved
        let mut wks = true;
        let mut wqs = true;
        let mut bks = true;
        let mut bqs = true;
        if self.whites_turn && piece == pieces::KING && start_square == 4 {
            wks = false;
            wqs = false;
        } else if !self.whites_turn && piece == pieces::KING && start_square == 60 {
            bks = false;
            bqs = false;
        }

        // Update castling rights based on a rook being moved
        if self.whites_turn && piece == pieces::ROOK && start_square == 7 {
            wks = false;
        } else if self.whites_turn && piece == pieces::ROOK && start_square == 0 {
            wqs = false;
        } else if !self.whites_turn && piece == pieces::ROOK && start_square == 63 {
            bks = false;
        } else if !self.whites_turn && piece == pieces::ROOK && start_square == 56 {
            bqs = false;
        }

        // Update castling rights based on a rook being captured
        if let Some(cp) = captured_piece {
            if cp == pieces::ROOK {
                if self.whites_turn && end_square == 63 {
                    bks = false;
                } else if self.whites_turn && end_square == 56 {
                    bqs = false;
                } else if !self.whites_turn && end_square == 7 {
                    wks = false;
                } else if !self.whites_turn && end_square == 0 {
                    wqs = false;
                }
            }
        }

        // Remove castling rights
        // Hash - also remove castling rights from Zobrist hash
        if self.white_ks_castling_rights && !wks {
            self.white_ks_castling_rights = false;
            self.zobrist_hash ^= hasher.hash_white_ks_castling_rights;
        }
        if self.white_qs_castling_rights && !wqs {
            self.white_qs_castling_rights = false;
            self.zobrist_hash ^= hasher.hash_white_qs_castling_rights;
        }
        if self.black_ks_castling_rights && !bks {
            self.black_ks_castling_rights = false;
            self.zobrist_hash ^= hasher.hash_black_ks_castling_rights;
        }
        if self.black_qs_castling_rights && !bqs {
            self.black_qs_castling_rights = false;
            self.zobrist_hash ^= hasher.hash_black_qs_castling_rights;
        }

        // Update the halfmove clock; pawn moves and captures reset it
        if piece == pieces::PAWN || captured_piece.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        // Change side
        self.whites_turn = !self.whites_turn;
        // Hash - change side
        self.zobrist_hash ^= hasher.hash_blacks_turn;

        // Store Zobrist hash in history
        self.zobrist_history.push(self.zobrist_hash);

    }

    // Undo the last move.  This restores all state to the state prior
    // to the last move made - the Zobrist hashes should be the same.
    // This function will be called a large number of times during a search,
    // and so the performance of this function is critical to the speed of
    // the engine.
    pub fn unmake_move(&mut self) {

        let hasher = zobrist::tables();

        // Remove Zobrist hash from history
        self.zobrist_history.pop();

        // Get the last move from history
        let last_move = if let Some(e) = self.move_history.pop() {
            e
        } else {
            panic!("Trying to unmake move with empty move history");
        };

        // Hash - change side
        self.zobrist_hash ^= hasher.hash_blacks_turn;
        // Change side
        self.whites_turn = !self.whites_turn;

        // Get rank (0-7) for important squares
        let end_rank = last_move.end_square / 8;
        let end_file = last_move.end_square % 8;

        // Get colors
        let my_color = if self.whites_turn {pieces::COLOR_WHITE} else {pieces::COLOR_BLACK};
        let opp_color = if self.whites_turn {pieces::COLOR_BLACK} else {pieces::COLOR_WHITE};

        // Restore the halfmove clock
        self.halfmove_clock = last_move.prior_halfmove_clock;

        // Restore en passant rights if they changed
        if last_move.prior_en_passant_rights != self.en_passant_rights {
            // Hash - undo old en passant rights, if needed
            if let Some(e) = self.en_passant_rights {
                self.zobrist_hash ^= hasher.hash_en_passant[e % 8];
            }
            // Hash - set en passant rights
            if let Some(e) = last_move.prior_en_passant_rights {
                self.zobrist_hash ^= hasher.hash_en_passant[e % 8]
            }
            self.en_passant_rights = last_move.prior_en_passant_rights;
        }

        // Restore castling rights if they changed
        let wks = last_move.prior_white_ks_castling_rights;
        let wqs = last_move.prior_white_qs_castling_rights;
        let bks = last_move.prior_black_ks_castling_rights;
        let bqs = last_move.prior_black_qs_castling_rights;
        if wks != self.white_ks_castling_rights {
            self.white_ks_castling_rights = wks;
            // Hash - toggle rights
            self.zobrist_hash ^= hasher.hash_white_ks_castling_rights
        }
        if wqs != self.white_qs_castling_rights {
            self.white_qs_castling_rights = wqs;
            // Hash - toggle rights
            self.zobrist_hash ^= hasher.hash_white_qs_castling_rights
        }
        if bks != self.black_ks_castling_rights {
            self.black_ks_castling_rights = bks;
            // Hash - toggle rights
            self.zobrist_hash ^= hasher.hash_black_ks_castling_rights
        }
        if bqs != self.black_qs_castling_rights {
            self.black_qs_castling_rights = bqs;
            // Hash - toggle rights
            self.zobrist_hash ^= hasher.hash_black_qs_castling_rights
        }

        // If this was a castling move, move the rook back.
        // Note that this is the same code block as in make_move because
        // of the symmetry in moves.
        if last_move.piece == pieces::KING {
            if last_move.start_square == 4 && last_move.end_square == 6 {
                self.bb_pieces[my_color][pieces::ROOK] ^= bitboard::BB_WKS_CASTLING_ROOKS_FROM_TO;
                self.bb_side[my_color] ^= bitboard::BB_WKS_CASTLING_ROOKS_FROM_TO;
                self.bb_occupied_squares ^= bitboard::BB_WKS_CASTLING_ROOKS_FROM_TO;
                self.bb_empty_squares ^= bitboard::BB_WKS_CASTLING_ROOKS_FROM_TO;
                // Hash - apply rook to new square and revert it from old square
                self.zobrist_hash ^= hasher.hash_piece[7][my_color][pieces::ROOK];
                self.zobrist_hash ^= hasher.hash_piece[5][my_color][pieces::ROOK];
            } else if last_move.start_square == 4 && last_move.end_square == 2 {
                self.bb_pieces[my_color][pieces::ROOK] ^= bitboard::BB_WQS_CASTLING_ROOKS_FROM_TO;
                self.bb_side[my_color] ^= bitboard::BB_WQS_CASTLING_ROOKS_FROM_TO;
                self.bb_occupied_squares ^= bitboard::BB_WQS_CASTLING_ROOKS_FROM_TO;
                self.bb_empty_squares ^= bitboard::BB_WQS_CASTLING_ROOKS_FROM_TO;
                // Hash - apply rook to new square and revert it from old square
                self.zobrist_hash ^= hasher.hash_piece[0][my_color][pieces::ROOK];
                self.zobrist_hash ^= hasher.hash_piece[3][my_color][pieces::ROOK];
            } else if last_move.start_square == 60 && last_move.end_square == 62 {
                self.bb_pieces[my_color][pieces::ROOK] ^= bitboard::BB_BKS_CASTLING_ROOKS_FROM_TO;
                self.bb_side[my_color] ^= bitboard::BB_BKS_CASTLING_ROOKS_FROM_TO;
                self.bb_occupied_squares ^= bitboard::BB_BKS_CASTLING_ROOKS_FROM_TO;
                self.bb_empty_squares ^= bitboard::BB_BKS_CASTLING_ROOKS_FROM_TO;
                // Hash - apply rook to new square and revert it from old square
                self.zobrist_hash ^= hasher.hash_piece[63][my_color][pieces::ROOK];
                self.zobrist_hash ^= hasher.hash_piece[61][my_color][pieces::ROOK];
            } else if last_move.start_square == 60 && last_move.end_square == 58 {
                self.bb_pieces[my_color][pieces::ROOK] ^= bitboard::BB_BQS_CASTLING_ROOKS_FROM_TO;
                self.bb_side[my_color] ^= bitboard::BB_BQS_CASTLING_ROOKS_FROM_TO;
                self.bb_occupied_squares ^= bitboard::BB_BQS_CASTLING_ROOKS_FROM_TO;
                self.bb_empty_squares ^= bitboard::BB_BQS_CASTLING_ROOKS_FROM_TO;
                // Hash - apply rook to new square and revert it from old square
                self.zobrist_hash ^= hasher.hash_piece[56][my_color][pieces::ROOK];
                self.zobrist_hash ^= hasher.hash_piece[59][my_color][pieces::ROOK];
            }
        }

        // Bitboards representing to and from squares
        let from_bb = bitboard::to_bb(last_move.start_square);
        let to_bb = bitboard::to_bb(last_move.end_square);
        let from_to_bb = from_bb ^ to_bb;

        // Undo any promotion.  For this step, we just change the promoted
        // piece back to a pawn (we don't change its board location yet).
        if let Some(promo) = last_move.promoted_piece {
            self.bb_pieces[my_color][pieces::PAWN] ^= to_bb;
            self.bb_pieces[my_color][promo] ^= to_bb;
            // Hash - remove the promoted piece from the square hash and
            // add the pawn
            self.zobrist_hash ^= hasher.hash_piece[last_move.end_square][my_color][pieces::PAWN];
            self.zobrist_hash ^= hasher.hash_piece[last_move.end_square][my_color][promo];
        }

        // Handle potential captures
        if let Some(cp) = last_move.captured_piece {
            // A capture occured
            if last_move.is_en_passant {
                // Add the captured pawn back to the board
                let captured_pawn_square: usize = if self.whites_turn {file_rank_to_square(end_file, end_rank-1)} else {file_rank_to_square(end_file, end_rank+1)};
                let captured_pawn_square_bb = bitboard::to_bb(captured_pawn_square);
                self.bb_pieces[opp_color][cp] ^= captured_pawn_square_bb;
                self.bb_side[opp_color] ^= captured_pawn_square_bb;
                self.bb_occupied_squares ^= captured_pawn_square_bb;
                self.bb_occupied_squares ^= from_to_bb;
                self.bb_empty_squares ^= captured_pawn_square_bb;
                self.bb_empty_squares ^= from_to_bb;
                // Hash - add the captured pawn to the square hash
                self.zobrist_hash ^= hasher.hash_piece[captured_pawn_square][opp_color][cp];
            } else {
                // Add the captured piece back to the board
                self.bb_pieces[opp_color][cp] ^= to_bb;
                self.bb_side[opp_color] ^= to_bb;
                self.bb_occupied_squares ^= from_bb;
                self.bb_empty_squares ^= from_bb;
                // Hash - add the captured piece to the square hash
                self.zobrist_hash ^= hasher.hash_piece[last_move.end_square][opp_color][cp];
            }
        } else {
            // There was no capture; this is a "quiet" move
            self.bb_occupied_squares ^= from_to_bb;
            self.bb_empty_squares ^= from_to_bb;
        }

        // Move the source back
        self.bb_pieces[my_color][last_move.piece] ^= from_to_bb;
        self.bb_side[my_color] ^= from_to_bb;
        // Hash - move the source back
        self.zobrist_hash ^= hasher.hash_piece[last_move.end_square][my_color][last_move.piece];
        self.zobrist_hash ^= hasher.hash_piece[last_move.start_square][my_color][last_move.piece];

    }

    // Pass the turn without moving a piece, used by null move pruning.
    // Only the side to move and the en passant rights change.
    pub fn make_null_move(&mut self) {
        let hasher = zobrist::tables();
        self.null_move_history.push(self.en_passant_rights);
        if let Some(e) = self.en_passant_rights {
            self.zobrist_hash ^= hasher.hash_en_passant[e % 8];
            self.en_passant_rights = None;
        }
        self.whites_turn = !self.whites_turn;
        self.zobrist_hash ^= hasher.hash_blacks_turn;
        self.zobrist_history.push(self.zobrist_hash);
    }

    // Undo the last null move.
    pub fn unmake_null_move(&mut self) {
        let hasher = zobrist::tables();
        self.zobrist_history.pop();
        self.zobrist_hash ^= hasher.hash_blacks_turn;
        self.whites_turn = !self.whites_turn;
        let prior = match self.null_move_history.pop() {
            Some(e) => e,
            None => panic!("Trying to unmake null move with empty null move history"),
        };
        if let Some(e) = prior {
            self.zobrist_hash ^= hasher.hash_en_passant[e % 8];
            self.en_passant_rights = Some(e);
        }
    }

    // Return a tuple representing the color and piece on a given square.
    // The will return None if the square is empty.
    pub fn get_color_and_piece_on_square(&self, square: usize) -> Option<(usize, usize)> {
        // Apply bitboards one by one to see if we get a hit
        let square_bb = bitboard::to_bb(square);
        if square_bb & self.bb_occupied_squares == 0 {
            return None;
        }
        for c in 0..2 {
            for p in 0..6 {
                if square_bb & self.bb_pieces[c][p] != 0 {
                    return Some((c, p))
                }
            }
        }
        None
    }

}

// Converts a standard square position string into a square ID.
// For instance, "a3" -> 16
pub fn square_str_to_id(square_str: &str) -> Result<usize, String> {
    let mut chars = square_str.chars();
    let file_char = chars.next().ok_or_else(|| format!("invalid square '{}'", square_str))?;
    let rank_char = chars.next().ok_or_else(|| format!("invalid square '{}'", square_str))?;
    if chars.next().is_some() {
        return Err(format!("invalid square '{}'", square_str));
    }
    let file = "abcdefgh".find(file_char).ok_or_else(|| format!("invalid file in square '{}'", square_str))?;
    let rank = match rank_char.to_digit(10) {
        Some(r) if (1..=8).contains(&r) => (r - 1) as usize,
        _ => return Err(format!("invalid rank in square '{}'", square_str)),
    };
    Ok(file_rank_to_square(file, rank))
}

// Converts a square ID back into its string form, e.g. 16 -> "a3"
pub fn square_id_to_str(square: usize) -> String {
    let file = char::from(b'a' + (square % 8) as u8);
    let rank = char::from(b'1' + (square / 8) as u8);
    let mut s = String::with_capacity(2);
    s.push(file);
    s.push(rank);
    s
}

// =====================================
//             UNIT TESTS
// =====================================
