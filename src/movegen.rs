//! This module contains functions related to piece movement and
//! move legality checking.

use crate::bitboard;
use crate::board;
use crate::pieces;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChessMove {

    // Starting square of the piece being moved
    pub start_square: usize,

    // Ending square of the piece being moved
    pub end_square: usize,

    // Piece type of the piece being moved
    pub piece: usize,

    // Captured piece, or None if no capture made
    pub captured_piece: Option<usize>,

    // Piece a pawn is promoting to, if this move is a promotion
    pub promotion: Option<usize>,

    // Whether or not this is an en passant capture
    pub is_en_passant: bool,

}

impl ChessMove {

    // Render the move in UCI long algebraic notation, e.g. "e2e4"
    // or "e7e8q".  Castling is the king's two-square move.
    pub fn uci(&self) -> String {
        let mut s = board::square_id_to_str(self.start_square);
        s.push_str(&board::square_id_to_str(self.end_square));
        if let Some(p) = self.promotion {
            if let Some(c) = pieces::piece_to_promotion_char(p) {
                s.push(c);
            }
        }
        s
    }

}

// Parse a single UCI long algebraic move string ("e2e4", "e7e8q") and
// resolve it against the legal moves of the given position.  Errors on
// malformed strings and on moves that are not legal on this board.
pub fn parse_uci_move(board: &mut board::ChessBoard, move_str: &str) -> Result<ChessMove, String> {
    if !move_str.is_ascii() || move_str.len() < 4 || move_str.len() > 5 {
        return Err(format!("malformed move '{}'", move_str));
    }
    let start_square = board::square_str_to_id(&move_str[0..2])?;
    let end_square = board::square_str_to_id(&move_str[2..4])?;
    let promotion = match move_str.chars().nth(4) {
        Some(c) => Some(pieces::promotion_char_to_piece(c).ok_or_else(|| format!("invalid promotion in '{}'", move_str))?),
        None => None,
    };
    generate_legal_moves(board).into_iter()
        .find(|m| m.start_square == start_square && m.end_square == end_square && m.promotion == promotion)
        .ok_or_else(|| format!("illegal move '{}'", move_str))
}

// Get any pawn push moves for a color from a starting location.
fn get_pawn_push_targets_bb(color: usize, empty: u64, square: usize) -> u64 {
    let pawn_bb = bitboard::to_bb(square);
    let single_push_bb = if color == pieces::COLOR_WHITE {bitboard::north_one(pawn_bb) & empty} else {bitboard::south_one(pawn_bb) & empty};
    let double_push_bb = if color == pieces::COLOR_WHITE {bitboard::north_one(single_push_bb) & empty & bitboard::BB_4RANK} else {bitboard::south_one(single_push_bb) & empty & bitboard::BB_5RANK};
    single_push_bb | double_push_bb
}

// Get any king target square related to castling.  Castling is only
// offered when the appropriate rights remain, the squares between king
// and rook are empty, and neither the king's square nor the square it
// passes through is attacked.  The landing square is covered by the
// standard legality filter.
fn get_castling_king_targets_bb(board: &board::ChessBoard, color: usize, occ: u64) -> u64 {
    let mut king_castling_bb: u64 = 0;
    let opp_color = 1 - color;
    if color == pieces::COLOR_WHITE {
        if board.white_ks_castling_rights
            && bitboard::BB_WKS_BETWEEN & occ == 0
            && !is_square_attacked_by_side(board, 4, opp_color)
            && !is_square_attacked_by_side(board, 5, opp_color) {
            king_castling_bb |= bitboard::BB_WKS_KING_END;
        }
        if board.white_qs_castling_rights
            && bitboard::BB_WQS_BETWEEN & occ == 0
            && !is_square_attacked_by_side(board, 4, opp_color)
            && !is_square_attacked_by_side(board, 3, opp_color) {
            king_castling_bb |= bitboard::BB_WQS_KING_END;
        }
    } else {
        if board.black_ks_castling_rights
            && bitboard::BB_BKS_BETWEEN & occ == 0
            && !is_square_attacked_by_side(board, 60, opp_color)
            && !is_square_attacked_by_side(board, 61, opp_color) {
            king_castling_bb |= bitboard::BB_BKS_KING_END;
        }
        if board.black_qs_castling_rights
            && bitboard::BB_BQS_BETWEEN & occ == 0
            && !is_square_attacked_by_side(board, 60, opp_color)
            && !is_square_attacked_by_side(board, 59, opp_color) {
            king_castling_bb |= bitboard::BB_BQS_KING_END;
        }
    }
    king_castling_bb
}

// Get all diagonal attacks (bottom left to top right) from a starting
// location, using Kindergarten bitboard lookups.
pub fn get_diagonal_attacks_bb(occ: u64, square: usize) -> u64 {
    let tmp_occ = (bitboard::BB_DIAGONAL_MASK[square] & occ).wrapping_mul(bitboard::BB_FILES[0]).wrapping_shr(56);
    let first_rank_bb = bitboard::BB_FIRST_RANK_ATTACKS[square & 7][tmp_occ as usize] as u64;
    bitboard::BB_DIAGONAL_MASK[square] & bitboard::BB_FILES[0].wrapping_mul(first_rank_bb)
}

// Get all anti-diagonal attacks (top left to bottom right) from a
// starting location.
pub fn get_antidiagonal_attacks_bb(occ: u64, square: usize) -> u64 {
    let tmp_occ = (bitboard::BB_ANTIDIAGONAL_MASK[square] & occ).wrapping_mul(bitboard::BB_FILES[0]).wrapping_shr(56);
    let first_rank_bb = bitboard::BB_FIRST_RANK_ATTACKS[square & 7][tmp_occ as usize] as u64;
    bitboard::BB_ANTIDIAGONAL_MASK[square] & bitboard::BB_FILES[0].wrapping_mul(first_rank_bb)
}

// Get all rank attacks from a starting location
pub fn get_rank_attacks_bb(occ: u64, square: usize) -> u64 {
    let tmp_occ = (bitboard::BB_RANK_MASK[square] & occ).wrapping_mul(bitboard::BB_FILES[0]).wrapping_shr(56);
    let first_rank_bb = bitboard::BB_FIRST_RANK_ATTACKS[square & 7][tmp_occ as usize] as u64;
    bitboard::BB_RANK_MASK[square] & bitboard::BB_FILES[0].wrapping_mul(first_rank_bb)
}

// Get all file attacks from a starting location
pub fn get_file_attacks_bb(occ: u64, square: usize) -> u64 {
    let tmp_square = square & 7;
    let mut tmp_occ = bitboard::BB_FILES[0] & occ.wrapping_shr(tmp_square as u32);
    tmp_occ = bitboard::BB_MAIN_DIAGONAL.wrapping_mul(tmp_occ).wrapping_shr(56);
    let index = (square ^ 56).wrapping_shr(3);
    let first_rank_bb = bitboard::BB_FIRST_RANK_ATTACKS[index][tmp_occ as usize] as u64;
    tmp_occ = bitboard::BB_MAIN_DIAGONAL.wrapping_mul(first_rank_bb);
    (bitboard::BB_FILES[7] & tmp_occ).wrapping_shr((tmp_square ^ 7) as u32)
}

// Return the attack set of the piece sitting on the given square: every
// square it attacks, regardless of what occupies the target.  Sliding
// rays include the first blocker of either color.  Pawn attack sets are
// the two capture diagonals, never the pushes.
pub fn get_attack_targets_bb(board: &board::ChessBoard, square: usize, color: usize, piece: usize) -> u64 {
    match piece {
        pieces::PAWN => bitboard::BB_PAWN_ATTACKS[color][square],
        pieces::KNIGHT => bitboard::BB_KNIGHT_ATTACKS[square],
        pieces::KING => bitboard::BB_KING_ATTACKS[square],
        pieces::BISHOP => get_diagonal_attacks_bb(board.bb_occupied_squares, square) | get_antidiagonal_attacks_bb(board.bb_occupied_squares, square),
        pieces::ROOK => get_rank_attacks_bb(board.bb_occupied_squares, square) | get_file_attacks_bb(board.bb_occupied_squares, square),
        pieces::QUEEN => {
            get_diagonal_attacks_bb(board.bb_occupied_squares, square)
                | get_antidiagonal_attacks_bb(board.bb_occupied_squares, square)
                | get_rank_attacks_bb(board.bb_occupied_squares, square)
                | get_file_attacks_bb(board.bb_occupied_squares, square)
        },
        _ => panic!("Invalid piece in get_attack_targets_bb"),
    }
}

// Determine the opponent's piece that is being captured
fn get_opponents_captured_piece(opp_bbs: &[u64; 6], capture_square: usize, is_en_passant: bool) -> usize {
    if is_en_passant {
        return pieces::PAWN;
    }
    let capture_bb = bitboard::to_bb(capture_square);
    for (opp_piece, opp_bb) in opp_bbs.iter().enumerate() {
        if opp_bb & capture_bb != 0 {
            return opp_piece;
        }
    }
    panic!("Invalid bitboard; cannot find opponents captured piece");
}

// Push a move into the target list, expanding pawn moves onto the last
// rank into the four possible promotions.
fn push_move(moves: &mut Vec<ChessMove>, start_square: usize, end_square: usize, piece: usize, captured_piece: Option<usize>, is_en_passant: bool) {
    let end_rank = end_square / 8;
    if piece == pieces::PAWN && (end_rank == 0 || end_rank == 7) {
        for promo in [pieces::QUEEN, pieces::ROOK, pieces::BISHOP, pieces::KNIGHT] {
            moves.push(ChessMove {
                start_square,
                end_square,
                piece,
                captured_piece,
                promotion: Some(promo),
                is_en_passant,
            });
        }
    } else {
        moves.push(ChessMove {
            start_square,
            end_square,
            piece,
            captured_piece,
            promotion: None,
            is_en_passant,
        });
    }
}

// Generate all psuedo-legal moves for a given color.
// A psuedo-legal move is an otherwise legal move that has not yet been
// checked to determine if it leaves the player's king in check.
pub fn generate_all_psuedo_legal_moves(board: &board::ChessBoard, my_color: usize) -> Vec<ChessMove> {

    let mut capture_moves = Vec::new();
    let mut quiet_moves = Vec::new();

    // Get colors
    let opp_color = 1 - my_color;

    // Create the en passant bitboard, which will be 0 if no en passant
    // rights exist
    let mut en_passant_bb = 0;
    if let Some(e) = board.en_passant_rights {
        en_passant_bb = bitboard::to_bb(e);
    }

    // Loop through each of our bitboards to generate a set of pseudo-legal moves
    for (piece, bb) in board.bb_pieces[my_color].iter().enumerate() {
        for square in bitboard::occupied_squares(*bb) {

            // Store state regarding an en passant capture
            let mut is_en_passant = false;

            // Get quite (i.e., non-capture) and capture move bitboards for the piece
            let quite_move_bb;
            let capture_move_bb;
            if piece == pieces::PAWN {
                quite_move_bb = get_pawn_push_targets_bb(my_color, board.bb_empty_squares, square);
                if bitboard::BB_PAWN_ATTACKS[my_color][square] & en_passant_bb != 0 {
                    is_en_passant = true;
                }
                capture_move_bb = bitboard::BB_PAWN_ATTACKS[my_color][square] & (board.bb_side[opp_color] | en_passant_bb);
            } else if piece == pieces::KING {
                let king_attacks = bitboard::BB_KING_ATTACKS[square];
                quite_move_bb = (king_attacks & board.bb_empty_squares) | get_castling_king_targets_bb(board, my_color, board.bb_occupied_squares);
                capture_move_bb = king_attacks & board.bb_side[opp_color];
            } else {
                let attacks = get_attack_targets_bb(board, square, my_color, piece);
                quite_move_bb = attacks & board.bb_empty_squares;
                capture_move_bb = attacks & board.bb_side[opp_color];
            }

            // First get non-capture moves
            for m in bitboard::occupied_squares(quite_move_bb) {
                push_move(&mut quiet_moves, square, m, piece, None, false);
            }

            // Next get capture moves
            for m in bitboard::occupied_squares(capture_move_bb) {
                // Figure out the piece that is being captured
                let ep_capture = is_en_passant && en_passant_bb == bitboard::to_bb(m);
                let cap = get_opponents_captured_piece(&board.bb_pieces[opp_color], m, ep_capture);
                push_move(&mut capture_moves, square, m, piece, Some(cap), ep_capture);
            }

        }
    }

    // Order capture moves first (by appending quiet moves to the end)
    // This will get re-sorted anyway, but may make the re-sort faster.
    capture_moves.append(&mut quiet_moves);
    capture_moves
}

// Determines whether a square is attacked by any piece of a given side
pub fn is_square_attacked_by_side(board: &board::ChessBoard, square: usize, by_side_color: usize) -> bool {
    let pawns = board.bb_pieces[by_side_color][pieces::PAWN];
    if bitboard::BB_PAWN_ATTACKS[1 - by_side_color][square] & pawns != 0 {
        return true;
    }
    let knights = board.bb_pieces[by_side_color][pieces::KNIGHT];
    if bitboard::BB_KNIGHT_ATTACKS[square] & knights != 0 {
        return true;
    }
    let king = board.bb_pieces[by_side_color][pieces::KING];
    if bitboard::BB_KING_ATTACKS[square] & king != 0 {
        return true;
    }
    let bishops_queens = board.bb_pieces[by_side_color][pieces::BISHOP] | board.bb_pieces[by_side_color][pieces::QUEEN];
    if (get_diagonal_attacks_bb(board.bb_occupied_squares, square) | get_antidiagonal_attacks_bb(board.bb_occupied_squares, square)) & bishops_queens != 0 {
        return true;
    }
    let rooks_queens = board.bb_pieces[by_side_color][pieces::ROOK] | board.bb_pieces[by_side_color][pieces::QUEEN];
    if (get_rank_attacks_bb(board.bb_occupied_squares, square) | get_file_attacks_bb(board.bb_occupied_squares, square)) & rooks_queens != 0 {
        return true;
    }
    false
}

// Check whether or not the king of the passed in color is in check
pub fn is_king_in_check(board: &board::ChessBoard, king_color: usize) -> bool {
    let king_square = match bitboard::bit_scan_forward(board.bb_pieces[king_color][pieces::KING]) {
        Some(e) => e,
        None => panic!("Cannot find king on bitboard"),
    };
    is_square_attacked_by_side(board, king_square, 1 - king_color)
}

// Modify the passed in moves vector to keep only moves that don't leave
// player's king in check.
pub fn retain_only_legal_moves(board: &mut board::ChessBoard, moves: &mut Vec<ChessMove>) {
    let my_color = if board.whites_turn {pieces::COLOR_WHITE} else {pieces::COLOR_BLACK};
    moves.retain(|m| {
        board.make_move(m.start_square, m.end_square, m.promotion);
        let keepit = !is_king_in_check(board, my_color);
        board.unmake_move();
        keepit
    });
}

// Generate all fully legal moves for the side to move.
pub fn generate_legal_moves(board: &mut board::ChessBoard) -> Vec<ChessMove> {
    let my_color = if board.whites_turn {pieces::COLOR_WHITE} else {pieces::COLOR_BLACK};
    let mut moves = generate_all_psuedo_legal_moves(board, my_color);
    retain_only_legal_moves(board, &mut moves);
    moves
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use crate::board::ChessBoard;
    use super::*;

    fn get_number_of_valid_moves(board: &mut ChessBoard, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }
        let mut move_count = 0;
        let moves = generate_legal_moves(board);
        for m in moves.iter() {
            board.make_move(m.start_square, m.end_square, m.promotion);
            move_count += get_number_of_valid_moves(board, depth - 1);
            board.unmake_move();
        }
        move_count
    }

    // Test the number of valid moves from the starting position
    #[test]
    fn test_perft() {
        let results = vec![1, 20, 400, 8902, 197281];
        let mut board = ChessBoard::new();
        board.new_game();
        for (depth, expected) in results.iter().enumerate() {
            let moves = get_number_of_valid_moves(&mut board, depth);
            assert_eq!(moves, *expected);
        }
    }

    // Castling, en passant and pin handling, from the well known
    // "kiwipete" position
    #[test]
    fn test_perft_kiwipete() {
        let results = vec![1, 48, 2039, 97862];
        let mut board = ChessBoard::new();
        board.set_from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        for (depth, expected) in results.iter().enumerate() {
            let moves = get_number_of_valid_moves(&mut board, depth);
            assert_eq!(moves, *expected);
        }
    }

    // Promotion-heavy position
    #[test]
    fn test_perft_promotions() {
        let results = vec![1, 24, 496, 9483];
        let mut board = ChessBoard::new();
        board.set_from_fen("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1").unwrap();
        for (depth, expected) in results.iter().enumerate() {
            let moves = get_number_of_valid_moves(&mut board, depth);
            assert_eq!(moves, *expected);
        }
    }

    // Test a capture
    #[test]
    fn test_capture() {
        let mut board = ChessBoard::new();
        board.new_game();
        board.make_move(12, 28, None); // e4
        board.make_move(51, 35, None); // d5
        let moves = generate_legal_moves(&mut board);
        let captures = moves.iter().filter(|m| m.captured_piece.is_some()).count();
        assert_eq!(captures, 1);
    }

    #[test]
    fn test_castling_through_check_is_illegal() {
        // Black rook on f8 covers f1; white may not castle kingside but
        // may castle queenside.
        let mut board = ChessBoard::new();
        board.set_from_fen("5rk1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = generate_legal_moves(&mut board);
        assert!(!moves.iter().any(|m| m.piece == pieces::KING && m.start_square == 4 && m.end_square == 6));
        assert!(moves.iter().any(|m| m.piece == pieces::KING && m.start_square == 4 && m.end_square == 2));
    }

    #[test]
    fn test_attack_targets() {
        let mut board = ChessBoard::new();
        board.new_game();
        // A rook in the corner of the starting position attacks only the
        // two adjacent occupied squares.
        let rook_attacks = get_attack_targets_bb(&board, 0, pieces::COLOR_WHITE, pieces::ROOK);
        assert_eq!(rook_attacks, bitboard::to_bb(1) | bitboard::to_bb(8));
        // A knight on b1 attacks a3, c3 and d2 (own pawn included)
        let knight_attacks = get_attack_targets_bb(&board, 1, pieces::COLOR_WHITE, pieces::KNIGHT);
        assert_eq!(knight_attacks, bitboard::to_bb(16) | bitboard::to_bb(18) | bitboard::to_bb(11));
        board.make_move(12, 28, None); // e4
        // The f1 bishop now sees the e2 diagonal out to a6
        let bishop_attacks = get_attack_targets_bb(&board, 5, pieces::COLOR_WHITE, pieces::BISHOP);
        assert_eq!(bishop_attacks, bitboard::to_bb(12) | bitboard::to_bb(19) | bitboard::to_bb(26)
            | bitboard::to_bb(33) | bitboard::to_bb(40) | bitboard::to_bb(14));
    }

    #[test]
    fn test_uci_move_codec() {
        let mut board = ChessBoard::new();
        board.new_game();
        let m = parse_uci_move(&mut board, "e2e4").unwrap();
        assert_eq!(m.start_square, 12);
        assert_eq!(m.end_square, 28);
        assert_eq!(m.uci(), "e2e4");
        assert!(parse_uci_move(&mut board, "e2e5").is_err());
        assert!(parse_uci_move(&mut board, "e2").is_err());
        assert!(parse_uci_move(&mut board, "e7e8x").is_err());

        // Promotions parse and render with their suffix
        board.set_from_fen("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let promo = parse_uci_move(&mut board, "e7e8n").unwrap();
        assert_eq!(promo.promotion, Some(pieces::KNIGHT));
        assert_eq!(promo.uci(), "e7e8n");
    }

    #[test]
    fn test_en_passant_capture_generated() {
        let mut board = ChessBoard::new();
        board.set_from_fen("4k3/8/8/8/4p3/8/3P4/4K3 w - - 0 1").unwrap();
        board.make_move(11, 27, None); // d2d4, giving black en passant rights
        assert_eq!(board.en_passant_rights, Some(19));
        let moves = generate_legal_moves(&mut board);
        let ep = moves.iter().find(|m| m.is_en_passant).expect("en passant capture must exist");
        assert_eq!(ep.start_square, 28);
        assert_eq!(ep.end_square, 19);
        assert_eq!(ep.captured_piece, Some(pieces::PAWN));
    }
}
