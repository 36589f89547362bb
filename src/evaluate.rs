//! This module contains the evaluator seam and the two evaluators that
//! define this engine's playing styles, along with the draw and
//! game-over detection used by the search.
//!
//! Both evaluators return scores relative to the side to move.  Neither
//! carries traditional positional knowledge: the coverage evaluator
//! values piece activity alone, and the capture evaluator values removing
//! material from the board above all else.

use crate::bitboard;
use crate::board;
use crate::movegen;
use crate::pieces;

// Score magnitude used by the capture evaluator for decided games.
pub const CHECKMATE_VALUE: i32 = 999_999;

// Total non-king material of the standard starting position under the
// ordering weights.  Fixed; not recomputed for handicap starts.
const STARTING_MATERIAL: i32 = 78;

// Light and dark square masks, for the insufficient material rules
const BB_LIGHT_SQUARES: u64 = 0x55AA55AA55AA55AA;
const BB_DARK_SQUARES: u64 = !BB_LIGHT_SQUARES;

// Coarse game state as seen by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    InProgress,
    Checkmate,
    Draw,
}

// The evaluator seam.  The search is generic over this single operation;
// implementations may generate moves (and therefore need the board
// mutable for make/unmake legality checks) but must leave the board and
// all search state exactly as they found them.
pub trait Evaluate {
    fn evaluate(&self, board: &mut board::ChessBoard) -> i32;
}

// Look up an evaluator by its UCI option value.
pub fn evaluator_from_name(name: &str) -> Option<Box<dyn Evaluate + Send>> {
    match name {
        "coverage" => Some(Box::new(CoverageEvaluator)),
        "capture" => Some(Box::new(CaptureEvaluator)),
        _ => None,
    }
}

// Determine the coarse state of the game: in progress, checkmate of the
// side to move, or any form of draw (stalemate, insufficient material,
// threefold repetition, 50-move rule).
pub fn game_state(board: &mut board::ChessBoard) -> GameState {
    if is_draw_by_insufficient_material(board)
        || is_draw_by_threefold_repitition(board)
        || is_draw_by_fifty_moves(board) {
        return GameState::Draw;
    }
    if movegen::generate_legal_moves(board).is_empty() {
        let my_color = if board.whites_turn {pieces::COLOR_WHITE} else {pieces::COLOR_BLACK};
        if movegen::is_king_in_check(board, my_color) {
            GameState::Checkmate
        } else {
            GameState::Draw
        }
    } else {
        GameState::InProgress
    }
}

// Check if the current Zobrist hash has been repeated twice before.
// Note the hash will only be the same if its the same player's turn,
// so we can skip every other element in the list
pub fn is_draw_by_threefold_repitition(board: &board::ChessBoard) -> bool {
    let hash = board.zobrist_hash;
    let mut appearances = 0;
    let mut check = true;
    for h in board.zobrist_history.iter().rev() {
        if check && hash == *h {
            // Note that the first iteration will always be an "appearance"
            appearances += 1;
        }
        if appearances == 3 {
            return true;
        }
        check = !check;
    }
    false
}

// Neither side can force checkmate: bare kings, a lone minor piece, or
// bishops that all stand on squares of one color.
pub fn is_draw_by_insufficient_material(board: &board::ChessBoard) -> bool {
    for color in 0..2 {
        if board.bb_pieces[color][pieces::PAWN] != 0
            || board.bb_pieces[color][pieces::ROOK] != 0
            || board.bb_pieces[color][pieces::QUEEN] != 0 {
            return false;
        }
    }
    let knights = board.bb_pieces[pieces::COLOR_WHITE][pieces::KNIGHT] | board.bb_pieces[pieces::COLOR_BLACK][pieces::KNIGHT];
    let bishops = board.bb_pieces[pieces::COLOR_WHITE][pieces::BISHOP] | board.bb_pieces[pieces::COLOR_BLACK][pieces::BISHOP];
    let minor_count = bitboard::pop_count(knights) + bitboard::pop_count(bishops);
    if minor_count <= 1 {
        return true;
    }
    if knights == 0 && (bishops & BB_LIGHT_SQUARES == 0 || bishops & BB_DARK_SQUARES == 0) {
        return true;
    }
    false
}

// 50 full moves without a capture or pawn move
pub fn is_draw_by_fifty_moves(board: &board::ChessBoard) -> bool {
    board.halfmove_clock >= 100
}

// The coverage evaluator.  A piece is worth the number of squares it
// attacks, plus one more for every attacked square that is occupied.
// Mobile, active pieces dominate; there is no material understanding at
// all, which produces a hyperactive style happy to give up material for
// activity.
pub struct CoverageEvaluator;

impl Evaluate for CoverageEvaluator {
    fn evaluate(&self, board: &mut board::ChessBoard) -> i32 {
        let mut coverage = [0i32; 2];
        for color in 0..2 {
            for piece in 0..6 {
                for square in bitboard::occupied_squares(board.bb_pieces[color][piece]) {
                    let attacks = movegen::get_attack_targets_bb(board, square, color, piece);
                    coverage[color] += bitboard::pop_count(attacks) as i32
                        + bitboard::pop_count(attacks & board.bb_occupied_squares) as i32;
                }
            }
        }
        let score = coverage[pieces::COLOR_WHITE] - coverage[pieces::COLOR_BLACK];
        if board.whites_turn {score} else {-score}
    }
}

// The capture evaluator.  Its one goal is removing material from the
// board: positions are scored by how much total material has left the
// game, with a large bonus for having captures available right now.
// Stalemate and dead draws count as success, since they end the game.
pub struct CaptureEvaluator;

impl Evaluate for CaptureEvaluator {
    fn evaluate(&self, board: &mut board::ChessBoard) -> i32 {
        let legal_moves = movegen::generate_legal_moves(board);
        if legal_moves.is_empty() {
            let my_color = if board.whites_turn {pieces::COLOR_WHITE} else {pieces::COLOR_BLACK};
            return if movegen::is_king_in_check(board, my_color) {
                -CHECKMATE_VALUE
            } else {
                CHECKMATE_VALUE / 2
            };
        }
        if is_draw_by_insufficient_material(board) {
            return CHECKMATE_VALUE / 2;
        }

        // Total material of both sides, kings excluded
        let mut material = 0;
        for color in 0..2 {
            for piece in 0..5 {
                material += bitboard::pop_count(board.bb_pieces[color][piece]) as i32 * pieces::ORDERING_WEIGHTS[piece];
            }
        }
        let mut score = (STARTING_MATERIAL - material) * 10_000;

        // Reward having captures to play, punish quiet positions
        let capture_count = legal_moves.iter().filter(|m| m.captured_piece.is_some()).count() as i32;
        if capture_count > 0 {
            score += 50_000 + 10_000 * capture_count;
        } else {
            score -= 100_000;
        }
        score
    }
}

// =====================================
//             UNIT TESTS
// =====================================
