//! This module contains the move-ordering heuristics: scoring of moves
//! for better alpha-beta pruning, plus the killer-move and history
//! tables that feed the scores.
//!
//! Priority from high to low is: (1) the transposition table move,
//! (2) moves delivering checkmate, (3) checks, (4) captures by MVV-LVA,
//! (5) killer moves at this ply, (6) promotions, (7) pawn advances deep
//! into enemy territory, and (8) remaining quiet moves by their history
//! score.

use rustc_hash::FxHashMap;

use crate::board;
use crate::movegen::{self, ChessMove};
use crate::pieces;

// Deepest ply for which killer slots are kept
pub const MAX_PLY: usize = 64;

// Score bands for the move classes above
const TT_MOVE_BONUS: i32 = 1_000_000;
const CHECKMATE_BONUS: i32 = 900_000;
const CHECK_BONUS: i32 = 500_000;
const CAPTURE_BONUS: i32 = 400_000;
const KILLER_BONUS: i32 = 300_000;
const PROMOTION_BONUS: i32 = 200_000;
const PAWN_ADVANCE_BONUS: i32 = 100_000;

// Killer slots per ply plus the butterfly history map, updated on quiet
// beta cutoffs and carried across searches within a game.
pub struct OrderingTables {
    killer_moves: [[Option<ChessMove>; 2]; MAX_PLY],
    history_table: FxHashMap<(usize, usize), i32>,
}

impl OrderingTables {

    pub fn new() -> OrderingTables {
        OrderingTables {
            killer_moves: [[None; 2]; MAX_PLY],
            history_table: FxHashMap::default(),
        }
    }

    pub fn clear(&mut self) {
        self.killer_moves = [[None; 2]; MAX_PLY];
        self.history_table.clear();
    }

    pub fn is_killer(&self, m: &ChessMove, ply: usize) -> bool {
        ply < MAX_PLY && self.killer_moves[ply].contains(&Some(*m))
    }

    // Record a quiet move that caused a beta cutoff.  The newest killer
    // sits in slot 0; re-adding the current slot 0 is a no-op.  Captures
    // never enter the table.
    pub fn update_killer_moves(&mut self, m: ChessMove, ply: usize) {
        if m.captured_piece.is_some() || ply >= MAX_PLY {
            return;
        }
        if self.killer_moves[ply][0] != Some(m) {
            self.killer_moves[ply][1] = self.killer_moves[ply][0];
            self.killer_moves[ply][0] = Some(m);
        }
    }

    // Bump the (from, to) counter of a quiet cutoff move by depth^2, so
    // cutoffs found near the root weigh more.
    pub fn update_history(&mut self, m: &ChessMove, depth: u8) {
        let bonus = depth as i32 * depth as i32;
        *self.history_table.entry((m.start_square, m.end_square)).or_insert(0) += bonus;
    }

    pub fn history_value(&self, m: &ChessMove) -> i32 {
        self.history_table.get(&(m.start_square, m.end_square)).copied().unwrap_or(0)
    }

}

// Most Valuable Victim - Least Valuable Attacker score of a capture,
// using the ordering weights.  Non-captures score 0.
pub fn mvv_lva_score(m: &ChessMove) -> i32 {
    match m.captured_piece {
        Some(victim) => pieces::ORDERING_WEIGHTS[victim] * 10 - pieces::ORDERING_WEIGHTS[m.piece],
        None => 0,
    }
}

// Sort capture moves in place, best victims first.  Used by the
// quiescence search, which considers nothing else.
pub fn order_captures(moves: &mut [ChessMove]) {
    moves.sort_unstable_by(|a, b| mvv_lva_score(b).cmp(&mvv_lva_score(a)));
}

// Score and sort the given legal moves, highest priority first.
pub fn order_moves(board: &mut board::ChessBoard, moves: Vec<ChessMove>, ply: usize, tt_move: Option<ChessMove>, tables: &OrderingTables) -> Vec<ChessMove> {
    let mut scored: Vec<(i32, ChessMove)> = moves.into_iter()
        .map(|m| (score_move(board, &m, ply, tt_move, tables), m))
        .collect();
    scored.sort_unstable_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, m)| m).collect()
}

fn score_move(board: &mut board::ChessBoard, m: &ChessMove, ply: usize, tt_move: Option<ChessMove>, tables: &OrderingTables) -> i32 {

    // The transposition table move outranks everything
    if tt_move == Some(*m) {
        return TT_MOVE_BONUS;
    }

    // Checking moves come next, mating ones first of all.  This is
    // decided before the capture class, so a capture that also checks is
    // scored as a check.
    board.make_move(m.start_square, m.end_square, m.promotion);
    let defender = if board.whites_turn {pieces::COLOR_WHITE} else {pieces::COLOR_BLACK};
    let gives_check = movegen::is_king_in_check(board, defender);
    let gives_checkmate = gives_check && movegen::generate_legal_moves(board).is_empty();
    board.unmake_move();
    if gives_checkmate {
        return CHECKMATE_BONUS;
    }
    if gives_check {
        return CHECK_BONUS;
    }

    if m.captured_piece.is_some() {
        return CAPTURE_BONUS + mvv_lva_score(m);
    }

    if tables.is_killer(m, ply) {
        return KILLER_BONUS;
    }

    if let Some(promo) = m.promotion {
        return PROMOTION_BONUS + pieces::ORDERING_WEIGHTS[promo];
    }

    if m.piece == pieces::PAWN {
        // Quiet pawn advances deep into enemy territory get a bonus
        // scaled by how far they reach; other quiet pawn moves sit at
        // the bottom of the ordering.
        let to_rank = (m.end_square / 8) as i32;
        if board.whites_turn && to_rank >= 5 {
            return PAWN_ADVANCE_BONUS + to_rank * 1000;
        } else if !board.whites_turn && to_rank <= 2 {
            return PAWN_ADVANCE_BONUS + (7 - to_rank) * 1000;
        }
        return 0;
    }

    tables.history_value(m)
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::board::ChessBoard;
    use crate::movegen::{generate_legal_moves, parse_uci_move};

    fn quiet_move(board: &mut ChessBoard, uci: &str) -> ChessMove {
        let m = parse_uci_move(board, uci).unwrap();
        assert!(m.captured_piece.is_none());
        m
    }

    #[test]
    fn test_tt_move_ranks_first() {
        let mut board = ChessBoard::new();
        board.new_game();
        let tables = OrderingTables::new();
        let moves = generate_legal_moves(&mut board);
        let tt_move = moves.iter().find(|m| m.uci() == "a2a3").copied();
        let ordered = order_moves(&mut board, moves, 0, tt_move, &tables);
        assert_eq!(Some(ordered[0]), tt_move);
    }

    #[test]
    fn test_captures_ordered_by_mvv_lva() {
        // Pawn takes queen must come before rook takes knight, and both
        // captures before every quiet move.  Neither capture checks.
        let mut board = ChessBoard::new();
        board.set_from_fen("7k/8/8/q2n4/1P6/8/8/3R2K1 w - - 0 1").unwrap();
        let queen_grab = parse_uci_move(&mut board, "b4a5").unwrap();
        let knight_grab = parse_uci_move(&mut board, "d1d5").unwrap();
        assert_eq!(mvv_lva_score(&queen_grab), 9 * 10 - 1);
        assert_eq!(mvv_lva_score(&knight_grab), 3 * 10 - 5);
        let tables = OrderingTables::new();
        let moves = generate_legal_moves(&mut board);
        let ordered = order_moves(&mut board, moves, 0, None, &tables);
        assert_eq!(ordered[0], queen_grab);
        assert_eq!(ordered[1], knight_grab);
        assert!(ordered[2..].iter().all(|m| m.captured_piece.is_none()));
    }

    #[test]
    fn test_checkmate_outranks_check_and_captures() {
        // Ladder mate: Rb8 is mate; the plain checks (including the
        // rook's capture of the h7 pawn) follow it in the ordering.
        let mut board = ChessBoard::new();
        board.set_from_fen("7k/R6p/8/8/8/8/7B/1R5K w - - 0 1").unwrap();
        let tables = OrderingTables::new();
        let moves = generate_legal_moves(&mut board);
        let ordered = order_moves(&mut board, moves, 0, None, &tables);
        assert_eq!(ordered[0].uci(), "b1b8");
        // The checking moves (Ra8+, Rxh7+ and Be5+) fill the next band,
        // in some order.
        let checks: Vec<String> = ordered[1..4].iter().map(|m| m.uci()).collect();
        assert!(checks.contains(&"a7a8".to_string()));
        assert!(checks.contains(&"a7h7".to_string()));
        assert!(checks.contains(&"h2e5".to_string()));
        // Everything after the check band is quiet and capture-free
        assert!(ordered[4..].iter().all(|m| m.captured_piece.is_none()));
    }

    #[test]
    fn test_killer_slots() {
        let mut board = ChessBoard::new();
        board.new_game();
        let mut tables = OrderingTables::new();
        let a = quiet_move(&mut board, "a2a3");
        let b = quiet_move(&mut board, "b2b3");
        tables.update_killer_moves(a, 3);
        assert!(tables.is_killer(&a, 3));
        assert!(!tables.is_killer(&a, 4));
        // Re-adding the newest killer is a no-op
        tables.update_killer_moves(a, 3);
        assert_eq!(tables.killer_moves[3], [Some(a), None]);
        // A new killer shifts the old one into slot 1
        tables.update_killer_moves(b, 3);
        assert_eq!(tables.killer_moves[3], [Some(b), Some(a)]);
        assert!(tables.is_killer(&a, 3));
    }

    #[test]
    fn test_killers_reject_captures() {
        let mut board = ChessBoard::new();
        board.new_game();
        board.make_move(12, 28, None); // e4
        board.make_move(51, 35, None); // d5
        let mut tables = OrderingTables::new();
        let capture = parse_uci_move(&mut board, "e4d5").unwrap();
        assert!(capture.captured_piece.is_some());
        tables.update_killer_moves(capture, 0);
        assert!(!tables.is_killer(&capture, 0));
    }

    #[test]
    fn test_history_accumulates() {
        let mut board = ChessBoard::new();
        board.new_game();
        let mut tables = OrderingTables::new();
        let m = quiet_move(&mut board, "g1f3");
        assert_eq!(tables.history_value(&m), 0);
        tables.update_history(&m, 3);
        assert_eq!(tables.history_value(&m), 9);
        tables.update_history(&m, 2);
        assert_eq!(tables.history_value(&m), 13);
        // History entries never go negative
        assert!(tables.history_value(&m) >= 0);
    }

    #[test]
    fn test_killer_ranks_above_plain_quiet_moves() {
        let mut board = ChessBoard::new();
        board.new_game();
        let mut tables = OrderingTables::new();
        let killer = quiet_move(&mut board, "h2h3");
        tables.update_killer_moves(killer, 0);
        let moves = generate_legal_moves(&mut board);
        let ordered = order_moves(&mut board, moves, 0, None, &tables);
        assert_eq!(ordered[0], killer);
    }

    #[test]
    fn test_pawn_advance_bonus() {
        // A quiet white pawn push to the 6th rank outranks other quiet
        // moves but stays below the killer band.
        let mut board = ChessBoard::new();
        board.set_from_fen("4k3/8/8/4P3/8/8/1P6/4K3 w - - 0 1").unwrap();
        let tables = OrderingTables::new();
        let advance = quiet_move(&mut board, "e5e6");
        let score = score_move(&mut board, &advance, 0, None, &tables);
        assert_eq!(score, PAWN_ADVANCE_BONUS + 5 * 1000);
        let small_push = quiet_move(&mut board, "b2b3");
        assert_eq!(score_move(&mut board, &small_push, 0, None, &tables), 0);
    }

    #[test]
    fn test_promotion_scoring() {
        // A quiet promotion (no capture, no check) scores in the
        // promotion band, queen ahead of knight.
        let mut board = ChessBoard::new();
        board.set_from_fen("8/1P5k/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let tables = OrderingTables::new();
        let queen_promo = parse_uci_move(&mut board, "b7b8q").unwrap();
        let knight_promo = parse_uci_move(&mut board, "b7b8n").unwrap();
        let qs = score_move(&mut board, &queen_promo, 0, None, &tables);
        let ns = score_move(&mut board, &knight_promo, 0, None, &tables);
        assert_eq!(qs, PROMOTION_BONUS + 9);
        assert_eq!(ns, PROMOTION_BONUS + 3);
    }
}
