//! This module contains all functionality related to searching the
//! chess board.  The core is a negamax implementation with alpha-beta
//! pruning, arranged as a principal variation search: after the first
//! move of a node the remaining moves are tried with a null window and
//! re-searched only when they beat it.
//!
//! A transposition table (TT) stores results of previously searched
//! nodes, null-move pruning skips subtrees where even passing beats
//! beta, and a quiescence search extends capture sequences past the
//! horizon.  Iterative deepening drives the whole thing, feeding each
//! depth's best move back into the next one's move ordering.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use crate::board;
use crate::evaluate;
use crate::movegen::{self, ChessMove};
use crate::ordering;
use crate::pieces;
use crate::timeman;
use crate::tt;
use crate::uci;

// Scores for terminal states and infinity
const MATE_SCORE: i32 = 30_000;
const INF: i32 = 10_000_000;

// Quiescence never extends further than this many plies
const MAX_QUIESCENCE_DEPTH: u8 = 8;

// Null move pruning searches a subtree this much shallower
const NULL_MOVE_REDUCTION: u8 = 3;

// Defaults for the UCI-configurable knobs
pub const DEFAULT_MAX_DEPTH: u8 = 6;
pub const DEFAULT_TT_SIZE_MB: usize = 128;

// The main engine
pub struct SearchEngine {

    // The game board
    board: board::ChessBoard,

    // The position evaluator in use; the search is generic over it
    evaluator: Box<dyn evaluate::Evaluate + Send>,

    // Configured iterative deepening ceiling
    max_depth: u8,

    // The transposition table
    tt: tt::TranspositionTable,

    // Killer and history tables for move ordering
    tables: ordering::OrderingTables,

    // Deadline and stop handling for the running search
    clock: timeman::SearchClock,

    // Nodes visited in the current search
    nodes_searched: u64,

    // Search number, grows monotonically and ages TT entries
    age: u32,

}

impl SearchEngine {

    // Construct a new SearchEngine.  The stop flag is shared with the
    // UCI front end, which sets it when the host requests a stop.
    pub fn new(stop: Arc<AtomicBool>) -> SearchEngine {
        let mut board = board::ChessBoard::new();
        board.new_game();
        SearchEngine {
            board,
            evaluator: Box::new(evaluate::CoverageEvaluator),
            max_depth: DEFAULT_MAX_DEPTH,
            tt: tt::TranspositionTable::new(DEFAULT_TT_SIZE_MB),
            tables: ordering::OrderingTables::new(),
            clock: timeman::SearchClock::new(stop),
            nodes_searched: 0,
            age: 0,
        }
    }

    // Start a new game: reset the board and forget everything learned
    pub fn new_game(&mut self) {
        self.board.new_game();
        self.tt.clear();
        self.tables.clear();
    }

    // Install a position prepared by the UCI front end
    pub fn set_board(&mut self, board: board::ChessBoard) {
        self.board = board;
    }

    pub fn white_to_move(&self) -> bool {
        self.board.whites_turn
    }

    pub fn set_max_depth(&mut self, depth: u8) {
        self.max_depth = depth;
    }

    // Changing the size rebuilds the table
    pub fn set_tt_size(&mut self, size_mb: usize) {
        self.tt = tt::TranspositionTable::new(size_mb);
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn evaluate::Evaluate + Send>) {
        self.evaluator = evaluator;
    }

    // This returns the engine's top move using an iterative deepening
    // search.  Times are in seconds; a non-positive time_left means no
    // deadline.  A depth_override caps the deepening for this search
    // only and disables the deadline, as a depth-forced "go" does.
    pub fn find_best_move(&mut self, time_left: f64, increment: f64, depth_override: Option<u8>) -> Option<ChessMove> {

        if evaluate::game_state(&mut self.board) != evaluate::GameState::InProgress {
            return None;
        }

        let max_depth = depth_override.unwrap_or(self.max_depth).max(1);
        if depth_override.is_some() {
            self.clock.start(0.0, 0.0);
        } else {
            self.clock.start(time_left, increment);
        }
        self.nodes_searched = 0;
        self.age += 1;

        let mut best_move = None;
        for depth in 1..=max_depth {
            if self.clock.is_time_up() || self.clock.stop_requested() {
                break;
            }

            let iteration_start = Instant::now();
            let (value, mv) = self.search(depth, -INF, INF, 0, true);
            let iteration_time = iteration_start.elapsed();

            if self.clock.is_time_up() {
                // The interrupted iteration's result is discarded; the
                // previously completed depth stands.
                break;
            }

            if let Some(m) = mv {
                best_move = Some(m);
                let nps = (self.nodes_searched as f64 / iteration_time.as_secs_f64().max(0.001)) as u64;
                uci::send(&format!(
                    "info depth {} score cp {} nodes {} nps {} time {} pv {}",
                    depth, value, self.nodes_searched, nps, iteration_time.as_millis(), m.uci()
                ));
            }
        }

        uci::send(&format!(
            "info string Search completed in {:.3}s, {} nodes",
            self.clock.elapsed().as_secs_f64(), self.nodes_searched
        ));

        if best_move.is_none() {
            // Not even depth 1 completed; any legal move beats none
            best_move = movegen::generate_legal_moves(&mut self.board).into_iter().next();
        }
        best_move
    }

    // The principal variation search.  Returns the node value and the
    // best move found, if any.  "ply" is the distance from the root,
    // "depth" the amount left to search.
    fn search(&mut self, depth: u8, mut alpha: i32, beta: i32, ply: u8, allow_null: bool) -> (i32, Option<ChessMove>) {

        // Out of time: unwind with a throwaway value and no TT store
        if self.clock.is_time_up() {
            return (self.evaluator.evaluate(&mut self.board), None);
        }

        // Terminal nodes.  Deeper mates score worse, so the search
        // prefers the shortest one.
        match evaluate::game_state(&mut self.board) {
            evaluate::GameState::Checkmate => return (-MATE_SCORE + ply as i32, None),
            evaluate::GameState::Draw => return (0, None),
            evaluate::GameState::InProgress => {}
        }

        // At the horizon, resolve captures before trusting the eval
        if depth == 0 {
            return (self.quiesce(alpha, beta, 0), None);
        }

        self.nodes_searched += 1;
        let zobrist_key = self.board.zobrist_hash;
        let alpha_orig = alpha;

        // Check the transposition table for a usable value; even a
        // depth-insufficient entry contributes its move for ordering
        let (tt_value, tt_move) = self.tt.probe(zobrist_key, depth, alpha, beta);
        if let Some(value) = tt_value {
            return (value, tt_move);
        }

        // Null move pruning: if passing the turn still beats beta with a
        // reduced search, the opponent will avoid this line.  Skipped in
        // check and in back-to-back nulls.
        let my_color = if self.board.whites_turn {pieces::COLOR_WHITE} else {pieces::COLOR_BLACK};
        if allow_null && depth >= 3 && !movegen::is_king_in_check(&self.board, my_color)
            && self.evaluator.evaluate(&mut self.board) >= beta {
            self.board.make_null_move();
            let (null_value, _) = self.search(depth - NULL_MOVE_REDUCTION, -beta, -beta + 1, ply + 1, false);
            self.board.unmake_null_move();
            if -null_value >= beta {
                return (beta, None);
            }
        }

        // Generate and order the legal moves
        let legal_moves = movegen::generate_legal_moves(&mut self.board);
        if legal_moves.is_empty() {
            // Game over should have caught this; fall back to the eval
            return (self.evaluator.evaluate(&mut self.board), None);
        }
        let ordered_moves = ordering::order_moves(&mut self.board, legal_moves, ply as usize, tt_move, &self.tables);

        let mut best_value = -INF;
        let mut best_move = None;
        for (i, m) in ordered_moves.iter().enumerate() {

            self.board.make_move(m.start_square, m.end_square, m.promotion);

            // The first move gets the full window; the rest are probed
            // with a null window and re-searched only on promise
            let value = if i == 0 {
                -self.search(depth - 1, -beta, -alpha, ply + 1, true).0
            } else {
                let mut v = -self.search(depth - 1, -alpha - 1, -alpha, ply + 1, true).0;
                if alpha < v && v < beta {
                    v = -self.search(depth - 1, -beta, -alpha, ply + 1, true).0;
                }
                v
            };

            self.board.unmake_move();

            if value > best_value {
                best_value = value;
                best_move = Some(*m);
            }
            if value > alpha {
                alpha = value;
            }
            if alpha >= beta {
                // Quiet cutoff moves feed the killer and history tables
                if m.captured_piece.is_none() {
                    self.tables.update_killer_moves(*m, ply as usize);
                    self.tables.update_history(m, depth);
                }
                break;
            }
        }

        // Classify the result against the original window and store it
        let bound = if best_value <= alpha_orig {
            tt::Bound::Upper
        } else if best_value >= beta {
            tt::Bound::Lower
        } else {
            tt::Bound::Exact
        };
        self.tt.store(zobrist_key, depth, best_value, bound, best_move, self.age);

        (best_value, best_move)
    }

    // This is an implementation of the quiescence search, which allows
    // the engine to keep searching "non-quiet" (capture) moves beyond
    // the search horizon.  This is done to mitigate the horizon effect,
    // which may cause a bad decision to be made right at the edge of the
    // search horizon.
    // See https://www.chessprogramming.org/Quiescence_Search
    fn quiesce(&mut self, mut alpha: i32, beta: i32, qdepth: u8) -> i32 {

        if self.clock.is_time_up() || qdepth > MAX_QUIESCENCE_DEPTH {
            return self.evaluator.evaluate(&mut self.board);
        }

        self.nodes_searched += 1;

        // This is our stand pat score, which is the current score
        // of the board without additional moves.
        let stand_pat = self.evaluator.evaluate(&mut self.board);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        // Only capture moves are searched, best victims first
        let mut captures: Vec<ChessMove> = movegen::generate_legal_moves(&mut self.board)
            .into_iter()
            .filter(|m| m.captured_piece.is_some())
            .collect();
        ordering::order_captures(&mut captures);

        for m in captures {
            self.board.make_move(m.start_square, m.end_square, m.promotion);
            let value = -self.quiesce(-beta, -alpha, qdepth + 1);
            self.board.unmake_move();

            if value >= beta {
                return beta;
            }
            if value > alpha {
                alpha = value;
            }
        }

        alpha
    }

}

#[cfg(test)]
impl SearchEngine {
    pub fn zobrist_hash(&self) -> u64 {
        self.board.zobrist_hash
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn engine_with_fen(fen: &str) -> SearchEngine {
        let mut engine = SearchEngine::new(Arc::new(AtomicBool::new(false)));
        let mut board = board::ChessBoard::new();
        board.set_from_fen(fen).unwrap();
        engine.set_board(board);
        engine
    }

    #[test]
    fn test_mate_in_one() {
        let mut engine = engine_with_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1");
        engine.clock.start(0.0, 0.0);
        engine.age += 1;
        let (value, mv) = engine.search(2, -INF, INF, 0, true);
        assert_eq!(mv.map(|m| m.uci()), Some("a1a8".to_string()));
        assert!(value >= MATE_SCORE - 2);

        let best = engine.find_best_move(0.0, 0.0, Some(2));
        assert_eq!(best.map(|m| m.uci()), Some("a1a8".to_string()));
    }

    #[test]
    fn test_shorter_mate_scores_higher() {
        // Ladder mate in 1 versus the same mate a move further out
        let mut mate_in_one = engine_with_fen("7k/R7/8/8/8/8/8/1R5K w - - 0 1");
        mate_in_one.clock.start(0.0, 0.0);
        mate_in_one.age += 1;
        let (value1, _) = mate_in_one.search(2, -INF, INF, 0, true);
        assert_eq!(value1, MATE_SCORE - 1);

        let mut mate_in_two = engine_with_fen("7k/8/8/8/8/8/R7/1R5K w - - 0 1");
        mate_in_two.clock.start(0.0, 0.0);
        mate_in_two.age += 1;
        let (value2, _) = mate_in_two.search(4, -INF, INF, 0, true);
        assert_eq!(value2, MATE_SCORE - 3);

        assert!(value1 > value2);
    }

    #[test]
    fn test_only_move_is_found() {
        let mut engine = engine_with_fen("7k/8/8/8/8/8/6q1/7K w - - 0 1");
        let mut board = board::ChessBoard::new();
        board.set_from_fen("7k/8/8/8/8/8/6q1/7K w - - 0 1").unwrap();
        let legal = movegen::generate_legal_moves(&mut board);
        assert_eq!(legal.len(), 1);
        let best = engine.find_best_move(0.0, 0.0, Some(4)).unwrap();
        assert_eq!(best, legal[0]);
    }

    #[test]
    fn test_capture_engine_takes_the_hanging_queen() {
        // Removing nine points of material dwarfs anything a quiet move
        // can offer the capture evaluator.
        let mut engine = SearchEngine::new(Arc::new(AtomicBool::new(false)));
        engine.set_evaluator(Box::new(evaluate::CaptureEvaluator));
        let mut board = board::ChessBoard::new();
        board.set_from_fen("3q3k/8/8/8/8/8/8/3R2K1 w - - 0 1").unwrap();
        engine.set_board(board);
        let best = engine.find_best_move(0.0, 0.0, Some(2)).unwrap();
        assert!(best.captured_piece.is_some());
        assert_eq!(best.uci(), "d1d8");
    }

    #[test]
    fn test_capture_engine_keeps_trading() {
        // A pure queen trade: taking is the only way to shed material
        let mut engine = SearchEngine::new(Arc::new(AtomicBool::new(false)));
        engine.set_evaluator(Box::new(evaluate::CaptureEvaluator));
        let mut board = board::ChessBoard::new();
        board.set_from_fen("3qk3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        engine.set_board(board);
        let best = engine.find_best_move(0.0, 0.0, Some(2)).unwrap();
        assert_eq!(best.uci(), "d1d8");
    }

    #[test]
    fn test_coverage_engine_opening_choice() {
        let mut engine = SearchEngine::new(Arc::new(AtomicBool::new(false)));
        let mut board = board::ChessBoard::new();
        board.new_game();
        engine.set_board(board);
        let best = engine.find_best_move(0.0, 0.0, Some(3)).unwrap();
        let candidates = ["g1f3", "d2d4", "e2e4", "c2c4", "b1c3"];
        assert!(candidates.contains(&best.uci().as_str()), "unexpected opening move {}", best.uci());
    }

    #[test]
    fn test_search_is_idempotent() {
        let mut engine = engine_with_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3");
        let first = engine.find_best_move(0.0, 0.0, Some(3));
        let second = engine.find_best_move(0.0, 0.0, Some(3));
        assert_eq!(first, second);
    }

    #[test]
    fn test_game_over_yields_no_move() {
        // Fool's mate: white has no move to make
        let mut engine = engine_with_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert_eq!(engine.find_best_move(0.0, 0.0, Some(3)), None);
    }

    #[test]
    fn test_drawn_repetition_scores_zero() {
        // The current position is the third occurrence of the starting
        // position; the search sees an immediate draw.
        let mut engine = SearchEngine::new(Arc::new(AtomicBool::new(false)));
        let mut board = board::ChessBoard::new();
        board.new_game();
        let shuffle = [(6, 21), (62, 45), (21, 6), (45, 62)];
        for _ in 0..3 {
            for (s, e) in shuffle {
                board.make_move(s, e, None);
            }
        }
        engine.set_board(board);
        engine.clock.start(0.0, 0.0);
        let (value, mv) = engine.search(4, -INF, INF, 0, true);
        assert_eq!(value, 0);
        assert_eq!(mv, None);
    }

    #[test]
    fn test_time_expiry_returns_promptly() {
        // 50 ms on the clock allocates a 5 ms budget; the search must
        // come back with some move almost immediately.
        let mut engine = SearchEngine::new(Arc::new(AtomicBool::new(false)));
        let mut board = board::ChessBoard::new();
        board.new_game();
        engine.set_board(board);
        let start = Instant::now();
        let best = engine.find_best_move(0.05, 0.0, None);
        assert!(best.is_some());
        assert!(start.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn test_stop_flag_aborts_timed_search() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut engine = SearchEngine::new(stop.clone());
        let mut board = board::ChessBoard::new();
        board.new_game();
        engine.set_board(board);
        stop.store(true, Ordering::Relaxed);
        // A timed go with stop already raised still yields a move
        let start = Instant::now();
        let best = engine.find_best_move(60.0, 0.0, None);
        assert!(best.is_some());
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
