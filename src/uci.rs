//! This module implements the Universal Chess Interface (UCI).
//!
//! Commands are read line by line and processed in order.  A "go" runs
//! the search on a worker thread so that "stop" can still be observed;
//! the engine lives behind a mutex that the worker holds for the
//! duration of a search, and the only other cross-thread state is the
//! stop flag.  Malformed input is reported with an "info string" line
//! and never disturbs the last known good position.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::board;
use crate::evaluate;
use crate::movegen;
use crate::search;

// Write one protocol line and flush it, so output is never stuck in a
// pipe buffer between us and the host.
pub fn send(line: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{}", line);
    let _ = handle.flush();
}

pub struct UCI {

    // The engine, shared with at most one search worker at a time
    engine: Arc<Mutex<search::SearchEngine>>,

    // Raised by "stop" (and on shutdown); the search polls it
    stop: Arc<AtomicBool>,

    // The running search worker, if any
    search_thread: Option<JoinHandle<()>>,

}

impl UCI {

    // Construct the UCI front end and the engine it owns
    pub fn new() -> UCI {
        let stop = Arc::new(AtomicBool::new(false));
        UCI {
            engine: Arc::new(Mutex::new(search::SearchEngine::new(Arc::clone(&stop)))),
            stop,
            search_thread: None,
        }
    }

    // The main UCI processing loop
    pub fn main_loop(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };
            if !self.handle_command(&line) {
                break;
            }
        }
        // Unwind any running search before exiting
        self.stop.store(true, Ordering::Relaxed);
        self.join_search();
    }

    // Process one command line.  Returns false when the engine should
    // exit.
    pub fn handle_command(&mut self, line: &str) -> bool {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return true;
        }
        match tokens[0] {
            "uci" => self.uci_command(),
            "isready" => send("readyok"),
            "ucinewgame" => self.ucinewgame_command(),
            "setoption" => self.setoption_command(&tokens),
            "position" => self.position_command(&tokens),
            "go" => self.go_command(&tokens),
            "stop" => self.stop.store(true, Ordering::Relaxed),
            "quit" => return false,
            _ => send(&format!("info string Unknown command: {}", tokens[0])),
        }
        true
    }

    // Process the "uci" command
    fn uci_command(&self) {
        send("id name Sparring Chess 0.1.0");
        send("id author Sparring Chess developers");
        send(&format!("option name MaxDepth type spin default {} min 1 max 20", search::DEFAULT_MAX_DEPTH));
        send(&format!("option name TTSize type spin default {} min 16 max 1024", search::DEFAULT_TT_SIZE_MB));
        send("option name Evaluator type combo default coverage var coverage var capture");
        send("uciok");
    }

    // Process the "ucinewgame" command
    fn ucinewgame_command(&mut self) {
        self.join_search();
        self.engine.lock().unwrap().new_game();
    }

    // Process the "setoption" command.  Out-of-range values are clamped;
    // unknown names and unparsable values are ignored.
    fn setoption_command(&mut self, tokens: &[&str]) {
        if tokens.len() < 5 || tokens[1] != "name" || tokens[3] != "value" {
            send("info string Malformed setoption command");
            return;
        }
        self.join_search();
        let mut engine = self.engine.lock().unwrap();
        match tokens[2] {
            "MaxDepth" => {
                if let Ok(depth) = tokens[4].parse::<i64>() {
                    engine.set_max_depth(depth.clamp(1, 20) as u8);
                }
            }
            "TTSize" => {
                if let Ok(size_mb) = tokens[4].parse::<i64>() {
                    engine.set_tt_size(size_mb.clamp(16, 1024) as usize);
                }
            }
            "Evaluator" => {
                if let Some(evaluator) = evaluate::evaluator_from_name(tokens[4]) {
                    engine.set_evaluator(evaluator);
                }
            }
            _ => {}
        }
    }

    // Process the "position" command.  The new position is built on a
    // scratch board first, so any error leaves the engine at the last
    // known good state.
    fn position_command(&mut self, tokens: &[&str]) {
        if tokens.len() < 2 {
            send("info string Malformed position command");
            return;
        }

        let mut scratch = board::ChessBoard::new();
        let mut index;
        match tokens[1] {
            "startpos" => {
                scratch.new_game();
                index = 2;
            }
            "fen" => {
                let fen_end = tokens.iter().position(|t| *t == "moves").unwrap_or(tokens.len());
                let fen = tokens[2..fen_end].join(" ");
                if let Err(e) = scratch.set_from_fen(&fen) {
                    send(&format!("info string Invalid FEN: {}", e));
                    return;
                }
                index = fen_end;
            }
            _ => {
                send("info string Malformed position command");
                return;
            }
        }

        if index < tokens.len() {
            if tokens[index] != "moves" {
                send("info string Malformed position command");
                return;
            }
            index += 1;
            for move_str in &tokens[index..] {
                match movegen::parse_uci_move(&mut scratch, move_str) {
                    Ok(m) => scratch.make_move(m.start_square, m.end_square, m.promotion),
                    Err(e) => {
                        send(&format!("info string {}", e));
                        return;
                    }
                }
            }
        }

        self.join_search();
        self.engine.lock().unwrap().set_board(scratch);
    }

    // Process the "go" command.  The search runs on a worker thread;
    // exactly one "bestmove" is emitted per "go", with "0000" standing
    // in when no legal move exists.
    fn go_command(&mut self, tokens: &[&str]) {
        // Only one search at a time
        self.join_search();
        self.stop.store(false, Ordering::Relaxed);

        let mut wtime = 0.0;
        let mut btime = 0.0;
        let mut winc = 0.0;
        let mut binc = 0.0;
        let mut depth = None;
        let mut i = 1;
        while i + 1 < tokens.len() {
            let value = tokens[i + 1];
            match tokens[i] {
                "wtime" => wtime = parse_millis(value),
                "btime" => btime = parse_millis(value),
                "winc" => winc = parse_millis(value),
                "binc" => binc = parse_millis(value),
                "depth" => depth = value.parse::<u8>().ok(),
                _ => {
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        let engine = Arc::clone(&self.engine);
        self.search_thread = Some(thread::spawn(move || {
            let mut engine = engine.lock().unwrap();
            let (time_left, increment) = if engine.white_to_move() {
                (wtime, winc)
            } else {
                (btime, binc)
            };
            match engine.find_best_move(time_left, increment, depth) {
                Some(m) => send(&format!("bestmove {}", m.uci())),
                None => send("bestmove 0000"),
            }
        }));
    }

    // Wait for the running search worker, if any, to finish
    fn join_search(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            let _ = handle.join();
        }
    }

}

// Clock values arrive in milliseconds; the engine thinks in seconds
fn parse_millis(token: &str) -> f64 {
    match token.parse::<f64>() {
        Ok(ms) => ms / 1000.0,
        Err(_) => {
            send(&format!("info string Ignoring unparsable time value: {}", token));
            0.0
        }
    }
}

// =====================================
//             UNIT TESTS
// =====================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::zobrist;

    fn board_after(commands: &[&str]) -> u64 {
        let mut uci = UCI::new();
        for c in commands {
            assert!(uci.handle_command(c));
        }
        let hash = uci.engine.lock().unwrap().zobrist_hash();
        hash
    }

    #[test]
    fn test_position_startpos_with_moves() {
        let hash = board_after(&["position startpos moves e2e4 e7e5 g1f3"]);
        let mut expected = board::ChessBoard::new();
        expected.new_game();
        expected.make_move(12, 28, None);
        expected.make_move(52, 36, None);
        expected.make_move(6, 21, None);
        assert_eq!(hash, expected.zobrist_hash);
    }

    #[test]
    fn test_position_fen_with_moves() {
        let hash = board_after(&["position fen 6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1 moves a1a8"]);
        let mut expected = board::ChessBoard::new();
        expected.set_from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        expected.make_move(0, 56, None);
        assert_eq!(hash, expected.zobrist_hash);
    }

    #[test]
    fn test_bad_position_keeps_last_good_state() {
        let mut uci = UCI::new();
        uci.handle_command("position startpos moves e2e4");
        let good = uci.engine.lock().unwrap().zobrist_hash();
        // Illegal move: rejected, board unchanged
        uci.handle_command("position startpos moves e2e5");
        assert_eq!(uci.engine.lock().unwrap().zobrist_hash(), good);
        // Invalid FEN: rejected, board unchanged
        uci.handle_command("position fen this/is/not/a/fen w - - 0 1");
        assert_eq!(uci.engine.lock().unwrap().zobrist_hash(), good);
        // Garbage position target: rejected
        uci.handle_command("position sidewaysys");
        assert_eq!(uci.engine.lock().unwrap().zobrist_hash(), good);
    }

    #[test]
    fn test_ucinewgame_resets_board() {
        let mut uci = UCI::new();
        uci.handle_command("position startpos moves e2e4");
        uci.handle_command("ucinewgame");
        let mut fresh = board::ChessBoard::new();
        fresh.new_game();
        assert_eq!(uci.engine.lock().unwrap().zobrist_hash(), zobrist::tables().full_hash(&fresh));
    }

    #[test]
    fn test_setoption_clamping() {
        let mut uci = UCI::new();
        uci.handle_command("setoption name MaxDepth value 99");
        assert_eq!(uci.engine.lock().unwrap().max_depth(), 20);
        uci.handle_command("setoption name MaxDepth value 0");
        assert_eq!(uci.engine.lock().unwrap().max_depth(), 1);
        uci.handle_command("setoption name MaxDepth value 7");
        assert_eq!(uci.engine.lock().unwrap().max_depth(), 7);
        // Unknown options and junk values are ignored
        uci.handle_command("setoption name Ponder value true");
        uci.handle_command("setoption name MaxDepth value banana");
        assert_eq!(uci.engine.lock().unwrap().max_depth(), 7);
        // Rebuilding the TT and switching evaluators must not error
        uci.handle_command("setoption name TTSize value 16");
        uci.handle_command("setoption name Evaluator value capture");
        uci.handle_command("setoption name Evaluator value telepathy");
    }

    #[test]
    fn test_go_depth_emits_bestmove() {
        let mut uci = UCI::new();
        uci.handle_command("position startpos");
        uci.handle_command("go depth 1");
        // The worker finishes and can be joined; the board is untouched
        uci.join_search();
        let mut fresh = board::ChessBoard::new();
        fresh.new_game();
        assert_eq!(uci.engine.lock().unwrap().zobrist_hash(), zobrist::tables().full_hash(&fresh));
    }

    #[test]
    fn test_quit_returns_false() {
        let mut uci = UCI::new();
        assert!(!uci.handle_command("quit"));
        assert!(uci.handle_command(""));
        assert!(uci.handle_command("isready"));
    }
}
