//! Welcome to Sparring Chess!
//!
//! This is the entry point into the Sparring Chess engine, a
//! configurable sparring opponent speaking the Universal Chess
//! Interface (UCI).  Control is immediately passed to the UCI
//! handling loop.

mod board;
mod zobrist;
mod pieces;
mod bitboard;
mod movegen;
mod evaluate;
mod ordering;
mod tt;
mod timeman;
mod search;
mod uci;

fn main() {
    println!("Sparring Chess 0.1.0");
    let mut uci_main = uci::UCI::new();
    uci_main.main_loop();
}
