pub mod completion;
pub mod config;
pub mod replay;
pub mod resolve;

use colored::Colorize;

pub fn print_version() {
    println!("{} {}", "blokview".bold(), env!("CARGO_PKG_VERSION"));
}
