//! Stylus Compiler Binary

use std::process;
use stylc::Cli;

fn main() {
    let mut cli = Cli::new();
    if let Err(e) = cli.run() {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
