//! Shared CLI helpers — banner and thinking indicator.

use colored::Colorize;

/// Print the banner shown at REPL start.
pub fn print_banner(assistant_name: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", format!("🎙 {assistant_name}").cyan().bold(), version.dimmed());
    println!("{}", "Type a message, or \"exit\" to quit.".dimmed());
    println!();
}

/// Print a "thinking" placeholder while the model call is in flight.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}
