//! Status messages on stderr. Results meant for scripts go to stdout.

use std::sync::atomic::{AtomicBool, Ordering};

use owo_colors::OwoColorize;

static COLOR: AtomicBool = AtomicBool::new(true);

/// Decide once whether messages are colored. `NO_COLOR` disables colors
/// as well as `--no-color`.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && std::env::var_os("NO_COLOR").is_none();
    COLOR.store(enabled, Ordering::Relaxed);
}

fn colored() -> bool {
    COLOR.load(Ordering::Relaxed)
}

pub fn success(message: &str) {
    if colored() {
        eprintln!("{} {}", "✓".green().bold(), message);
    } else {
        eprintln!("✓ {message}");
    }
}

pub fn info(message: &str) {
    if colored() {
        eprintln!("{} {}", "ℹ".blue().bold(), message);
    } else {
        eprintln!("ℹ {message}");
    }
}

pub fn warning(message: &str) {
    if colored() {
        eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
    } else {
        eprintln!("⚠ {message}");
    }
}
