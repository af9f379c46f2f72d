//! Terminal output helpers
//!
//! Status lines start with a one-character marker. Errors and warnings go to
//! stderr so piped output (`changelog generate --stdout`) stays clean.

use console::{style, Style, StyledObject};

const KEY_WIDTH: usize = 14;

fn line(marker: StyledObject<&str>, message: &str) -> String {
    format!("{} {}", marker, message)
}

pub fn success(message: &str) {
    println!("{}", line(style("✓").green().bold(), message));
}

pub fn error(message: &str) {
    eprintln!("{}", line(style("✗").red().bold(), message));
}

pub fn warning(message: &str) {
    eprintln!("{}", line(style("!").yellow().bold(), message));
}

pub fn info(message: &str) {
    println!("{}", line(style("→").blue(), message));
}

/// Section title
pub fn header(text: &str) -> String {
    style(text).bold().underlined().to_string()
}

/// Indented `key: value` line with keys padded into a column
pub fn key_value(key: &str, value: &str) -> String {
    let key = format!("{}:", key);
    format!("  {} {}", style(format!("{:<width$}", key, width = KEY_WIDTH)).dim(), value)
}

/// Per-item result line; failures here are part of normal output
pub fn outcome(ok: bool, message: &str) {
    let marker = if ok {
        style("✓").green().bold()
    } else {
        style("✗").red().bold()
    };
    println!("{}", line(marker, message));
}

pub fn version_style() -> Style {
    Style::new().green().bold()
}

pub fn path_style() -> Style {
    Style::new().cyan()
}

pub fn dim_style() -> Style {
    Style::new().dim()
}
