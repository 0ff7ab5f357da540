//! Severity-tagged user output on stderr.
//!
//! Dry-run traces and command listings go to stdout; everything a human
//! reads as status goes through here so the tags stay consistent whether
//! or not the run is interactive.

use colored::Colorize;
use std::fmt::Display;

pub fn info(msg: impl Display) {
    eprintln!("{} {msg}", "[INFO]".blue().bold());
}

pub fn success(msg: impl Display) {
    eprintln!("{} {msg}", "[OK]".green().bold());
}

pub fn warn(msg: impl Display) {
    eprintln!("{} {msg}", "[WARN]".yellow().bold());
}

pub fn error(msg: impl Display) {
    eprintln!("{} {msg}", "[ERROR]".red().bold());
}

/// Section heading before a group of prompts.
pub fn header(title: &str) {
    eprintln!();
    eprintln!("{}", format!("── {title} ──").cyan().bold());
}

/// Indented `label: value` line under a heading.
pub fn field(label: &str, value: impl Display) {
    eprintln!("  {:<22} {value}", format!("{label}:").dimmed());
}
