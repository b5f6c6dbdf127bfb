//! CLI UI utilities for terminal output.
//!
//! This module provides colored status lines, a loading spinner, and the
//! result-card and detail renderings used by the `vipdb` binary.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{fields, QueryResponse, Record};
use crate::search::{DetailEntry, DisplayValue};

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
}

/// Print a styled status message to stderr.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => eprintln!("{} {}", icon.green().bold(), msg),
        Status::Error => eprintln!("{} {}", icon.red().bold(), msg),
        Status::Warning => eprintln!("{} {}", icon.yellow().bold(), msg),
        Status::Info => eprintln!("{} {}", icon.cyan().bold(), msg),
        Status::Search => eprintln!("{} {}", icon.yellow(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "─".repeat(terminal_width().min(80)).dimmed());
}

/// Print the status line and paging position of a response.
pub fn print_query_header(response: &QueryResponse) {
    println!();
    println!(
        "{} {}",
        status_icon(Status::Search).yellow().bold(),
        response.summary().bold()
    );
    if response.total_pages > 1 {
        println!(
            "{}",
            format!(
                "Page {} of {} ({} per page)",
                response.page, response.total_pages, response.page_size
            )
            .dimmed()
        );
    }
    println!();
}

/// Print a record as a compact result card: title, then PMID, VIP name and
/// database pills.
pub fn print_record_card(index: usize, record: &Record) {
    let width = terminal_width().saturating_sub(8).max(20);
    println!(
        "{:>3}. {}",
        index.to_string().dimmed(),
        truncate_with_ellipsis(&record.display_title(), width).blue().bold()
    );

    let mut pills = vec![format!("PMID: {}", record.identifier())];
    let vip = record.text(fields::VIP_NAME);
    if !vip.trim().is_empty() {
        pills.push(vip);
    }
    let db = record.text(fields::DATABASE);
    if !db.trim().is_empty() {
        pills.push(format!("Database: {}", db));
    }
    let pills: Vec<String> = pills.iter().map(|p| format!("[{}]", p)).collect();
    println!("     {}", pills.join(" ").dimmed());
}

/// Print the detail projection of a record.
pub fn print_details(entries: &[DetailEntry]) {
    let key_width = entries
        .iter()
        .map(|e| unicode_width::UnicodeWidthStr::width(e.key.as_str()))
        .max()
        .unwrap_or(0);

    for entry in entries {
        let padding = key_width.saturating_sub(unicode_width::UnicodeWidthStr::width(
            entry.key.as_str(),
        ));
        let key = format!("{}{}", entry.key, " ".repeat(padding));
        match &entry.value {
            DisplayValue::Blank => {
                println!("  {}  {}", key.bold(), entry.value.display_text().dimmed())
            }
            DisplayValue::Link { label, .. } => {
                println!("  {}  {}", key.bold(), label.underline().cyan())
            }
            DisplayValue::Text { text } => println!("  {}  {}", key.bold(), text),
        }
    }
}

/// Format a number with commas.
pub fn format_number(n: usize) -> String {
    n.to_string()
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();

    if total_width <= max_width {
        return text.to_string();
    }

    // Longest prefix that fits alongside the ellipsis
    let mut current_width = 0;
    let mut end_idx = 0;

    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width.saturating_sub(3) {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated)
}

/// Loading spinner, hidden when stderr is not a terminal.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = if std::io::stderr().is_terminal() {
            indicatif::ProgressBar::new_spinner()
        } else {
            indicatif::ProgressBar::hidden()
        };
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Finish with success message.
    pub fn finish_with_success(&self, msg: &str) {
        self.pb
            .finish_with_message(format!("{} {}", status_icon(Status::Success).green(), msg));
    }

    /// Remove the spinner without a message.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
