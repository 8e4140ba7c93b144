use crate::map::MapHandle;
use crate::session::{Author, ChatMessage, LocatedPlace};
use crate::utils::text::wrap_text;
use chrono::{DateTime, Local};
use console::{Term, style};
use termimad::MadSkin;

const LOADING_TEXT: &str = "🛰  Analyzing…";

fn box_width(term: &Term) -> usize {
    let terminal_width = term.size().1 as usize;
    std::cmp::min(terminal_width.saturating_sub(4), 120).max(60)
}

/// Whether an answer carries markdown worth rendering with termimad.
pub fn looks_like_markdown(text: &str) -> bool {
    text.contains("```")
        || text.contains("**")
        || text.contains('`')
        || text.lines().any(|line| {
            let line = line.trim_start();
            line.starts_with('#') || line.starts_with("- ") || line.starts_with("* ")
        })
}

pub fn display_welcome() {
    println!(
        "{} {}",
        style("🌏 geochat").bold().cyan(),
        style("geospatial assistant for India").dim()
    );
    println!(
        "Type a question, or '/help' for commands. Press Ctrl+D or type /quit to exit.\n"
    );
}

pub fn show_loading() {
    let term = Term::stdout();
    let _ = term.write_line(&style(LOADING_TEXT).dim().italic().to_string());
}

pub fn clear_loading() {
    let _ = Term::stdout().clear_last_lines(1);
}

fn display_header(at: &DateTime<Local>) {
    println!(
        "\n{} {}",
        style("🤖 GEOCHAT").bold().blue(),
        style(at.format("%H:%M:%S")).dim()
    );
}

/// Display an assistant message in a formatted box, or as rendered markdown.
pub fn display_response(response: &str, at: &DateTime<Local>) {
    if looks_like_markdown(response) {
        display_header(at);
        MadSkin::default().print_text(response);
        return;
    }

    let term = Term::stdout();
    let max_width = box_width(&term);

    let wrapped_lines: Vec<String> = response
        .lines()
        .flat_map(|line| wrap_text(line, max_width.saturating_sub(4)))
        .collect();

    let content_max_len = wrapped_lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let width = std::cmp::min(max_width, content_max_len + 4);

    let top_border = "┌".to_string() + &"─".repeat(width - 2) + "┐";
    let bottom_border = "└".to_string() + &"─".repeat(width - 2) + "┘";

    display_header(at);
    println!("{}", style(&top_border).dim().blue());

    for line in wrapped_lines {
        let padding = width.saturating_sub(line.chars().count() + 3);
        let styled = if line.starts_with("Error:") {
            style(&line).bold().red()
        } else if line.starts_with("Usage:") {
            style(&line).bold().yellow()
        } else {
            style(&line).bold().white()
        };
        println!("│ {}{}│", styled, " ".repeat(padding));
    }

    println!("{}", style(&bottom_border).dim().blue());
}

/// Prints every assistant message after index `from` in the transcript.
pub fn display_new_messages(messages: &[ChatMessage], from: usize) {
    for message in messages.iter().skip(from) {
        if message.role == Author::Assistant {
            display_response(&message.text, &message.created_at);
        }
    }
}

pub fn display_map(label: &str, handle: &MapHandle) {
    println!(
        "{} {} {}",
        style("🗺").bold().green(),
        style(label).bold(),
        style(handle.as_str()).underlined().cyan()
    );
}

pub fn display_located(place: &LocatedPlace) {
    println!(
        "\n{} {} ({})",
        style("📍 Detected location:").bold().green(),
        style(&place.result.location).bold(),
        place.result.coordinates
    );
    display_map(&place.result.location, &place.map);
}

pub fn display_error(message: &str) {
    eprintln!("{} {}", style("⚠").bold().red(), style(message).red());
}
