use regex::Regex;
use std::sync::LazyLock;

/// Boilerplate lead-ins models put in front of the actual answer, e.g.
/// "Based on my analysis:", "Here's the answer:" or "Final response:".
/// Anchored at the start; a run of consecutive lead-ins is removed as one.
static LEAD_IN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:(?:based\s+on|according\s+to|after)\s+(?:(?:my|the)\s+)?analysis\s*:|here(?:\s+is|'s)\s+(?:(?:the|a|my)\s+)?(?:answer|solution|response)\s*:|(?:final|direct)\s+(?:answer|solution|response)\s*:)\s*)+",
    )
    .expect("Invalid lead-in regex")
});

/// Strips a leading boilerplate preamble from a model answer and trims it.
///
/// Only the start of the text is inspected, so a lead-in phrase appearing
/// later in the body is kept. Applying it twice gives the same result as once.
pub fn sanitize_response(text: &str) -> String {
    LEAD_IN_PATTERN.replace(text, "").trim().to_string()
}

/// Wrap a string into lines no wider than `max_width` characters, breaking at
/// spaces where possible.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let current_len = current.chars().count();
        let word_len = word.chars().count();

        if current_len > 0 && current_len + 1 + word_len > max_width {
            lines.push(std::mem::take(&mut current));
        }

        if word_len > max_width {
            // No space to break at, cut the word itself
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(max_width) {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = chunk.iter().collect();
            }
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
