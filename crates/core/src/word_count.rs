//! Plain-text length of a markdown body, shown next to each case in the admin listing.

use regex::Regex;
use std::sync::LazyLock;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.*?)`").unwrap());
static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}\s+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strips markdown syntax from `body`, leaving approximate plain text.
///
/// Fenced code blocks are dropped entirely. Link targets, inline code ticks, emphasis
/// markers and heading markers at the start of a line are removed while their text is
/// kept. Runs of whitespace (newlines included) collapse to one space and the result is
/// trimmed.
///
/// Unwrapping one construct can expose another (`[#](x) Intro` becomes `# Intro`), so the
/// passes repeat until the text stops changing. That makes the function idempotent.
pub fn strip_markdown(body: &str) -> String {
    let mut text = strip_pass(body);
    loop {
        let next = strip_pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

// Every pass either shortens the text or only turns whitespace into spaces, so the loop
// above terminates.
fn strip_pass(body: &str) -> String {
    let text = CODE_BLOCK.replace_all(body, "");
    let text = LINK.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_owned()
}

/// Character count of [`strip_markdown`]'s output.
pub fn word_count(body: &str) -> usize {
    strip_markdown(body).chars().count()
}
