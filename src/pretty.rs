//! # Pretty printing
//!
//! Renders the small markdown subset produced by [`crate::narrator`] on the terminal:
//!
//! | Markdown Syntax | Terminal Rendering |
//! |-----------------|--------------------|
//! | `# Header`      | **Bold Cyan**      |
//! | `**bold**`      | **Bold**           |
//! | `*italic*`      | *Italic*           |
//! | `` `code` ``    | Yellow             |
//! | `- item`        | `•` bullet         |
//!
//! Colors and attributes go through `crossterm`; inline spans use plain ANSI escapes.

use crossterm::{
    ExecutableCommand,
    style::{Attribute, Color, SetAttribute, SetForegroundColor},
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::io::{Write, stdout};

static INLINE_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());

/// Print markdown text to stdout with terminal formatting.
///
/// # Errors
/// Returns IO errors if terminal output fails.
pub fn print_pretty(text: &str) -> Result<(), Box<dyn Error>> {
    let mut out = stdout();
    write_pretty(&mut out, text)?;
    out.flush()?;
    Ok(())
}

/// Render markdown text into any writer.
pub fn write_pretty<W: Write>(out: &mut W, text: &str) -> Result<(), Box<dyn Error>> {
    for line in text.lines() {
        let header = line
            .strip_prefix("### ")
            .or_else(|| line.strip_prefix("## "))
            .or_else(|| line.strip_prefix("# "));

        if let Some(header) = header {
            out.execute(SetForegroundColor(Color::Cyan))?;
            out.execute(SetAttribute(Attribute::Bold))?;
            writeln!(out, "{}", header)?;
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(SetForegroundColor(Color::Reset))?;
        } else if let Some(item) = line.strip_prefix("- ") {
            writeln!(out, "  • {}", inline_markdown(item))?;
        } else {
            writeln!(out, "{}", inline_markdown(line))?;
        }
    }

    Ok(())
}

/// Replace inline code, bold and italic spans with ANSI escapes, in that order.
fn inline_markdown(line: &str) -> String {
    let processed = INLINE_CODE_RE.replace_all(line, "\x1b[33m$1\x1b[0m");
    let processed = BOLD_RE.replace_all(&processed, "\x1b[1m$1\x1b[0m");
    ITALIC_RE
        .replace_all(&processed, "\x1b[3m$1\x1b[0m")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> String {
        let mut buf = Vec::new();
        write_pretty(&mut buf, text).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_inline_spans() {
        assert_eq!(inline_markdown("a **b** c"), "a \x1b[1mb\x1b[0m c");
        assert_eq!(inline_markdown("*x*"), "\x1b[3mx\x1b[0m");
        assert_eq!(inline_markdown("shelf `A-01`"), "shelf \x1b[33mA-01\x1b[0m");
        assert_eq!(inline_markdown("plain"), "plain");
    }

    #[test]
    fn test_headers_lose_their_marker() {
        let out = render("## Safety check\n### Laskar Pelangi");
        assert!(out.contains("Safety check"));
        assert!(!out.contains("## "));
        assert!(out.contains("Laskar Pelangi"));
    }

    #[test]
    fn test_bullets() {
        assert_eq!(render("- email detected."), "  • email detected.\n");
    }

    #[test]
    fn test_print_pretty_empty_string() {
        assert!(print_pretty("").is_ok());
    }
}
