//! Terminal rendering of settled and tentative text.

use std::io::{self, Write};

use habla_application::TranscriptUpdate;

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Characters of transcript kept visible on the live line.
const VIEW_CHARS: usize = 96;

/// Repaints a single live line: the tail of the settled transcript followed
/// by the tentative text in dim. The full settled transcript is printed once
/// on finish.
pub struct Renderer {
    settled: String,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            settled: String::new(),
        }
    }

    pub fn render(&mut self, update: &TranscriptUpdate) -> io::Result<()> {
        self.settled.push_str(&update.settled);

        let tentative = tail(&update.tentative, VIEW_CHARS / 2);
        let remaining = VIEW_CHARS - tentative.chars().count();
        let settled_view = tail(&self.settled, remaining);

        let mut out = io::stdout().lock();
        write!(out, "{CLEAR_LINE}{settled_view}{DIM}{tentative}{RESET}")?;
        out.flush()
    }

    /// Clear the live line and print the complete settled transcript.
    pub fn finish(self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{CLEAR_LINE}{}", self.settled)?;
        out.flush()
    }
}

/// Last `max_chars` characters of `s`, on a char boundary.
fn tail(s: &str, max_chars: usize) -> &str {
    let count = s.chars().count();
    if count <= max_chars {
        return s;
    }
    let skip = count - max_chars;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_short_string_unchanged() {
        assert_eq!(tail("hola", 10), "hola");
    }

    #[test]
    fn test_tail_truncates_on_char_boundary() {
        assert_eq!(tail("señales", 4), "ales");
        assert_eq!(tail("año", 2), "ño");
    }
}
