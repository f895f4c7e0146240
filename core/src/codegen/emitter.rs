//! Line-based output.
//!
//! Each top-level item (definition, conversion, class, morph) is written into
//! its own [`Emitter`] and committed to the [`Output`] as one batch. Items
//! requested while another item is being built are flushed first, so every
//! helper appears ahead of its first user.

use core::fmt::Write;

/// Accumulated program text.
#[derive(Debug, Default)]
pub struct Output {
    text: String,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// Buffered batch of lines.
#[derive(Debug, Default)]
pub struct Emitter {
    lines: Vec<String>,
}

const INDENT: &str = "  ";

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new line at `indent` levels.
    pub fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        let mut line = INDENT.repeat(indent);
        line.push_str(text.as_ref());
        self.lines.push(line);
    }

    /// Appends to the current line.
    pub fn append(&mut self, text: impl AsRef<str>) {
        match self.lines.last_mut() {
            Some(last) => last.push_str(text.as_ref()),
            None => self.lines.push(text.as_ref().to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Commits the batch followed by a blank separator line.
    pub fn flush(&mut self, out: &mut Output) {
        for line in self.lines.drain(..) {
            out.text.push_str(&line);
            out.text.push('\n');
        }
        out.text.push('\n');
    }

    /// The buffered lines as one block, without committing them.
    pub fn into_block(self) -> String {
        self.lines.join("\n")
    }
}

pub(crate) fn pad(indent: usize) -> String {
    INDENT.repeat(indent)
}

/// Double-quoted target string literal.
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{2028}' || c == '\u{2029}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flush_adds_separator_and_clears() {
        let mut out = Output::new();
        let mut em = Emitter::new();
        em.line(0, "function f() {");
        em.line(1, "return 1");
        em.append(";");
        em.line(0, "}");
        em.flush(&mut out);
        assert!(em.is_empty());

        em.line(0, "f();");
        em.flush(&mut out);
        assert_eq!(out.as_str(), "function f() {\n  return 1;\n}\n\nf();\n\n");
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(js_string("\u{1}"), r#""\u0001""#);
    }
}
