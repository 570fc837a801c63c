//! Quote- and paren-aware scanning over raw statement text.
//!
//! The statement dialect is split on separators rather than fully lexed:
//! commas inside parentheses or single-quoted strings never split a list,
//! and keywords inside quoted strings are never matched.

pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
    in_quote: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            depth: 0,
            in_quote: false,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Advance one byte, tracking quote and nesting state.
    fn advance(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        match b {
            b'\'' => self.in_quote = !self.in_quote,
            b'(' if !self.in_quote => self.depth += 1,
            b')' if !self.in_quote => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
        Some(b)
    }

    fn at_top_level(&self) -> bool {
        self.depth == 0 && !self.in_quote
    }

    /// Split on `sep` wherever it appears at nesting depth zero outside quotes.
    /// Each piece is trimmed. An empty input yields a single empty piece.
    pub fn split(mut self, sep: u8) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut start = 0;
        while let Some(b) = self.peek_byte() {
            if b == sep && self.at_top_level() {
                pieces.push(self.slice(start, self.pos).trim());
                self.pos += 1;
                start = self.pos;
                continue;
            }
            self.advance();
        }
        pieces.push(self.slice(start, self.pos).trim());
        pieces
    }

    /// Split on the keyword `kw` surrounded by whitespace, case-insensitively,
    /// outside quotes. Used for `AND` chains. Any ASCII whitespace counts as
    /// a separator, so tabs and newlines around `kw` split too.
    /// A keyword at either end of the input has no whitespace on that side
    /// and stays inside the piece.
    pub fn split_keyword(mut self, kw: &str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        let mut start = 0;
        while self.peek_byte().is_some() {
            if !self.in_quote && self.separator_keyword_at(self.pos, kw) {
                pieces.push(self.slice(start, self.pos).trim());
                self.pos += kw.len() + 2;
                start = self.pos;
                continue;
            }
            self.advance();
        }
        pieces.push(self.slice(start, self.pos).trim());
        pieces
    }

    /// Byte offset of the first top-level occurrence of `kw` as a whole word.
    pub fn find_keyword(mut self, kw: &str) -> Option<usize> {
        while self.peek_byte().is_some() {
            if self.at_top_level() && self.word_at(self.pos, kw) {
                return Some(self.pos);
            }
            self.advance();
        }
        None
    }

    /// Offset just past the parenthesis matching the `(` at `open`, or
    /// `None` when it is never closed.
    pub fn matching_paren(mut self, open: usize) -> Option<usize> {
        self.pos = open;
        if self.peek_byte() != Some(b'(') {
            return None;
        }
        self.advance();
        while self.peek_byte().is_some() {
            self.advance();
            if self.at_top_level() {
                return Some(self.pos);
            }
        }
        None
    }

    fn separator_keyword_at(&self, pos: usize, kw: &str) -> bool {
        let end = pos + kw.len() + 2;
        if end > self.input.len() {
            return false;
        }
        self.input[pos].is_ascii_whitespace()
            && self.input[end - 1].is_ascii_whitespace()
            && self.input[pos + 1..end - 1].eq_ignore_ascii_case(kw.as_bytes())
    }

    fn word_at(&self, pos: usize, kw: &str) -> bool {
        let end = pos + kw.len();
        if end > self.input.len() {
            return false;
        }
        if !self.input[pos..end].eq_ignore_ascii_case(kw.as_bytes()) {
            return false;
        }
        let before_ok = pos == 0 || !is_ident_part(self.input[pos - 1]);
        let after_ok = end == self.input.len() || !is_ident_part(self.input[end]);
        before_ok && after_ok
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        // Boundaries always fall on ASCII separators, so they are char boundaries.
        std::str::from_utf8(&self.input[start..end]).unwrap_or_default()
    }
}

pub fn is_ident_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Strip surrounding single quotes and decode `''` escapes.
/// Returns `None` when `raw` is not a complete single-quoted string.
pub fn unquote(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'\'' || bytes[bytes.len() - 1] != b'\'' {
        return None;
    }
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' && chars.peek() == Some(&'\'') {
            chars.next();
        }
        out.push(c);
    }
    Some(out)
}

/// Strip surrounding double quotes from an identifier, if present.
pub fn unquote_ident(raw: &str) -> &str {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_quotes_and_parens() {
        let parts = Scanner::new("a TEXT, b NUMERIC(10, 2), c 'x,y'").split(b',');
        assert_eq!(parts, vec!["a TEXT", "b NUMERIC(10, 2)", "c 'x,y'"]);
    }

    #[test]
    fn split_handles_escaped_quote() {
        let parts = Scanner::new("'it''s, ok', 2").split(b',');
        assert_eq!(parts, vec!["'it''s, ok'", "2"]);
    }

    #[test]
    fn split_empty_input_yields_one_piece() {
        assert_eq!(Scanner::new("").split(b','), vec![""]);
    }

    #[test]
    fn split_keyword_is_case_insensitive() {
        let parts = Scanner::new("a = 1 and b IS NULL AND c = 'x'").split_keyword("AND");
        assert_eq!(parts, vec!["a = 1", "b IS NULL", "c = 'x'"]);
    }

    #[test]
    fn split_keyword_ignores_quoted_text() {
        let parts = Scanner::new("name = 'Tom AND Jerry' AND id = 1").split_keyword("AND");
        assert_eq!(parts, vec!["name = 'Tom AND Jerry'", "id = 1"]);
    }

    #[test]
    fn split_keyword_requires_surrounding_spaces() {
        let parts = Scanner::new("brand = 'x'").split_keyword("AND");
        assert_eq!(parts, vec!["brand = 'x'"]);
    }

    #[test]
    fn split_keyword_accepts_any_whitespace() {
        let parts = Scanner::new("a = 1\tAND\nb = 2").split_keyword("AND");
        assert_eq!(parts, vec!["a = 1", "b = 2"]);
    }

    #[test]
    fn find_keyword_matches_whole_words_only() {
        let quoted = Scanner::new("a = 'WHERE' WHERE b = 1");
        assert_eq!(quoted.find_keyword("where"), Some(12));
        assert_eq!(Scanner::new("somewhere = 1").find_keyword("WHERE"), None);
    }

    #[test]
    fn matching_paren_skips_nested_and_quoted() {
        let text = "t (a, b(1), ')') VALUES";
        assert_eq!(Scanner::new(text).matching_paren(2), Some(16));
        assert_eq!(Scanner::new("(a, b").matching_paren(0), None);
    }

    #[test]
    fn unquote_decodes_escapes() {
        assert_eq!(unquote("'it''s'"), Some("it's".to_string()));
        assert_eq!(unquote("''"), Some(String::new()));
        assert_eq!(unquote("abc"), None);
        assert_eq!(unquote("'abc"), None);
    }

    #[test]
    fn unquote_ident_strips_double_quotes() {
        assert_eq!(unquote_ident("\"Name\""), "Name");
        assert_eq!(unquote_ident(" Name "), "Name");
    }
}
