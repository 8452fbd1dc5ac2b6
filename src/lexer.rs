//! A shared cursor over the input string, plus the routines for recognizing
//! numeric literals and bracketed unit bodies. The cursor is created per
//! call to [`crate::evaluate`] and destroyed when evaluation returns; it is
//! the only thing in the evaluator that owns mutable state.

use crate::error::EvalError;

/// A byte-offset cursor over the expression text.
///
/// The grammar is ASCII outside of a handful of unit symbols (`°C`, `µ`),
/// both of which are represented as single non-ASCII UTF-8 characters with
/// no ASCII continuation bytes that could be mistaken for operators, so
/// byte-wise scanning with `char` decoding at use sites is safe.
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The next character without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The character one past the next, without consuming anything.
    #[must_use]
    pub fn peek2(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Consumes and returns the next character, if any.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consumes the next character iff it equals `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    /// Sets the cursor to an absolute byte position. Used only by the
    /// conditional skip machinery, which advances the cursor without
    /// constructing a value.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Scans a numeric literal: optional sign, digits, optional fractional
    /// part, optional `e`/`E` exponent with optional sign. Returns the
    /// parsed `f64` and leaves the cursor just past the literal.
    ///
    /// The sign is consumed here only when called from a context where a
    /// leading `+`/`-` is unambiguously part of the number (the primary
    /// parser); infix `+`/`-` is handled by the binary-operator level, never
    /// by this routine, so `a-1` lexes as `a`, `-`, `1`, not `a`, `-1`.
    pub fn scan_number(&mut self, allow_sign: bool) -> Result<f64, EvalError> {
        let start = self.pos;
        let mut saw_digit = false;

        if allow_sign && matches!(self.peek(), Some('+') | Some('-')) {
            self.advance();
        }

        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            saw_digit = true;
        }

        if self.peek() == Some('.') {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
                saw_digit = true;
            }
            if self.peek() == Some('.') {
                return Err(EvalError::BadNumber(start));
            }
        }

        if !saw_digit {
            return Err(EvalError::BadNumber(start));
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let mark = self.pos;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            let mut saw_exp_digit = false;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
                saw_exp_digit = true;
            }
            if !saw_exp_digit {
                return Err(EvalError::BadNumber(mark));
            }
        }

        self.input[start..self.pos]
            .parse::<f64>()
            .map_err(|_| EvalError::BadNumber(start))
    }

    /// Scans an identifier: letters, digits, `.`, `_`, starting with a letter.
    #[must_use]
    pub fn scan_identifier(&mut self) -> Option<&'a str> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.advance();
            }
            _ => return None,
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '.' || c == '_') {
            self.advance();
        }
        Some(&self.input[start..self.pos])
    }

    /// Scans the body of a `[ ... ]` unit bracket, assuming the opening `[`
    /// has already been consumed. Leaves the cursor just past the closing
    /// `]`.
    pub fn scan_unit_body(&mut self) -> Result<&'a str, EvalError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c != ']') {
            self.advance();
        }
        if self.peek() != Some(']') {
            return Err(EvalError::MissingCloseBracket(start));
        }
        let body = &self.input[start..self.pos];
        self.advance();
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_number_reads_integer_part() {
        let mut c = Cursor::new("123abc");
        assert_eq!(c.scan_number(true).unwrap(), 123.0);
        assert_eq!(c.rest(), "abc");
    }

    #[test]
    fn scan_number_reads_sign_fraction_and_exponent() {
        let mut c = Cursor::new("-1.5e-3rest");
        assert_eq!(c.scan_number(true).unwrap(), -1.5e-3);
        assert_eq!(c.rest(), "rest");
    }

    #[test]
    fn scan_number_without_sign_permission_stops_before_sign() {
        let mut c = Cursor::new("-5");
        assert!(c.scan_number(false).is_err());
    }

    #[test]
    fn scan_number_rejects_exponent_without_digits() {
        let mut c = Cursor::new("1e");
        assert!(c.scan_number(true).is_err());
    }

    #[test]
    fn scan_number_rejects_a_second_dot() {
        let mut c = Cursor::new("1.2.3");
        let err = c.scan_number(true).unwrap_err();
        assert!(matches!(err, EvalError::BadNumber(0)));
    }

    #[test]
    fn scan_identifier_allows_dots_and_underscores() {
        let mut c = Cursor::new("foo.bar_baz(");
        assert_eq!(c.scan_identifier(), Some("foo.bar_baz"));
        assert_eq!(c.rest(), "(");
    }

    #[test]
    fn scan_unit_body_stops_at_close_bracket() {
        let mut c = Cursor::new("kg.m/s2] rest");
        assert_eq!(c.scan_unit_body().unwrap(), "kg.m/s2");
        assert_eq!(c.rest(), " rest");
    }

    #[test]
    fn scan_unit_body_without_close_bracket_fails() {
        let mut c = Cursor::new("kg.m");
        assert!(c.scan_unit_body().is_err());
    }
}
