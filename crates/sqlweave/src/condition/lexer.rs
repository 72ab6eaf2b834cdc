//! Tokenizer for free-text conditions such as `age > 30` or
//! `name IN ('a', 'b')`.

use crate::error::{WeaveError, WeaveResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    IsNotNull,
    IsNull,
    NotIn,
    Not,
    Between,
    In,
    Ilike,
    Like,
    /// `= != <> < > <= >=`
    Comparison,
    LParen,
    RParen,
    /// Single-quoted literal, unescaped.
    Str,
    Number,
    And,
    Or,
    Ident,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the token start.
    pub offset: usize,
}

pub(crate) struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn token(&self, kind: TokenKind, text: impl Into<String>) -> Token {
        Token {
            kind,
            text: text.into(),
            offset: self.start,
        }
    }

    fn error(&self, message: &str) -> WeaveError {
        WeaveError::parse(self.input, self.start, message)
    }

    /// The word following `from` after optional whitespace, with its end offset.
    fn word_after(&self, from: usize) -> Option<(&'a str, usize)> {
        let rest = &self.input[from..];
        let trimmed = rest.trim_start();
        if trimmed.len() == rest.len() {
            return None;
        }
        let begin = from + (rest.len() - trimmed.len());
        let len = trimmed
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(trimmed.len());
        (len > 0).then(|| (&self.input[begin..begin + len], begin + len))
    }

    fn scan_word(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let word = &self.input[self.start..self.pos];
        let upper = word.to_ascii_uppercase();

        let kind = match upper.as_str() {
            "IS" => match self.word_after(self.pos) {
                Some((w, end)) if w.eq_ignore_ascii_case("NULL") => {
                    self.pos = end;
                    Some(TokenKind::IsNull)
                }
                Some((w, end)) if w.eq_ignore_ascii_case("NOT") => match self.word_after(end) {
                    Some((w2, end2)) if w2.eq_ignore_ascii_case("NULL") => {
                        self.pos = end2;
                        Some(TokenKind::IsNotNull)
                    }
                    _ => None,
                },
                _ => None,
            },
            "NOT" => match self.word_after(self.pos) {
                Some((w, end)) if w.eq_ignore_ascii_case("IN") => {
                    self.pos = end;
                    Some(TokenKind::NotIn)
                }
                _ => Some(TokenKind::Not),
            },
            "BETWEEN" => Some(TokenKind::Between),
            "IN" => Some(TokenKind::In),
            "ILIKE" => Some(TokenKind::Ilike),
            "LIKE" => Some(TokenKind::Like),
            "AND" => Some(TokenKind::And),
            "OR" => Some(TokenKind::Or),
            _ => None,
        };

        match kind {
            Some(kind) => self.token(kind, &self.input[self.start..self.pos]),
            None => self.token(TokenKind::Ident, word),
        }
    }

    fn scan_number(&mut self) -> WeaveResult<Token> {
        if self.peek() == Some('-') {
            self.advance();
        }
        let digits_start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == digits_start {
            return Err(self.error("expected digits"));
        }
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        // `12abc` is neither a number nor an identifier.
        if self
            .peek()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            return Err(self.error("malformed number"));
        }
        Ok(self.token(TokenKind::Number, &self.input[self.start..self.pos]))
    }

    fn scan_string(&mut self) -> WeaveResult<Token> {
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.advance();
                    value.push('\'');
                }
                Some('\'') => break,
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string literal")),
            }
        }
        Ok(self.token(TokenKind::Str, value))
    }

    fn scan_comparison(&mut self) -> WeaveResult<Token> {
        let first = self.advance();
        let second = self.peek();
        match (first, second) {
            (Some('!'), Some('=')) | (Some('<'), Some('>' | '=')) | (Some('>'), Some('=')) => {
                self.advance();
            }
            (Some('!'), _) => return Err(self.error("expected '=' after '!'")),
            _ => {}
        }
        Ok(self.token(TokenKind::Comparison, &self.input[self.start..self.pos]))
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> WeaveResult<Vec<Token>> {
        let mut out = Vec::new();
        loop {
            self.skip_whitespace();
            self.start = self.pos;
            let Some(c) = self.peek() else { break };
            let token = match c {
                '(' => {
                    self.advance();
                    self.token(TokenKind::LParen, "(")
                }
                ')' => {
                    self.advance();
                    self.token(TokenKind::RParen, ")")
                }
                ',' => {
                    self.advance();
                    self.token(TokenKind::Comma, ",")
                }
                '\'' => self.scan_string()?,
                '=' | '!' | '<' | '>' => self.scan_comparison()?,
                '-' if self.peek_next().is_some_and(|n| n.is_ascii_digit()) => self.scan_number()?,
                c if c.is_ascii_digit() => self.scan_number()?,
                c if c.is_ascii_alphabetic() || c == '_' => self.scan_word(),
                _ => return Err(self.error("unexpected character")),
            };
            out.push(token);
        }
        Ok(out)
    }
}
