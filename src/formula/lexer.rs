//! Hand-written lexer for the formula grammar.
//! `**` is lexed as a single token so the parser never sees two adjacent `*`.

use super::error::ParseError;
use std::fmt;

/// A token with its byte offsets in the source: `(start, tok, end)`.
pub type Spanned = (usize, Tok, usize);

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Num(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Num(n) => write!(f, "{}", n),
            Tok::Str(s) => write!(f, "'{}'", s),
            Tok::Ident(s) => write!(f, "{}", s),
            Tok::LParen => f.write_str("("),
            Tok::RParen => f.write_str(")"),
            Tok::Comma => f.write_str(","),
            Tok::Plus => f.write_str("+"),
            Tok::Minus => f.write_str("-"),
            Tok::Star => f.write_str("*"),
            Tok::StarStar => f.write_str("**"),
            Tok::Slash => f.write_str("/"),
        }
    }
}

pub struct Lexer<'input> {
    input: &'input str,
    pos: usize,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Lexer { input, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        let skipped: usize = rest
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(char::len_utf8)
            .sum();
        self.pos += skipped;
    }

    fn take_ident(&mut self) -> String {
        let rest = &self.input[self.pos..];
        let end = rest
            .char_indices()
            .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += end;
        rest[..end].to_string()
    }

    /// `[0-9]+(\.[0-9]*)?` or `\.[0-9]+`, followed by an optional exponent.
    fn take_num(&mut self) -> Result<f64, ParseError> {
        let rest = &self.input[self.pos..];
        let bytes = rest.as_bytes();
        let n = bytes.len();
        let digits = |mut i: usize| {
            while i < n && bytes[i].is_ascii_digit() {
                i += 1;
            }
            i
        };

        let mut end = digits(0);
        if end < n && bytes[end] == b'.' {
            end = digits(end + 1);
        }
        if end < n && (bytes[end] == b'e' || bytes[end] == b'E') {
            let mut exp_end = end + 1;
            if exp_end < n && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
                exp_end += 1;
            }
            let after = digits(exp_end);
            // No digits after the marker: leave `e` for the next token.
            if after > exp_end {
                end = after;
            }
        }

        let text = &rest[..end];
        self.pos += end;
        text.parse::<f64>()
            .map_err(|_| ParseError::InvalidNumber(text.to_string()))
    }

    fn take_string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.pos;
        let body = &self.input[start + 1..];
        match body.find(quote) {
            Some(close) => {
                self.pos = start + 1 + close + 1;
                Ok(body[..close].to_string())
            }
            None => Err(ParseError::UnterminatedString(start)),
        }
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result<Spanned, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.pos;
        let c = self.input[start..].chars().next()?;

        let tok = match c {
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            ',' => Tok::Comma,
            '+' => Tok::Plus,
            '-' => Tok::Minus,
            '/' => Tok::Slash,
            '*' => {
                if self.input[start + 1..].starts_with('*') {
                    self.pos += 2;
                    return Some(Ok((start, Tok::StarStar, self.pos)));
                }
                Tok::Star
            }
            '\'' | '"' => {
                return Some(self.take_string(c).map(|s| (start, Tok::Str(s), self.pos)));
            }
            c if c.is_ascii_digit() || c == '.' => {
                return Some(self.take_num().map(|n| (start, Tok::Num(n), self.pos)));
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident = self.take_ident();
                return Some(Ok((start, Tok::Ident(ident), self.pos)));
            }
            other => return Some(Err(ParseError::UnexpectedChar { ch: other, offset: start })),
        };

        self.pos += c.len_utf8();
        Some(Ok((start, tok, self.pos)))
    }
}
