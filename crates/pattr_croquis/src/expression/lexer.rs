//! Expression lexer.

use pattr_carton::{is_identifier_char, is_identifier_start, CompactString};

use crate::errors::EvalError;

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    String(String),
    Identifier(CompactString),

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Question,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,

    Eq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,

    EqEq,
    BangEq,
    EqEqEq,
    BangEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    AmpAmp,
    PipePipe,
    QuestionQuestion,
    PlusPlus,
    MinusMinus,

    /// `=>`, template literals and other syntax outside the grammar
    Unsupported(&'static str),

    Eof,
}

/// A token with its byte span
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: u32,
    pub end: u32,
}

/// Tokenize a whole expression source
pub fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let mut lexer = Lexer {
        input: source.as_bytes(),
        source,
        index: 0,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    input: &'a [u8],
    source: &'a str,
    index: usize,
}

impl Lexer<'_> {
    #[inline]
    fn peek(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.index + ahead).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_whitespace()) {
            self.index += 1;
        }
    }

    fn next_token(&mut self) -> Result<Token, EvalError> {
        self.skip_whitespace();
        let start = self.index;
        let Some(c) = self.peek(0) else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        let kind = match c {
            b'0'..=b'9' => return self.number(),
            b'.' if self.peek(1).is_some_and(|d| d.is_ascii_digit()) => return self.number(),
            b'"' | b'\'' => return self.string(c),
            c if is_identifier_start(c) => {
                while self.peek(0).is_some_and(is_identifier_char) {
                    self.index += 1;
                }
                let name = &self.source[start..self.index];
                return Ok(self.token(TokenKind::Identifier(name.into()), start));
            }
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b',' => self.single(TokenKind::Comma),
            b'.' => self.single(TokenKind::Dot),
            b':' => self.single(TokenKind::Colon),
            b';' => self.single(TokenKind::Semicolon),
            b'`' => self.single(TokenKind::Unsupported("template literal")),
            b'?' => match self.peek(1) {
                Some(b'?') => self.many(2, TokenKind::QuestionQuestion),
                Some(b'.') => self.many(2, TokenKind::Unsupported("optional chaining")),
                _ => self.single(TokenKind::Question),
            },
            b'+' => match self.peek(1) {
                Some(b'+') => self.many(2, TokenKind::PlusPlus),
                Some(b'=') => self.many(2, TokenKind::PlusEq),
                _ => self.single(TokenKind::Plus),
            },
            b'-' => match self.peek(1) {
                Some(b'-') => self.many(2, TokenKind::MinusMinus),
                Some(b'=') => self.many(2, TokenKind::MinusEq),
                _ => self.single(TokenKind::Minus),
            },
            b'*' => match self.peek(1) {
                Some(b'=') => self.many(2, TokenKind::StarEq),
                Some(b'*') => self.many(2, TokenKind::Unsupported("exponent operator")),
                _ => self.single(TokenKind::Star),
            },
            b'/' => match self.peek(1) {
                Some(b'=') => self.many(2, TokenKind::SlashEq),
                _ => self.single(TokenKind::Slash),
            },
            b'%' => match self.peek(1) {
                Some(b'=') => self.many(2, TokenKind::PercentEq),
                _ => self.single(TokenKind::Percent),
            },
            b'!' => match (self.peek(1), self.peek(2)) {
                (Some(b'='), Some(b'=')) => self.many(3, TokenKind::BangEqEq),
                (Some(b'='), _) => self.many(2, TokenKind::BangEq),
                _ => self.single(TokenKind::Bang),
            },
            b'=' => match (self.peek(1), self.peek(2)) {
                (Some(b'='), Some(b'=')) => self.many(3, TokenKind::EqEqEq),
                (Some(b'='), _) => self.many(2, TokenKind::EqEq),
                (Some(b'>'), _) => self.many(2, TokenKind::Unsupported("arrow function")),
                _ => self.single(TokenKind::Eq),
            },
            b'<' => match self.peek(1) {
                Some(b'=') => self.many(2, TokenKind::LtEq),
                _ => self.single(TokenKind::Lt),
            },
            b'>' => match self.peek(1) {
                Some(b'=') => self.many(2, TokenKind::GtEq),
                _ => self.single(TokenKind::Gt),
            },
            b'&' if self.peek(1) == Some(b'&') => self.many(2, TokenKind::AmpAmp),
            b'|' if self.peek(1) == Some(b'|') => self.many(2, TokenKind::PipePipe),
            _ => {
                let ch = self.source[start..].chars().next().unwrap_or('?');
                return Err(EvalError::syntax(
                    format!("unexpected character '{}'", ch),
                    start as u32,
                ));
            }
        };
        Ok(self.token(kind, start))
    }

    #[inline]
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.many(1, kind)
    }

    #[inline]
    fn many(&mut self, len: usize, kind: TokenKind) -> TokenKind {
        self.index += len;
        kind
    }

    #[inline]
    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            start: start as u32,
            end: self.index as u32,
        }
    }

    fn eat_digits(&mut self) {
        while self.peek(0).is_some_and(|c| c.is_ascii_digit()) {
            self.index += 1;
        }
    }

    fn number(&mut self) -> Result<Token, EvalError> {
        let start = self.index;
        self.eat_digits();
        if self.peek(0) == Some(b'.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            self.index += 1;
            self.eat_digits();
        }
        if matches!(self.peek(0), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek(1), Some(b'+' | b'-')));
            if self.peek(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                self.index += 1 + sign;
                self.eat_digits();
            }
        }
        if self.peek(0).is_some_and(is_identifier_start) {
            return Err(EvalError::syntax("identifier directly after number", self.index as u32));
        }
        let text = &self.source[start..self.index];
        let value = text
            .parse::<f64>()
            .map_err(|_| EvalError::syntax(format!("invalid number '{}'", text), start as u32))?;
        Ok(self.token(TokenKind::Number(value), start))
    }

    fn string(&mut self, quote: u8) -> Result<Token, EvalError> {
        let start = self.index;
        self.index += 1;
        let mut out = String::new();
        loop {
            let Some(c) = self.peek(0) else {
                return Err(EvalError::syntax("unterminated string", start as u32));
            };
            if c == quote {
                self.index += 1;
                return Ok(self.token(TokenKind::String(out), start));
            }
            if c == b'\\' {
                let escaped = self.source[self.index + 1..].chars().next().ok_or_else(|| {
                    EvalError::syntax("unterminated string", start as u32)
                })?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
                self.index += 1 + escaped.len_utf8();
                continue;
            }
            let ch = self.source[self.index..].chars().next().unwrap_or_default();
            out.push(ch);
            self.index += ch.len_utf8().max(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a === b ?? c++"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::EqEqEq,
                TokenKind::Identifier("b".into()),
                TokenKind::QuestionQuestion,
                TokenKind::Identifier("c".into()),
                TokenKind::PlusPlus,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_and_strings() {
        assert_eq!(
            kinds(r#"1.5 .5 2e3 'it\'s' "é""#),
            vec![
                TokenKind::Number(1.5),
                TokenKind::Number(0.5),
                TokenKind::Number(2000.0),
                TokenKind::String("it's".into()),
                TokenKind::String("é".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_member_access_on_number_literal_is_dot() {
        assert_eq!(
            kinds("items.length"),
            vec![
                TokenKind::Identifier("items".into()),
                TokenKind::Dot,
                TokenKind::Identifier("length".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_errors() {
        assert!(tokenize("'open").is_err());
        assert!(tokenize("a # b").is_err());
        assert!(tokenize("3px").is_err());
    }
}
