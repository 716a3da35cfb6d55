//! Tokenizer for the query language.

use riffle_common::utils::error::{Error, Result};

/// Token kinds, keywords included (matched case-insensitively).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Arrow,
    Dash,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Star,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    Identifier,
    Integer,
    Float,
    Str,
    Create,
    Delete,
    Match,
    Continuous,
    Where,
    Return,
    And,
    File,
    True,
    False,
    Count,
    Sum,
    Min,
    Max,
    Avg,
    Eof,
}

/// One token with its source text.
#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

/// Hand-written tokenizer over the query bytes.
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.position += 1;
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            text: String::from_utf8_lossy(&self.input[start..self.position]).into_owned(),
            position: start,
        }
    }

    /// Produces the next token.
    ///
    /// # Errors
    ///
    /// Returns a parse error on unterminated strings or bytes outside the
    /// language.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        let start = self.position;
        let Some(byte) = self.bump() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        let kind = match byte {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b':' => TokenKind::Colon,
            b'.' => TokenKind::Dot,
            b'*' => TokenKind::Star,
            b'=' => TokenKind::Eq,
            b'-' => {
                if self.peek() == Some(b'>') {
                    self.position += 1;
                    TokenKind::Arrow
                } else {
                    TokenKind::Dash
                }
            }
            b'<' => match self.peek() {
                Some(b'>') => {
                    self.position += 1;
                    TokenKind::NotEq
                }
                Some(b'=') => {
                    self.position += 1;
                    TokenKind::Le
                }
                _ => TokenKind::Lt,
            },
            b'>' => {
                if self.peek() == Some(b'=') {
                    self.position += 1;
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'\'' => {
                while let Some(b) = self.peek() {
                    if b == b'\'' {
                        break;
                    }
                    self.position += 1;
                }
                if self.bump() != Some(b'\'') {
                    return Err(Error::parse(format!(
                        "unterminated string starting at position {start}"
                    )));
                }
                // Strip the quotes.
                return Ok(Token {
                    kind: TokenKind::Str,
                    text: String::from_utf8_lossy(&self.input[start + 1..self.position - 1])
                        .into_owned(),
                    position: start,
                });
            }
            b'0'..=b'9' => {
                let mut is_float = false;
                while let Some(b) = self.peek() {
                    if b.is_ascii_digit() {
                        self.position += 1;
                    } else if b == b'.' && !is_float
                        && self
                            .input
                            .get(self.position + 1)
                            .is_some_and(u8::is_ascii_digit)
                    {
                        is_float = true;
                        self.position += 1;
                    } else {
                        break;
                    }
                }
                if is_float {
                    TokenKind::Float
                } else {
                    TokenKind::Integer
                }
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                while self
                    .peek()
                    .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
                {
                    self.position += 1;
                }
                let text = &self.input[start..self.position];
                keyword_kind(text).unwrap_or(TokenKind::Identifier)
            }
            other => {
                return Err(Error::parse(format!(
                    "unexpected character {:?} at position {start}",
                    char::from(other)
                )));
            }
        };
        Ok(self.token(kind, start))
    }
}

fn keyword_kind(text: &[u8]) -> Option<TokenKind> {
    let upper: Vec<u8> = text.iter().map(u8::to_ascii_uppercase).collect();
    let kind = match upper.as_slice() {
        b"CREATE" => TokenKind::Create,
        b"DELETE" => TokenKind::Delete,
        b"MATCH" => TokenKind::Match,
        b"CONTINUOUS" => TokenKind::Continuous,
        b"WHERE" => TokenKind::Where,
        b"RETURN" => TokenKind::Return,
        b"AND" => TokenKind::And,
        b"FILE" => TokenKind::File,
        b"TRUE" => TokenKind::True,
        b"FALSE" => TokenKind::False,
        b"COUNT" => TokenKind::Count,
        b"SUM" => TokenKind::Sum,
        b"MIN" => TokenKind::Min,
        b"MAX" => TokenKind::Max,
        b"AVG" => TokenKind::Avg,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(text);
        let mut result = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            let kind = token.kind;
            result.push(kind);
            if kind == TokenKind::Eof {
                return result;
            }
        }
    }

    #[test]
    fn test_pattern_tokens() {
        assert_eq!(
            kinds("(a)-[:FOLLOWS]->(b);"),
            vec![
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Dash,
                TokenKind::LBracket,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::RBracket,
                TokenKind::Arrow,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_arrow_vs_dash() {
        assert_eq!(
            kinds("(a)->(b)"),
            vec![
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(
            kinds("= <> < > <= >="),
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        let mut lexer = Lexer::new("42 3.25 'alice' true");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Integer);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Float);
        let s = lexer.next_token().unwrap();
        assert_eq!(s.kind, TokenKind::Str);
        assert_eq!(s.text, "alice");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::True);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            kinds("continuous match where return"),
            vec![
                TokenKind::Continuous,
                TokenKind::Match,
                TokenKind::Where,
                TokenKind::Return,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("'oops");
        assert!(lexer.next_token().is_err());
    }
}
