//! Formula lexer.

use std::iter::Peekable;
use std::str::CharIndices;

/// Formula token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Identifiers and literals
    Ident(String),
    Str(String),
    Num(f64),

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Question,
    Colon,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    StrictEq,
    StrictNotEq,
    AndAnd,
    OrOr,

    // End of input
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character {ch:?} at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated string starting at {0}")]
    UnterminatedString(usize),

    #[error("invalid escape sequence at {0}")]
    BadEscape(usize),

    #[error("invalid number {text:?} at {pos}")]
    BadNumber { text: String, pos: usize },
}

/// Formula lexer.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenizes the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    /// Consumes the next character if it is `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let Some(&(pos, c)) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        if c.is_ascii_digit() || (c == '.' && self.digit_follows(pos)) {
            return self.read_number(pos);
        }
        if is_ident_start(c) {
            return Ok(Token::Ident(self.read_identifier()));
        }
        if c == '"' || c == '\'' {
            return self.read_string(pos);
        }

        self.bump();
        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '?' => Token::Question,
            ':' => Token::Colon,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '%' => Token::Percent,
            '<' => {
                if self.eat('=') {
                    Token::Le
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Ge
                } else {
                    Token::Gt
                }
            }
            '!' => {
                if !self.eat('=') {
                    Token::Bang
                } else if self.eat('=') {
                    Token::StrictNotEq
                } else {
                    Token::NotEq
                }
            }
            '=' if self.eat('=') => {
                if self.eat('=') {
                    Token::StrictEq
                } else {
                    Token::EqEq
                }
            }
            '&' if self.eat('&') => Token::AndAnd,
            '|' if self.eat('|') => Token::OrOr,
            _ => return Err(LexError::UnexpectedChar { ch: c, pos }),
        };
        Ok(token)
    }

    fn digit_follows(&self, pos: usize) -> bool {
        self.input[pos + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    fn read_number(&mut self, start: usize) -> Result<Token, LexError> {
        let mut end = start;
        let mut seen_dot = false;
        let mut seen_exp = false;

        while let Some(&(i, c)) = self.chars.peek() {
            let take = match c {
                '0'..='9' => true,
                '.' if !seen_dot && !seen_exp => {
                    seen_dot = true;
                    true
                }
                'e' | 'E' if !seen_exp => {
                    seen_exp = true;
                    // Allow a sign right after the exponent marker.
                    self.bump();
                    end = i + 1;
                    if let Some(&(j, '+' | '-')) = self.chars.peek() {
                        self.bump();
                        end = j + 1;
                    }
                    continue;
                }
                _ => false,
            };
            if !take {
                break;
            }
            self.bump();
            end = i + c.len_utf8();
        }

        let text = &self.input[start..end];
        if self.peek_char().is_some_and(is_ident_start) {
            return Err(LexError::BadNumber {
                text: text.to_owned(),
                pos: start,
            });
        }
        text.parse::<f64>()
            .map(Token::Num)
            .map_err(|_| LexError::BadNumber {
                text: text.to_owned(),
                pos: start,
            })
    }

    /// Reads a quoted string. Escapes follow JSON, plus `\'` so single-quoted
    /// strings can contain their own quote.
    fn read_string(&mut self, start: usize) -> Result<Token, LexError> {
        let Some((_, quote)) = self.bump() else {
            return Err(LexError::UnterminatedString(start));
        };
        let mut s = String::new();
        loop {
            let Some((pos, c)) = self.bump() else {
                return Err(LexError::UnterminatedString(start));
            };
            match c {
                c if c == quote => return Ok(Token::Str(s)),
                '\\' => {
                    let Some((_, escaped)) = self.bump() else {
                        return Err(LexError::UnterminatedString(start));
                    };
                    match escaped {
                        '"' | '\'' | '\\' | '/' => s.push(escaped),
                        'b' => s.push('\u{8}'),
                        'f' => s.push('\u{c}'),
                        'n' => s.push('\n'),
                        'r' => s.push('\r'),
                        't' => s.push('\t'),
                        'u' => s.push(self.read_unicode_escape(pos)?),
                        _ => return Err(LexError::BadEscape(pos)),
                    }
                }
                _ => s.push(c),
            }
        }
    }

    /// Reads the `XXXX` of a `\uXXXX` escape, joining surrogate pairs.
    fn read_unicode_escape(&mut self, pos: usize) -> Result<char, LexError> {
        let high = self.read_hex4(pos)?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high).ok_or(LexError::BadEscape(pos));
        }
        if !(self.eat('\\') && self.eat('u')) {
            return Err(LexError::BadEscape(pos));
        }
        let low = self.read_hex4(pos)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(LexError::BadEscape(pos));
        }
        let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(code).ok_or(LexError::BadEscape(pos))
    }

    fn read_hex4(&mut self, pos: usize) -> Result<u32, LexError> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|(_, c)| c.to_digit(16))
                .ok_or(LexError::BadEscape(pos))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
