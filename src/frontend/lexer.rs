use thiserror::Error;

use crate::frontend::token::{KEYWORDS, ONE_CHAR_OPERATORS, TWO_CHAR_OPERATORS, Token, TokenKind};
use crate::lang::span::SourcePos;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, pos: SourcePos },

    #[error("Unexpected end of input")]
    UnexpectedEndOfInput { pos: SourcePos },

    #[error("Hex literal '0x{digits}' has an odd number of digits")]
    OddHexLength { digits: String, pos: SourcePos },

    #[error("Integer literal '{text}' is too large")]
    IntegerTooLarge { text: String, pos: SourcePos },
}

impl LexError {
    pub fn pos(&self) -> SourcePos {
        match self {
            LexError::UnexpectedCharacter { pos, .. }
            | LexError::UnexpectedEndOfInput { pos }
            | LexError::OddHexLength { pos, .. }
            | LexError::IntegerTooLarge { pos, .. } => *pos,
        }
    }

    pub fn line(&self) -> usize {
        self.pos().line
    }
}

/// Tokenizer with a single token of lookahead.
///
/// Whitespace and `#` line comments are skipped between tokens. A failed
/// token consumes the offending character, so lexing can resume after it.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    peeked: Option<Result<Token, LexError>>,
    last_end: SourcePos,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            peeked: None,
            last_end: SourcePos::start(),
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn lookahead(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        Some(ch)
    }

    fn here(&self) -> SourcePos {
        SourcePos::new(self.pos, self.line, self.col)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.current() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                while let Some(c) = self.current() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Position where the next token starts.
    ///
    /// With a token already peeked this is that token's start; otherwise it
    /// is the cursor, which may still sit before whitespace.
    pub fn current_position(&self) -> SourcePos {
        match &self.peeked {
            Some(Ok(token)) => token.pos,
            Some(Err(err)) => err.pos(),
            None => self.here(),
        }
    }

    /// Position just past the most recently consumed token.
    pub fn end_position(&self) -> SourcePos {
        self.last_end
    }

    /// True when only whitespace and comments remain.
    pub fn at_end(&mut self) -> bool {
        match &self.peeked {
            Some(Ok(token)) => token.is_eof(),
            Some(Err(_)) => false,
            None => {
                self.skip_whitespace_and_comments();
                self.current().is_none()
            }
        }
    }

    /// Look at the next token without consuming it. Repeated peeks return the
    /// same result.
    pub fn peek(&mut self) -> Result<&Token, LexError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lex_token());
        }
        match self.peeked.as_ref() {
            Some(Ok(token)) => Ok(token),
            Some(Err(err)) => Err(err.clone()),
            None => Err(LexError::UnexpectedEndOfInput { pos: self.here() }),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        let result = match self.peeked.take() {
            Some(result) => result,
            None => self.lex_token(),
        };
        if let Ok(token) = &result {
            if !token.is_eof() {
                self.last_end = token.end;
            }
        }
        result
    }

    /// Lex the whole input, stopping at the first error.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn token(&self, kind: TokenKind, text: String, pos: SourcePos) -> Token {
        Token {
            kind,
            text,
            pos,
            end: self.here(),
        }
    }

    fn lex_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace_and_comments();
        let pos = self.here();

        let Some(ch) = self.current() else {
            return Ok(self.token(TokenKind::EndOfInput, String::new(), pos));
        };

        if ch == '0' && self.lookahead() == Some('x') {
            return self.read_hex(pos);
        }
        if ch.is_ascii_digit() {
            return self.read_integer(pos);
        }
        if is_name_start(ch) {
            let text = self.read_name();
            let kind = if KEYWORDS.contains(&text.as_str()) {
                TokenKind::Keyword
            } else {
                TokenKind::Name
            };
            return Ok(self.token(kind, text, pos));
        }
        if ch == '$' {
            self.advance();
            return match self.current() {
                Some(c) if is_name_start(c) => {
                    let text = self.read_name();
                    Ok(self.token(TokenKind::ExternName, text, pos))
                }
                Some(c) => {
                    let err_pos = self.here();
                    self.advance();
                    Err(LexError::UnexpectedCharacter { ch: c, pos: err_pos })
                }
                None => Err(LexError::UnexpectedEndOfInput { pos: self.here() }),
            };
        }
        self.read_operator(ch, pos)
    }

    fn read_name(&mut self) -> String {
        let mut text = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn read_integer(&mut self, pos: SourcePos) -> Result<Token, LexError> {
        let mut digits = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if digits.parse::<i64>().is_err() {
            return Err(LexError::IntegerTooLarge { text: digits, pos });
        }
        Ok(self.token(TokenKind::Integer, digits, pos))
    }

    fn read_hex(&mut self, pos: SourcePos) -> Result<Token, LexError> {
        self.advance(); // '0'
        self.advance(); // 'x'

        let mut digits = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_hexdigit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if digits.is_empty() {
            let err_pos = self.here();
            return match self.advance() {
                Some(ch) => Err(LexError::UnexpectedCharacter { ch, pos: err_pos }),
                None => Err(LexError::UnexpectedEndOfInput { pos: err_pos }),
            };
        }
        if digits.len() % 2 != 0 {
            return Err(LexError::OddHexLength { digits, pos });
        }
        Ok(self.token(TokenKind::Hex, digits, pos))
    }

    fn read_operator(&mut self, ch: char, pos: SourcePos) -> Result<Token, LexError> {
        if let Some(next) = self.lookahead() {
            let pair: String = [ch, next].iter().collect();
            if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
                self.advance();
                self.advance();
                return Ok(self.token(TokenKind::Operator, pair, pos));
            }
        }
        self.advance();
        if ONE_CHAR_OPERATORS.contains(ch) {
            Ok(self.token(TokenKind::Operator, ch.to_string(), pos))
        } else {
            Err(LexError::UnexpectedCharacter { ch, pos })
        }
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

/// Decode the digits of a hex token into bytes.
pub fn hex_bytes(digits: &str) -> Vec<u8> {
    digits
        .as_bytes()
        .chunks(2)
        .filter_map(|pair| std::str::from_utf8(pair).ok())
        .filter_map(|pair| u8::from_str_radix(pair, 16).ok())
        .collect()
}
