use crate::lang::span::SourcePos;

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Decimal digits.
    Integer,
    /// Hex digits of a `0x..` literal, without the prefix.
    Hex,
    Name,
    /// `$name`, resolved from outside the program. The text excludes `$`.
    ExternName,
    /// One of [`KEYWORDS`].
    Keyword,
    /// Punctuation and operators, one or two characters.
    Operator,
    EndOfInput,
}

pub const KEYWORDS: [&str; 9] = [
    "if", "else", "for", "in", "Assert", "true", "false", "and", "or",
];

/// Two-character operators, preferred over their one-character prefixes.
pub const TWO_CHAR_OPERATORS: [&str; 7] = ["==", "<=", ">=", "!=", "||", "&&", ".."];

pub const ONE_CHAR_OPERATORS: &str = "=<>!|&,~+-*/%()[]{}:;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Position of the first character.
    pub pos: SourcePos,
    /// Position just past the last character.
    pub end: SourcePos,
}

impl Token {
    /// True for the operator or keyword spelled `text`.
    pub fn is(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Operator | TokenKind::Keyword) && self.text == text
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TokenKind::Integer => "integer",
            TokenKind::Hex => "hex",
            TokenKind::Name => "name",
            TokenKind::ExternName => "extern",
            TokenKind::Keyword => "keyword",
            TokenKind::Operator => "operator",
            TokenKind::EndOfInput => "eof",
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::EndOfInput => write!(f, "end of input"),
            TokenKind::Hex => write!(f, "'0x{}'", self.text),
            TokenKind::ExternName => write!(f, "'${}'", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}
