use std::fmt::Write;

use crate::frontend::token::{Token, TokenKind};

pub struct TokenDumper {
    pub color: bool,
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self { color: true }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";
    const GRN: &'static str = "\x1b[32m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn dump(&self, tokens: &[Token]) {
        print!("{}", self.render(tokens));
    }

    /// One line per token: `[line:col] KIND text`.
    pub fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for token in tokens {
            let colr = if self.color { Self::color(token) } else { "" };
            let reset = if self.color { Self::RESET } else { "" };
            let _ = writeln!(
                out,
                "[{:02}:{:02}] {}{:<8} {}{}",
                token.pos.line,
                token.pos.col,
                colr,
                Self::kind(token),
                Self::text(token),
                reset
            );
        }
        out
    }

    fn kind(token: &Token) -> &'static str {
        match token.kind {
            TokenKind::Integer => "INT",
            TokenKind::Hex => "HEX",
            TokenKind::Name => "NAME",
            TokenKind::ExternName => "EXTERN",
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Operator => "OP",
            TokenKind::EndOfInput => "EOF",
        }
    }

    fn text(token: &Token) -> String {
        match token.kind {
            TokenKind::Hex => format!("0x{}", token.text),
            TokenKind::ExternName => format!("${}", token.text),
            _ => token.text.clone(),
        }
    }

    fn color(token: &Token) -> &'static str {
        match token.kind {
            TokenKind::EndOfInput => Self::DIM,
            TokenKind::Integer | TokenKind::Hex => Self::CYN,
            TokenKind::Name => Self::YEL,
            TokenKind::ExternName => Self::GRN,
            TokenKind::Operator => Self::MAG,
            TokenKind::Keyword => Self::RESET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    #[test]
    fn test_render_plain() {
        let tokens = Lexer::new("x = $k;\n0x0a").tokenize().unwrap();
        let out = TokenDumper::new().no_color().render(&tokens);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "[01:01] NAME     x");
        assert_eq!(lines[2], "[01:05] EXTERN   $k");
        assert_eq!(lines[4], "[02:01] HEX      0x0a");
        assert!(lines[5].contains("EOF"));
    }
}
