//! Tokenizer for acorn source
//!
//! The lexer converts acorn source code into a stream of tokens with span
//! information. Errors produce `TokenKind::Error` tokens plus a diagnostic.

use crate::diagnostic::{self, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};

mod literals;

/// Converts source text into tokens
pub struct Lexer {
    pub(super) chars: Vec<char>,
    /// Index of the next unread character
    pub(super) current: usize,
    /// Index where the token being scanned begins
    pub(super) start_pos: usize,
    /// Collected diagnostics
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            current: 0,
            start_pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Scan the whole input; the token list always ends with `Eof`
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        (tokens, std::mem::take(&mut self.diagnostics))
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start_pos = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof, "");
        }

        let c = self.advance();
        if let Some(kind) = single_char_token(c) {
            return self.scanned(kind);
        }

        match c {
            '=' => self.either('=', TokenKind::EqualEqual, TokenKind::Equal),
            '!' => self.either('=', TokenKind::BangEqual, TokenKind::Bang),
            '>' => self.either('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '<' if self.match_char('-') => self.scanned(TokenKind::NewSlot),
            '<' => self.either('=', TokenKind::LessEqual, TokenKind::Less),
            '&' | '|' if self.match_char(c) => {
                let kind = if c == '&' { TokenKind::AmpAmp } else { TokenKind::PipePipe };
                self.scanned(kind)
            }
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            c => self.error_token(
                diagnostic::UNEXPECTED_CHARACTER,
                &format!("Unexpected character '{}'", c),
            ),
        }
    }

    /// `double` if the next character is `next`, otherwise `single`
    fn either(&mut self, next: char, double: TokenKind, single: TokenKind) -> Token {
        let kind = if self.match_char(next) { double } else { single };
        self.scanned(kind)
    }

    /// Token whose lexeme is everything consumed since `start_pos`
    fn scanned(&self, kind: TokenKind) -> Token {
        let lexeme: String = self.chars[self.start_pos..self.current].iter().collect();
        self.make_token(kind, &lexeme)
    }

    /// Skip whitespace and comments (`//`, `#` and `/* */`)
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            if self.is_at_end() {
                return;
            }

            match self.peek() {
                ' ' | '\r' | '\t' | '\n' => {
                    self.advance();
                }
                '#' => self.skip_line(),
                '/' if self.peek_next() == Some('/') => self.skip_line(),
                '/' if self.peek_next() == Some('*') => self.skip_block_comment(),
                _ => return,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let opened_at = self.current;
        self.current += 2;

        while !self.is_at_end() {
            if self.advance() == '*' && self.match_char('/') {
                return;
            }
        }

        self.diagnostics.push(
            Diagnostic::error_with_code(
                diagnostic::UNTERMINATED_COMMENT,
                "Unterminated block comment",
                Span::new(opened_at, self.current),
            )
            .with_label("opened here")
            .with_help("close the comment with '*/'"),
        );
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    // === Character navigation ===

    pub(super) fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    /// Next unread character, `'\0'` at the end
    pub(super) fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    pub(super) fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    /// Consume the next character if it is `expected`
    fn match_char(&mut self, expected: char) -> bool {
        let matched = self.chars.get(self.current) == Some(&expected);
        if matched {
            self.current += 1;
        }
        matched
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    // === Token creation ===

    pub(super) fn make_token(&self, kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, Span::new(self.start_pos, self.current))
    }

    /// Record a diagnostic and return an `Error` token
    pub(super) fn error_token(&mut self, code: &str, message: &str) -> Token {
        let span = Span::new(self.start_pos, self.current.max(self.start_pos + 1));
        self.diagnostics
            .push(Diagnostic::error_with_code(code, message, span).with_label("lexer error"));
        Token::new(TokenKind::Error, message, span)
    }
}

fn single_char_token(c: char) -> Option<TokenKind> {
    let kind = match c {
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        '[' => TokenKind::LeftBracket,
        ']' => TokenKind::RightBracket,
        ';' => TokenKind::Semicolon,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Dot,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Star,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diagnostics) = Lexer::new(source).tokenize();
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {:?}", diagnostics);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_new_slot_and_comparisons() {
        assert_eq!(
            kinds("x <- 1 <= 2 < 3"),
            vec![
                TokenKind::Identifier,
                TokenKind::NewSlot,
                TokenKind::Integer,
                TokenKind::LessEqual,
                TokenKind::Integer,
                TokenKind::Less,
                TokenKind::Integer,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("// line\n# hash\n/* block\n */ f();"),
            vec![
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let (_, diagnostics) = Lexer::new("/* open").tokenize();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, diagnostic::UNTERMINATED_COMMENT);
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, diagnostics) = Lexer::new("a @ b").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(diagnostics[0].code, diagnostic::UNEXPECTED_CHARACTER);
    }
}
