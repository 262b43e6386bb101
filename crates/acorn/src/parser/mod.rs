//! Parser for acorn scripts
//!
//! Statements are parsed by recursive descent and expressions by precedence
//! climbing. A syntax error is recorded as a diagnostic, after which the
//! parser skips to the next statement boundary and carries on.

mod expr;
mod stmt;

use crate::ast::*;
use crate::diagnostic::{Diagnostic, NESTING_TOO_DEEP};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Deepest nesting of statements and expressions a script may use
pub const MAX_NESTING_DEPTH: usize = 128;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_SIZE: usize = 1024 * 1024;

/// Builds a [`Program`] from a token stream
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) diagnostics: Vec<Diagnostic>,
    depth: usize,
}

/// Binding strength of infix operators, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    Lowest,
    Or,         // ||
    And,        // &&
    Equality,   // == !=
    Comparison, // < <= > >=
    Term,       // + -
    Factor,     // * / %
    Unary,      // ! - typeof
    Call,       // () [] .
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    /// Parse every statement, collecting diagnostics instead of stopping
    pub fn parse(&mut self) -> (Program, Vec<Diagnostic>) {
        let mut statements = Vec::new();
        let start = self.peek().span;

        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize(),
            }
        }

        let span = start.merge(self.peek().span);
        (Program { statements, span }, std::mem::take(&mut self.diagnostics))
    }

    // === Helper methods ===

    /// Consume the current token and return it
    pub(super) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    /// Peek at current token
    pub(super) fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    /// Span of the previously consumed token
    pub(super) fn previous_span(&self) -> Span {
        self.tokens[self.current.saturating_sub(1)].span
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    /// Consume the current token if it is `kind`
    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a `kind` token or record `message` as an error
    pub(super) fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, ()> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error(message);
            Err(())
        }
    }

    /// Consume an identifier token
    pub(super) fn consume_identifier(&mut self, context: &str) -> Result<Identifier, ()> {
        let current = self.peek();
        if current.kind == TokenKind::Identifier {
            let token = self.advance();
            Ok(Identifier {
                name: token.lexeme.clone(),
                span: token.span,
            })
        } else if TokenKind::is_keyword(&current.lexeme).is_some() {
            let message = format!("Cannot use keyword '{}' as {}", current.lexeme, context);
            self.error(&message);
            Err(())
        } else {
            let message = format!("Expected {} but found {:?}", context, current.kind);
            self.error(&message);
            Err(())
        }
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.tokens[self.current].kind == TokenKind::Eof
    }

    /// Record an error at the current token
    pub(super) fn error(&mut self, message: &str) {
        let token = self.peek();
        // The lexer already reported this one
        if token.kind == TokenKind::Error {
            return;
        }
        let span = token.span;
        self.diagnostics.push(
            Diagnostic::error(message, span)
                .with_label("syntax error")
                .with_help("statements end with ';' and blocks with '}'"),
        );
    }

    /// Run `parse` one nesting level deeper, or record an error past
    /// [`MAX_NESTING_DEPTH`]
    pub(super) fn nested<T>(
        &mut self,
        what: &str,
        parse: impl FnOnce(&mut Self) -> Result<T, ()>,
    ) -> Result<T, ()> {
        if self.depth >= MAX_NESTING_DEPTH {
            let span = self.peek().span;
            self.diagnostics.push(
                Diagnostic::error_with_code(NESTING_TOO_DEEP, format!("{} nested too deeply", what), span)
                    .with_label("nesting limit")
                    .with_help(format!("at most {} levels are allowed", MAX_NESTING_DEPTH)),
            );
            return Err(());
        }

        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || parse(self));
        self.depth -= 1;
        result
    }

    /// Skip to the next statement boundary after an error
    pub(super) fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.tokens[self.current - 1].kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Function
                | TokenKind::Local
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Throw => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    pub(super) fn parse_source(source: &str) -> (Program, Vec<Diagnostic>) {
        let (tokens, _) = Lexer::new(source).tokenize();
        Parser::new(tokens).parse()
    }

    #[test]
    fn test_parser_empty() {
        let (program, diagnostics) = parse_source("");
        assert!(program.statements.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_recovers_after_error() {
        let (program, diagnostics) = parse_source("local = 1; f();");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_keyword_as_name() {
        let (_, diagnostics) = parse_source("local while = 1;");
        assert!(diagnostics[0].message.contains("Cannot use keyword 'while'"));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |levels: usize| format!("r <- {}1{};", "(".repeat(levels), ")".repeat(levels));

        let (_, diagnostics) = parse_source(&nested(100));
        assert!(diagnostics.is_empty());

        let (_, diagnostics) = parse_source(&nested(100_000));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, crate::diagnostic::NESTING_TOO_DEEP);
        assert_eq!(diagnostics[0].message, "expression nested too deeply");

        let (_, diagnostics) = parse_source(&"{".repeat(100_000));
        assert_eq!(diagnostics[0].message, "statement nested too deeply");
    }

    #[test]
    fn test_lexer_errors_not_reported_twice() {
        let (tokens, lex_diagnostics) = Lexer::new("x <- \"open").tokenize();
        let (_, parse_diagnostics) = Parser::new(tokens).parse();
        assert_eq!(lex_diagnostics.len(), 1);
        assert!(parse_diagnostics.is_empty());
    }
}
