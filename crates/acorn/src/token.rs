//! Token types for lexical analysis
//!
//! Defines all token types recognized by the acorn lexer.

use crate::span::Span;
use serde::{Deserialize, Serialize};

/// Token type produced by the lexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text of this token (unescaped contents for strings)
    pub lexeme: String,
    /// Source location
    pub span: Span,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }
}

/// Classification of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal (42)
    Integer,
    /// Float literal (3.14, 1e3)
    Float,
    /// String literal ("hello")
    String,
    /// `true` keyword
    True,
    /// `false` keyword
    False,
    /// `null` keyword
    Null,
    /// Identifier
    Identifier,

    // Keywords
    /// `local` keyword
    Local,
    /// `function` keyword
    Function,
    /// `if` keyword
    If,
    /// `else` keyword
    Else,
    /// `while` keyword
    While,
    /// `return` keyword
    Return,
    /// `throw` keyword
    Throw,
    /// `typeof` keyword
    Typeof,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `=`
    Equal,
    /// `<-` (new slot)
    NewSlot,
    EqualEqual,
    Bang,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AmpAmp,
    PipePipe,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Dot,

    /// Lexer error (the diagnostic is recorded separately)
    Error,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Map an identifier to its keyword kind, if it is one
    pub fn is_keyword(s: &str) -> Option<TokenKind> {
        match s {
            "local" => Some(TokenKind::Local),
            "function" => Some(TokenKind::Function),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "return" => Some(TokenKind::Return),
            "throw" => Some(TokenKind::Throw),
            "typeof" => Some(TokenKind::Typeof),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }
}
