//! Diagnostics for compile-time errors
//!
//! Lexer and parser errors are collected as [`Diagnostic`]s and reported
//! through the runtime's error sink when a buffer fails to compile.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic syntax error
pub const SYNTAX_ERROR: &str = "AC1000";
/// Unexpected character
pub const UNEXPECTED_CHARACTER: &str = "AC1001";
/// Unterminated string literal
pub const UNTERMINATED_STRING: &str = "AC1002";
/// Invalid escape sequence
pub const INVALID_ESCAPE: &str = "AC1003";
/// Unterminated block comment
pub const UNTERMINATED_COMMENT: &str = "AC1004";
/// Malformed or out-of-range number literal
pub const INVALID_NUMBER: &str = "AC1005";
/// Expressions or blocks nested past the parser's limit
pub const NESTING_TOO_DEEP: &str = "AC1006";

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticLevel::Error => write!(f, "error"),
            DiagnosticLevel::Warning => write!(f, "warning"),
        }
    }
}

/// A compile diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    /// Error code (e.g., "AC1002")
    pub code: String,
    pub message: String,
    /// Source label (script name)
    pub file: String,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Length of error span
    pub length: usize,
    /// Short label for the offending range
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub help: Option<String>,
    #[serde(skip)]
    span: Span,
}

impl Diagnostic {
    /// Create a new error diagnostic with code
    pub fn error_with_code(code: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            code: code.into(),
            message: message.into(),
            file: "<unknown>".to_string(),
            line: 1,
            column: span.start + 1,
            length: span.len(),
            label: String::new(),
            help: None,
            span,
        }
    }

    /// Create a new error diagnostic with the generic syntax error code
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::error_with_code(SYNTAX_ERROR, message, span)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Resolve file name, line and column against the source text
    pub fn located(mut self, file: &str, source: &str) -> Self {
        let (line, column) = self.span.line_column(source);
        self.file = file.to_string();
        self.line = line;
        self.column = column;
        self
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}[{}]: {}",
            self.file, self.line, self.column, self.level, self.code, self.message
        )?;
        if let Some(help) = &self.help {
            write!(f, " (help: {})", help)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_located_display() {
        let diag = Diagnostic::error_with_code(UNTERMINATED_STRING, "Unterminated string literal", Span::new(9, 12))
            .located("demo.nut", "x <- 1;\n\n\"abc");
        assert_eq!(diag.line, 3);
        assert_eq!(diag.column, 1);
        assert_eq!(
            diag.to_string(),
            "demo.nut:3:1: error[AC1002]: Unterminated string literal"
        );
    }

    #[test]
    fn test_help_follows_message() {
        let diag = Diagnostic::error("Expected expression", Span::new(0, 1))
            .with_help("statements end with ';'")
            .located("demo.nut", "+");
        assert_eq!(
            diag.to_string(),
            "demo.nut:1:1: error[AC1000]: Expected expression (help: statements end with ';')"
        );
    }
}
