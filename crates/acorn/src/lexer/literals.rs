//! Literal scanning for the lexer

use crate::diagnostic;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl Lexer {
    /// Scan a string literal
    pub(super) fn string(&mut self) -> Token {
        let mut value = String::new();
        let mut error_token = None;

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\\' {
                self.advance(); // consume backslash
                if self.is_at_end() {
                    return self.error_token(diagnostic::UNTERMINATED_STRING, "Unterminated string literal");
                }

                let escape_char = self.advance();
                let escaped = match escape_char {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '0' => '\0',
                    '\\' => '\\',
                    '"' => '"',
                    '\'' => '\'',
                    _ => {
                        // Keep scanning so the rest of the string is consumed
                        if error_token.is_none() {
                            error_token = Some(self.error_token(
                                diagnostic::INVALID_ESCAPE,
                                &format!("Invalid escape sequence '\\{}'", escape_char),
                            ));
                        }
                        continue;
                    }
                };
                value.push(escaped);
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return self.error_token(diagnostic::UNTERMINATED_STRING, "Unterminated string literal");
        }

        self.advance(); // Closing "

        error_token.unwrap_or_else(|| self.make_token(TokenKind::String, &value))
    }

    /// Scan a number literal (integer, float, or scientific notation)
    pub(super) fn number(&mut self) -> Token {
        let start = self.current - 1;
        let mut is_float = false;

        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance(); // consume .
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        if self.peek() == 'e' || self.peek() == 'E' {
            is_float = true;
            self.advance();
            if self.peek() == '+' || self.peek() == '-' {
                self.advance();
            }
            if !self.peek().is_ascii_digit() {
                return self.error_token(
                    diagnostic::INVALID_NUMBER,
                    "Invalid number: exponent requires digits",
                );
            }
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme: String = self.chars[start..self.current].iter().collect();
        if is_float {
            self.make_token(TokenKind::Float, &lexeme)
        } else if lexeme.parse::<i64>().is_err() {
            self.error_token(
                diagnostic::INVALID_NUMBER,
                &format!("Integer literal '{}' is out of range", lexeme),
            )
        } else {
            self.make_token(TokenKind::Integer, &lexeme)
        }
    }

    /// Scan an identifier or keyword
    pub(super) fn identifier(&mut self) -> Token {
        let start = self.current - 1;

        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let lexeme: String = self.chars[start..self.current].iter().collect();
        let kind = TokenKind::is_keyword(&lexeme).unwrap_or(TokenKind::Identifier);

        self.make_token(kind, &lexeme)
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostic;
    use crate::lexer::Lexer;
    use crate::token::TokenKind;
    use rstest::rstest;

    #[rstest]
    #[case("42", TokenKind::Integer, "42")]
    #[case("1998.1", TokenKind::Float, "1998.1")]
    #[case("2e10", TokenKind::Float, "2e10")]
    #[case("\"a\\tb\"", TokenKind::String, "a\tb")]
    #[case("local", TokenKind::Local, "local")]
    #[case("_name1", TokenKind::Identifier, "_name1")]
    fn test_single_literal(#[case] source: &str, #[case] kind: TokenKind, #[case] lexeme: &str) {
        let (tokens, diagnostics) = Lexer::new(source).tokenize();
        assert!(diagnostics.is_empty());
        assert_eq!(tokens[0].kind, kind);
        assert_eq!(tokens[0].lexeme, lexeme);
    }

    #[test]
    fn test_member_access_is_not_a_float() {
        let (tokens, _) = Lexer::new("t.x").tokenize();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Identifier, TokenKind::Dot, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[rstest]
    #[case("\"open", diagnostic::UNTERMINATED_STRING)]
    #[case("\"bad \\q\"", diagnostic::INVALID_ESCAPE)]
    #[case("1e+", diagnostic::INVALID_NUMBER)]
    #[case("99999999999999999999", diagnostic::INVALID_NUMBER)]
    fn test_literal_errors(#[case] source: &str, #[case] code: &str) {
        let (tokens, diagnostics) = Lexer::new(source).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(diagnostics[0].code, code);
    }
}
