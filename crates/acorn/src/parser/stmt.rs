//! Statement parsing

use crate::ast::*;
use crate::parser::Parser;
use crate::span::Span;
use crate::token::TokenKind;

impl Parser {
    /// Parse a statement
    pub(super) fn parse_statement(&mut self) -> Result<Stmt, ()> {
        self.nested("statement", |parser| match parser.peek().kind {
            TokenKind::Local => parser.parse_local_decl(),
            TokenKind::Function => Ok(Stmt::Function(parser.parse_function()?)),
            TokenKind::If => parser.parse_if_stmt(),
            TokenKind::While => parser.parse_while_stmt(),
            TokenKind::Return => parser.parse_return_stmt(),
            TokenKind::Throw => parser.parse_throw_stmt(),
            TokenKind::LeftBrace => Ok(Stmt::Block(parser.parse_block()?)),
            TokenKind::Semicolon => {
                // Empty statement
                let span = parser.advance().span;
                Ok(Stmt::Block(Block {
                    statements: Vec::new(),
                    span,
                }))
            }
            _ => parser.parse_expr_stmt(),
        })
    }

    /// Consume an optional `;` and return the span of the statement end
    fn end_statement(&mut self) -> Span {
        self.match_token(TokenKind::Semicolon);
        self.previous_span()
    }

    /// Parse `local name [= init];`
    fn parse_local_decl(&mut self) -> Result<Stmt, ()> {
        let keyword_span = self.advance().span;
        let name = self.consume_identifier("a variable name")?;

        let init = if self.match_token(TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let end_span = self.end_statement();

        Ok(Stmt::Local(LocalDecl {
            name,
            init,
            span: keyword_span.merge(end_span),
        }))
    }

    /// Parse `function name(params) { body }`
    pub(super) fn parse_function(&mut self) -> Result<FunctionDecl, ()> {
        let fn_span = self.advance().span;
        let name = self.consume_identifier("a function name")?;

        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.consume_identifier("a parameter name")?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        let body = self.parse_block()?;
        let span = fn_span.merge(body.span);

        Ok(FunctionDecl {
            name,
            params,
            body,
            span,
        })
    }

    /// Parse `{ statements }`
    pub(super) fn parse_block(&mut self) -> Result<Block, ()> {
        let start_span = self.consume(TokenKind::LeftBrace, "Expected '{'")?.span;
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        let end_span = self.consume(TokenKind::RightBrace, "Expected '}' after block")?.span;

        Ok(Block {
            statements,
            span: start_span.merge(end_span),
        })
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ()> {
        let if_span = self.advance().span;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;

        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.match_token(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        let span = if_span.merge(self.previous_span());
        Ok(Stmt::If(IfStmt {
            cond,
            then_branch,
            else_branch,
            span,
        }))
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt, ()> {
        let while_span = self.advance().span;
        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after condition")?;
        let body = Box::new(self.parse_statement()?);

        let span = while_span.merge(self.previous_span());
        Ok(Stmt::While(WhileStmt { cond, body, span }))
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt, ()> {
        let return_span = self.advance().span;

        let value = if self.check(TokenKind::Semicolon) || self.check(TokenKind::RightBrace) || self.is_at_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let end_span = self.end_statement();

        Ok(Stmt::Return(ReturnStmt {
            value,
            span: return_span.merge(end_span),
        }))
    }

    fn parse_throw_stmt(&mut self) -> Result<Stmt, ()> {
        let throw_span = self.advance().span;
        let value = self.parse_expression()?;
        let end_span = self.end_statement();

        Ok(Stmt::Throw(ThrowStmt {
            value,
            span: throw_span.merge(end_span),
        }))
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ()> {
        let expr = self.parse_expression()?;
        let span = expr.span().merge(self.end_statement());
        Ok(Stmt::Expr(ExprStmt { expr, span }))
    }
}
