//! Expressions

use crate::ast::*;
use crate::parser::{Parser, Precedence};
use crate::token::{Token, TokenKind};

impl Parser {
    /// Parse an expression, including a trailing `=` or `<-` assignment
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ()> {
        let expr = self.parse_precedence(Precedence::Lowest)?;

        let op = match self.peek().kind {
            TokenKind::Equal => AssignOp::Set,
            TokenKind::NewSlot => AssignOp::NewSlot,
            _ => return Ok(expr),
        };
        self.advance();

        let start = expr.span();
        let target = self.expr_to_assign_target(expr)?;
        // Assignment is right-associative
        let value = self.parse_expression()?;
        let span = start.merge(value.span());

        Ok(Expr::Assign(AssignExpr {
            target,
            op,
            value: Box::new(value),
            span,
        }))
    }

    /// Parse expression with given precedence
    pub(super) fn parse_precedence(&mut self, precedence: Precedence) -> Result<Expr, ()> {
        self.nested("expression", |parser| {
            let mut left = parser.parse_prefix()?;

            while precedence < parser.current_precedence() {
                left = parser.parse_infix(left)?;
            }

            Ok(left)
        })
    }

    fn parse_prefix(&mut self) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::Integer => {
                let token = self.advance();
                let value = token.lexeme.parse::<i64>().unwrap_or_default();
                Ok(Expr::Literal(Literal::Integer(value), token.span))
            }
            TokenKind::Float => {
                let token = self.advance();
                let value = token.lexeme.parse::<f64>().unwrap_or_default();
                Ok(Expr::Literal(Literal::Float(value), token.span))
            }
            TokenKind::String => {
                let token = self.advance();
                Ok(Expr::Literal(Literal::String(token.lexeme.clone()), token.span))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                let value = token.kind == TokenKind::True;
                Ok(Expr::Literal(Literal::Bool(value), token.span))
            }
            TokenKind::Null => {
                let span = self.advance().span;
                Ok(Expr::Literal(Literal::Null, span))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Expr::Identifier(Identifier {
                    name: token.lexeme.clone(),
                    span: token.span,
                }))
            }
            TokenKind::LeftParen => self.parse_group(),
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::LeftBrace => self.parse_table_literal(),
            TokenKind::Minus | TokenKind::Bang => self.parse_unary(),
            TokenKind::Typeof => self.parse_typeof(),
            _ => {
                self.error("Expected expression");
                Err(())
            }
        }
    }

    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::LeftParen => self.parse_call(left),
            TokenKind::LeftBracket => self.parse_index(left),
            TokenKind::Dot => self.parse_member(left),
            _ => self.parse_binary(left),
        }
    }

    pub(super) fn current_precedence(&self) -> Precedence {
        Self::token_precedence(self.peek())
    }

    fn token_precedence(token: &Token) -> Precedence {
        match token.kind {
            TokenKind::PipePipe => Precedence::Or,
            TokenKind::AmpAmp => Precedence::And,
            TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equality,
            TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
                Precedence::Comparison
            }
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
            TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::Dot => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }

    fn parse_binary(&mut self, left: Expr) -> Result<Expr, ()> {
        let op_token = self.advance().clone();
        let op = match op_token.kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::EqualEqual => BinaryOp::Eq,
            TokenKind::BangEqual => BinaryOp::Ne,
            TokenKind::Less => BinaryOp::Lt,
            TokenKind::LessEqual => BinaryOp::Le,
            TokenKind::Greater => BinaryOp::Gt,
            TokenKind::GreaterEqual => BinaryOp::Ge,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::PipePipe => BinaryOp::Or,
            _ => {
                self.error("Expected binary operator");
                return Err(());
            }
        };

        let right = self.parse_precedence(Self::token_precedence(&op_token))?;
        let span = left.span().merge(right.span());

        Ok(Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }))
    }

    fn parse_unary(&mut self) -> Result<Expr, ()> {
        let op_token = self.advance();
        let op = if op_token.kind == TokenKind::Minus {
            UnaryOp::Negate
        } else {
            UnaryOp::Not
        };
        let start = op_token.span;

        let expr = self.parse_precedence(Precedence::Unary)?;
        let span = start.merge(expr.span());

        Ok(Expr::Unary(UnaryExpr {
            op,
            expr: Box::new(expr),
            span,
        }))
    }

    fn parse_typeof(&mut self) -> Result<Expr, ()> {
        let start = self.advance().span;
        let expr = self.parse_precedence(Precedence::Unary)?;
        let span = start.merge(expr.span());

        Ok(Expr::Typeof(TypeofExpr {
            expr: Box::new(expr),
            span,
        }))
    }

    fn parse_group(&mut self) -> Result<Expr, ()> {
        let start_span = self.advance().span;
        let expr = self.parse_expression()?;
        let end_span = self.consume(TokenKind::RightParen, "Expected ')'")?.span;

        Ok(Expr::Group(GroupExpr {
            expr: Box::new(expr),
            span: start_span.merge(end_span),
        }))
    }

    fn parse_array_literal(&mut self) -> Result<Expr, ()> {
        let start_span = self.advance().span;
        let mut elements = Vec::new();

        while !self.check(TokenKind::RightBracket) && !self.is_at_end() {
            elements.push(self.parse_expression()?);
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        let end_span = self.consume(TokenKind::RightBracket, "Expected ']' after array elements")?.span;

        Ok(Expr::Array(ArrayLiteral {
            elements,
            span: start_span.merge(end_span),
        }))
    }

    /// Parse `{ key = value, ... }` (commas optional)
    fn parse_table_literal(&mut self) -> Result<Expr, ()> {
        let start_span = self.advance().span;
        let mut entries = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            let key = self.consume_identifier("a table key")?;
            self.consume(TokenKind::Equal, "Expected '=' after table key")?;
            let value = self.parse_precedence(Precedence::Lowest)?;
            entries.push((key, value));
            self.match_token(TokenKind::Comma);
        }

        let end_span = self.consume(TokenKind::RightBrace, "Expected '}' after table entries")?.span;

        Ok(Expr::Table(TableLiteral {
            entries,
            span: start_span.merge(end_span),
        }))
    }

    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ()> {
        self.advance(); // (
        let mut args = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        let end_span = self.consume(TokenKind::RightParen, "Expected ')' after arguments")?.span;
        let span = callee.span().merge(end_span);

        Ok(Expr::Call(CallExpr {
            callee: Box::new(callee),
            args,
            span,
        }))
    }

    fn parse_index(&mut self, target: Expr) -> Result<Expr, ()> {
        self.advance(); // [
        let index = self.parse_expression()?;
        let end_span = self.consume(TokenKind::RightBracket, "Expected ']' after index")?.span;
        let span = target.span().merge(end_span);

        Ok(Expr::Index(IndexExpr {
            target: Box::new(target),
            index: Box::new(index),
            span,
        }))
    }

    /// `t.key` is sugar for `t["key"]`
    fn parse_member(&mut self, target: Expr) -> Result<Expr, ()> {
        self.advance(); // .
        let key = self.consume_identifier("a member name")?;
        let span = target.span().merge(key.span);

        Ok(Expr::Index(IndexExpr {
            target: Box::new(target),
            index: Box::new(Expr::Literal(Literal::String(key.name), key.span)),
            span,
        }))
    }

    fn expr_to_assign_target(&mut self, expr: Expr) -> Result<AssignTarget, ()> {
        match expr {
            Expr::Identifier(id) => Ok(AssignTarget::Name(id)),
            Expr::Index(index) => Ok(AssignTarget::Index {
                target: index.target,
                index: index.index,
            }),
            _ => {
                self.error("Invalid assignment target");
                Err(())
            }
        }
    }
}
