//! Statement execution

use crate::ast::*;
use crate::error::VmError;
use crate::interpreter::{Flow, Interpreter};
use crate::value::{ScriptFunction, Value};
use std::collections::HashMap;
use std::rc::Rc;

impl<'vm> Interpreter<'vm> {
    pub(super) fn exec_statements(&mut self, statements: &[Stmt]) -> Result<Flow, VmError> {
        for stmt in statements {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, VmError> {
        match stmt {
            Stmt::Local(decl) => {
                let value = match &decl.init {
                    Some(init) => self.eval_expr(init)?,
                    None => Value::Null,
                };
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(decl.name.name.clone(), value);
                }
                Ok(Flow::Normal)
            }
            Stmt::Function(decl) => {
                let function = ScriptFunction {
                    name: decl.name.name.clone(),
                    params: decl.params.iter().map(|p| p.name.clone()).collect(),
                    body: decl.body.statements.clone(),
                    source: Rc::clone(&self.function.source),
                };
                self.vm
                    .root()
                    .borrow_mut()
                    .insert(decl.name.name.as_str(), Value::Closure(Rc::new(function)));
                Ok(Flow::Normal)
            }
            Stmt::If(if_stmt) => {
                if self.eval_expr(&if_stmt.cond)?.is_truthy() {
                    self.exec_stmt(&if_stmt.then_branch)
                } else if let Some(else_branch) = &if_stmt.else_branch {
                    self.exec_stmt(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(while_stmt) => {
                while self.eval_expr(&while_stmt.cond)?.is_truthy() {
                    if let Flow::Return(value) = self.exec_stmt(&while_stmt.body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Throw(throw) => {
                let value = self.eval_expr(&throw.value)?;
                Err(self.error(value.to_string(), throw.span))
            }
            Stmt::Block(block) => {
                self.scopes.push(HashMap::new());
                let result = self.exec_statements(&block.statements);
                self.scopes.pop();
                result
            }
            Stmt::Expr(expr_stmt) => {
                self.eval_expr(&expr_stmt.expr)?;
                Ok(Flow::Normal)
            }
        }
    }
}
