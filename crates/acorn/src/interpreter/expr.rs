//! Expression evaluation

use crate::ast::*;
use crate::error::VmError;
use crate::interpreter::Interpreter;
use crate::span::Span;
use crate::value::{Table, Value};
use crate::vm::{STACK_GROW_SIZE, STACK_RED_ZONE};
use std::cell::RefCell;
use std::rc::Rc;

impl<'vm> Interpreter<'vm> {
    /// Evaluate `expr`, growing the native stack when it runs low
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, VmError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_expr_inner(expr))
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> Result<Value, VmError> {
        match expr {
            Expr::Literal(literal, _) => Ok(match literal {
                Literal::Integer(n) => Value::Integer(*n),
                Literal::Float(n) => Value::Float(*n),
                Literal::String(s) => Value::string(s),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),
            Expr::Identifier(id) => self
                .lookup(&id.name)
                .ok_or_else(|| self.missing_index(&id.name, id.span)),
            Expr::Unary(unary) => self.eval_unary(unary),
            Expr::Binary(binary) => self.eval_binary(binary),
            Expr::Call(call) => self.eval_call(call),
            Expr::Index(index) => {
                let target = self.eval_expr(&index.target)?;
                let key = self.eval_expr(&index.index)?;
                self.load(target, key, index.span)
            }
            Expr::Assign(assign) => self.eval_assign(assign),
            Expr::Array(array) => {
                let mut elements = Vec::with_capacity(array.elements.len());
                for element in &array.elements {
                    elements.push(self.eval_expr(element)?);
                }
                Ok(Value::Array(Rc::new(RefCell::new(elements))))
            }
            Expr::Table(table) => {
                let mut slots = Table::new();
                for (key, value) in &table.entries {
                    let value = self.eval_expr(value)?;
                    slots.insert(key.name.as_str(), value);
                }
                Ok(Value::Table(Rc::new(RefCell::new(slots))))
            }
            Expr::Typeof(typeof_expr) => {
                let value = self.eval_expr(&typeof_expr.expr)?;
                Ok(Value::string(value.type_of().name()))
            }
            Expr::Group(group) => self.eval_expr(&group.expr),
        }
    }

    fn missing_index(&self, name: &str, span: Span) -> VmError {
        self.error(format!("the index '{}' does not exist", name), span)
    }

    fn eval_call(&mut self, call: &CallExpr) -> Result<Value, VmError> {
        let callee = self.eval_expr(&call.callee)?;
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expr(arg)?);
        }

        self.vm
            .invoke(&callee, args)
            .map_err(|err| err.at(|| self.location(call.span)))
    }

    fn eval_unary(&mut self, unary: &UnaryExpr) -> Result<Value, VmError> {
        let value = self.eval_expr(&unary.expr)?;
        match (unary.op, value) {
            (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
            (UnaryOp::Negate, Value::Integer(n)) => Ok(Value::Integer(n.wrapping_neg())),
            (UnaryOp::Negate, Value::Float(n)) => Ok(Value::Float(-n)),
            (UnaryOp::Negate, other) => Err(self.error(
                format!("cannot negate '{}'", other.type_of()),
                unary.span,
            )),
        }
    }

    fn eval_binary(&mut self, binary: &BinaryExpr) -> Result<Value, VmError> {
        let left = self.eval_expr(&binary.left)?;

        // Short-circuit operators yield one of their operands
        match binary.op {
            BinaryOp::And if !left.is_truthy() => return Ok(left),
            BinaryOp::Or if left.is_truthy() => return Ok(left),
            BinaryOp::And | BinaryOp::Or => return self.eval_expr(&binary.right),
            _ => {}
        }

        let right = self.eval_expr(&binary.right)?;
        match binary.op {
            BinaryOp::Eq => Ok(Value::Bool(left.loosely_equals(&right))),
            BinaryOp::Ne => Ok(Value::Bool(!left.loosely_equals(&right))),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                self.compare(binary.op, &left, &right, binary.span)
            }
            _ => self.arithmetic(binary.op, left, right, binary.span),
        }
    }

    fn arithmetic(&self, op: BinaryOp, left: Value, right: Value, span: Span) -> Result<Value, VmError> {
        match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => {
                let (a, b) = (*a, *b);
                let result = match op {
                    BinaryOp::Add => a.wrapping_add(b),
                    BinaryOp::Sub => a.wrapping_sub(b),
                    BinaryOp::Mul => a.wrapping_mul(b),
                    BinaryOp::Div if b == 0 => return Err(self.error("division by zero", span)),
                    BinaryOp::Div => a.wrapping_div(b),
                    BinaryOp::Mod if b == 0 => return Err(self.error("modulo by zero", span)),
                    _ => a.wrapping_rem(b),
                };
                Ok(Value::Integer(result))
            }
            (Value::String(_), _) | (_, Value::String(_)) if op == BinaryOp::Add => {
                Ok(Value::string(&format!("{}{}", left, right)))
            }
            _ => match (as_float(&left), as_float(&right)) {
                (Some(a), Some(b)) => Ok(Value::Float(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                })),
                _ => Err(self.error(
                    format!(
                        "cannot apply '{}' to '{}' and '{}'",
                        symbol(op),
                        left.type_of(),
                        right.type_of()
                    ),
                    span,
                )),
            },
        }
    }

    fn compare(&self, op: BinaryOp, left: &Value, right: &Value, span: Span) -> Result<Value, VmError> {
        let ordering = match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            _ => match (as_float(left), as_float(right)) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => {
                    return Err(self.error(
                        format!("cannot compare '{}' and '{}'", left.type_of(), right.type_of()),
                        span,
                    ))
                }
            },
        };

        // NaN compares false both ways
        let result = ordering.is_some_and(|ordering| match op {
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Le => ordering.is_le(),
            BinaryOp::Gt => ordering.is_gt(),
            _ => ordering.is_ge(),
        });
        Ok(Value::Bool(result))
    }

    fn eval_assign(&mut self, assign: &AssignExpr) -> Result<Value, VmError> {
        match &assign.target {
            AssignTarget::Name(id) => {
                let value = self.eval_expr(&assign.value)?;
                match assign.op {
                    AssignOp::NewSlot => {
                        self.vm
                            .root()
                            .borrow_mut()
                            .insert(id.name.as_str(), value.clone());
                    }
                    AssignOp::Set => {
                        let local = self
                            .scopes
                            .iter_mut()
                            .rev()
                            .find_map(|scope| scope.get_mut(&id.name));
                        match local {
                            Some(slot) => *slot = value.clone(),
                            None => {
                                let updated = self
                                    .vm
                                    .root()
                                    .borrow_mut()
                                    .set_existing(&id.name, value.clone());
                                if !updated {
                                    return Err(self.missing_index(&id.name, id.span));
                                }
                            }
                        }
                    }
                }
                Ok(value)
            }
            AssignTarget::Index { target, index } => {
                let container = self.eval_expr(target)?;
                let key = self.eval_expr(index)?;
                let value = self.eval_expr(&assign.value)?;
                self.store(container, key, value.clone(), assign.op, assign.span)?;
                Ok(value)
            }
        }
    }

    fn load(&self, container: Value, key: Value, span: Span) -> Result<Value, VmError> {
        match container {
            Value::Table(table) => {
                let key = self.table_key(key, span)?;
                let value = table.borrow().get(&key).cloned();
                value.ok_or_else(|| self.missing_index(&key, span))
            }
            Value::Array(array) => {
                let array = array.borrow();
                let index = self.array_index(&key, array.len(), span)?;
                Ok(array[index].clone())
            }
            other => Err(self.error(format!("attempt to index '{}'", other.type_of()), span)),
        }
    }

    fn store(&self, container: Value, key: Value, value: Value, op: AssignOp, span: Span) -> Result<(), VmError> {
        match container {
            Value::Table(table) => {
                let key = self.table_key(key, span)?;
                let mut table = table.borrow_mut();
                match op {
                    AssignOp::NewSlot => {
                        table.insert(key, value);
                    }
                    AssignOp::Set => {
                        if !table.set_existing(&key, value) {
                            return Err(self.missing_index(&key, span));
                        }
                    }
                }
                Ok(())
            }
            Value::Array(array) => {
                if op == AssignOp::NewSlot {
                    return Err(self.error("cannot create slots in an array", span));
                }
                let mut array = array.borrow_mut();
                let index = self.array_index(&key, array.len(), span)?;
                array[index] = value;
                Ok(())
            }
            other => Err(self.error(format!("attempt to index '{}'", other.type_of()), span)),
        }
    }

    fn table_key(&self, key: Value, span: Span) -> Result<Rc<str>, VmError> {
        match key {
            Value::String(key) => Ok(key),
            other => Err(self.error(
                format!("table keys must be strings, got '{}'", other.type_of()),
                span,
            )),
        }
    }

    fn array_index(&self, key: &Value, len: usize, span: Span) -> Result<usize, VmError> {
        match key {
            Value::Integer(n) => usize::try_from(*n)
                .ok()
                .filter(|index| *index < len)
                .ok_or_else(|| self.error(format!("index {} out of range", n), span)),
            other => Err(self.error(
                format!("array index must be an integer, got '{}'", other.type_of()),
                span,
            )),
        }
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(n) => Some(*n as f64),
        Value::Float(n) => Some(*n),
        _ => None,
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
    }
}
