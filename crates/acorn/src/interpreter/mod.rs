//! AST interpreter (tree-walking)
//!
//! Each script call runs in its own `Interpreter` with block-scoped locals.
//! Names that are not locals resolve through the root table. Script
//! functions do not capture enclosing locals.

mod expr;
mod stmt;

use crate::error::{Location, VmError};
use crate::span::Span;
use crate::value::{ScriptFunction, Value};
use crate::vm::Vm;
use std::collections::HashMap;
use std::rc::Rc;

/// Control flow signal for `return`
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Flow {
    Normal,
    Return(Value),
}

/// Interpreter state for one script call
pub(crate) struct Interpreter<'vm> {
    pub(super) vm: &'vm Vm,
    pub(super) function: Rc<ScriptFunction>,
    /// Local scopes (innermost last)
    pub(super) scopes: Vec<HashMap<String, Value>>,
}

impl<'vm> Interpreter<'vm> {
    pub(crate) fn new(vm: &'vm Vm, function: Rc<ScriptFunction>) -> Self {
        Self {
            vm,
            function,
            scopes: Vec::new(),
        }
    }

    /// Run the function body with `args` bound to its parameters
    pub(crate) fn run(mut self, args: Vec<Value>) -> Result<Value, VmError> {
        let params = self
            .function
            .params
            .iter()
            .cloned()
            .zip(args)
            .collect::<HashMap<_, _>>();
        self.scopes.push(params);

        let function = Rc::clone(&self.function);
        match self.exec_statements(&function.body)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Null),
        }
    }

    pub(super) fn location(&self, span: Span) -> Location {
        let source = &self.function.source;
        let (line, column) = span.line_column(&source.text);
        Location {
            label: source.label.clone(),
            line,
            column,
        }
    }

    /// Runtime error located at `span`
    pub(super) fn error(&self, message: impl Into<String>, span: Span) -> VmError {
        VmError::Runtime {
            message: message.into(),
            location: Some(self.location(span)),
        }
    }

    /// Resolve a name through the local scopes, then the root table
    pub(super) fn lookup(&self, name: &str) -> Option<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
            .or_else(|| self.vm.root().borrow().get(name).cloned())
    }
}
