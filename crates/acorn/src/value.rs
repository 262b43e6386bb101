//! Runtime value representation
//!
//! - Null, Bool, Integer, Float, UserPointer: immediate values
//! - Strings: immutable, reference-counted (`Rc<str>`)
//! - Tables and arrays: shared, interior-mutable (`Rc<RefCell<..>>`), reference semantics
//! - Closures: script functions (AST + source) or native Rust functions

use crate::ast::Stmt;
use crate::vm::Vm;
use crate::Raised;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::rc::Rc;

/// Result of a native function: the number of return values left on top of its frame
pub type NativeResult = Result<usize, Raised>;

/// Native function entry point
pub type NativeFn = fn(&Vm) -> NativeResult;

/// Type tag of a runtime value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Null,
    Bool,
    Integer,
    Float,
    String,
    UserPointer,
    UserData,
    Table,
    Array,
    Closure,
    NativeClosure,
    Generator,
}

impl ObjectType {
    /// Name as reported by `typeof`
    pub fn name(self) -> &'static str {
        match self {
            ObjectType::Null => "null",
            ObjectType::Bool => "bool",
            ObjectType::Integer => "integer",
            ObjectType::Float => "float",
            ObjectType::String => "string",
            ObjectType::UserPointer => "userpointer",
            ObjectType::UserData => "userdata",
            ObjectType::Table => "table",
            ObjectType::Array => "array",
            ObjectType::Closure => "function",
            ObjectType::NativeClosure => "native function",
            ObjectType::Generator => "generator",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque host pointer. The runtime never dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserPointer(*mut c_void);

impl UserPointer {
    pub fn new(ptr: *mut c_void) -> Self {
        UserPointer(ptr)
    }

    pub fn null() -> Self {
        UserPointer(std::ptr::null_mut())
    }

    /// Wrap the address of a host object
    pub fn from_ref<T>(value: &T) -> Self {
        UserPointer(value as *const T as *mut c_void)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for UserPointer {
    fn default() -> Self {
        Self::null()
    }
}

/// String-keyed table
#[derive(Debug, Default)]
pub struct Table {
    slots: HashMap<Rc<str>, Value>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.slots.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Create or overwrite a slot, returning the previous value
    pub fn insert(&mut self, key: impl Into<Rc<str>>, value: Value) -> Option<Value> {
        self.slots.insert(key.into(), value)
    }

    /// Overwrite an existing slot. Returns false when the key is absent.
    pub fn set_existing(&mut self, key: &str, value: Value) -> bool {
        match self.slots.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.slots.remove(key)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(|k| k.as_ref())
    }
}

/// Script source kept alive by the closures compiled from it
#[derive(Debug)]
pub struct Source {
    pub label: String,
    pub text: String,
}

/// Compiled script function
#[derive(Debug)]
pub struct ScriptFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub source: Rc<Source>,
}

/// Native function bound to a name and an optional host context
pub struct NativeClosure {
    pub name: Rc<str>,
    pub func: NativeFn,
    pub context: Option<Rc<dyn Any>>,
}

impl fmt::Debug for NativeClosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeClosure")
            .field("name", &self.name)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

/// Runtime value
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(Rc<str>),
    UserPointer(UserPointer),
    Table(Rc<RefCell<Table>>),
    Array(Rc<RefCell<Vec<Value>>>),
    Closure(Rc<ScriptFunction>),
    NativeClosure(Rc<NativeClosure>),
}

impl Value {
    pub fn type_of(&self) -> ObjectType {
        match self {
            Value::Null => ObjectType::Null,
            Value::Bool(_) => ObjectType::Bool,
            Value::Integer(_) => ObjectType::Integer,
            Value::Float(_) => ObjectType::Float,
            Value::String(_) => ObjectType::String,
            Value::UserPointer(_) => ObjectType::UserPointer,
            Value::Table(_) => ObjectType::Table,
            Value::Array(_) => ObjectType::Array,
            Value::Closure(_) => ObjectType::Closure,
            Value::NativeClosure(_) => ObjectType::NativeClosure,
        }
    }

    pub fn string(text: &str) -> Self {
        Value::String(Rc::from(text))
    }

    /// Null, false and numeric zero are falsy; everything else is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            _ => true,
        }
    }

    /// Script-level equality: integers and floats compare numerically,
    /// composites compare by identity
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::UserPointer(a), Value::UserPointer(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::NativeClosure(a), Value::NativeClosure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Table(t) => write!(f, "Table({} slots)", t.borrow().len()),
            Value::Array(a) => write!(f, "Array({} elements)", a.borrow().len()),
            Value::Closure(c) => write!(f, "Closure({})", c.name),
            Value::NativeClosure(n) => write!(f, "NativeClosure({})", n.name),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::UserPointer(p) => write!(f, "(userpointer : {:p})", p.as_ptr()),
            Value::Table(t) => write!(f, "(table : {:p})", Rc::as_ptr(t)),
            Value::Array(a) => write!(f, "(array : {:p})", Rc::as_ptr(a)),
            Value::Closure(c) => write!(f, "(function : {})", c.name),
            Value::NativeClosure(n) => write!(f, "(native function : {})", n.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Value::Null, false)]
    #[case(Value::Bool(false), false)]
    #[case(Value::Integer(0), false)]
    #[case(Value::Float(0.0), false)]
    #[case(Value::Integer(-1), true)]
    #[case(Value::string(""), true)]
    fn test_truthiness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(value.is_truthy(), expected);
    }

    #[test]
    fn test_numeric_loose_equality() {
        assert!(Value::Integer(1).loosely_equals(&Value::Float(1.0)));
        assert!(!Value::Integer(1).loosely_equals(&Value::string("1")));
        assert_ne!(Value::Integer(1), Value::Float(1.0));
    }

    #[test]
    fn test_tables_compare_by_identity() {
        let a = Rc::new(RefCell::new(Table::new()));
        let b = Rc::new(RefCell::new(Table::new()));
        assert_eq!(Value::Table(a.clone()), Value::Table(a));
        assert_ne!(Value::Table(b.clone()), Value::Table(Rc::new(RefCell::new(Table::new()))));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Float(1.5).type_of().name(), "float");
        assert_eq!(ObjectType::NativeClosure.to_string(), "native function");
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(1998.1).to_string(), "1998.1");
        assert_eq!(Value::string("blah").to_string(), "blah");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
