//! Typed view over a runtime's value stack
//!
//! A [`Stack`] is a stateless, copyable handle over a [`Vm`]. Any number of
//! views may exist at once; they all observe the same underlying stack.
//!
//! # Examples
//!
//! ```
//! use nut::{Session, Stack};
//!
//! let session = Session::new();
//! let stack = session.stack();
//!
//! stack.push("blah");
//! stack.push(1998.1);
//! assert_eq!(stack.read::<f64>(-1), 1998.1);
//! assert_eq!(stack.read::<String>(-2), "blah");
//! stack.pop(2);
//! ```

use crate::error::TypeMismatch;
use crate::guard::StackGuard;
use crate::value::{FromStack, ScalarValue, ToStack};
use acorn::{ObjectType, Vm};
use std::fmt;

/// Stack position: 1-based from the frame base, negative from the top
pub type Position = isize;

/// Non-owning view of the current call frame's stack
#[derive(Clone, Copy)]
pub struct Stack<'vm> {
    vm: &'vm Vm,
}

impl<'vm> Stack<'vm> {
    pub fn new(vm: &'vm Vm) -> Self {
        Stack { vm }
    }

    pub fn vm(&self) -> &'vm Vm {
        self.vm
    }

    /// Number of values in the current frame; also the position of the top value
    pub fn top(&self) -> usize {
        self.vm.top()
    }

    /// Truncate the frame to `top` values
    ///
    /// Extending the frame fills the new slots with null.
    pub fn set_top(&self, top: usize) {
        self.vm.set_top(top);
    }

    /// Remove the top `count` values
    pub fn pop(&self, count: usize) {
        self.vm.pop(count);
    }

    /// Push one scalar value
    pub fn push<T: ToStack>(&self, value: T) {
        value.push_to(self);
    }

    pub fn push_null(&self) {
        self.vm.push_null();
    }

    /// Push the first `len` bytes of `value`
    ///
    /// Panics if `len` is out of range or not on a character boundary.
    pub fn push_str_with_len(&self, value: &str, len: usize) {
        self.vm.push_string(&value[..len]);
    }

    pub fn push_value(&self, value: ScalarValue) {
        value.push_to(self);
    }

    /// Type tag at `position`, without consuming it
    pub fn type_of(&self, position: Position) -> ObjectType {
        self.vm.type_of(position)
    }

    /// Whether the slot at `position` holds exactly `T`'s tag
    pub fn verify<T: FromStack>(&self, position: Position) -> bool {
        self.type_of(position) == T::TAG
    }

    /// Read the value at `position` as `T`
    ///
    /// # Panics
    ///
    /// Panics if the slot's tag is not `T`'s tag. A mismatch is a programming
    /// error and is never coerced. Use [`Stack::try_read`] for data whose type
    /// is not known in advance.
    pub fn read<T: FromStack>(&self, position: Position) -> T {
        match self.try_read(position) {
            Ok(value) => value,
            Err(mismatch) => panic!("stack read failed: {}", mismatch),
        }
    }

    /// Read the value at `position` as `T`, reporting a tag mismatch
    pub fn try_read<T: FromStack>(&self, position: Position) -> Result<T, TypeMismatch> {
        let found = self.type_of(position);
        let mismatch = TypeMismatch {
            position,
            expected: T::TAG,
            found,
        };
        if found != T::TAG {
            return Err(mismatch);
        }
        T::extract(self.vm, position).ok_or(mismatch)
    }

    /// Read any supported scalar; `None` for composite values
    pub fn read_value(&self, position: Position) -> Option<ScalarValue> {
        ScalarValue::read_from(self.vm, position)
    }

    /// Save the current top, restoring it when the guard drops
    pub fn guard(&self) -> StackGuard<'vm> {
        StackGuard::new(*self)
    }
}

impl fmt::Debug for Stack<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<_> = (1..=self.top() as Position)
            .map(|position| self.type_of(position).name())
            .collect();
        f.debug_struct("Stack").field("types", &types).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acorn::UserPointer;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_push_increments_top() {
        let vm = Vm::open(16);
        let stack = Stack::new(&vm);
        stack.push(true);
        stack.push(1_i64);
        stack.push_null();
        assert_eq!(stack.top(), 3);
        assert_eq!(stack.type_of(3), ObjectType::Null);
        stack.pop(3);
        assert_eq!(stack.top(), 0);
    }

    #[test]
    fn test_push_str_with_len() {
        let vm = Vm::open(16);
        let stack = Stack::new(&vm);
        stack.push_str_with_len("blahblah", 4);
        assert_eq!(stack.read::<String>(-1), "blah");
    }

    #[test]
    fn test_try_read_reports_mismatch() {
        let vm = Vm::open(16);
        let stack = Stack::new(&vm);
        stack.push("text");
        assert_eq!(
            stack.try_read::<f64>(-1),
            Err(TypeMismatch {
                position: -1,
                expected: ObjectType::Float,
                found: ObjectType::String,
            })
        );
    }

    #[test]
    fn test_strict_read_does_not_widen_integers() {
        let vm = Vm::open(16);
        let stack = Stack::new(&vm);
        stack.push(3_i64);
        assert!(stack.try_read::<f64>(1).is_err());
        assert!(stack.verify::<i64>(1));
        assert!(!stack.verify::<f64>(1));
    }

    #[test]
    fn test_user_pointer_identity() {
        let vm = Vm::open(16);
        let stack = Stack::new(&vm);
        let host = 5_u32;
        let pointer = UserPointer::from_ref(&host);
        stack.push(pointer);
        assert_eq!(stack.read::<UserPointer>(-1), pointer);
    }

    #[test]
    fn test_composite_has_no_scalar_value() {
        let vm = Vm::open(16);
        let stack = Stack::new(&vm);
        vm.push_root_table();
        assert_eq!(stack.read_value(-1), None);
        assert_eq!(format!("{:?}", stack), "Stack { types: [\"table\"] }");
    }

    #[test]
    #[should_panic(expected = "stack read failed: expected float at stack position -1, found string")]
    fn test_read_mismatch_panics() {
        let vm = Vm::open(16);
        let stack = Stack::new(&vm);
        stack.push("blah");
        let _ = stack.read::<f64>(-1);
    }
}
