//! Scalar values and the typed push/read traits
//!
//! Only scalar categories cross the boundary:
//!
//! | Rust                  | Type tag        |
//! |-----------------------|-----------------|
//! | `Null`, `()` results  | `null`          |
//! | `bool`                | `bool`          |
//! | `i64`, `i32`          | `integer`       |
//! | `f64`, `f32`          | `float`         |
//! | `String`, `&str`      | `string`        |
//! | `UserPointer`         | `userpointer`   |
//!
//! Tables, arrays and closures are recognised by tag but never marshalled.

use crate::stack::{Position, Stack};
use acorn::{ObjectType, UserPointer, Vm};

/// The script `null` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Null;

/// A value of one of the supported scalar categories
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    UserPointer(UserPointer),
}

impl ScalarValue {
    /// Type tag this value is pushed with
    pub fn tag(&self) -> ObjectType {
        match self {
            ScalarValue::Null => ObjectType::Null,
            ScalarValue::Bool(_) => ObjectType::Bool,
            ScalarValue::Integer(_) => ObjectType::Integer,
            ScalarValue::Float(_) => ObjectType::Float,
            ScalarValue::String(_) => ObjectType::String,
            ScalarValue::UserPointer(_) => ObjectType::UserPointer,
        }
    }

    /// Whether values with `tag` can be marshalled at all
    pub fn supports(tag: ObjectType) -> bool {
        matches!(
            tag,
            ObjectType::Null
                | ObjectType::Bool
                | ObjectType::Integer
                | ObjectType::Float
                | ObjectType::String
                | ObjectType::UserPointer
        )
    }

    pub(crate) fn read_from(vm: &Vm, position: Position) -> Option<Self> {
        match vm.type_of(position) {
            ObjectType::Null => Some(ScalarValue::Null),
            ObjectType::Bool => vm.get_bool(position).ok().map(ScalarValue::Bool),
            ObjectType::Integer => vm.get_integer(position).ok().map(ScalarValue::Integer),
            ObjectType::Float => vm.get_float(position).ok().map(ScalarValue::Float),
            ObjectType::String => vm
                .get_string(position)
                .ok()
                .map(|s| ScalarValue::String(s.to_string())),
            ObjectType::UserPointer => vm.get_user_pointer(position).ok().map(ScalarValue::UserPointer),
            _ => None,
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

impl From<UserPointer> for ScalarValue {
    fn from(value: UserPointer) -> Self {
        ScalarValue::UserPointer(value)
    }
}

impl From<Null> for ScalarValue {
    fn from(_: Null) -> Self {
        ScalarValue::Null
    }
}

/// Types that can be pushed onto the stack as one value
pub trait ToStack {
    fn push_to(self, stack: &Stack<'_>);
}

/// Types that can be read from one stack slot
pub trait FromStack: Sized {
    /// Tag a strict read requires
    const TAG: ObjectType;

    /// Whether a native-call argument with `tag` converts to this type
    ///
    /// Only argument conversion uses this; strict reads compare against `TAG`.
    fn accepts(tag: ObjectType) -> bool {
        tag == Self::TAG
    }

    /// Whether an accepted argument's value is representable in this type
    fn in_range(_vm: &Vm, _position: Position) -> bool {
        true
    }

    /// Read the slot at `position`
    ///
    /// Returns `None` when the slot cannot be converted.
    fn extract(vm: &Vm, position: Position) -> Option<Self>;
}

/// Finite doubles beyond `f32::MAX` would become infinite
fn fits_f32(n: f64) -> bool {
    !n.is_finite() || n.abs() <= f64::from(f32::MAX)
}

impl ToStack for bool {
    fn push_to(self, stack: &Stack<'_>) {
        stack.vm().push_bool(self);
    }
}

impl ToStack for i64 {
    fn push_to(self, stack: &Stack<'_>) {
        stack.vm().push_integer(self);
    }
}

impl ToStack for i32 {
    fn push_to(self, stack: &Stack<'_>) {
        stack.vm().push_integer(i64::from(self));
    }
}

impl ToStack for f64 {
    fn push_to(self, stack: &Stack<'_>) {
        stack.vm().push_float(self);
    }
}

impl ToStack for f32 {
    fn push_to(self, stack: &Stack<'_>) {
        stack.vm().push_float(f64::from(self));
    }
}

impl ToStack for &str {
    fn push_to(self, stack: &Stack<'_>) {
        stack.vm().push_string(self);
    }
}

impl ToStack for String {
    fn push_to(self, stack: &Stack<'_>) {
        stack.vm().push_string(&self);
    }
}

impl ToStack for UserPointer {
    fn push_to(self, stack: &Stack<'_>) {
        stack.vm().push_user_pointer(self);
    }
}

impl ToStack for Null {
    fn push_to(self, stack: &Stack<'_>) {
        stack.vm().push_null();
    }
}

impl ToStack for ScalarValue {
    fn push_to(self, stack: &Stack<'_>) {
        match self {
            ScalarValue::Null => Null.push_to(stack),
            ScalarValue::Bool(b) => b.push_to(stack),
            ScalarValue::Integer(n) => n.push_to(stack),
            ScalarValue::Float(n) => n.push_to(stack),
            ScalarValue::String(s) => s.push_to(stack),
            ScalarValue::UserPointer(p) => p.push_to(stack),
        }
    }
}

/// `None` pushes null
impl<T: ToStack> ToStack for Option<T> {
    fn push_to(self, stack: &Stack<'_>) {
        match self {
            Some(value) => value.push_to(stack),
            None => Null.push_to(stack),
        }
    }
}

impl FromStack for bool {
    const TAG: ObjectType = ObjectType::Bool;

    fn extract(vm: &Vm, position: Position) -> Option<Self> {
        vm.get_bool(position).ok()
    }
}

impl FromStack for i64 {
    const TAG: ObjectType = ObjectType::Integer;

    fn extract(vm: &Vm, position: Position) -> Option<Self> {
        vm.get_integer(position).ok()
    }
}

/// Integers outside `i32` do not convert
impl FromStack for i32 {
    const TAG: ObjectType = ObjectType::Integer;

    fn in_range(vm: &Vm, position: Position) -> bool {
        Self::extract(vm, position).is_some()
    }

    fn extract(vm: &Vm, position: Position) -> Option<Self> {
        vm.get_integer(position).ok().and_then(|n| i32::try_from(n).ok())
    }
}

impl FromStack for f64 {
    const TAG: ObjectType = ObjectType::Float;

    fn accepts(tag: ObjectType) -> bool {
        matches!(tag, ObjectType::Float | ObjectType::Integer)
    }

    fn extract(vm: &Vm, position: Position) -> Option<Self> {
        vm.get_float(position).ok()
    }
}

impl FromStack for f32 {
    const TAG: ObjectType = ObjectType::Float;

    fn accepts(tag: ObjectType) -> bool {
        matches!(tag, ObjectType::Float | ObjectType::Integer)
    }

    fn in_range(vm: &Vm, position: Position) -> bool {
        Self::extract(vm, position).is_some()
    }

    fn extract(vm: &Vm, position: Position) -> Option<Self> {
        vm.get_float(position).ok().filter(|n| fits_f32(*n)).map(|n| n as f32)
    }
}

impl FromStack for String {
    const TAG: ObjectType = ObjectType::String;

    fn extract(vm: &Vm, position: Position) -> Option<Self> {
        vm.get_string(position).ok().map(|s| s.to_string())
    }
}

impl FromStack for UserPointer {
    const TAG: ObjectType = ObjectType::UserPointer;

    fn extract(vm: &Vm, position: Position) -> Option<Self> {
        vm.get_user_pointer(position).ok()
    }
}

impl FromStack for Null {
    const TAG: ObjectType = ObjectType::Null;

    fn extract(vm: &Vm, position: Position) -> Option<Self> {
        (vm.type_of(position) == ObjectType::Null).then_some(Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ScalarValue::Null, ObjectType::Null)]
    #[case(ScalarValue::from(true), ObjectType::Bool)]
    #[case(ScalarValue::from(7_i64), ObjectType::Integer)]
    #[case(ScalarValue::from(1998.1), ObjectType::Float)]
    #[case(ScalarValue::from("blah"), ObjectType::String)]
    #[case(ScalarValue::from(UserPointer::null()), ObjectType::UserPointer)]
    fn test_each_variant_has_one_tag(#[case] value: ScalarValue, #[case] tag: ObjectType) {
        assert_eq!(value.tag(), tag);
        assert!(ScalarValue::supports(tag));
    }

    #[rstest]
    #[case(ObjectType::Table)]
    #[case(ObjectType::Array)]
    #[case(ObjectType::Closure)]
    #[case(ObjectType::NativeClosure)]
    #[case(ObjectType::UserData)]
    #[case(ObjectType::Generator)]
    fn test_composites_are_unsupported(#[case] tag: ObjectType) {
        assert!(!ScalarValue::supports(tag));
    }

    #[test]
    fn test_only_floats_accept_integers() {
        assert!(f64::accepts(ObjectType::Integer));
        assert!(f32::accepts(ObjectType::Integer));
        assert!(!i64::accepts(ObjectType::Float));
        assert!(!String::accepts(ObjectType::Integer));
    }

    #[test]
    fn test_scalar_value_round_trip() {
        let vm = Vm::open(16);
        let stack = Stack::new(&vm);
        for value in [
            ScalarValue::Null,
            ScalarValue::Bool(false),
            ScalarValue::Integer(-3),
            ScalarValue::Float(0.5),
            ScalarValue::String("text".to_string()),
        ] {
            stack.push(value.clone());
            assert_eq!(stack.read_value(-1), Some(value));
        }
    }
}
