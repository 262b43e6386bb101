//! Base library
//!
//! `print`, `error` and `assert`, installed into the root table by
//! [`register_base_library`].

use crate::value::{NativeFn, NativeResult};
use crate::vm::Vm;

const BASE_LIBRARY: &[(&str, NativeFn)] = &[("print", print), ("error", error), ("assert", assert)];

/// Check if a name belongs to the base library
pub fn is_builtin(name: &str) -> bool {
    BASE_LIBRARY.iter().any(|(builtin, _)| *builtin == name)
}

/// Install the base library into the root table
pub fn register_base_library(vm: &Vm) {
    for (name, func) in BASE_LIBRARY {
        vm.push_root_table();
        vm.push_string(name);
        vm.new_closure(*func, name);
        // The root table always accepts string keys
        let _ = vm.new_slot(-3);
        vm.pop(1);
    }
}

fn expect_arguments(vm: &Vm, name: &str, min: usize, max: usize) -> Result<(), crate::Raised> {
    let supplied = vm.top();
    if supplied < min || supplied > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(vm.throw_error(format!(
            "{} expects {} argument(s), got {}",
            name, expected, supplied
        )));
    }
    Ok(())
}

/// `print(x)`: send `x` to the print sink
fn print(vm: &Vm) -> NativeResult {
    expect_arguments(vm, "print", 1, 1)?;
    vm.print(&vm.stringify(1));
    Ok(0)
}

/// `error(x)`: send `x` to the error sink
fn error(vm: &Vm) -> NativeResult {
    expect_arguments(vm, "error", 1, 1)?;
    vm.report_error(&vm.stringify(1));
    Ok(0)
}

/// `assert(cond, [message])`
fn assert(vm: &Vm) -> NativeResult {
    expect_arguments(vm, "assert", 1, 2)?;
    if vm.is_truthy(1) {
        return Ok(0);
    }
    let message = if vm.top() == 2 {
        vm.stringify(2)
    } else {
        "assertion failed".to_string()
    };
    Err(vm.throw_error(message))
}
