use crate::bytecode::{
    bytecode_interpreter::{Interpreter, InterpreterError},
    call_frame::CallFrame,
    values::{value, Binop},
    StepResult,
};

pub fn op_not(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    let top = match vm.peek() {
        Ok(top) => top,
        Err(err) => return StepResult::Err(err),
    };
    vm.pop_stack();
    vm.push_stack(value::Value::Bool(top.is_falsey())).into()
}

pub fn op_equal(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    if let Err(err) = vm.stack.ensure_depth(2) {
        return StepResult::Err(err.into());
    }
    let val2 = vm.pop_stack();
    let val1 = vm.pop_stack();
    vm.push_stack(value::Value::Bool(val1 == val2)).into()
}

pub fn op_greater(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    vm.compare(Binop::Greater).into()
}

pub fn op_less(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    vm.compare(Binop::Less).into()
}
