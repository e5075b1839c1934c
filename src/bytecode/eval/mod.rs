pub mod calculation;
pub mod logical;

use crate::bytecode::{
    bytecode::Constant,
    bytecode_interpreter::{Interpreter, InterpreterError},
    call_frame::CallFrame,
    values::value,
    StepResult,
};

pub fn op_return(_vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    StepResult::OkReturn(())
}

pub fn op_constant(vm: &mut Interpreter, frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    let res = frame
        .read_byte()
        .and_then(|idx| frame.read_constant(usize::from(idx)))
        .and_then(|constant| vm.push_constant(constant));
    res.into()
}

pub fn op_constant_long(vm: &mut Interpreter, frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    let res = frame
        .read_u24()
        .and_then(|idx| frame.read_constant(idx))
        .and_then(|constant| vm.push_constant(constant));
    res.into()
}

pub fn op_nil(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    vm.push_stack(value::Value::Nil).into()
}

pub fn op_true(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    vm.push_stack(value::Value::Bool(true)).into()
}

pub fn op_false(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    vm.push_stack(value::Value::Bool(false)).into()
}

pub fn op_pop(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    if let Err(err) = vm.stack.ensure_depth(1) {
        return StepResult::Err(err.into());
    }
    vm.pop_stack();
    StepResult::Ok(())
}

pub fn op_print(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    if let Err(err) = vm.stack.ensure_depth(1) {
        return StepResult::Err(err.into());
    }
    let val = vm.pop_stack();
    vm.print_val(&val);
    StepResult::Ok(())
}

impl Interpreter {
    fn push_constant(&mut self, constant: Constant) -> Result<(), InterpreterError> {
        let val = match constant {
            Constant::Number(num) => value::Value::Number(num),
            Constant::String(s) => value::Value::String(self.heap.manage_str(s)),
        };
        self.push_stack(val)
    }
}
