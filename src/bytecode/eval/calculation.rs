use crate::bytecode::{
    bytecode_interpreter::{Interpreter, InterpreterError},
    call_frame::CallFrame,
    values::{value, Binop},
    StepResult,
};

pub fn op_add(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    if let Err(err) = vm.stack.ensure_depth(2) {
        return StepResult::Err(err.into());
    }
    let (val1, val2) = match (vm.peek_by(1), vm.peek_by(0)) {
        (Ok(val1), Ok(val2)) => (val1, val2),
        (Err(err), _) | (_, Err(err)) => return StepResult::Err(err),
    };

    match (&val1, &val2) {
        (value::Value::Number(_), value::Value::Number(_)) => vm.numeric_binop(Binop::Add).into(),
        (value::Value::String(_), value::Value::String(_)) => vm.concatenate().into(),
        _ => StepResult::Err(InterpreterError::Runtime(format!(
            "Operands must be two numbers or two strings, found {} and {}.",
            value::type_of(&val1),
            value::type_of(&val2),
        ))),
    }
}

pub fn op_subtract(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    vm.numeric_binop(Binop::Sub).into()
}

pub fn op_multiply(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    vm.numeric_binop(Binop::Mul).into()
}

pub fn op_divide(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    vm.numeric_binop(Binop::Div).into()
}

pub fn op_negate(vm: &mut Interpreter, _frame: &mut CallFrame<'_>) -> StepResult<(), InterpreterError> {
    let top = match vm.peek() {
        Ok(top) => top,
        Err(err) => return StepResult::Err(err),
    };
    match top {
        value::Value::Number(num) => {
            vm.pop_stack();
            vm.push_stack(value::Value::Number(-num)).into()
        }
        _ => StepResult::Err(InterpreterError::Runtime(format!(
            "Operand must be a number, found {}.",
            value::type_of(&top)
        ))),
    }
}
