pub mod bytecode;
pub mod bytecode_interpreter;
pub mod call_frame;
pub mod disassembler;
mod eval;
pub mod stack;
pub mod values;

pub enum StepResult<T, E> {
    Ok(T),
    OkReturn(T),
    Err(E),
}

impl<T, E> From<Result<T, E>> for StepResult<T, E> {
    fn from(res: Result<T, E>) -> StepResult<T, E> {
        match res {
            Ok(val) => StepResult::Ok(val),
            Err(err) => StepResult::Err(err),
        }
    }
}
