pub mod bytecode;
pub mod compiler;
pub mod config;
pub mod error_formatting;
pub mod gc;
pub mod input;
pub mod scanner;

pub use bytecode::bytecode_interpreter::{
    InterpretResult, Interpreter, InterpreterError, RuntimeError,
};
pub use config::{ConfigError, VmConfig};
