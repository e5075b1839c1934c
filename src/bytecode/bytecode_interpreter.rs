use super::call_frame::CallFrame;
use super::disassembler;
use super::eval;
use super::stack::{Stack, StackError};
use super::StepResult;
use crate::bytecode::bytecode::{self, Lineno, N_OPS};
use crate::compiler;
use crate::config::VmConfig;
use crate::gc::gc;

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace};

pub struct Interpreter {
    pub stack: Stack,
    pub heap: gc::Heap,
    pub output: Vec<String>,
    config: VmConfig,
    torn_down: bool,
}

impl Default for Interpreter {
    fn default() -> Interpreter {
        Interpreter::new(VmConfig::default())
    }
}

/// Faults raised while executing a single instruction. The dispatch loop
/// attaches the source line and turns these into a [`RuntimeError`].
#[derive(Error, Eq, PartialEq, Debug, Clone)]
pub enum InterpreterError {
    #[error("{0}")]
    Runtime(String),
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error("Unknown opcode {0}.")]
    UnknownOpcode(u8),
    #[error("Unexpected end of bytecode at offset {offset}.")]
    Truncated { offset: usize },
}

#[derive(Error, Eq, PartialEq, Debug, Clone)]
#[error("{message}\n[line {line}] in script")]
pub struct RuntimeError {
    pub line: Lineno,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpretResult {
    Ok,
    CompileError(Vec<compiler::Error>),
    RuntimeError(RuntimeError),
}

impl InterpretResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, InterpretResult::Ok)
    }

    /// Process exit status for hosts, following sysexits.h.
    pub fn exit_code(&self) -> i32 {
        match self {
            InterpretResult::Ok => 0,
            InterpretResult::CompileError(_) => 65,
            InterpretResult::RuntimeError(_) => 70,
        }
    }
}

pub type OpFn = fn(&mut Interpreter, &mut CallFrame<'_>) -> StepResult<(), InterpreterError>;

/// Indexed by opcode byte; the order must match `bytecode::Opcode`.
pub const OP_TABLE: [OpFn; N_OPS] = [
    eval::op_return,
    eval::op_constant,
    eval::op_constant_long,
    eval::op_nil,
    eval::op_true,
    eval::op_false,
    eval::op_pop,
    eval::logical::op_equal,
    eval::logical::op_greater,
    eval::logical::op_less,
    eval::calculation::op_add,
    eval::calculation::op_subtract,
    eval::calculation::op_multiply,
    eval::calculation::op_divide,
    eval::logical::op_not,
    eval::calculation::op_negate,
    eval::op_print,
];

impl Interpreter {
    pub fn new(config: VmConfig) -> Interpreter {
        debug!(stack_capacity = config.stack_capacity, "creating interpreter");
        Interpreter {
            stack: Stack::with_capacity(config.stack_capacity),
            heap: Default::default(),
            output: Default::default(),
            config,
            torn_down: false,
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Returns the VM to its freshly created state. Calling it repeatedly is
    /// harmless.
    pub fn init(&mut self) {
        self.stack.clear();
        self.heap.free_all();
        self.output.clear();
        self.torn_down = false;
        debug!("interpreter initialised");
    }

    /// Releases every heap object the VM owns.
    ///
    /// # Panics
    ///
    /// Panics when called twice without an intervening [`Interpreter::init`].
    pub fn teardown(&mut self) {
        assert!(
            !self.torn_down,
            "teardown called twice without an intervening init"
        );
        let live_handles = self
            .stack
            .iter()
            .filter_map(gc::Heap::extract_id)
            .count();
        debug!("{}", self.heap.summarize_stats());
        self.stack.clear();
        let freed = self.heap.free_all();
        self.torn_down = true;
        debug!(freed, live_handles, "interpreter torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        assert!(!self.torn_down, "interpret called on a torn down interpreter");

        match compiler::compile(source) {
            Ok(chunk) => self.interpret_chunk(&chunk),
            Err(errors) => {
                debug!(count = errors.len(), "compilation failed");
                InterpretResult::CompileError(errors)
            }
        }
    }

    /// Runs an already compiled chunk. The chunk is only borrowed for the
    /// duration of the call.
    pub fn interpret_chunk(&mut self, chunk: &bytecode::Chunk) -> InterpretResult {
        assert!(!self.torn_down, "interpret called on a torn down interpreter");

        // Nothing on the heap is reachable once the stack is reset.
        self.stack.clear();
        debug!(bytes = self.heap.bytes_allocated(), "releasing heap");
        self.heap.free_all();

        let mut frame = CallFrame::new(chunk);
        match self.run(&mut frame) {
            Ok(()) => InterpretResult::Ok,
            Err(err) => {
                debug!(line = err.line.value, message = %err.message, "runtime error");
                InterpretResult::RuntimeError(err)
            }
        }
    }

    fn run(&mut self, frame: &mut CallFrame<'_>) -> Result<(), RuntimeError> {
        loop {
            frame.begin_op();

            if self.config.trace_execution {
                self.trace_instruction(frame);
            }

            let res = match frame.read_byte() {
                Ok(byte) => match OP_TABLE.get(usize::from(byte)) {
                    Some(op) => op(self, frame),
                    None => StepResult::Err(InterpreterError::UnknownOpcode(byte)),
                },
                Err(err) => StepResult::Err(err),
            };

            match res {
                StepResult::Ok(()) => {}
                StepResult::OkReturn(()) => return Ok(()),
                StepResult::Err(err) => {
                    return Err(RuntimeError {
                        line: frame.lineno(),
                        message: err.to_string(),
                    })
                }
            }
        }
    }

    fn trace_instruction(&self, frame: &CallFrame<'_>) {
        let stack = self
            .stack
            .iter()
            .map(|val| format!("[ {} ]", self.format_val(val)))
            .join("");
        let (listing, _) = disassembler::disassemble_instruction(frame.chunk(), frame.op_start());
        trace!(stack = %stack, "{}", listing);
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }
}

#[cfg(test)]
mod tests {

    macro_rules! vec_of_strings {
        ($($x:expr),*) => (vec![$($x.to_string()),*]);
    }

    use crate::bytecode::bytecode::{Chunk, Constant, Lineno, Opcode};
    use crate::bytecode::bytecode_interpreter::*;
    use crate::config::VmConfig;
    use pretty_assertions::assert_eq;

    fn quiet_config() -> VmConfig {
        VmConfig {
            echo_output: false,
            ..VmConfig::default()
        }
    }

    fn evaluate(code: &str) -> Result<Vec<String>, String> {
        let mut interp = Interpreter::new(quiet_config());
        match interp.interpret(code) {
            InterpretResult::Ok => Ok(interp.output),
            InterpretResult::CompileError(errors) => Err(errors
                .iter()
                .map(|err| err.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            InterpretResult::RuntimeError(err) => Err(err.message),
        }
    }

    fn check_output(code: &str, expected_output: &[String]) {
        let res = evaluate(code);

        match res {
            Ok(output) => assert_eq!(output, expected_output),
            Err(err) => panic!("{}", err),
        }
    }

    fn check_error(code: &str, f: &dyn Fn(&str)) {
        let res = evaluate(code);

        match res {
            Ok(output) => panic!("{:?}", output),
            Err(err) => f(&err),
        }
    }

    fn run_chunk(chunk: &Chunk) -> InterpretResult {
        Interpreter::new(quiet_config()).interpret_chunk(chunk)
    }

    #[test]
    fn test_arithmetic_precedence() {
        check_output("print (1 + 2) * 3;", &vec_of_strings!["9"]);
        check_output("print 1 + 2 * 3;", &vec_of_strings!["7"]);
        check_output("print -(4 - 6) / 4;", &vec_of_strings!["0.5"]);
    }

    #[test]
    fn test_literals_and_logic() {
        check_output(
            "print nil; print true; print !nil; print !0;",
            &vec_of_strings!["nil", "true", "true", "false"],
        );
    }

    #[test]
    fn test_comparisons() {
        check_output(
            "print 1 < 2; print 2 <= 1; print 3 > 3; print 3 >= 3; print 1 == 1; print 1 != 2;",
            &vec_of_strings!["true", "false", "false", "true", "true", "true"],
        );
    }

    #[test]
    fn test_equality_across_types() {
        check_output(
            "print nil == false; print \"a\" == \"a\"; print \"a\" == 1;",
            &vec_of_strings!["false", "true", "false"],
        );
    }

    #[test]
    fn test_string_concatenation() {
        check_output(
            "print \"beignets with \" + \"cafe au lait\";",
            &vec_of_strings!["beignets with cafe au lait"],
        );
        check_output(
            "print \"ab\" + \"c\" == \"a\" + \"bc\";",
            &vec_of_strings!["true"],
        );
    }

    #[test]
    fn test_expression_statement_leaves_stack_empty() {
        let mut interp = Interpreter::new(quiet_config());
        assert_eq!(interp.interpret("1 + 2; \"x\";"), InterpretResult::Ok);
        assert!(interp.stack.is_empty());
        assert!(interp.output.is_empty());
    }

    #[test]
    fn test_div_by_zero() {
        check_error("print 1 / 0;", &|err: &str| {
            assert_eq!(err, "Division by zero.")
        });
    }

    #[test]
    fn test_negate_non_number() {
        check_error("print -\"muffin\";", &|err: &str| {
            assert!(err.starts_with("Operand must be a number"))
        });
    }

    #[test]
    fn test_add_mixed_types() {
        check_error("print 1 + \"a\";", &|err: &str| {
            assert!(err.starts_with("Operands must be two numbers or two strings"))
        });
    }

    #[test]
    fn test_compare_non_numbers() {
        check_error("print true < 1;", &|err: &str| {
            assert!(err.starts_with("Operands must be numbers"))
        });
    }

    #[test]
    fn test_runtime_error_reports_line() {
        let mut interp = Interpreter::new(quiet_config());
        let res = interp.interpret("print 1;\nprint 2;\nprint 3 * nil;\nprint 4;");
        match res {
            InterpretResult::RuntimeError(err) => {
                assert_eq!(err.line, Lineno(3));
                assert_eq!(err.to_string(), format!("{}\n[line 3] in script", err.message));
            }
            other => panic!("{:?}", other),
        }
        assert_eq!(interp.output, vec_of_strings!["1", "2"]);
    }

    #[test]
    fn test_faulting_instruction_leaves_operands() {
        let mut interp = Interpreter::new(quiet_config());
        let res = interp.interpret("1 - true;");
        assert_eq!(res.exit_code(), 70);
        assert_eq!(interp.stack.len(), 2);
    }

    #[test]
    fn test_overflow_with_small_capacity() {
        let mut interp = Interpreter::new(VmConfig {
            stack_capacity: 4,
            ..quiet_config()
        });
        match interp.interpret("print 1 + (2 + (3 + (4 + 5)));") {
            InterpretResult::RuntimeError(err) => {
                assert!(err.message.starts_with("Stack overflow"))
            }
            other => panic!("{:?}", other),
        }
        assert_eq!(interp.stack.len(), 4);

        assert_eq!(interp.interpret("print 1 + (2 + 3);"), InterpretResult::Ok);
        assert_eq!(interp.output, vec_of_strings!["6"]);
    }

    #[test]
    fn test_underflow_is_a_runtime_error() {
        let mut chunk = Chunk::default();
        chunk.write_constant(Constant::Number(1.0), Lineno(1)).unwrap();
        chunk.write_op(Opcode::Add, Lineno(2));
        chunk.write_op(Opcode::Return, Lineno(2));
        match run_chunk(&chunk) {
            InterpretResult::RuntimeError(err) => {
                assert_eq!(err.line, Lineno(2));
                assert!(err.message.starts_with("Stack underflow"));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_pop_on_empty_stack_is_a_runtime_error() {
        let mut chunk = Chunk::default();
        chunk.write_op(Opcode::Pop, Lineno(1));
        chunk.write_op(Opcode::Return, Lineno(1));
        assert!(matches!(
            run_chunk(&chunk),
            InterpretResult::RuntimeError(_)
        ));
    }

    #[test]
    fn test_unknown_opcode() {
        let mut chunk = Chunk::default();
        chunk.write_op(Opcode::Nil, Lineno(1));
        chunk.write(200, Lineno(4));
        match run_chunk(&chunk) {
            InterpretResult::RuntimeError(err) => {
                assert_eq!(err.message, "Unknown opcode 200.");
                assert_eq!(err.line, Lineno(4));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_missing_return() {
        let mut chunk = Chunk::default();
        chunk.write_op(Opcode::Nil, Lineno(1));
        chunk.write_op(Opcode::Pop, Lineno(1));
        match run_chunk(&chunk) {
            InterpretResult::RuntimeError(err) => {
                assert_eq!(err.message, "Unexpected end of bytecode at offset 2.")
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_truncated_operand() {
        let mut chunk = Chunk::default();
        chunk.add_constant_number(1.0);
        chunk.write_op(Opcode::ConstantLong, Lineno(1));
        chunk.write(0, Lineno(1));
        assert!(matches!(
            run_chunk(&chunk),
            InterpretResult::RuntimeError(RuntimeError { .. })
        ));
    }

    #[test]
    fn test_invalid_constant_index() {
        let mut chunk = Chunk::default();
        chunk.write_op(Opcode::Constant, Lineno(1));
        chunk.write(9, Lineno(1));
        chunk.write_op(Opcode::Return, Lineno(1));
        match run_chunk(&chunk) {
            InterpretResult::RuntimeError(err) => {
                assert_eq!(err.message, "Invalid constant index 9.")
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn test_constant_long_is_executed() {
        let mut chunk = Chunk::default();
        for i in 0..300 {
            chunk.add_constant_number(i as f64);
        }
        chunk
            .write_constant(Constant::Number(299.0), Lineno(1))
            .unwrap();
        chunk.write_op(Opcode::Print, Lineno(1));
        chunk.write_op(Opcode::Return, Lineno(1));
        assert_eq!(chunk.code[0], u8::from(Opcode::ConstantLong));

        let mut interp = Interpreter::new(quiet_config());
        assert_eq!(interp.interpret_chunk(&chunk), InterpretResult::Ok);
        assert_eq!(interp.output, vec_of_strings!["299"]);
    }

    #[test]
    fn test_op_table_matches_opcodes() {
        assert_eq!(OP_TABLE.len(), N_OPS);
        assert!(Opcode::try_from(N_OPS as u8).is_err());
    }

    #[test]
    fn test_compile_error_leaves_stack_untouched() {
        let mut interp = Interpreter::new(quiet_config());
        interp.interpret("1 - nil;");
        let depth = interp.stack.len();
        assert_eq!(depth, 2);
        match interp.interpret("1 +") {
            InterpretResult::CompileError(errors) => assert_eq!(errors.len(), 1),
            other => panic!("{:?}", other),
        }
        assert_eq!(interp.stack.len(), depth);
    }

    #[test]
    fn test_calls_are_independent() {
        let mut interp = Interpreter::new(quiet_config());
        assert!(matches!(
            interp.interpret("print \"left\" + 1;"),
            InterpretResult::RuntimeError(_)
        ));
        assert_eq!(interp.interpret("print 2 * 21;"), InterpretResult::Ok);
        assert_eq!(interp.interpret("print \"a\" + \"b\";"), InterpretResult::Ok);
        assert_eq!(interp.take_output(), vec_of_strings!["42", "ab"]);
        assert!(interp.output.is_empty());
    }

    #[test]
    fn test_lifecycle() {
        let mut interp = Interpreter::new(quiet_config());
        interp.init();
        interp.init();
        assert_eq!(interp.interpret("print \"x\";"), InterpretResult::Ok);
        interp.interpret("\"dangling\" + 1;");
        assert!(!interp.stack.is_empty());
        interp.teardown();
        assert!(interp.is_torn_down());
        assert!(interp.stack.is_empty());
        assert!(interp.heap.is_empty());

        interp.init();
        assert_eq!(interp.interpret("print 1;"), InterpretResult::Ok);
        assert_eq!(interp.output, vec_of_strings!["1"]);
    }

    #[test]
    #[should_panic(expected = "teardown called twice")]
    fn test_double_teardown_panics() {
        let mut interp = Interpreter::new(quiet_config());
        interp.teardown();
        interp.teardown();
    }

    #[test]
    #[should_panic(expected = "torn down interpreter")]
    fn test_interpret_after_teardown_panics() {
        let mut interp = Interpreter::new(quiet_config());
        interp.teardown();
        interp.interpret("print 1;");
    }

    #[test]
    #[should_panic(expected = "torn down interpreter")]
    fn test_compile_error_after_teardown_panics() {
        let mut interp = Interpreter::new(quiet_config());
        interp.teardown();
        interp.interpret("1 +");
    }

    #[test]
    fn test_trace_execution_runs() {
        let mut interp = Interpreter::new(VmConfig {
            trace_execution: true,
            ..quiet_config()
        });
        assert_eq!(interp.interpret("print -(1 + 2);"), InterpretResult::Ok);
        assert_eq!(interp.output, vec_of_strings!["-3"]);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(InterpretResult::Ok.exit_code(), 0);
        assert!(InterpretResult::Ok.is_ok());
        assert_eq!(InterpretResult::CompileError(vec![]).exit_code(), 65);
    }
}
