pub mod value;

use crate::bytecode::bytecode_interpreter::{Interpreter, InterpreterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binop {
    Add,
    Sub,
    Mul,
    Div,
    Greater,
    Less,
}

impl std::fmt::Display for Binop {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Binop::Add => write!(fmt, "Add"),
            Binop::Sub => write!(fmt, "Sub"),
            Binop::Mul => write!(fmt, "Mul"),
            Binop::Div => write!(fmt, "Div"),
            Binop::Greater => write!(fmt, "Greater"),
            Binop::Less => write!(fmt, "Less"),
        }
    }
}

impl Interpreter {
    pub fn format_val(&self, val: &value::Value) -> String {
        match val {
            value::Value::Nil => "nil".to_string(),
            value::Value::Bool(b) => b.to_string(),
            value::Value::Number(num) => num.to_string(),
            value::Value::String(id) => match self.heap.get_str(*id) {
                Some(s) => s.to_string(),
                None => format!("<freed string {}>", id),
            },
        }
    }

    pub fn print_val(&mut self, val: &value::Value) {
        let output = self.format_val(val);
        if self.config().echo_output {
            println!("{}", output);
        }
        self.output.push(output);
    }

    pub fn apply_numeric_binop(left: f64, right: f64, binop: Binop) -> value::Value {
        match binop {
            Binop::Add => value::Value::Number(left + right),
            Binop::Sub => value::Value::Number(left - right),
            Binop::Mul => value::Value::Number(left * right),
            Binop::Div => value::Value::Number(left / right),
            Binop::Greater => value::Value::Bool(left > right),
            Binop::Less => value::Value::Bool(left < right),
        }
    }

    /// Pops two numbers and pushes `left <binop> right`. Operand types are
    /// checked before anything is popped.
    pub fn numeric_binop(&mut self, binop: Binop) -> Result<(), InterpreterError> {
        self.stack.ensure_depth(2)?;
        let val1 = self.peek_by(1)?;
        let val2 = self.peek_by(0)?;

        match (val1, val2) {
            (value::Value::Number(n1), value::Value::Number(n2)) => {
                if binop == Binop::Div && n2 == 0.0 {
                    return Err(InterpreterError::Runtime(String::from("Division by zero.")));
                }
                self.pop_stack_n_times(2);
                self.push_stack(Interpreter::apply_numeric_binop(n1, n2, binop))
            }
            _ => Err(InterpreterError::Runtime(format!(
                "Operands must be numbers, found {} and {} in {} expression.",
                value::type_of(&val1),
                value::type_of(&val2),
                binop
            ))),
        }
    }

    pub fn compare(&mut self, binop: Binop) -> Result<(), InterpreterError> {
        self.numeric_binop(binop)
    }

    pub fn concatenate(&mut self) -> Result<(), InterpreterError> {
        self.stack.ensure_depth(2)?;
        let (id1, id2) = match (self.peek_by(1)?, self.peek_by(0)?) {
            (value::Value::String(id1), value::Value::String(id2)) => (id1, id2),
            (val1, val2) => {
                return Err(InterpreterError::Runtime(format!(
                    "Operands must be two strings, found {} and {}.",
                    value::type_of(&val1),
                    value::type_of(&val2)
                )))
            }
        };

        let joined = match (self.heap.get_str(id1), self.heap.get_str(id2)) {
            (Some(s1), Some(s2)) => format!("{}{}", s1, s2),
            _ => {
                return Err(InterpreterError::Runtime(String::from(
                    "Dangling string handle in concatenation.",
                )))
            }
        };
        let id = self.heap.manage_str(joined);
        self.pop_stack_n_times(2);
        self.push_stack(value::Value::String(id))
    }
}
