use thiserror::Error;

use crate::bytecode::{
    bytecode_interpreter::{Interpreter, InterpreterError},
    values::value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("Stack overflow (capacity {capacity}).")]
    Overflow { capacity: usize },
    #[error("Stack underflow: needed {needed} value(s) but the stack holds {depth}.")]
    Underflow { needed: usize, depth: usize },
}

/// Fixed-capacity evaluation stack. The buffer is allocated once and never
/// grows; `top` is one past the last live slot.
#[derive(Debug, Clone)]
pub struct Stack {
    slots: Box<[value::Value]>,
    top: usize,
}

impl Stack {
    pub fn with_capacity(capacity: usize) -> Stack {
        Stack {
            slots: vec![value::Value::Nil; capacity].into_boxed_slice(),
            top: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.top
    }

    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Resets the cursor and scrubs every slot so no stale heap handle
    /// survives in the buffer.
    pub fn clear(&mut self) {
        self.slots.fill(value::Value::Nil);
        self.top = 0;
    }

    pub fn push(&mut self, val: value::Value) -> Result<(), StackError> {
        if self.top >= self.slots.len() {
            return Err(StackError::Overflow {
                capacity: self.slots.len(),
            });
        }
        self.slots[self.top] = val;
        self.top += 1;
        Ok(())
    }

    /// Removes the top value.
    ///
    /// # Panics
    ///
    /// Panics on an empty stack. Callers check depth with
    /// [`Stack::ensure_depth`] before popping.
    pub fn pop(&mut self) -> value::Value {
        if self.top == 0 {
            panic!("attempted to pop empty stack!");
        }
        self.top -= 1;
        self.slots[self.top]
    }

    /// Value `distance` slots below the top (`0` is the top itself).
    pub fn peek(&self, distance: usize) -> Option<&value::Value> {
        if distance >= self.top {
            return None;
        }
        self.slots.get(self.top - distance - 1)
    }

    pub fn ensure_depth(&self, needed: usize) -> Result<(), StackError> {
        if self.top < needed {
            return Err(StackError::Underflow {
                needed,
                depth: self.top,
            });
        }
        Ok(())
    }

    /// Live values from bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, value::Value> {
        self.slots[..self.top].iter()
    }
}

impl Interpreter {
    pub fn push_stack(&mut self, val: value::Value) -> Result<(), InterpreterError> {
        self.stack.push(val)?;
        Ok(())
    }

    pub fn pop_stack(&mut self) -> value::Value {
        self.stack.pop()
    }

    pub fn pop_stack_n_times(&mut self, num_to_pop: usize) {
        for _ in 0..num_to_pop {
            self.pop_stack();
        }
    }

    pub fn peek_by(&self, n: usize) -> Result<value::Value, InterpreterError> {
        match self.stack.peek(n) {
            Some(val) => Ok(*val),
            None => Err(InterpreterError::Stack(StackError::Underflow {
                needed: n + 1,
                depth: self.stack.len(),
            })),
        }
    }

    pub fn peek(&self) -> Result<value::Value, InterpreterError> {
        self.peek_by(0)
    }
}
