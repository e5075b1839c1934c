use crate::bytecode::bytecode::{self, Chunk, Lineno};
use crate::bytecode::bytecode_interpreter::InterpreterError;

/// The chunk installed for one interpret call together with its instruction
/// pointer. The frame borrows the chunk, so it cannot outlive the call that
/// created it.
pub struct CallFrame<'c> {
    chunk: &'c Chunk,
    pub instruction_pointer: usize,
    op_start: usize,
}

impl<'c> CallFrame<'c> {
    pub fn new(chunk: &'c Chunk) -> CallFrame<'c> {
        CallFrame {
            chunk,
            instruction_pointer: 0,
            op_start: 0,
        }
    }

    pub fn chunk(&self) -> &'c Chunk {
        self.chunk
    }

    /// Marks the current position as the start of the next instruction.
    pub fn begin_op(&mut self) {
        self.op_start = self.instruction_pointer;
    }

    pub fn op_start(&self) -> usize {
        self.op_start
    }

    pub fn read_byte(&mut self) -> Result<u8, InterpreterError> {
        let byte = self
            .chunk
            .byte_at(self.instruction_pointer)
            .ok_or(InterpreterError::Truncated {
                offset: self.instruction_pointer,
            })?;
        self.instruction_pointer += 1;
        Ok(byte)
    }

    pub fn read_u24(&mut self) -> Result<usize, InterpreterError> {
        let hi = self.read_byte()? as usize;
        let mid = self.read_byte()? as usize;
        let lo = self.read_byte()? as usize;
        Ok(hi << 16 | mid << 8 | lo)
    }

    pub fn read_constant(&self, idx: usize) -> Result<bytecode::Constant, InterpreterError> {
        self.chunk
            .constant_at(idx)
            .cloned()
            .ok_or_else(|| InterpreterError::Runtime(format!("Invalid constant index {}.", idx)))
    }

    /// Line of the instruction currently executing.
    pub fn lineno(&self) -> Lineno {
        self.chunk.line_at(self.op_start)
    }
}
