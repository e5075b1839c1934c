use serde::{Deserialize, Serialize};

use std::f64;
use std::fmt;

#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct Lineno {
    pub value: usize,
}

impl std::fmt::Display for Lineno {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.value)
    }
}

#[allow(non_snake_case)]
pub fn Lineno(value: usize) -> Lineno {
    Lineno { value }
}

pub const N_OPS: usize = 17;

/// Largest index a `ConstantLong` operand can address (24 bits).
pub const MAX_CONSTANTS: usize = 0x00FF_FFFF;

#[repr(u8)]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Return = 0,
    Constant,
    ConstantLong,
    Nil,
    True,
    False,
    Pop,
    Equal,
    Greater,
    Less,
    Add,
    Subtract,
    Multiply,
    Divide,
    Not,
    Negate,
    Print,
}

impl Opcode {
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Return => "Return",
            Opcode::Constant => "Constant",
            Opcode::ConstantLong => "ConstantLong",
            Opcode::Nil => "Nil",
            Opcode::True => "True",
            Opcode::False => "False",
            Opcode::Pop => "Pop",
            Opcode::Equal => "Equal",
            Opcode::Greater => "Greater",
            Opcode::Less => "Less",
            Opcode::Add => "Add",
            Opcode::Subtract => "Subtract",
            Opcode::Multiply => "Multiply",
            Opcode::Divide => "Divide",
            Opcode::Not => "Not",
            Opcode::Negate => "Negate",
            Opcode::Print => "Print",
        }
    }

    /// Number of operand bytes following the opcode byte.
    pub fn operand_width(&self) -> usize {
        match self {
            Opcode::Constant => 1,
            Opcode::ConstantLong => 3,
            _ => 0,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.name())
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        use Opcode::*;

        match byte {
            0 => Ok(Return),
            1 => Ok(Constant),
            2 => Ok(ConstantLong),
            3 => Ok(Nil),
            4 => Ok(True),
            5 => Ok(False),
            6 => Ok(Pop),
            7 => Ok(Equal),
            8 => Ok(Greater),
            9 => Ok(Less),
            10 => Ok(Add),
            11 => Ok(Subtract),
            12 => Ok(Multiply),
            13 => Ok(Divide),
            14 => Ok(Not),
            15 => Ok(Negate),
            16 => Ok(Print),
            unknown => Err(unknown),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Constant {
    Number(f64),
    String(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Constant::Number(n) => write!(f, "{}", n),
            Constant::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Run-length encoded mapping from code offsets to source lines. Each run is
/// `(line, count)`: `count` consecutive bytes were emitted for `line`.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct LineTable {
    runs: Vec<(usize, usize)>,
}

impl LineTable {
    pub fn push(&mut self, lineno: Lineno) {
        match self.runs.last_mut() {
            Some((line, count)) if *line == lineno.value => *count += 1,
            _ => self.runs.push((lineno.value, 1)),
        }
    }

    pub fn line_at(&self, offset: usize) -> Option<Lineno> {
        let mut end = 0;
        for (line, count) in &self.runs {
            end += count;
            if offset < end {
                return Some(Lineno(*line));
            }
        }
        None
    }

    pub fn last(&self) -> Option<Lineno> {
        self.runs.last().map(|(line, _)| Lineno(*line))
    }

    pub fn len(&self) -> usize {
        self.runs.iter().map(|(_, count)| count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Chunk {
    pub code: Vec<u8>,
    pub constants: Vec<Constant>,
    pub lines: LineTable,
}

impl Chunk {
    pub fn write(&mut self, byte: u8, lineno: Lineno) {
        self.code.push(byte);
        self.lines.push(lineno);
    }

    pub fn write_op(&mut self, op: Opcode, lineno: Lineno) {
        self.write(op.into(), lineno);
    }

    /// Emits the shortest load instruction able to address `val`.
    pub fn write_constant(&mut self, val: Constant, lineno: Lineno) -> Result<usize, String> {
        let idx = match val {
            Constant::Number(num) => self.add_constant_number(num),
            Constant::String(s) => self.add_constant_string(s),
        };

        if idx <= u8::MAX as usize {
            self.write_op(Opcode::Constant, lineno);
            self.write(idx as u8, lineno);
        } else if idx <= MAX_CONSTANTS {
            self.write_op(Opcode::ConstantLong, lineno);
            self.write(((idx >> 16) & 0xFF) as u8, lineno);
            self.write(((idx >> 8) & 0xFF) as u8, lineno);
            self.write((idx & 0xFF) as u8, lineno);
        } else {
            return Err(format!(
                "Too many constants in one chunk (limit is {}).",
                MAX_CONSTANTS + 1
            ));
        }
        Ok(idx)
    }

    pub fn add_constant_number(&mut self, c: f64) -> usize {
        if let Some(id) = self.find_number(c) {
            id
        } else {
            self.add_constant(Constant::Number(c))
        }
    }

    pub fn add_constant_string(&mut self, s: String) -> usize {
        if let Some(id) = self.find_string(&s) {
            id
        } else {
            self.add_constant(Constant::String(s))
        }
    }

    pub fn add_constant(&mut self, val: Constant) -> usize {
        let const_idx = self.constants.len();
        self.constants.push(val);
        const_idx
    }

    pub fn find_string(&self, s: &str) -> Option<usize> {
        self.constants.iter().position(|c| {
            if let Constant::String(s2) = c {
                s == s2
            } else {
                false
            }
        })
    }

    fn find_number(&self, num: f64) -> Option<usize> {
        self.constants.iter().position(|c| {
            if let Constant::Number(num2) = c {
                num.to_bits() == num2.to_bits()
            } else {
                false
            }
        })
    }

    pub fn code_len(&self) -> usize {
        self.code.len()
    }

    pub fn byte_at(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    pub fn constant_at(&self, idx: usize) -> Option<&Constant> {
        self.constants.get(idx)
    }

    /// Source line of the byte at `offset`. Offsets past the end report the
    /// last recorded line so that faults on a truncated chunk still point
    /// somewhere useful.
    pub fn line_at(&self, offset: usize) -> Lineno {
        self.lines
            .line_at(offset)
            .or_else(|| self.lines.last())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_opcode_byte_mapping() {
        for byte in 0..N_OPS as u8 {
            let op = Opcode::try_from(byte).unwrap();
            assert_eq!(u8::from(op), byte);
        }
        assert_eq!(Opcode::try_from(N_OPS as u8), Err(N_OPS as u8));
        assert_eq!(Opcode::try_from(255), Err(255));
    }

    #[test]
    fn test_line_table_run_length() {
        let mut lines = LineTable::default();
        for line in [1, 1, 1, 2, 2, 5] {
            lines.push(Lineno(line));
        }
        assert_eq!(lines.runs.len(), 3);
        assert_eq!(lines.len(), 6);
        let expected = [1, 1, 1, 2, 2, 5];
        for (offset, line) in expected.iter().enumerate() {
            assert_eq!(lines.line_at(offset), Some(Lineno(*line)));
        }
        assert_eq!(lines.line_at(6), None);
    }

    #[test]
    fn test_line_at_past_end_uses_last_line() {
        let mut chunk = Chunk::default();
        chunk.write_op(Opcode::Nil, Lineno(3));
        chunk.write_op(Opcode::Print, Lineno(4));
        assert_eq!(chunk.line_at(1), Lineno(4));
        assert_eq!(chunk.line_at(10), Lineno(4));
        assert_eq!(Chunk::default().line_at(0), Lineno(0));
    }

    #[test]
    fn test_constants_are_deduplicated() {
        let mut chunk = Chunk::default();
        let a = chunk.add_constant_number(1.5);
        let b = chunk.add_constant_string(String::from("x"));
        assert_eq!(chunk.add_constant_number(1.5), a);
        assert_eq!(chunk.add_constant_string(String::from("x")), b);
        assert_eq!(chunk.constants.len(), 2);
    }

    #[test]
    fn test_write_constant_switches_to_long_form() {
        let mut chunk = Chunk::default();
        for i in 0..256 {
            chunk.add_constant_number(i as f64);
        }
        let idx = chunk
            .write_constant(Constant::Number(1000.0), Lineno(7))
            .unwrap();
        assert_eq!(idx, 256);
        assert_eq!(chunk.code, vec![u8::from(Opcode::ConstantLong), 0x00, 0x01, 0x00]);
        assert_eq!(chunk.lines.len(), 4);

        let short = chunk
            .write_constant(Constant::Number(3.0), Lineno(7))
            .unwrap();
        assert_eq!(short, 3);
        assert_eq!(&chunk.code[4..], &[u8::from(Opcode::Constant), 3]);
    }

    #[test]
    fn test_operand_width() {
        assert_eq!(Opcode::Constant.operand_width(), 1);
        assert_eq!(Opcode::ConstantLong.operand_width(), 3);
        assert_eq!(Opcode::Add.operand_width(), 0);
        assert_eq!(format!("{:<10}|", Opcode::Add), "Add       |");
    }
}
