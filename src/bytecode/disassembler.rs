use crate::bytecode::bytecode::{Chunk, Opcode};

pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut lines = vec![format!("=== {} ===", name)];

    let mut offset = 0;
    while offset < chunk.code_len() {
        let (listing, next) = disassemble_instruction(chunk, offset);
        lines.push(listing);
        offset = next;
    }

    lines.join("\n")
}

/// Renders the instruction at `offset` and returns the offset of the next
/// one.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize) -> (String, usize) {
    let mut res = format!("{:04} ", offset);
    if offset > 0 && chunk.line_at(offset) == chunk.line_at(offset - 1) {
        res.push_str("   | ");
    } else {
        res.push_str(&format!("{:>4} ", chunk.line_at(offset).value));
    }

    let byte = match chunk.byte_at(offset) {
        Some(byte) => byte,
        None => {
            res.push_str("<end of chunk>");
            return (res, offset + 1);
        }
    };

    match Opcode::try_from(byte) {
        Ok(op @ (Opcode::Constant | Opcode::ConstantLong)) => {
            constant_instruction(res, op, chunk, offset)
        }
        Ok(op) => {
            res.push_str(op.name());
            (res, offset + 1)
        }
        Err(unknown) => {
            res.push_str(&format!("Unknown opcode {}", unknown));
            (res, offset + 1)
        }
    }
}

fn constant_instruction(
    mut res: String,
    op: Opcode,
    chunk: &Chunk,
    offset: usize,
) -> (String, usize) {
    let width = op.operand_width();
    let operands: Option<Vec<u8>> = (1..=width).map(|i| chunk.byte_at(offset + i)).collect();

    match operands {
        Some(bytes) => {
            let idx = bytes.iter().fold(0usize, |acc, b| acc << 8 | *b as usize);
            res.push_str(&format!("{:<16} {:4} ", op, idx));
            match chunk.constant_at(idx) {
                Some(constant) => {
                    res.push_str(&format!("'{}'", constant));
                }
                None => res.push_str("<invalid constant>"),
            }
        }
        None => {
            res.push_str(&format!("{:<16} <truncated>", op));
        }
    }

    (res, offset + 1 + width)
}
