//! Text rendering of instruction streams.

use std::collections::HashSet;
use std::fmt::Write;

use crate::bytecode::Opcode;
use crate::bytecode::ir::{Instruction, InstructionKind};
use crate::bytecode::op::OpcodeNames;
use crate::lang::span::StmtTable;

pub const ANNOTATION_HEADER: &str = "### Autogenerated Hello script.";

/// Marker that starts every annotation line.
pub const COMMENT_MARKER: &str = "### ";

/// Render one instruction the way the target machine's script tools read it.
///
/// Data pushes print as `L<len> 0x<hex>`. `OP_0` prints as `L1 0x00`, every
/// other opcode by name.
pub fn render_instruction(instruction: &Instruction, names: &OpcodeNames) -> String {
    match &instruction.kind {
        InstructionKind::Opcode(Opcode::Op0) => "L1 0x00".to_string(),
        InstructionKind::Opcode(op) => names.name(*op).to_string(),
        InstructionKind::Data(bytes) => format!("L{} 0x{}", bytes.len(), hex(bytes)),
    }
}

pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{:02x}", b);
    }
    out
}

/// One instruction per line, no annotations.
pub fn render_script(instructions: &[Instruction], names: &OpcodeNames) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.push_str(&render_instruction(instruction, names));
        out.push('\n');
    }
    out
}

/// Render the annotated script.
///
/// Before the first instruction of each statement, the statement's source
/// text is copied in with every line prefixed by `### `. Each statement is
/// copied once, in order of first use.
pub fn annotate(
    instructions: &[Instruction],
    stmts: &StmtTable,
    source: &str,
    names: &OpcodeNames,
) -> String {
    let mut out = String::new();
    out.push_str(ANNOTATION_HEADER);
    out.push('\n');

    let mut written = HashSet::new();
    for instruction in instructions {
        if let Some(id) = instruction.stmt {
            if written.insert(id) {
                if let Some(stmt) = stmts.get(id) {
                    out.push('\n');
                    out.push_str(COMMENT_MARKER);
                    for ch in stmt.text(source).chars() {
                        out.push(ch);
                        if ch == '\n' {
                            out.push_str(COMMENT_MARKER);
                        }
                    }
                    out.push('\n');
                }
            }
        }
        out.push_str(&render_instruction(instruction, names));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::span::{SourcePos, Stmt, StmtId};

    #[test]
    fn test_render_instruction() {
        let names = OpcodeNames::new();
        assert_eq!(
            render_instruction(&Instruction::opcode(Opcode::Op0, None), &names),
            "L1 0x00"
        );
        assert_eq!(
            render_instruction(&Instruction::opcode(Opcode::ToAltStack, None), &names),
            "OP_TOALTSTACK"
        );
        assert_eq!(
            render_instruction(&Instruction::data(vec![0x0a, 0xff], None), &names),
            "L2 0x0aff"
        );
    }

    #[test]
    fn test_annotate_writes_each_statement_once() {
        let source = "x = 1;\nif (x == 1)\n{ }";
        let mut stmts = StmtTable::new();
        let first = stmts.declare(Stmt::new(SourcePos::start(), SourcePos::new(6, 1, 7)));
        let second = stmts.declare(Stmt::new(SourcePos::new(7, 2, 1), SourcePos::new(19, 3, 1)));
        let code = vec![
            Instruction::data(vec![1], Some(first)),
            Instruction::opcode(Opcode::ToAltStack, Some(first)),
            Instruction::opcode(Opcode::FromAltStack, Some(second)),
            Instruction::opcode(Opcode::If, Some(second)),
        ];
        let text = annotate(&code, &stmts, source, &OpcodeNames::new());
        let expected = "\
### Autogenerated Hello script.

### x = 1;
L1 0x01
OP_TOALTSTACK

### if (x == 1)
### 
OP_FROMALTSTACK
OP_IF
";
        assert_eq!(text, expected);
        assert_eq!(second, StmtId(1));
    }
}
