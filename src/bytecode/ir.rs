use crate::bytecode::Opcode;
use crate::config::CompilerOptions;
use crate::lang::span::{StmtId, StmtTable};
use serde::{Deserialize, Serialize};

/// What an instruction does: run an opcode, or push a byte string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionKind {
    Opcode(Opcode),
    Data(Vec<u8>),
}

/// One entry of the output program, tagged with the statement that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub stmt: Option<StmtId>,
}

impl Instruction {
    pub fn opcode(op: Opcode, stmt: Option<StmtId>) -> Self {
        Instruction {
            kind: InstructionKind::Opcode(op),
            stmt,
        }
    }

    pub fn data(bytes: Vec<u8>, stmt: Option<StmtId>) -> Self {
        Instruction {
            kind: InstructionKind::Data(bytes),
            stmt,
        }
    }

    /// True if this is the opcode `op`.
    pub fn is(&self, op: Opcode) -> bool {
        matches!(self.kind, InstructionKind::Opcode(own) if own == op)
    }

    pub fn as_opcode(&self) -> Option<Opcode> {
        match self.kind {
            InstructionKind::Opcode(op) => Some(op),
            InstructionKind::Data(_) => None,
        }
    }
}

/// A successful compilation: the instruction stream plus the span table its
/// `stmt` tags index into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledScript {
    pub instructions: Vec<Instruction>,
    pub stmts: StmtTable,
    pub options: CompilerOptions,
    /// Rendered annotated script, when requested by the options.
    pub annotated: Option<String>,
}

impl CompiledScript {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
        self.instructions.iter().filter_map(Instruction::as_opcode)
    }

    pub fn count(&self, op: Opcode) -> usize {
        self.instructions.iter().filter(|i| i.is(op)).count()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
