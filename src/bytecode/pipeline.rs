use crate::bytecode::ir::{Instruction, InstructionKind};
use crate::bytecode::{Opcode, script_num};
use crate::lang::span::StmtId;

/// Output buffer of the code generator.
///
/// Every instruction is tagged with the most recently declared statement.
/// With the optimizer on, an alt-stack transfer that directly undoes the
/// previous instruction cancels it instead of being appended.
#[derive(Debug, Clone, Default)]
pub struct InstructionPipeline {
    instructions: Vec<Instruction>,
    current_stmt: Option<StmtId>,
    optimize: bool,
    elided: usize,

    /// Shortest length since the last [`InstructionPipeline::take_low_water`]
    low_water: usize,
}

impl InstructionPipeline {
    pub fn new(optimize: bool) -> Self {
        InstructionPipeline {
            optimize,
            ..Self::default()
        }
    }

    /// Attribute subsequent instructions to `stmt`.
    pub fn declare_stmt(&mut self, stmt: StmtId) {
        self.current_stmt = Some(stmt);
    }

    pub fn current_stmt(&self) -> Option<StmtId> {
        self.current_stmt
    }

    pub fn push_op(&mut self, op: Opcode) {
        if self.optimize {
            let undoes = match op {
                Opcode::ToAltStack => Some(Opcode::FromAltStack),
                Opcode::FromAltStack => Some(Opcode::ToAltStack),
                _ => None,
            };
            if let Some(prev) = undoes {
                if self.instructions.last().is_some_and(|last| last.is(prev)) {
                    self.instructions.pop();
                    self.elided += 2;
                    self.low_water = self.low_water.min(self.instructions.len());
                    tracing::trace!(elided = ?prev, with = ?op, "peephole: cancelled alt-stack transfer pair");
                    return;
                }
            }
        }
        self.instructions
            .push(Instruction::opcode(op, self.current_stmt));
    }

    /// Push a byte string. The empty string is pushed as `OP_0`.
    pub fn push_data(&mut self, bytes: Vec<u8>) {
        if bytes.is_empty() {
            self.push_op(Opcode::Op0);
        } else {
            self.instructions
                .push(Instruction::data(bytes, self.current_stmt));
        }
    }

    /// Push an integer in its canonical form: `OP_0` for zero, otherwise the
    /// minimal script-number encoding.
    pub fn push_int(&mut self, value: i64) {
        self.push_data(script_num::encode(value));
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Length of the untouched prefix since the previous call. Instructions
    /// below it are exactly as they were then; the peephole may have removed
    /// some above it.
    pub fn take_low_water(&mut self) -> usize {
        std::mem::replace(&mut self.low_water, self.instructions.len())
    }

    /// Number of instructions removed by the peephole so far.
    pub fn elided(&self) -> usize {
        self.elided
    }

    pub fn last_kind(&self) -> Option<&InstructionKind> {
        self.instructions.last().map(|i| &i.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pipe: &InstructionPipeline) -> Vec<InstructionKind> {
        pipe.instructions().iter().map(|i| i.kind.clone()).collect()
    }

    #[test]
    fn test_zero_is_op0() {
        let mut pipe = InstructionPipeline::new(false);
        pipe.push_int(0);
        pipe.push_int(1);
        pipe.push_int(-1);
        assert_eq!(
            kinds(&pipe),
            vec![
                InstructionKind::Opcode(Opcode::Op0),
                InstructionKind::Data(vec![0x01]),
                InstructionKind::Data(vec![0x81]),
            ]
        );
    }

    #[test]
    fn test_instructions_tagged_with_latest_stmt() {
        let mut pipe = InstructionPipeline::new(false);
        pipe.push_op(Opcode::Nop);
        pipe.declare_stmt(StmtId(0));
        pipe.push_int(5);
        pipe.declare_stmt(StmtId(3));
        pipe.push_op(Opcode::Dup);

        let tags: Vec<_> = pipe.instructions().iter().map(|i| i.stmt).collect();
        assert_eq!(tags, vec![None, Some(StmtId(0)), Some(StmtId(3))]);
    }

    #[test]
    fn test_peephole_cancels_adjacent_pairs() {
        let mut pipe = InstructionPipeline::new(true);
        pipe.push_int(1);
        pipe.push_op(Opcode::ToAltStack);
        pipe.push_op(Opcode::FromAltStack);
        assert_eq!(kinds(&pipe), vec![InstructionKind::Data(vec![0x01])]);

        pipe.push_op(Opcode::FromAltStack);
        pipe.push_op(Opcode::ToAltStack);
        assert_eq!(pipe.len(), 1);
        assert_eq!(pipe.elided(), 4);
    }

    #[test]
    fn test_peephole_only_looks_at_previous_instruction() {
        let mut pipe = InstructionPipeline::new(true);
        pipe.push_op(Opcode::ToAltStack);
        pipe.push_op(Opcode::Dup);
        pipe.push_op(Opcode::FromAltStack);
        assert_eq!(pipe.len(), 3);

        // same opcode twice is not a cancelling pair
        pipe.push_op(Opcode::FromAltStack);
        assert_eq!(pipe.len(), 4);
    }

    #[test]
    fn test_low_water_tracks_cancelled_prefix() {
        let mut pipe = InstructionPipeline::new(true);
        pipe.push_int(1);
        pipe.push_op(Opcode::ToAltStack);
        assert_eq!(pipe.take_low_water(), 0);

        // a cancelled pair reaches into the earlier instructions
        pipe.push_op(Opcode::FromAltStack);
        pipe.push_op(Opcode::Dup);
        assert_eq!(pipe.take_low_water(), 1);

        pipe.push_op(Opcode::ToAltStack);
        pipe.push_op(Opcode::FromAltStack);
        assert_eq!(pipe.take_low_water(), 2);
        assert_eq!(pipe.take_low_water(), 2);
    }

    #[test]
    fn test_peephole_disabled() {
        let mut pipe = InstructionPipeline::new(false);
        pipe.push_op(Opcode::ToAltStack);
        pipe.push_op(Opcode::FromAltStack);
        assert_eq!(pipe.len(), 2);
        assert_eq!(pipe.elided(), 0);
    }

    #[test]
    fn test_empty_data_is_op0() {
        let mut pipe = InstructionPipeline::new(false);
        pipe.push_data(Vec::new());
        assert_eq!(pipe.last_kind(), Some(&InstructionKind::Opcode(Opcode::Op0)));
    }
}
