//! Named variables on a push/pop-only alt-stack.
//!
//! Between statements the alt-stack holds exactly one value per declared
//! variable, slot 0 deepest. Reading or writing slot `k` of `n` means popping
//! the `n - k` topmost values onto the primary stack, doing the work there,
//! and pushing them back in the original order.

use std::collections::HashMap;

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::pipeline::InstructionPipeline;
use crate::bytecode::{Opcode, script_num};

/// Name ⇄ slot mapping. Slots are dense, assigned on first write and never
/// released.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    slots: HashMap<String, usize>,
    names: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot of `name`, allocating the next free slot if it is new. The flag
    /// tells whether the name already existed.
    pub fn index_of(&mut self, name: &str) -> (usize, bool) {
        if let Some(&slot) = self.slots.get(name) {
            return (slot, true);
        }
        let slot = self.names.len();
        self.slots.insert(name.to_string(), slot);
        self.names.push(name.to_string());
        debug_assert_eq!(self.slots.len(), self.names.len());
        tracing::trace!(name, slot, "allocated variable slot");
        (slot, false)
    }

    /// Slot of `name` without allocating.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn name_at(&self, slot: usize) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in slot order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.names.clear();
    }

    /// Drop every slot at or above `len`, returning to an earlier state of
    /// the table.
    pub fn truncate(&mut self, len: usize) {
        for name in self.names.drain(len.min(self.names.len())..) {
            self.slots.remove(&name);
        }
    }

    /// Emit code leaving a copy of `name` on top of the primary stack. The
    /// alt-stack is left unchanged.
    ///
    /// `line` is only used to report an unassigned name.
    pub fn copy_to_top_of_stack(
        &self,
        name: &str,
        line: usize,
        pipe: &mut InstructionPipeline,
    ) -> Result<(), CompileError> {
        let slot = self
            .lookup(name)
            .ok_or_else(|| CompileError::UninitializedVariable {
                name: name.to_string(),
                line,
            })?;
        let count = self.len();

        // target ends up on top of the primary stack
        for _ in slot..count {
            pipe.push_op(Opcode::FromAltStack);
        }
        pipe.push_op(Opcode::Dup);
        pipe.push_op(Opcode::ToAltStack);
        // the copy sinks one place per restored variable
        for _ in slot + 1..count {
            pipe.push_op(Opcode::Swap);
            pipe.push_op(Opcode::ToAltStack);
        }
        Ok(())
    }

    /// Emit code moving the value on top of the primary stack into `name`'s
    /// slot, allocating the slot if the name is new.
    pub fn assign_from_top_of_stack(&mut self, name: &str, pipe: &mut InstructionPipeline) {
        let (slot, existed) = self.index_of(name);
        if !existed {
            debug_assert_eq!(slot + 1, self.len());
            pipe.push_op(Opcode::ToAltStack);
            return;
        }

        let count = self.len();
        for _ in slot..count {
            pipe.push_op(Opcode::FromAltStack);
        }
        pipe.push_op(Opcode::Drop);
        let above = count - 1 - slot;
        if above > 0 {
            pipe.push_data(script_num::encode(above as i64));
            pipe.push_op(Opcode::Roll);
        }
        for _ in slot..count {
            pipe.push_op(Opcode::ToAltStack);
        }
    }

    /// Emit code binding `name` to a literal integer.
    pub fn assign_value_to_variable(
        &mut self,
        name: &str,
        value: i64,
        pipe: &mut InstructionPipeline,
    ) {
        pipe.push_int(value);
        self.assign_from_top_of_stack(name, pipe);
    }
}
