//! Executing compiled scripts.
//!
//! The compiler talks to an evaluator only through [`ScriptEvaluator`].
//! [`ScriptVm`] is a reference implementation covering the opcodes the
//! compiler emits.

pub mod externs;
pub mod runtime_error;
pub mod vm;

pub use externs::{EnvExterns, ExternValues};
pub use runtime_error::EvalError;
pub use vm::ScriptVm;

use crate::bytecode::ir::Instruction;
use crate::config::VerifyFlags;

/// Primary stack, alt stack and the stack of branch-execution flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStacks {
    pub main: Vec<Vec<u8>>,
    pub alt: Vec<Vec<u8>>,
    pub exec: Vec<bool>,
}

impl ExecutionStacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.main.clear();
        self.alt.clear();
        self.exec.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.alt.is_empty() && self.exec.is_empty()
    }
}

/// Runs an instruction stream against a set of stacks.
pub trait ScriptEvaluator {
    fn evaluate(
        &self,
        script: &[Instruction],
        flags: VerifyFlags,
        stacks: &mut ExecutionStacks,
    ) -> Result<(), EvalError>;
}

/// Outcome of a compile-then-evaluate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub success: bool,
    pub description: String,
}

impl Evaluation {
    pub fn succeeded() -> Self {
        Evaluation {
            success: true,
            description: "No error".to_string(),
        }
    }

    pub fn failed(description: impl Into<String>) -> Self {
        Evaluation {
            success: false,
            description: description.into(),
        }
    }
}
