//! # Code generation
//!
//! Opcodes, the instruction pipeline and the variable allocator it drives,
//! the compiler proper, and text rendering of its output.

pub mod compile;
pub mod compile_error;
pub mod disasm;
pub mod ir;
pub mod op;
pub mod pipeline;
pub mod script_num;
pub mod script_text;
pub mod stack_check;
pub mod symbols;

pub use compile::Compiler;
pub use compile_error::{CompileError, CompileFailure, Diagnostic, DiagnosticKind};
pub use ir::{CompiledScript, Instruction, InstructionKind};
pub use op::{Opcode, OpcodeNames};
pub use pipeline::InstructionPipeline;
pub use symbols::SymbolTable;
