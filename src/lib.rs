//! Compiler for Hello, a small C-like language targeting a Bitcoin-style
//! stack machine. Named variables live on the machine's alt-stack.

pub mod bytecode;
pub mod config;
pub mod frontend;
pub mod lang;
pub mod runtime;

pub use bytecode::{CompileFailure, CompiledScript, Compiler};
pub use config::{CompilerOptions, EvalLimits, VerifyFlags};
pub use runtime::Evaluation;
