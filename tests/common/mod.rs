//! Shared helpers for the integration tests.
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code, unused_imports)]

use std::collections::HashMap;

pub use hello_lang::bytecode::disasm::render_instruction;
pub use hello_lang::bytecode::{CompiledScript, Compiler, Opcode, script_num};
pub use hello_lang::{CompilerOptions, VerifyFlags};

/// Compiler with the given options and no external values defined.
pub fn compiler(options: CompilerOptions) -> Compiler {
    Compiler::new()
        .with_options(options)
        .with_externs(HashMap::<String, Vec<u8>>::new())
}

/// Compile, panicking with the diagnostics on failure.
pub fn compile(source: &str, options: CompilerOptions) -> CompiledScript {
    match compiler(options).compile(source) {
        Ok(script) => script,
        Err(failure) => panic!("compilation failed:\n{}", failure),
    }
}

/// Instructions rendered one per entry, as the script text shows them.
pub fn rendered(source: &str, options: CompilerOptions) -> Vec<String> {
    let mut c = compiler(options);
    let script = match c.compile(source) {
        Ok(script) => script,
        Err(failure) => panic!("compilation failed:\n{}", failure),
    };
    script
        .instructions
        .iter()
        .map(|i| render_instruction(i, c.opcode_names()))
        .collect()
}

/// Compile and evaluate, returning the alt-stack: one entry per variable,
/// in declaration order.
pub fn alt_after(source: &str, options: CompilerOptions) -> Result<Vec<Vec<u8>>, String> {
    let mut c = compiler(options);
    let result = c.execute(source);
    if result.success {
        Ok(c.stacks().alt.clone())
    } else {
        Err(result.description)
    }
}

/// Script-number encodings of `values`.
pub fn nums(values: &[i64]) -> Vec<Vec<u8>> {
    values.iter().map(|v| script_num::encode(*v)).collect()
}

/// Assert that `source` runs and leaves the listed variable values.
#[macro_export]
macro_rules! assert_vars {
    ($source:expr, [$($value:expr),* $(,)?]) => {{
        for options in [
            $crate::common::CompilerOptions::empty(),
            $crate::common::CompilerOptions::OPTIMIZER_ENABLED,
        ] {
            let alt = $crate::common::alt_after($source, options)
                .unwrap_or_else(|e| panic!("{} failed: {}", $source, e));
            assert_eq!(
                alt,
                $crate::common::nums(&[$($value),*]),
                "variables of {:?} with {:?}",
                $source,
                options
            );
        }
    }};
}
