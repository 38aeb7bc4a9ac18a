//! Built-in functions that map directly onto a single opcode.

use crate::bytecode::Opcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// Any number of arguments, closed by `)`.
    Variable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub opcode: Opcode,
}

const fn builtin(name: &'static str, arity: Arity, opcode: Opcode) -> Builtin {
    Builtin {
        name,
        arity,
        opcode,
    }
}

use Arity::{Fixed, Variable};

/// Statement-level builtins. They leave nothing on the stack.
pub const SPECIAL_FUNCTIONS: &[Builtin] = &[
    builtin("Verify", Fixed(1), Opcode::Verify),
    builtin("CheckSequenceVerify", Fixed(1), Opcode::CheckSequenceVerify),
    builtin("CheckLocktimeVerify", Fixed(1), Opcode::CheckLockTimeVerify),
    builtin("CheckSigVerify", Fixed(2), Opcode::CheckSigVerify),
    builtin("CheckMultiSigVerify", Variable, Opcode::CheckMultiSigVerify),
    builtin("Return", Fixed(1), Opcode::Return),
];

/// Expression-level builtins. Each leaves one value on the stack, except
/// `split` which leaves two; the second is reachable as `tos`.
pub const NATIVE_FUNCTIONS: &[Builtin] = &[
    // crypto
    builtin("RIPEMD160", Fixed(1), Opcode::Ripemd160),
    builtin("SHA1", Fixed(1), Opcode::Sha1),
    builtin("SHA256", Fixed(1), Opcode::Sha256),
    builtin("HASH160", Fixed(1), Opcode::Hash160),
    builtin("HASH256", Fixed(1), Opcode::Hash256),
    builtin("CheckSig", Fixed(2), Opcode::CheckSig),
    builtin("CheckMultiSig", Variable, Opcode::CheckMultiSig),
    // byte arrays
    builtin("split", Fixed(2), Opcode::Split),
    builtin("cat", Fixed(2), Opcode::Cat),
    builtin("xor", Fixed(2), Opcode::Xor),
    builtin("Bin2Num", Fixed(1), Opcode::Bin2Num),
    builtin("Num2Bin", Fixed(2), Opcode::Num2Bin),
    // numeric
    builtin("abs", Fixed(1), Opcode::Abs),
    builtin("max", Fixed(2), Opcode::Max),
    builtin("min", Fixed(2), Opcode::Min),
    builtin("within", Fixed(3), Opcode::Within),
    // misc
    builtin("depth", Fixed(0), Opcode::Depth),
    builtin("size", Fixed(1), Opcode::Size),
];

pub fn special_function(name: &str) -> Option<&'static Builtin> {
    SPECIAL_FUNCTIONS.iter().find(|b| b.name == name)
}

pub fn native_function(name: &str) -> Option<&'static Builtin> {
    NATIVE_FUNCTIONS.iter().find(|b| b.name == name)
}
