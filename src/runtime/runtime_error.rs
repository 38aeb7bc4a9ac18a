use thiserror::Error;

use crate::bytecode::Opcode;
use crate::bytecode::script_num::ScriptNumError;

/// Why the reference evaluator rejected a script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("stack underflow at {0}")]
    StackUnderflow(Opcode),

    #[error("alt-stack underflow")]
    AltStackUnderflow,

    #[error("invalid stack operation: {op} with depth {depth}")]
    InvalidStackOperation { op: Opcode, depth: i64 },

    #[error("OP_VERIFY failed")]
    VerifyFailed,

    #[error("OP_RETURN was encountered")]
    OpReturn,

    #[error("unbalanced conditional")]
    UnbalancedConditional,

    #[error("discouraged use of upgradable {0}")]
    DiscourageUpgradableNops(Opcode),

    #[error("{0} is not supported by this evaluator")]
    UnsupportedOpcode(Opcode),

    #[error(transparent)]
    ScriptNum(#[from] ScriptNumError),

    #[error("division by zero at {0}")]
    DivisionByZero(Opcode),

    #[error("invalid split position {position} for {len} bytes")]
    InvalidSplitRange { position: i64, len: usize },

    #[error("operands of {0} differ in size")]
    InvalidOperandSize(Opcode),

    #[error("value does not fit in {size} bytes")]
    ImpossibleEncoding { size: i64 },

    #[error("stack element of {len} bytes exceeds the {max} byte limit")]
    PushSize { len: usize, max: usize },

    #[error("stack size limit exceeded ({0})")]
    StackSize(usize),

    #[error("execution step limit exceeded ({0})")]
    StepLimit(usize),
}
