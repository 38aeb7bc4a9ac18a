use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// OPCODE - target machine instructions
// =============================================================================

/// Opcodes of the target stack machine.
///
/// Discriminants are the machine's byte values. Only the opcodes the compiler
/// emits, or the reference evaluator understands, are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    // push value
    Op0 = 0x00,
    Op1Negate = 0x4f,
    Op1 = 0x51,

    // control
    Nop = 0x61,
    If = 0x63,
    NotIf = 0x64,
    Else = 0x67,
    EndIf = 0x68,
    Verify = 0x69,
    Return = 0x6a,

    // stack ops
    ToAltStack = 0x6b,
    FromAltStack = 0x6c,
    Depth = 0x74,
    Drop = 0x75,
    Dup = 0x76,
    Roll = 0x7a,
    Swap = 0x7c,

    // byte arrays
    Cat = 0x7e,
    Split = 0x7f,
    Num2Bin = 0x80,
    Bin2Num = 0x81,
    Size = 0x82,

    // bit logic
    Xor = 0x86,
    Equal = 0x87,

    // numeric
    Negate = 0x8f,
    Abs = 0x90,
    Not = 0x91,
    ZeroNotEqual = 0x92,
    Add = 0x93,
    Sub = 0x94,
    Mul = 0x95,
    Div = 0x96,
    Mod = 0x97,
    BoolAnd = 0x9a,
    BoolOr = 0x9b,
    NumEqual = 0x9c,
    NumNotEqual = 0x9e,
    LessThan = 0x9f,
    GreaterThan = 0xa0,
    LessThanOrEqual = 0xa1,
    GreaterThanOrEqual = 0xa2,
    Min = 0xa3,
    Max = 0xa4,
    Within = 0xa5,

    // crypto
    Ripemd160 = 0xa6,
    Sha1 = 0xa7,
    Sha256 = 0xa8,
    Hash160 = 0xa9,
    Hash256 = 0xaa,
    CheckSig = 0xac,
    CheckSigVerify = 0xad,
    CheckMultiSig = 0xae,
    CheckMultiSigVerify = 0xaf,

    // expansion
    Nop1 = 0xb0,
    CheckLockTimeVerify = 0xb1,
    CheckSequenceVerify = 0xb2,
    Nop4 = 0xb3,
}

impl Opcode {
    pub const ALL: [Opcode; 57] = [
        Opcode::Op0,
        Opcode::Op1Negate,
        Opcode::Op1,
        Opcode::Nop,
        Opcode::If,
        Opcode::NotIf,
        Opcode::Else,
        Opcode::EndIf,
        Opcode::Verify,
        Opcode::Return,
        Opcode::ToAltStack,
        Opcode::FromAltStack,
        Opcode::Depth,
        Opcode::Drop,
        Opcode::Dup,
        Opcode::Roll,
        Opcode::Swap,
        Opcode::Cat,
        Opcode::Split,
        Opcode::Num2Bin,
        Opcode::Bin2Num,
        Opcode::Size,
        Opcode::Xor,
        Opcode::Equal,
        Opcode::Negate,
        Opcode::Abs,
        Opcode::Not,
        Opcode::ZeroNotEqual,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::BoolAnd,
        Opcode::BoolOr,
        Opcode::NumEqual,
        Opcode::NumNotEqual,
        Opcode::LessThan,
        Opcode::GreaterThan,
        Opcode::LessThanOrEqual,
        Opcode::GreaterThanOrEqual,
        Opcode::Min,
        Opcode::Max,
        Opcode::Within,
        Opcode::Ripemd160,
        Opcode::Sha1,
        Opcode::Sha256,
        Opcode::Hash160,
        Opcode::Hash256,
        Opcode::CheckSig,
        Opcode::CheckSigVerify,
        Opcode::CheckMultiSig,
        Opcode::CheckMultiSigVerify,
        Opcode::Nop1,
        Opcode::CheckLockTimeVerify,
        Opcode::CheckSequenceVerify,
        Opcode::Nop4,
    ];

    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Symbolic name as the target machine's tooling prints it.
    pub fn name(self) -> &'static str {
        use Opcode::*;
        match self {
            Op0 => "0",
            Op1Negate => "-1",
            Op1 => "1",
            Nop => "OP_NOP",
            If => "OP_IF",
            NotIf => "OP_NOTIF",
            Else => "OP_ELSE",
            EndIf => "OP_ENDIF",
            Verify => "OP_VERIFY",
            Return => "OP_RETURN",
            ToAltStack => "OP_TOALTSTACK",
            FromAltStack => "OP_FROMALTSTACK",
            Depth => "OP_DEPTH",
            Drop => "OP_DROP",
            Dup => "OP_DUP",
            Roll => "OP_ROLL",
            Swap => "OP_SWAP",
            Cat => "OP_CAT",
            Split => "OP_SPLIT",
            Num2Bin => "OP_NUM2BIN",
            Bin2Num => "OP_BIN2NUM",
            Size => "OP_SIZE",
            Xor => "OP_XOR",
            Equal => "OP_EQUAL",
            Negate => "OP_NEGATE",
            Abs => "OP_ABS",
            Not => "OP_NOT",
            ZeroNotEqual => "OP_0NOTEQUAL",
            Add => "OP_ADD",
            Sub => "OP_SUB",
            Mul => "OP_MUL",
            Div => "OP_DIV",
            Mod => "OP_MOD",
            BoolAnd => "OP_BOOLAND",
            BoolOr => "OP_BOOLOR",
            NumEqual => "OP_NUMEQUAL",
            NumNotEqual => "OP_NUMNOTEQUAL",
            LessThan => "OP_LESSTHAN",
            GreaterThan => "OP_GREATERTHAN",
            LessThanOrEqual => "OP_LESSTHANOREQUAL",
            GreaterThanOrEqual => "OP_GREATERTHANOREQUAL",
            Min => "OP_MIN",
            Max => "OP_MAX",
            Within => "OP_WITHIN",
            Ripemd160 => "OP_RIPEMD160",
            Sha1 => "OP_SHA1",
            Sha256 => "OP_SHA256",
            Hash160 => "OP_HASH160",
            Hash256 => "OP_HASH256",
            CheckSig => "OP_CHECKSIG",
            CheckSigVerify => "OP_CHECKSIGVERIFY",
            CheckMultiSig => "OP_CHECKMULTISIG",
            CheckMultiSigVerify => "OP_CHECKMULTISIGVERIFY",
            Nop1 => "OP_NOP1",
            CheckLockTimeVerify => "OP_CHECKLOCKTIMEVERIFY",
            CheckSequenceVerify => "OP_CHECKSEQUENCEVERIFY",
            Nop4 => "OP_NOP4",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Bidirectional opcode/name table.
///
/// Built once by the caller and passed by reference to the renderer and the
/// script text reader. Name lookups accept both `OP_ADD` and `ADD`.
#[derive(Debug, Clone)]
pub struct OpcodeNames {
    by_name: HashMap<String, Opcode>,
    by_opcode: HashMap<Opcode, &'static str>,
}

impl OpcodeNames {
    pub fn new() -> Self {
        let mut by_name = HashMap::new();
        let mut by_opcode = HashMap::new();

        for op in Opcode::ALL {
            let name = op.name();
            by_opcode.insert(op, name);
            if let Some(short) = name.strip_prefix("OP_") {
                by_name.insert(name.to_string(), op);
                by_name.insert(short.to_string(), op);
            }
        }
        // numerals print as "0", "-1", "1"; decimal text is a number, not a name
        by_name.insert("OP_0".to_string(), Opcode::Op0);
        by_name.insert("OP_1".to_string(), Opcode::Op1);
        by_name.insert("OP_FALSE".to_string(), Opcode::Op0);
        by_name.insert("OP_TRUE".to_string(), Opcode::Op1);
        by_name.insert("OP_1NEGATE".to_string(), Opcode::Op1Negate);
        by_name.insert("OP_NOP2".to_string(), Opcode::CheckLockTimeVerify);
        by_name.insert("OP_NOP3".to_string(), Opcode::CheckSequenceVerify);

        OpcodeNames { by_name, by_opcode }
    }

    pub fn name(&self, op: Opcode) -> &'static str {
        self.by_opcode.get(&op).copied().unwrap_or("OP_UNKNOWN")
    }

    pub fn lookup(&self, name: &str) -> Option<Opcode> {
        self.by_name.get(name).copied()
    }
}

impl Default for OpcodeNames {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_opcodes_are_distinct() {
        let mut bytes: Vec<u8> = Opcode::ALL.iter().map(|op| op.byte()).collect();
        bytes.sort();
        bytes.dedup();
        assert_eq!(bytes.len(), Opcode::ALL.len());
    }

    #[test]
    fn test_opcode_values() {
        assert_eq!(Opcode::Op0.byte(), 0x00);
        assert_eq!(Opcode::ToAltStack.byte(), 0x6b);
        assert_eq!(Opcode::FromAltStack.byte(), 0x6c);
        assert_eq!(Opcode::Add.byte(), 0x93);
        assert_eq!(Opcode::Nop4.byte(), 0xb3);
    }

    #[test]
    fn test_names() {
        let names = OpcodeNames::new();
        assert_eq!(names.name(Opcode::Add), "OP_ADD");
        assert_eq!(names.name(Opcode::Op0), "0");
        assert_eq!(names.lookup("OP_ADD"), Some(Opcode::Add));
        assert_eq!(names.lookup("ADD"), Some(Opcode::Add));
        assert_eq!(names.lookup("0"), None);
        assert_eq!(names.lookup("OP_0"), Some(Opcode::Op0));
        assert_eq!(names.lookup("OP_NOP3"), Some(Opcode::CheckSequenceVerify));
        assert_eq!(names.lookup("OP_BOGUS"), None);
    }
}
