use sha2::{Digest, Sha256 as Sha256Hasher};

use crate::bytecode::ir::{Instruction, InstructionKind};
use crate::bytecode::{Opcode, script_num};
use crate::config::{EvalLimits, VerifyFlags};
use crate::runtime::runtime_error::EvalError;
use crate::runtime::{ExecutionStacks, ScriptEvaluator};

/// Reference evaluator for compiled scripts.
///
/// Covers stack and alt-stack manipulation, numeric and boolean operators,
/// byte-string operators, SHA-256 hashing and conditionals. Signature checks
/// and the remaining hash opcodes need a transaction context or hash
/// functions this evaluator does not carry, and fail with
/// [`EvalError::UnsupportedOpcode`].
#[derive(Debug, Clone, Default)]
pub struct ScriptVm {
    limits: EvalLimits,
}

impl ScriptVm {
    pub fn new() -> Self {
        Self::with_limits(EvalLimits::default())
    }

    pub fn with_limits(limits: EvalLimits) -> Self {
        ScriptVm { limits }
    }

    pub fn limits(&self) -> &EvalLimits {
        &self.limits
    }
}

impl ScriptEvaluator for ScriptVm {
    fn evaluate(
        &self,
        script: &[Instruction],
        flags: VerifyFlags,
        stacks: &mut ExecutionStacks,
    ) -> Result<(), EvalError> {
        let mut exec = Exec {
            stacks,
            flags,
            limits: self.limits,
            steps: 0,
        };
        for instruction in script {
            exec.step(instruction)?;
        }
        if !exec.stacks.exec.is_empty() {
            return Err(EvalError::UnbalancedConditional);
        }
        Ok(())
    }
}

struct Exec<'s> {
    stacks: &'s mut ExecutionStacks,
    flags: VerifyFlags,
    limits: EvalLimits,
    steps: usize,
}

impl Exec<'_> {
    fn executing(&self) -> bool {
        self.stacks.exec.iter().all(|taken| *taken)
    }

    fn check_limits(&mut self) -> Result<(), EvalError> {
        self.steps += 1;
        if let Some(max) = self.limits.max_steps {
            if self.steps > max {
                return Err(EvalError::StepLimit(max));
            }
        }
        if self.stacks.main.len() + self.stacks.alt.len() > self.limits.max_stack_size {
            return Err(EvalError::StackSize(self.limits.max_stack_size));
        }
        Ok(())
    }

    fn push(&mut self, bytes: Vec<u8>) -> Result<(), EvalError> {
        if bytes.len() > self.limits.max_element_size {
            return Err(EvalError::PushSize {
                len: bytes.len(),
                max: self.limits.max_element_size,
            });
        }
        self.stacks.main.push(bytes);
        Ok(())
    }

    fn push_num(&mut self, value: i64) -> Result<(), EvalError> {
        self.push(script_num::encode(value))
    }

    fn push_bool(&mut self, value: bool) -> Result<(), EvalError> {
        self.push(if value { vec![1] } else { Vec::new() })
    }

    fn pop(&mut self, op: Opcode) -> Result<Vec<u8>, EvalError> {
        self.stacks.main.pop().ok_or(EvalError::StackUnderflow(op))
    }

    fn pop_num(&mut self, op: Opcode) -> Result<i64, EvalError> {
        let bytes = self.pop(op)?;
        let require_minimal = self.flags.contains(VerifyFlags::MINIMAL_DATA);
        Ok(script_num::decode(&bytes, script_num::MAX_NUM_SIZE, require_minimal)?)
    }

    fn top(&self, op: Opcode) -> Result<&Vec<u8>, EvalError> {
        self.stacks.main.last().ok_or(EvalError::StackUnderflow(op))
    }

    fn step(&mut self, instruction: &Instruction) -> Result<(), EvalError> {
        self.check_limits()?;

        let op = match &instruction.kind {
            InstructionKind::Data(bytes) => {
                if self.executing() {
                    self.push(bytes.clone())?;
                }
                return Ok(());
            }
            InstructionKind::Opcode(op) => *op,
        };

        // conditionals run even inside a skipped branch
        match op {
            Opcode::If | Opcode::NotIf => {
                let mut taken = false;
                if self.executing() {
                    taken = script_num::as_bool(&self.pop(op)?);
                    if op == Opcode::NotIf {
                        taken = !taken;
                    }
                }
                self.stacks.exec.push(taken);
                return Ok(());
            }
            Opcode::Else => {
                let top = self
                    .stacks
                    .exec
                    .last_mut()
                    .ok_or(EvalError::UnbalancedConditional)?;
                *top = !*top;
                return Ok(());
            }
            Opcode::EndIf => {
                self.stacks
                    .exec
                    .pop()
                    .ok_or(EvalError::UnbalancedConditional)?;
                return Ok(());
            }
            _ => {}
        }

        if !self.executing() {
            return Ok(());
        }
        self.exec_op(op)
    }

    fn exec_op(&mut self, op: Opcode) -> Result<(), EvalError> {
        use Opcode::*;
        match op {
            Op0 => self.push(Vec::new())?,
            Op1 => self.push_num(1)?,
            Op1Negate => self.push_num(-1)?,

            Nop => {}
            // without a transaction to check against, the locktime opcodes
            // behave as the upgradable NOPs they replaced
            Nop1 | Nop4 | CheckLockTimeVerify | CheckSequenceVerify => {
                if self.flags.contains(VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS) {
                    return Err(EvalError::DiscourageUpgradableNops(op));
                }
            }
            Verify => {
                if !script_num::as_bool(&self.pop(op)?) {
                    return Err(EvalError::VerifyFailed);
                }
            }
            Return => return Err(EvalError::OpReturn),

            // stack
            ToAltStack => {
                let value = self.pop(op)?;
                self.stacks.alt.push(value);
            }
            FromAltStack => {
                let value = self.stacks.alt.pop().ok_or(EvalError::AltStackUnderflow)?;
                self.push(value)?;
            }
            Depth => {
                let depth = self.stacks.main.len() as i64;
                self.push_num(depth)?;
            }
            Drop => {
                self.pop(op)?;
            }
            Dup => {
                let value = self.top(op)?.clone();
                self.push(value)?;
            }
            Swap => {
                let b = self.pop(op)?;
                let a = self.pop(op)?;
                self.push(b)?;
                self.push(a)?;
            }
            Roll => {
                let depth = self.pop_num(op)?;
                let len = self.stacks.main.len();
                let index = usize::try_from(depth)
                    .ok()
                    .filter(|d| *d < len)
                    .map(|d| len - 1 - d)
                    .ok_or(EvalError::InvalidStackOperation { op, depth })?;
                let value = self.stacks.main.remove(index);
                self.push(value)?;
            }

            // byte strings
            Cat => {
                let b = self.pop(op)?;
                let mut a = self.pop(op)?;
                a.extend_from_slice(&b);
                self.push(a)?;
            }
            Split => {
                let position = self.pop_num(op)?;
                let mut data = self.pop(op)?;
                let len = data.len();
                let at = usize::try_from(position)
                    .ok()
                    .filter(|p| *p <= len)
                    .ok_or(EvalError::InvalidSplitRange { position, len })?;
                let tail = data.split_off(at);
                self.push(data)?;
                self.push(tail)?;
            }
            Num2Bin => {
                let size = self.pop_num(op)?;
                let value = self.pop(op)?;
                let max = self.limits.max_element_size;
                if size > max as i64 {
                    return Err(EvalError::PushSize {
                        len: usize::try_from(size).unwrap_or(usize::MAX),
                        max,
                    });
                }
                let encoded = num_to_bin(value, size)?;
                self.push(encoded)?;
            }
            Bin2Num => {
                let value = minimally_encode(self.pop(op)?);
                if value.len() > script_num::MAX_NUM_SIZE {
                    return Err(EvalError::ImpossibleEncoding {
                        size: script_num::MAX_NUM_SIZE as i64,
                    });
                }
                self.push(value)?;
            }
            Size => {
                let len = self.top(op)?.len() as i64;
                self.push_num(len)?;
            }
            Xor => {
                let b = self.pop(op)?;
                let a = self.pop(op)?;
                if a.len() != b.len() {
                    return Err(EvalError::InvalidOperandSize(op));
                }
                let result = a.iter().zip(&b).map(|(x, y)| x ^ y).collect();
                self.push(result)?;
            }
            Equal => {
                let b = self.pop(op)?;
                let a = self.pop(op)?;
                self.push_bool(a == b)?;
            }

            // unary numeric
            Negate | Abs | Not | ZeroNotEqual => {
                let a = self.pop_num(op)?;
                match op {
                    Negate => self.push_num(-a)?,
                    Abs => self.push_num(a.abs())?,
                    Not => self.push_bool(a == 0)?,
                    _ => self.push_bool(a != 0)?,
                }
            }

            // binary numeric
            Add | Sub | Mul | Div | Mod | BoolAnd | BoolOr | NumEqual | NumNotEqual
            | LessThan | GreaterThan | LessThanOrEqual | GreaterThanOrEqual | Min | Max => {
                let b = self.pop_num(op)?;
                let a = self.pop_num(op)?;
                match op {
                    Add => self.push_num(a + b)?,
                    Sub => self.push_num(a - b)?,
                    Mul => self.push_num(a * b)?,
                    Div | Mod if b == 0 => return Err(EvalError::DivisionByZero(op)),
                    Div => self.push_num(a / b)?,
                    Mod => self.push_num(a % b)?,
                    BoolAnd => self.push_bool(a != 0 && b != 0)?,
                    BoolOr => self.push_bool(a != 0 || b != 0)?,
                    NumEqual => self.push_bool(a == b)?,
                    NumNotEqual => self.push_bool(a != b)?,
                    LessThan => self.push_bool(a < b)?,
                    GreaterThan => self.push_bool(a > b)?,
                    LessThanOrEqual => self.push_bool(a <= b)?,
                    GreaterThanOrEqual => self.push_bool(a >= b)?,
                    Min => self.push_num(a.min(b))?,
                    _ => self.push_num(a.max(b))?,
                }
            }
            Within => {
                let max = self.pop_num(op)?;
                let min = self.pop_num(op)?;
                let x = self.pop_num(op)?;
                self.push_bool(min <= x && x < max)?;
            }

            // crypto
            Sha256 => {
                let data = self.pop(op)?;
                self.push(Sha256Hasher::digest(&data).to_vec())?;
            }
            Hash256 => {
                let data = self.pop(op)?;
                let once = Sha256Hasher::digest(&data);
                self.push(Sha256Hasher::digest(once).to_vec())?;
            }
            Ripemd160 | Sha1 | Hash160 | CheckSig | CheckSigVerify | CheckMultiSig
            | CheckMultiSigVerify => return Err(EvalError::UnsupportedOpcode(op)),

            If | NotIf | Else | EndIf => {}
        }
        Ok(())
    }
}

/// Shortest encoding of the number held in `data`.
fn minimally_encode(mut data: Vec<u8>) -> Vec<u8> {
    let Some(&last) = data.last() else {
        return data;
    };
    if last & 0x7f != 0 {
        return data;
    }
    if data.len() == 1 {
        return Vec::new();
    }
    if data[data.len() - 2] & 0x80 != 0 {
        return data;
    }
    // strip zero padding, keeping the sign bit
    let mut i = data.len() - 1;
    while i > 0 {
        if data[i - 1] != 0 {
            if data[i - 1] & 0x80 != 0 {
                data[i] = last;
                data.truncate(i + 1);
            } else {
                data[i - 1] |= last;
                data.truncate(i);
            }
            return data;
        }
        i -= 1;
    }
    Vec::new()
}

/// Pad the number in `value` to exactly `size` bytes.
fn num_to_bin(value: Vec<u8>, size: i64) -> Result<Vec<u8>, EvalError> {
    let mut raw = minimally_encode(value);
    let target = usize::try_from(size)
        .ok()
        .filter(|s| *s >= raw.len())
        .ok_or(EvalError::ImpossibleEncoding { size })?;
    if raw.len() == target {
        return Ok(raw);
    }
    let mut sign = 0x00;
    if let Some(last) = raw.last_mut() {
        sign = *last & 0x80;
        *last &= 0x7f;
    }
    raw.resize(target - 1, 0x00);
    raw.push(sign);
    Ok(raw)
}
