use crate::bytecode::ir::{Instruction, InstructionKind};
use crate::bytecode::{Opcode, script_num};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    Main,
    Alt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackCheckError {
    pub ip: usize,
    pub stack: StackKind,
    pub message: String,
}

impl std::fmt::Display for StackCheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stack-check error at ip={}: {}", self.ip, self.message)
    }
}

impl std::error::Error for StackCheckError {}

impl StackCheckError {
    fn new(ip: usize, stack: StackKind, message: impl Into<String>) -> Self {
        Self {
            ip,
            stack,
            message: message.into(),
        }
    }
}

/// Item counts of the primary and alt stacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackHeights {
    pub main: i32,
    pub alt: i32,
}

impl StackHeights {
    pub fn new(main: i32, alt: i32) -> Self {
        StackHeights { main, alt }
    }
}

/// Returns (pops, pushes) on the primary stack for an opcode with a fixed
/// effect, or None if the effect is dynamic or handled separately.
fn effect(op: Opcode) -> Option<(i32, i32)> {
    use Opcode::*;
    Some(match op {
        Op0 | Op1Negate | Op1 => (0, 1),

        Nop | Nop1 | Nop4 => (0, 0),
        // the locktime checks leave their operand in place
        CheckLockTimeVerify | CheckSequenceVerify => (1, 1),
        Verify => (1, 0),

        Depth => (0, 1),
        Drop => (1, 0),
        Dup => (1, 2),
        Swap => (2, 2),

        Cat | Num2Bin | Xor | Equal => (2, 1),
        Split => (2, 2),
        Bin2Num => (1, 1),
        Size => (1, 2),

        Negate | Abs | Not | ZeroNotEqual => (1, 1),
        Add | Sub | Mul | Div | Mod => (2, 1),
        BoolAnd | BoolOr | NumEqual | NumNotEqual => (2, 1),
        LessThan | GreaterThan | LessThanOrEqual | GreaterThanOrEqual => (2, 1),
        Min | Max => (2, 1),
        Within => (3, 1),

        Ripemd160 | Sha1 | Sha256 | Hash160 | Hash256 => (1, 1),
        CheckSig => (2, 1),
        CheckSigVerify => (2, 0),

        // control flow, alt-stack transfers, ROLL and RETURN are tracked by
        // the checker itself; multisig pops a count it reads at run time
        If | NotIf | Else | EndIf | Return | ToAltStack | FromAltStack | Roll => return None,
        CheckMultiSig | CheckMultiSigVerify => return None,
    })
}

fn pop(h: &mut StackHeights, count: i32, ip: usize, op: Opcode) -> Result<(), StackCheckError> {
    h.main -= count;
    if h.main < 0 {
        return Err(StackCheckError::new(
            ip,
            StackKind::Main,
            format!("stack underflow at {}, needed {} items", op, count),
        ));
    }
    Ok(())
}

/// Follow the stack heights through an instruction stream.
///
/// Both arms of every `IF`/`NOTIF` must leave the same heights. Returns the
/// final heights, or `None` once an instruction with a dynamic effect is
/// reached (`RETURN`, multisig, `ROLL` without a literal count).
pub fn check_with_initial(
    instructions: &[Instruction],
    initial: StackHeights,
) -> Result<Option<StackHeights>, StackCheckError> {
    let mut h = initial;
    // heights before each open branch, and at the end of its IF arm once
    // ELSE has been seen
    let mut branches: Vec<(StackHeights, Option<StackHeights>)> = Vec::new();
    let mut last_int: Option<i64> = None;

    for (ip, instruction) in instructions.iter().enumerate() {
        let op = match &instruction.kind {
            InstructionKind::Data(bytes) => {
                last_int = script_num::decode(bytes, 8, false).ok();
                h.main += 1;
                continue;
            }
            InstructionKind::Opcode(op) => *op,
        };
        let operand = last_int.take();

        match op {
            Opcode::If | Opcode::NotIf => {
                pop(&mut h, 1, ip, op)?;
                branches.push((h, None));
            }
            Opcode::Else => {
                let Some(branch) = branches.last_mut() else {
                    return Err(StackCheckError::new(ip, StackKind::Main, "ELSE without IF"));
                };
                if branch.1.is_some() {
                    return Err(StackCheckError::new(ip, StackKind::Main, "second ELSE in one IF"));
                }
                branch.1 = Some(h);
                h = branch.0;
            }
            Opcode::EndIf => {
                let Some((before, then_end)) = branches.pop() else {
                    return Err(StackCheckError::new(ip, StackKind::Main, "ENDIF without IF"));
                };
                // without ELSE the skipped path keeps the heights from before the IF
                let other = then_end.unwrap_or(before);
                if other.alt != h.alt {
                    return Err(StackCheckError::new(
                        ip,
                        StackKind::Alt,
                        format!("branches leave alt-stack heights {} and {}", other.alt, h.alt),
                    ));
                }
                if other.main != h.main {
                    return Err(StackCheckError::new(
                        ip,
                        StackKind::Main,
                        format!("branches leave stack heights {} and {}", other.main, h.main),
                    ));
                }
            }
            Opcode::ToAltStack => {
                pop(&mut h, 1, ip, op)?;
                h.alt += 1;
            }
            Opcode::FromAltStack => {
                if h.alt < 1 {
                    return Err(StackCheckError::new(ip, StackKind::Alt, "alt-stack underflow"));
                }
                h.alt -= 1;
                h.main += 1;
            }
            Opcode::Roll => {
                let Some(depth) = operand.and_then(|n| i32::try_from(n).ok()) else {
                    return Ok(None);
                };
                pop(&mut h, depth + 2, ip, op)?;
                h.main += depth + 1;
            }
            Opcode::Return => return Ok(None),
            _ => match effect(op) {
                Some((pops, pushes)) => {
                    pop(&mut h, pops, ip, op)?;
                    h.main += pushes;
                }
                None => return Ok(None),
            },
        }
    }

    if !branches.is_empty() {
        return Err(StackCheckError::new(
            instructions.len(),
            StackKind::Main,
            "IF without ENDIF",
        ));
    }
    Ok(Some(h))
}

/// Check stack effects starting from empty stacks.
pub fn check(instructions: &[Instruction]) -> Result<Option<StackHeights>, StackCheckError> {
    check_with_initial(instructions, StackHeights::default())
}
