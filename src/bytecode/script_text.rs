//! Reading script text back into instructions.
//!
//! Accepts what [`crate::bytecode::disasm`] writes: whitespace separated
//! `L<len> 0x<hex>` pushes and opcode names, with `#` starting a comment
//! that runs to the end of the line. Bare `0x<hex>` pushes and decimal
//! numbers are accepted as well.
//!
//! `L1 0x00` reads back as `OP_0`, which is also how the renderer prints
//! `OP_0`. A one-byte zero data push therefore does not survive the trip.

use thiserror::Error;

use crate::bytecode::ir::Instruction;
use crate::bytecode::op::OpcodeNames;
use crate::bytecode::{Opcode, script_num};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptTextError {
    #[error("Unknown token '{token}' at line {line}")]
    UnknownToken { token: String, line: usize },

    #[error("Invalid hex data '{token}' at line {line}")]
    InvalidHex { token: String, line: usize },

    #[error("Push of {declared} bytes carries {actual} at line {line}")]
    LengthMismatch {
        declared: usize,
        actual: usize,
        line: usize,
    },

    #[error("Missing data after '{prefix}' at line {line}")]
    MissingData { prefix: String, line: usize },
}

/// Parse script text into instructions. None of them carry a statement.
pub fn parse_script(text: &str, names: &OpcodeNames) -> Result<Vec<Instruction>, ScriptTextError> {
    let mut out = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let code = match raw.find('#') {
            Some(at) => &raw[..at],
            None => raw,
        };

        let mut words = code.split_whitespace();
        while let Some(word) = words.next() {
            if let Some(declared) = length_prefix(word) {
                let data = words.next().ok_or_else(|| ScriptTextError::MissingData {
                    prefix: word.to_string(),
                    line,
                })?;
                let bytes = hex_data(data, line)?;
                if bytes.len() != declared {
                    return Err(ScriptTextError::LengthMismatch {
                        declared,
                        actual: bytes.len(),
                        line,
                    });
                }
                out.push(push(bytes));
            } else if word.starts_with("0x") {
                out.push(push(hex_data(word, line)?));
            } else if let Ok(value) = word.parse::<i64>() {
                out.push(number(value));
            } else if let Some(op) = names.lookup(word) {
                out.push(Instruction::opcode(op, None));
            } else {
                return Err(ScriptTextError::UnknownToken {
                    token: word.to_string(),
                    line,
                });
            }
        }
    }

    Ok(out)
}

/// `L<n>` → n
fn length_prefix(word: &str) -> Option<usize> {
    let digits = word.strip_prefix('L')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn hex_data(word: &str, line: usize) -> Result<Vec<u8>, ScriptTextError> {
    let invalid = || ScriptTextError::InvalidHex {
        token: word.to_string(),
        line,
    };
    let digits = word.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.len() % 2 != 0 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid()))
        .collect()
}

fn push(bytes: Vec<u8>) -> Instruction {
    if bytes.is_empty() || bytes == [0x00] {
        Instruction::opcode(Opcode::Op0, None)
    } else {
        Instruction::data(bytes, None)
    }
}

fn number(value: i64) -> Instruction {
    match value {
        0 => Instruction::opcode(Opcode::Op0, None),
        1 => Instruction::opcode(Opcode::Op1, None),
        -1 => Instruction::opcode(Opcode::Op1Negate, None),
        _ => Instruction::data(script_num::encode(value), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::disasm::render_script;

    #[test]
    fn test_parse_rendered_lines() {
        let names = OpcodeNames::new();
        let text = "### header\nL1 0x01 L2 0x0aff\nOP_TOALTSTACK # trailing\n\nL1 0x00\nADD\n";
        let script = parse_script(text, &names).unwrap();
        assert_eq!(
            script,
            vec![
                Instruction::data(vec![0x01], None),
                Instruction::data(vec![0x0a, 0xff], None),
                Instruction::opcode(Opcode::ToAltStack, None),
                Instruction::opcode(Opcode::Op0, None),
                Instruction::opcode(Opcode::Add, None),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let names = OpcodeNames::new();
        let script = parse_script("0 1 -1 16 0x05", &names).unwrap();
        assert!(script[0].is(Opcode::Op0));
        assert!(script[1].is(Opcode::Op1));
        assert!(script[2].is(Opcode::Op1Negate));
        assert_eq!(script[3], Instruction::data(vec![0x10], None));
        assert_eq!(script[4], Instruction::data(vec![0x05], None));
    }

    #[test]
    fn test_rendered_script_reads_back() {
        let names = OpcodeNames::new();
        let code = vec![
            Instruction::data(vec![0x03], None),
            Instruction::opcode(Opcode::Op0, None),
            Instruction::opcode(Opcode::Equal, None),
            Instruction::opcode(Opcode::If, None),
            Instruction::opcode(Opcode::EndIf, None),
        ];
        let text = render_script(&code, &names);
        assert_eq!(parse_script(&text, &names).unwrap(), code);
    }

    #[test]
    fn test_errors() {
        let names = OpcodeNames::new();
        assert!(matches!(
            parse_script("OP_DUP\nOP_BOGUS", &names),
            Err(ScriptTextError::UnknownToken { line: 2, .. })
        ));
        assert!(matches!(
            parse_script("L2 0x01", &names),
            Err(ScriptTextError::LengthMismatch {
                declared: 2,
                actual: 1,
                ..
            })
        ));
        assert!(matches!(
            parse_script("L1", &names),
            Err(ScriptTextError::MissingData { .. })
        ));
        assert!(matches!(
            parse_script("0x0g", &names),
            Err(ScriptTextError::InvalidHex { .. })
        ));
    }
}
