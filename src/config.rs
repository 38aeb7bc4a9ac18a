//! Compiler and evaluator configuration.

use serde::{Deserialize, Serialize};

/// Option bitmask controlling a compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct CompilerOptions(u32);

impl CompilerOptions {
    /// Compile `Assert(..)` statements. Without it they generate nothing.
    pub const ASSERTS_ENABLED: CompilerOptions = CompilerOptions(0x01);
    /// Enable the adjacent alt-stack transfer elision.
    pub const OPTIMIZER_ENABLED: CompilerOptions = CompilerOptions(0x02);
    /// Render the annotated script after a successful compile.
    pub const OUTPUT_ANNOTATED_SCRIPT: CompilerOptions = CompilerOptions(0x04);

    pub const fn empty() -> Self {
        CompilerOptions(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        CompilerOptions(bits & 0x07)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: CompilerOptions) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: CompilerOptions) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: CompilerOptions) {
        self.0 &= !other.0;
    }

    pub fn with(mut self, other: CompilerOptions, enabled: bool) -> Self {
        if enabled {
            self.insert(other);
        } else {
            self.remove(other);
        }
        self
    }

    pub fn asserts_enabled(self) -> bool {
        self.contains(Self::ASSERTS_ENABLED)
    }

    pub fn optimizer_enabled(self) -> bool {
        self.contains(Self::OPTIMIZER_ENABLED)
    }

    pub fn annotate(self) -> bool {
        self.contains(Self::OUTPUT_ANNOTATED_SCRIPT)
    }
}

impl std::ops::BitOr for CompilerOptions {
    type Output = CompilerOptions;

    fn bitor(self, rhs: Self) -> Self::Output {
        CompilerOptions(self.0 | rhs.0)
    }
}

/// Script verification flags understood by the reference evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifyFlags(u32);

impl VerifyFlags {
    /// Reject reserved no-op opcodes (this is what makes compiled
    /// assertions fail).
    pub const DISCOURAGE_UPGRADABLE_NOPS: VerifyFlags = VerifyFlags(0x01);
    /// Reject non-minimally encoded numeric operands.
    pub const MINIMAL_DATA: VerifyFlags = VerifyFlags(0x02);

    pub const fn empty() -> Self {
        VerifyFlags(0)
    }

    pub const fn contains(self, other: VerifyFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for VerifyFlags {
    fn default() -> Self {
        VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS | VerifyFlags::MINIMAL_DATA
    }
}

impl std::ops::BitOr for VerifyFlags {
    type Output = VerifyFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        VerifyFlags(self.0 | rhs.0)
    }
}

/// Resource limits of the reference evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalLimits {
    pub max_steps: Option<usize>,
    /// Combined item count of the primary and alt stacks.
    pub max_stack_size: usize,
    /// Largest byte string a single stack item may hold.
    pub max_element_size: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        EvalLimits {
            max_steps: None,
            max_stack_size: 1000,
            max_element_size: 520,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_bits() {
        let opts = CompilerOptions::ASSERTS_ENABLED | CompilerOptions::OUTPUT_ANNOTATED_SCRIPT;
        assert_eq!(opts.bits(), 0x05);
        assert!(opts.asserts_enabled());
        assert!(!opts.optimizer_enabled());
        assert!(opts.annotate());
    }

    #[test]
    fn test_options_with() {
        let opts = CompilerOptions::empty()
            .with(CompilerOptions::OPTIMIZER_ENABLED, true)
            .with(CompilerOptions::ASSERTS_ENABLED, false);
        assert_eq!(opts, CompilerOptions::OPTIMIZER_ENABLED);

        let opts = opts.with(CompilerOptions::OPTIMIZER_ENABLED, false);
        assert_eq!(opts, CompilerOptions::empty());
    }

    #[test]
    fn test_from_bits_masks_unknown() {
        assert_eq!(CompilerOptions::from_bits(0xff).bits(), 0x07);
    }

    #[test]
    fn test_verify_flags_default() {
        let flags = VerifyFlags::default();
        assert!(flags.contains(VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS));
        assert!(!VerifyFlags::empty().contains(VerifyFlags::MINIMAL_DATA));
    }
}
