//! Resolution of `$name` values supplied from outside the program.

use std::collections::HashMap;

/// Source of external variable values.
pub trait ExternValues {
    /// Value of `name`, if the source defines it.
    fn get(&self, name: &str) -> Option<Vec<u8>>;

    /// Value used when `name` is not defined.
    fn default_value(&self) -> Vec<u8> {
        Vec::new()
    }
}

/// Reads external values from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvExterns;

impl ExternValues for EnvExterns {
    fn get(&self, name: &str) -> Option<Vec<u8>> {
        std::env::var_os(name).map(|value| value.into_encoded_bytes())
    }
}

impl ExternValues for HashMap<String, Vec<u8>> {
    fn get(&self, name: &str) -> Option<Vec<u8>> {
        HashMap::get(self, name).cloned()
    }
}
