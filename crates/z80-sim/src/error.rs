//! Simulator errors.
//!
//! Only state import/export can fail. Execution itself never does.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A register name not in the canonical table.
    UnknownRegister(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRegister(name) => write!(f, "unknown register: {name:?}"),
        }
    }
}

impl std::error::Error for SimError {}
