//! Call types and host capabilities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an operation, used to pick eligible hosts and timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    /// Idempotent, GET-like operations (search, browse, get settings)
    Read,
    /// Mutating operations (indexing, settings updates, deletes)
    Write,
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Set of call types a host accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallTypes {
    /// Read-only host
    Read,
    /// Write-only host
    Write,
    /// Host accepting both reads and writes
    Universal,
}

impl CallTypes {
    /// Whether this set contains the given call type
    #[must_use]
    pub fn contains(self, call_type: CallType) -> bool {
        match self {
            Self::Universal => true,
            Self::Read => call_type == CallType::Read,
            Self::Write => call_type == CallType::Write,
        }
    }
}

impl From<CallType> for CallTypes {
    fn from(call_type: CallType) -> Self {
        match call_type {
            CallType::Read => Self::Read,
            CallType::Write => Self::Write,
        }
    }
}
