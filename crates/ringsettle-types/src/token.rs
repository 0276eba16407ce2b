//! Token standards.

use serde::{Deserialize, Serialize};

/// Declared standard of a token leg.
///
/// Fungible tokens move by balance + allowance; partitioned tokens move
/// between tranches and require the holder to have authorized the engine as
/// an operator.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum TokenType {
    #[default]
    Fungible,
    Partitioned,
}

impl TokenType {
    /// Wire code of this token type.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Fungible => 0,
            Self::Partitioned => 1,
        }
    }

    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Fungible),
            1 => Some(Self::Partitioned),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fungible => write!(f, "FUNGIBLE"),
            Self::Partitioned => write!(f, "PARTITIONED"),
        }
    }
}
