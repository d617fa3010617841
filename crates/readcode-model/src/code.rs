//! Operator-chosen integer codes and per-record codings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InvalidCodeInput;

/// Integer label an operator attaches to phrases.
///
/// Codes carry no range constraint; negative values and zero are as valid as
/// any other integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Code(i64);

impl Code {
    /// Code assigned to unmatched records under zero fill.
    pub const ZERO: Code = Code(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for Code {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for Code {
    type Err = InvalidCodeInput;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        input
            .trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| InvalidCodeInput {
                input: input.to_string(),
            })
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The label attached to one record.
///
/// `Unset` is distinct from every code. It is the starting value of every
/// record and, under missing fill, the exported value of unmatched records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Coding {
    #[default]
    Unset,
    Coded(Code),
}

impl Coding {
    pub const fn is_unset(self) -> bool {
        matches!(self, Self::Unset)
    }

    pub const fn code(self) -> Option<Code> {
        match self {
            Self::Unset => None,
            Self::Coded(code) => Some(code),
        }
    }
}

impl From<Code> for Coding {
    fn from(code: Code) -> Self {
        Self::Coded(code)
    }
}

/// Renders the export cell: the integer, or an empty string when unset.
impl fmt::Display for Coding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::Coded(code) => write!(f, "{code}"),
        }
    }
}
