use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Direction of a unit movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Outbound: units handed to the account.
    Delivered,
    /// Inbound: units taken back from the account.
    Returned,
}

impl Flow {
    pub const ALL: [Flow; 2] = [Flow::Delivered, Flow::Returned];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Returned => "returned",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Flow {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "delivered" => Ok(Self::Delivered),
            "returned" => Ok(Self::Returned),
            other => Err(EngineError::CorruptedRecord(format!(
                "invalid flow: {other}"
            ))),
        }
    }
}
