use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Filing status of a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilingStatus {
    Single,
    MarriedJoint,
    MarriedSeparate,
    HeadOfHousehold,
}

impl FilingStatus {
    /// All statuses in table order.
    pub const ALL: [FilingStatus; 4] = [
        Self::Single,
        Self::MarriedJoint,
        Self::MarriedSeparate,
        Self::HeadOfHousehold,
    ];

    /// Short IRS-style code used in table files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::MarriedJoint => "MFJ",
            Self::MarriedSeparate => "MFS",
            Self::HeadOfHousehold => "HOH",
        }
    }

    /// Long form used by return documents.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::MarriedJoint => "marriedJoint",
            Self::MarriedSeparate => "marriedSeparate",
            Self::HeadOfHousehold => "headOfHousehold",
        }
    }

    /// Accepts either the short code or the long form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "S" | "single" => Some(Self::Single),
            "MFJ" | "marriedJoint" => Some(Self::MarriedJoint),
            "MFS" | "marriedSeparate" => Some(Self::MarriedSeparate),
            "HOH" | "headOfHousehold" => Some(Self::HeadOfHousehold),
            _ => None,
        }
    }
}

impl fmt::Display for FilingStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilingStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::UnknownFilingStatus(s.to_string()))
    }
}

impl TryFrom<String> for FilingStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FilingStatus> for String {
    fn from(value: FilingStatus) -> Self {
        value.name().to_string()
    }
}
