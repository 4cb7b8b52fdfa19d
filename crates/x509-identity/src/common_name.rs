// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured identity encoded in a dot-separated common name.
//!
//! Client certificates issued under this scheme carry a CN of the form
//! `LAST.FIRST[.MIDDLE].EDIPI`, where the trailing EDIPI is a decimal
//! numeric identifier.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{FormatReason, IdentityError};

/// Name fields and numeric identifier decoded from a common name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StructuredIdentity {
    pub last_name: String,
    pub first_name: String,
    /// Only present for four-segment common names; never `Some("")` from a three-segment one.
    pub middle_name: Option<String>,
    /// EDIPI
    pub numeric_id: u64,
}

impl StructuredIdentity {
    /// Decompose a common name token.
    ///
    /// The token must split on `.` into exactly 3 or 4 segments and the last
    /// segment must be a non-empty run of ASCII digits that fits in a `u64`.
    /// Name segments are taken as-is, including empty ones.
    pub fn parse(common_name: &str) -> Result<Self, IdentityError> {
        let segments: Vec<&str> = common_name.split('.').collect();
        let (last_name, first_name, middle_name, numeric) = match segments.as_slice() {
            [last, first, id] => (*last, *first, None, *id),
            [last, first, middle, id] => (*last, *first, Some(*middle), *id),
            _ => {
                return Err(FormatReason::UnexpectedSegmentCount {
                    common_name: common_name.to_string(),
                    actual: segments.len(),
                }
                .into())
            }
        };

        let numeric_id =
            parse_numeric_id(numeric).ok_or_else(|| FormatReason::InvalidNumericId {
                segment: numeric.to_string(),
                common_name: common_name.to_string(),
            })?;

        Ok(Self {
            last_name: last_name.to_string(),
            first_name: first_name.to_string(),
            middle_name: middle_name.map(str::to_string),
            numeric_id,
        })
    }
}

impl FromStr for StructuredIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StructuredIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.last_name, self.first_name)?;
        if let Some(middle) = &self.middle_name {
            write!(f, ".{}", middle)?;
        }
        write!(f, ".{}", self.numeric_id)
    }
}

/// Strict decimal: no sign, no whitespace, no empty string.
fn parse_numeric_id(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
