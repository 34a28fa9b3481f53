//! The six dissimilarity cutoffs at which single-linkage clustering is run.
//!
//! A threshold is known under three spellings:
//! - the decimal form used in clustering file names and status files ("0.030"),
//! - the legacy alias of the older pipeline ("03"),
//! - the percent label used in the aggregated report ("3.0").
//!
//! The centroid to SH table does not use any of them, it encodes a threshold with a small integer code 1..6.
//! The code is **not** monotonic in the cutoff: 0.030→1, 0.020→2, 0.010→3, 0.025→4, 0.015→5, 0.005→6.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ShMatchError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Threshold {
    T030,
    T025,
    T020,
    T015,
    T010,
    T005,
}

impl Threshold {
    /// All thresholds, from the most permissive (3.0%) to the finest (0.5%).
    /// This is the order of records in status files and of column triples in the report.
    pub const ALL: [Threshold; 6] = [
        Threshold::T030,
        Threshold::T025,
        Threshold::T020,
        Threshold::T015,
        Threshold::T010,
        Threshold::T005,
    ];

    /// code used as key in centroid2sh mappings
    pub fn code(&self) -> u8 {
        match self {
            Threshold::T030 => 1,
            Threshold::T020 => 2,
            Threshold::T010 => 3,
            Threshold::T025 => 4,
            Threshold::T015 => 5,
            Threshold::T005 => 6,
        }
    }

    /// inverse of [code](Self::code)
    pub fn from_code(code: u8) -> Option<Threshold> {
        Threshold::ALL.iter().copied().find(|t| t.code() == code)
    }

    pub fn decimal(&self) -> &'static str {
        match self {
            Threshold::T030 => "0.030",
            Threshold::T025 => "0.025",
            Threshold::T020 => "0.020",
            Threshold::T015 => "0.015",
            Threshold::T010 => "0.010",
            Threshold::T005 => "0.005",
        }
    }

    pub fn legacy_alias(&self) -> &'static str {
        match self {
            Threshold::T030 => "03",
            Threshold::T025 => "025",
            Threshold::T020 => "02",
            Threshold::T015 => "015",
            Threshold::T010 => "01",
            Threshold::T005 => "005",
        }
    }

    /// percent label, as found in report column names : "status (3.0)"
    pub fn percent_label(&self) -> &'static str {
        match self {
            Threshold::T030 => "3.0",
            Threshold::T025 => "2.5",
            Threshold::T020 => "2.0",
            Threshold::T015 => "1.5",
            Threshold::T010 => "1.0",
            Threshold::T005 => "0.5",
        }
    }
} // end of impl Threshold

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.decimal())
    }
}

impl FromStr for Threshold {
    type Err = ShMatchError;

    /// accepts decimal form, legacy alias or percent label, surrounding blanks ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Threshold::ALL
            .iter()
            .copied()
            .find(|t| t.decimal() == s || t.legacy_alias() == s || t.percent_label() == s)
            .ok_or_else(|| ShMatchError::UnknownThreshold(s.to_string()))
    }
}

//==========================================================================
