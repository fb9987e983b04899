//! The four-pillar chart input type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alphabet::{Branch, Stem};
use crate::error::{EngineResult, ValidationError};

/// Which of the four pillars a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    /// The year pillar.
    Year,
    /// The month pillar.
    Month,
    /// The day pillar.
    Day,
    /// The hour pillar.
    Hour,
}

impl Pillar {
    /// All four pillars in chart order.
    pub const ALL: [Self; 4] = [Self::Year, Self::Month, Self::Day, Self::Hour];

    /// Stable index in [0, 4).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Year => 0,
            Self::Month => 1,
            Self::Day => 2,
            Self::Hour => 3,
        }
    }

    /// Human-readable pillar label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One pillar: a stem over a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemBranch {
    /// The heavenly stem.
    pub stem: Stem,
    /// The earthly branch.
    pub branch: Branch,
}

impl StemBranch {
    /// Parses a two-character pillar string such as `"甲子"`.
    pub fn parse(text: &str, pillar: &'static str) -> EngineResult<Self> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() != 2 {
            return Err(ValidationError::InvalidPillarLength {
                pillar,
                actual: chars.len(),
            }
            .into());
        }
        let stem = Stem::from_char(chars[0])
            .ok_or(ValidationError::UnknownStem { character: chars[0] })?;
        let branch = Branch::from_char(chars[1])
            .ok_or(ValidationError::UnknownBranch { character: chars[1] })?;
        Ok(Self { stem, branch })
    }
}

impl fmt::Display for StemBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.branch)
    }
}

/// A complete four-pillar chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarSet {
    /// The year pillar.
    pub year: StemBranch,
    /// The month pillar. Its branch rules the seasonal correction.
    pub month: StemBranch,
    /// The day pillar. Its stem is the day master.
    pub day: StemBranch,
    /// The hour pillar.
    pub hour: StemBranch,
}

impl PillarSet {
    /// Parses four two-character pillar strings in year/month/day/hour order.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a string is not exactly two
    /// characters or a character is not a stem/branch.
    pub fn parse(year: &str, month: &str, day: &str, hour: &str) -> EngineResult<Self> {
        Ok(Self {
            year: StemBranch::parse(year, "year")?,
            month: StemBranch::parse(month, "month")?,
            day: StemBranch::parse(day, "day")?,
            hour: StemBranch::parse(hour, "hour")?,
        })
    }

    /// The pillar at a given chart position.
    #[must_use]
    pub const fn pillar(&self, pillar: Pillar) -> StemBranch {
        match pillar {
            Pillar::Year => self.year,
            Pillar::Month => self.month,
            Pillar::Day => self.day,
            Pillar::Hour => self.hour,
        }
    }

    /// The day master stem.
    #[must_use]
    pub const fn day_master(&self) -> Stem {
        self.day.stem
    }

    /// The month branch, which governs seasonal strength.
    #[must_use]
    pub const fn month_branch(&self) -> Branch {
        self.month.branch
    }
}

impl fmt::Display for PillarSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.year, self.month, self.day, self.hour)
    }
}
