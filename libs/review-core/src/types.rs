//! Core value types: grades, practice states, state filters and algorithm identity.

use crate::error::{Result, SchedulerError};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single review, ordered from most severe failure to easiest success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    FailSevere,
    FailMedium,
    Fail,
    Hard,
    Good,
    Easy,
}

impl Grade {
    /// All grades in ascending order.
    pub const ALL: [Grade; 6] = [
        Grade::FailSevere,
        Grade::FailMedium,
        Grade::Fail,
        Grade::Hard,
        Grade::Good,
        Grade::Easy,
    ];

    /// Convert to numeric value (0-5).
    pub fn to_value(self) -> u8 {
        match self {
            Self::FailSevere => 0,
            Self::FailMedium => 1,
            Self::Fail => 2,
            Self::Hard => 3,
            Self::Good => 4,
            Self::Easy => 5,
        }
    }

    /// Create from numeric value (0-5).
    pub fn from_value(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::FailSevere),
            1 => Ok(Self::FailMedium),
            2 => Ok(Self::Fail),
            3 => Ok(Self::Hard),
            4 => Ok(Self::Good),
            5 => Ok(Self::Easy),
            other => Err(SchedulerError::InvalidGrade(other)),
        }
    }

    pub fn is_failure(self) -> bool {
        self <= Self::Fail
    }

    pub fn is_success(self) -> bool {
        !self.is_failure()
    }

    /// Failure severity: 3 for `FailSevere` down to 1 for `Fail`, 0 for successes.
    pub fn severity(self) -> u8 {
        match self {
            Self::FailSevere => 3,
            Self::FailMedium => 2,
            Self::Fail => 1,
            Self::Hard | Self::Good | Self::Easy => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailSevere => "fail_severe",
            Self::FailMedium => "fail_medium",
            Self::Fail => "fail",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }
}

impl TryFrom<u8> for Grade {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_value(value)
    }
}

/// Where a card sits in its practice lifecycle. Exactly one applies at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardPracticeState {
    New,
    Learning,
    Due,
    Dismissed,
    Suspended,
}

impl Default for CardPracticeState {
    fn default() -> Self {
        Self::New
    }
}

impl CardPracticeState {
    pub const ALL: [CardPracticeState; 5] = [
        CardPracticeState::New,
        CardPracticeState::Learning,
        CardPracticeState::Due,
        CardPracticeState::Dismissed,
        CardPracticeState::Suspended,
    ];

    /// Whether the card takes part in review scheduling.
    pub fn is_active(self) -> bool {
        matches!(self, Self::New | Self::Learning | Self::Due)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Due => "due",
            Self::Dismissed => "dismissed",
            Self::Suspended => "suspended",
        }
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "learning" => Some(Self::Learning),
            "due" => Some(Self::Due),
            "dismissed" => Some(Self::Dismissed),
            "suspended" => Some(Self::Suspended),
            _ => None,
        }
    }
}

impl fmt::Display for CardPracticeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Bitwise selection over practice states for collection counts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StateFilter: u8 {
        const NEW = 1 << 0;
        const LEARNING = 1 << 1;
        const DUE = 1 << 2;
        const DISMISSED = 1 << 3;
        const SUSPENDED = 1 << 4;

        const ACTIVE = Self::NEW.bits() | Self::LEARNING.bits() | Self::DUE.bits();
        const INACTIVE = Self::DISMISSED.bits() | Self::SUSPENDED.bits();
    }
}

impl StateFilter {
    pub fn matches(self, state: CardPracticeState) -> bool {
        self.intersects(StateFilter::from(state))
    }
}

impl From<CardPracticeState> for StateFilter {
    fn from(state: CardPracticeState) -> Self {
        match state {
            CardPracticeState::New => Self::NEW,
            CardPracticeState::Learning => Self::LEARNING,
            CardPracticeState::Due => Self::DUE,
            CardPracticeState::Dismissed => Self::DISMISSED,
            CardPracticeState::Suspended => Self::SUSPENDED,
        }
    }
}

/// Identity of a scheduling algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmId {
    Sm2,
}

impl Default for AlgorithmId {
    fn default() -> Self {
        Self::Sm2
    }
}

impl AlgorithmId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sm2 => "sm2",
        }
    }

    pub fn version(&self) -> u32 {
        match self {
            Self::Sm2 => 1,
        }
    }

    /// Stable numeric id: 32-bit FNV-1a hash of the name.
    pub fn id(&self) -> u32 {
        fnv1a(self.name().as_bytes())
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sm2" => Some(Self::Sm2),
            _ => None,
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for b in bytes {
        hash ^= u32::from(*b);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}
