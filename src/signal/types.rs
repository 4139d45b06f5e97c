//! Signal types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Signal errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    /// Value outside 0-9
    #[error("Invalid digit: {0}")]
    InvalidDigit(u8),
}

/// A trailing price digit, always in 0..=9
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// All ten digits in ascending order
    pub const ALL: [Digit; 10] = [
        Digit(0),
        Digit(1),
        Digit(2),
        Digit(3),
        Digit(4),
        Digit(5),
        Digit(6),
        Digit(7),
        Digit(8),
        Digit(9),
    ];

    /// Create a digit, returning None when out of range
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 9 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Numeric value
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Index into per-digit arrays
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Parse the trailing ASCII digit of a string
    pub fn trailing(text: &str) -> Option<Self> {
        let last = text.as_bytes().last()?;
        if last.is_ascii_digit() {
            Some(Self(last - b'0'))
        } else {
            None
        }
    }
}

impl TryFrom<u8> for Digit {
    type Error = SignalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(SignalError::InvalidDigit(value))
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of digits backed by a bitmask. Iteration is ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DigitSet(u16);

impl DigitSet {
    /// Empty set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Set containing every digit
    pub const fn full() -> Self {
        Self(0x3FF)
    }

    /// Insert a digit
    pub fn insert(&mut self, digit: Digit) {
        self.0 |= 1 << digit.value();
    }

    /// Remove a digit
    pub fn remove(&mut self, digit: Digit) {
        self.0 &= !(1 << digit.value());
    }

    /// Whether the digit is present
    pub fn contains(&self, digit: Digit) -> bool {
        self.0 & (1 << digit.value()) != 0
    }

    /// Number of distinct digits
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Digits in `self` but not in `other`
    pub fn difference(&self, other: &DigitSet) -> DigitSet {
        DigitSet(self.0 & !other.0)
    }

    /// Digits not in this set
    pub fn complement(&self) -> DigitSet {
        DigitSet(!self.0 & Self::full().0)
    }

    /// Ascending iterator over members
    pub fn iter(&self) -> impl Iterator<Item = Digit> + '_ {
        Digit::ALL.into_iter().filter(move |d| self.contains(*d))
    }

    /// Members as a vector, ascending
    pub fn to_vec(&self) -> Vec<Digit> {
        self.iter().collect()
    }
}

impl FromIterator<Digit> for DigitSet {
    fn from_iter<I: IntoIterator<Item = Digit>>(iter: I) -> Self {
        let mut set = DigitSet::empty();
        for digit in iter {
            set.insert(digit);
        }
        set
    }
}

/// Strategy identifier, declared in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Digit repeating within the recent window
    Pattern,
    /// Most frequent digit over the full window
    MostFrequent,
    /// Absent or least frequent digit over the full window
    LeastSeen,
    /// New digit escaping a low-diversity regime
    Breakout,
}

impl StrategyKind {
    /// All strategies in evaluation order
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Pattern,
        StrategyKind::MostFrequent,
        StrategyKind::LeastSeen,
        StrategyKind::Breakout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Pattern => "pattern",
            StrategyKind::MostFrequent => "most_frequent",
            StrategyKind::LeastSeen => "least_seen",
            StrategyKind::Breakout => "breakout",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One strategy's vote in a consensus round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyVote {
    pub strategy: StrategyKind,
    pub digit: Digit,
    /// Weight at vote time
    pub weight: f64,
}

/// Per-strategy counters owned by the consensus engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyPerformance {
    /// Configured vote weight
    pub weight: f64,
    /// Number of rounds in which the strategy voted
    pub total_proposals: u64,
    /// Winning trades the strategy contributed to
    pub win_credits: u64,
}

impl StrategyPerformance {
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            total_proposals: 0,
            win_credits: 0,
        }
    }
}

/// A consensus decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Unique decision identifier
    pub id: Uuid,
    /// Selected digit
    pub digit: Digit,
    /// Strategies that voted this round, in evaluation order
    pub strategies: Vec<StrategyKind>,
    /// Votes cast this round
    pub votes: Vec<StrategyVote>,
    /// Decision timestamp
    pub timestamp: DateTime<Utc>,
}
