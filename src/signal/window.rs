//! Bounded tick digit history

use super::{Digit, DigitSet};
use std::collections::VecDeque;

/// Default number of digits retained
pub const DEFAULT_CAPACITY: usize = 100;

/// Order-preserving FIFO of the most recent trailing digits
#[derive(Debug, Clone)]
pub struct TickWindow {
    digits: VecDeque<Digit>,
    capacity: usize,
}

impl TickWindow {
    /// Create a window holding at most `capacity` digits
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            digits: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a digit, evicting the oldest when full
    pub fn append(&mut self, digit: Digit) {
        if self.digits.len() == self.capacity {
            self.digits.pop_front();
        }
        self.digits.push_back(digit);
    }

    /// The last `k` digits (fewer if the window is shorter), oldest first
    pub fn snapshot(&self, k: usize) -> Vec<Digit> {
        let skip = self.digits.len().saturating_sub(k);
        self.digits.iter().skip(skip).copied().collect()
    }

    /// Iterator over the last `k` digits, oldest first
    pub fn recent(&self, k: usize) -> impl Iterator<Item = Digit> + '_ {
        let skip = self.digits.len().saturating_sub(k);
        self.digits.iter().skip(skip).copied()
    }

    /// Distinct digits over the full window
    pub fn digit_set(&self) -> DigitSet {
        self.digits.iter().copied().collect()
    }

    /// Most recently observed digit
    pub fn last(&self) -> Option<Digit> {
        self.digits.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Digit> + '_ {
        self.digits.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }
}

impl Default for TickWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
