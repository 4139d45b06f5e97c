//! Digit selection heuristics
//!
//! Every strategy is a pure function of the tick window and the digit set
//! recorded at the previous decision. Ties always resolve to the lowest digit.

use super::{Digit, DigitSet, StrategyKind, TickWindow};
use serde::Deserialize;

/// Tunable spans and thresholds shared by the strategies
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StrategyParams {
    /// Span inspected by the pattern detector
    #[serde(default = "default_pattern_window")]
    pub pattern_window: usize,
    /// Count within the span that marks a pattern
    #[serde(default = "default_pattern_threshold")]
    pub pattern_threshold: usize,
    /// Span inspected by the breakout detector
    #[serde(default = "default_breakout_window")]
    pub breakout_window: usize,
    /// Maximum distinct digits for a compressed regime
    #[serde(default = "default_breakout_max_distinct")]
    pub breakout_max_distinct: usize,
    /// Span a breakout digit must appear in
    #[serde(default = "default_breakout_recent")]
    pub breakout_recent: usize,
}

fn default_pattern_window() -> usize {
    10
}
fn default_pattern_threshold() -> usize {
    5
}
fn default_breakout_window() -> usize {
    10
}
fn default_breakout_max_distinct() -> usize {
    3
}
fn default_breakout_recent() -> usize {
    5
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            pattern_window: 10,
            pattern_threshold: 5,
            breakout_window: 10,
            breakout_max_distinct: 3,
            breakout_recent: 5,
        }
    }
}

/// Occurrence count per digit
pub fn frequencies(digits: impl IntoIterator<Item = Digit>) -> [usize; 10] {
    let mut counts = [0usize; 10];
    for digit in digits {
        counts[digit.index()] += 1;
    }
    counts
}

/// Lowest absent digit, otherwise the least frequent digit
pub fn least_seen(window: &TickWindow) -> Option<Digit> {
    let counts = frequencies(window.iter());

    if let Some(absent) = Digit::ALL.into_iter().find(|d| counts[d.index()] == 0) {
        return Some(absent);
    }

    let mut best = Digit::ALL[0];
    for digit in Digit::ALL {
        if counts[digit.index()] < counts[best.index()] {
            best = digit;
        }
    }
    Some(best)
}

/// Most frequent digit; abstains on an empty window
pub fn most_frequent(window: &TickWindow) -> Option<Digit> {
    if window.is_empty() {
        return None;
    }

    let counts = frequencies(window.iter());
    let mut best = Digit::ALL[0];
    for digit in Digit::ALL {
        if counts[digit.index()] > counts[best.index()] {
            best = digit;
        }
    }
    Some(best)
}

/// First digit repeating at least `threshold` times in the last `span` ticks
pub fn detect_pattern(window: &TickWindow, span: usize, threshold: usize) -> Option<Digit> {
    let counts = frequencies(window.recent(span));
    Digit::ALL
        .into_iter()
        .find(|d| counts[d.index()] >= threshold.max(1))
}

/// New digit breaking out of a low-diversity regime
///
/// The recent span is compressed when it holds at most `max_distinct`
/// distinct digits. Candidates are digits of that span missing from `prior`;
/// the first candidate seen in the last `recent` ticks wins.
pub fn compression_breakout(
    window: &TickWindow,
    prior: &DigitSet,
    span: usize,
    max_distinct: usize,
    recent: usize,
) -> Option<Digit> {
    let unique: DigitSet = window.recent(span).collect();
    if unique.is_empty() || unique.len() > max_distinct {
        return None;
    }

    let latest: DigitSet = window.recent(recent).collect();
    unique
        .difference(prior)
        .iter()
        .find(|digit| latest.contains(*digit))
}

/// Run one strategy with the given parameters
pub fn evaluate(
    kind: StrategyKind,
    window: &TickWindow,
    prior: &DigitSet,
    params: &StrategyParams,
) -> Option<Digit> {
    match kind {
        StrategyKind::Pattern => {
            detect_pattern(window, params.pattern_window, params.pattern_threshold)
        }
        StrategyKind::MostFrequent => most_frequent(window),
        StrategyKind::LeastSeen => least_seen(window),
        StrategyKind::Breakout => compression_breakout(
            window,
            prior,
            params.breakout_window,
            params.breakout_max_distinct,
            params.breakout_recent,
        ),
    }
}
