//! Interval union over employment periods.
//!
//! Concurrent jobs must not double-count: only the wall-clock union of the
//! intervals contributes to total experience.

use crate::profile::dates::DatePoint;

/// An employment period. Both months are inclusive: Jan-Jun is six months.
/// `start <= end` is expected but not required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DatePoint,
    pub end: DatePoint,
}

impl Interval {
    pub fn new(start: DatePoint, end: DatePoint) -> Self {
        Self { start, end }
    }

    /// Whole months covered, counting the end month. Inverted intervals
    /// cover nothing.
    pub fn months(&self) -> u32 {
        let span = self.start.months_until(&self.end);
        if span < 0 {
            0
        } else {
            span as u32 + 1
        }
    }
}

/// Merges overlapping (or touching) intervals into a minimal sorted set.
pub fn merge_intervals(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|i| i.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for next in sorted {
        match merged.last_mut() {
            Some(current) if next.start <= current.end => {
                current.start = current.start.min(next.start);
                current.end = current.end.max(next.end);
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Total months covered by the union of `intervals`.
pub fn merged_months(intervals: &[Interval]) -> u32 {
    merge_intervals(intervals).iter().map(Interval::months).sum()
}

/// Total years covered by the union of `intervals`. Empty input is 0.0.
pub fn merge_and_sum(intervals: &[Interval]) -> f64 {
    merged_months(intervals) as f64 / 12.0
}
