//! Time slices and the append-only chain that holds them

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// Admissions recorded during one granularity-sized sub-window
///
/// Only the newest slice of a chain is ever incremented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlice {
    /// Admissions counted in this slice
    pub count: u32,
    /// Inclusive start of the sub-window
    pub start: DateTime<Utc>,
    /// Inclusive end of the sub-window
    pub end: DateTime<Utc>,
}

impl TimeSlice {
    /// Create an empty slice covering `[start, end]`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end, "slice start must not be after its end");
        TimeSlice {
            count: 0,
            start,
            end,
        }
    }

    /// Whether `t` falls inside the slice
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Time-ordered sequence of slices, oldest first
///
/// Slices are appended at the tail and leave either from the head (when they
/// age out of a rolling window) or all at once on [`clear`](Self::clear).
#[derive(Debug, Clone, Default)]
pub struct SliceChain {
    slices: VecDeque<TimeSlice>,
}

impl SliceChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `slice` as the new latest slice
    pub fn push(&mut self, slice: TimeSlice) {
        debug_assert!(
            self.latest().is_none_or(|latest| latest.end < slice.start),
            "slices must be appended in strictly increasing time order"
        );
        self.slices.push_back(slice);
    }

    pub fn earliest(&self) -> Option<&TimeSlice> {
        self.slices.front()
    }

    pub fn latest(&self) -> Option<&TimeSlice> {
        self.slices.back()
    }

    pub fn latest_mut(&mut self) -> Option<&mut TimeSlice> {
        self.slices.back_mut()
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Discard every slice
    pub fn clear(&mut self) {
        self.slices.clear();
    }

    /// Iterate from the earliest slice to the latest
    pub fn iter(&self) -> impl Iterator<Item = &TimeSlice> {
        self.slices.iter()
    }

    /// Remove leading slices that ended at or before `cutoff`
    ///
    /// Returns the total admission count carried by the removed slices.
    pub fn pop_expired(&mut self, cutoff: DateTime<Utc>) -> u64 {
        let mut released = 0;
        while let Some(head) = self.slices.front() {
            if head.end > cutoff {
                break;
            }
            released += u64::from(head.count);
            self.slices.pop_front();
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + TimeDelta::seconds(secs)
    }

    fn chain_of(points: &[(i64, u32)]) -> SliceChain {
        let mut chain = SliceChain::new();
        for &(secs, count) in points {
            let mut slice = TimeSlice::new(at(secs), at(secs));
            slice.count = count;
            chain.push(slice);
        }
        chain
    }

    #[test]
    fn test_empty_chain() {
        let chain = SliceChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
        assert!(chain.earliest().is_none());
        assert!(chain.latest().is_none());
    }

    #[test]
    fn test_push_keeps_order() {
        let chain = chain_of(&[(0, 1), (10, 2), (20, 3)]);

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.earliest().unwrap().start, at(0));
        assert_eq!(chain.latest().unwrap().start, at(20));

        let counts: Vec<u32> = chain.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![1, 2, 3]);
    }

    #[test]
    fn test_only_latest_is_mutated() {
        let mut chain = chain_of(&[(0, 1), (10, 0)]);
        chain.latest_mut().unwrap().count += 5;

        assert_eq!(chain.earliest().unwrap().count, 1);
        assert_eq!(chain.latest().unwrap().count, 5);
    }

    #[test]
    fn test_pop_expired_releases_counts() {
        let mut chain = chain_of(&[(0, 1), (10, 2), (20, 3)]);

        assert_eq!(chain.pop_expired(at(-1)), 0);
        assert_eq!(chain.len(), 3);

        // Cutoff is inclusive of slice ends
        assert_eq!(chain.pop_expired(at(10)), 3);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.earliest().unwrap().start, at(20));

        assert_eq!(chain.pop_expired(at(100)), 3);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut chain = chain_of(&[(0, 1), (10, 2)]);
        chain.clear();
        assert!(chain.is_empty());
    }

    #[test]
    fn test_contains() {
        let slice = TimeSlice::new(at(0), at(59));
        assert!(slice.contains(at(0)));
        assert!(slice.contains(at(59)));
        assert!(!slice.contains(at(60)));
        assert!(!slice.contains(at(-1)));
    }
}
