//! Interval merge engine
//!
//! Pure functions turning an unordered collection of watched intervals into
//! the minimal sorted, non-overlapping covering set, and deriving covered
//! duration from it. No I/O, no side effects; the recalculation write path in
//! the Postgres adapter calls into this module from inside its transaction.
//!
//! Two intervals separated by a gap no larger than the tolerance are treated
//! as one contiguous watched region. This models seek and playback jitter in
//! client reports, not a data bug to correct.

use tracing::debug;
use watchspan_model::{Interval, IntervalReport};

/// Gap between intervals, in seconds, still counted as contiguous viewing.
pub const DEFAULT_GAP_TOLERANCE: f64 = 1.0;

/// Merge intervals into the canonical covering set.
///
/// Input may be empty, unordered, overlapping, or duplicated. Output is
/// ordered by start, and consecutive elements satisfy
/// `out[i].end + gap_tolerance < out[i + 1].start`.
///
/// Idempotent: `merge(&merge(x, t), t) == merge(x, t)` for any `t >= 0`.
/// Pairs with `start >= end` are the caller's responsibility to filter (see
/// [`filter_reported`]); they pass through the walk without panicking.
pub fn merge(intervals: &[Interval], gap_tolerance: f64) -> Vec<Interval> {
    if intervals.is_empty() {
        return Vec::new();
    }

    let mut sorted = intervals.to_vec();
    // Stable sort; ties on start keep input order, which cannot change the result.
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged = Vec::with_capacity(sorted.len());
    let mut current = sorted[0];
    for interval in &sorted[1..] {
        if interval.start <= current.end + gap_tolerance {
            // Start never moves once a run has begun accumulating.
            current.end = current.end.max(interval.end);
        } else {
            merged.push(current);
            current = *interval;
        }
    }
    merged.push(current);

    merged
}

/// Total seconds covered, counting overlapping and adjacent regions once.
///
/// Always merges first; summing a possibly-overlapping raw set would double
/// count overlap.
pub fn covered_duration(intervals: &[Interval], gap_tolerance: f64) -> f64 {
    merge(intervals, gap_tolerance)
        .iter()
        .map(Interval::length)
        .sum()
}

/// Per-element validation of untrusted client-reported intervals.
///
/// Drops, never rejects: an element with a missing or non-finite bound, a
/// negative start, an end past the video duration, or `start >= end` is
/// skipped and the rest of the report proceeds.
pub fn filter_reported(raw: &[IntervalReport], duration: f64) -> Vec<Interval> {
    raw.iter()
        .filter_map(|element| {
            let (Some(start), Some(end)) = (element.start_time, element.end_time)
            else {
                debug!("dropping reported interval with missing bounds");
                return None;
            };
            if !start.is_finite()
                || !end.is_finite()
                || start < 0.0
                || end > duration
                || start >= end
            {
                debug!(start, end, duration, "dropping out-of-range reported interval");
                return None;
            }
            Some(Interval::new(start, end))
        })
        .collect()
}

/// Verify that a merged set is canonical for the given duration.
///
/// Checked after every merge and before the replace is committed; a failure
/// here means the engine itself misbehaved and the transaction must abort.
pub fn check_canonical(
    intervals: &[Interval],
    duration: f64,
    gap_tolerance: f64,
) -> std::result::Result<(), String> {
    for (i, interval) in intervals.iter().enumerate() {
        if !interval.is_within(duration) {
            return Err(format!(
                "interval [{}, {}] outside [0, {}]",
                interval.start, interval.end, duration
            ));
        }
        if i > 0 {
            let prev = &intervals[i - 1];
            if prev.end + gap_tolerance >= interval.start {
                return Err(format!(
                    "intervals [{}, {}] and [{}, {}] not separated beyond tolerance {}",
                    prev.start, prev.end, interval.start, interval.end, gap_tolerance
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intervals(pairs: &[(f64, f64)]) -> Vec<Interval> {
        pairs.iter().map(|&(s, e)| Interval::new(s, e)).collect()
    }

    #[test]
    fn merge_empty_is_empty() {
        assert!(merge(&[], DEFAULT_GAP_TOLERANCE).is_empty());
        assert_eq!(covered_duration(&[], DEFAULT_GAP_TOLERANCE), 0.0);
    }

    #[test]
    fn merge_single_passes_through() {
        let input = intervals(&[(3.0, 9.0)]);
        assert_eq!(merge(&input, 1.0), input);
    }

    #[test]
    fn overlapping_intervals_collapse() {
        let input = intervals(&[(0.0, 10.0), (9.0, 20.0)]);
        assert_eq!(merge(&input, 1.0), intervals(&[(0.0, 20.0)]));
        assert_eq!(covered_duration(&input, 1.0), 20.0);
    }

    #[test]
    fn gap_within_tolerance_collapses() {
        let input = intervals(&[(0.0, 5.0), (6.0, 10.0)]);
        assert_eq!(merge(&input, 1.0), intervals(&[(0.0, 10.0)]));
    }

    #[test]
    fn gap_beyond_tolerance_stays_split() {
        let input = intervals(&[(0.0, 5.0), (7.0, 10.0)]);
        assert_eq!(merge(&input, 1.0), intervals(&[(0.0, 5.0), (7.0, 10.0)]));
        assert_eq!(covered_duration(&input, 1.0), 8.0);
    }

    #[test]
    fn unordered_input_is_sorted_first() {
        let input = intervals(&[(30.0, 40.0), (0.0, 10.0), (9.0, 20.0)]);
        assert_eq!(
            merge(&input, 1.0),
            intervals(&[(0.0, 20.0), (30.0, 40.0)])
        );
    }

    #[test]
    fn contained_interval_does_not_shrink_run() {
        let input = intervals(&[(0.0, 30.0), (5.0, 10.0)]);
        assert_eq!(merge(&input, 1.0), intervals(&[(0.0, 30.0)]));
    }

    #[test]
    fn duplicates_collapse() {
        let input = intervals(&[(2.0, 4.0), (2.0, 4.0), (2.0, 4.0)]);
        assert_eq!(merge(&input, 1.0), intervals(&[(2.0, 4.0)]));
    }

    #[test]
    fn merge_is_idempotent() {
        for tolerance in [0.0, 0.5, 1.0, 5.0] {
            let input = intervals(&[
                (12.0, 14.5),
                (0.0, 3.0),
                (3.5, 7.0),
                (7.2, 7.4),
                (40.0, 41.0),
            ]);
            let once = merge(&input, tolerance);
            let twice = merge(&once, tolerance);
            assert_eq!(once, twice, "tolerance {tolerance}");
        }
    }

    #[test]
    fn covered_duration_never_exceeds_raw_sum() {
        let input = intervals(&[(0.0, 10.0), (5.0, 15.0), (20.0, 25.0)]);
        let raw_sum: f64 = input.iter().map(Interval::length).sum();
        assert!(covered_duration(&input, 1.0) <= raw_sum);

        // Equality iff nothing merged.
        let disjoint = intervals(&[(0.0, 5.0), (10.0, 15.0)]);
        let disjoint_sum: f64 = disjoint.iter().map(Interval::length).sum();
        assert_eq!(covered_duration(&disjoint, 1.0), disjoint_sum);
    }

    #[test]
    fn zero_tolerance_keeps_adjacent_regions_separate() {
        let input = intervals(&[(0.0, 5.0), (6.0, 10.0)]);
        assert_eq!(merge(&input, 0.0), intervals(&[(0.0, 5.0), (6.0, 10.0)]));
    }

    #[test]
    fn filter_drops_malformed_elements() {
        let raw = vec![
            IntervalReport::new(0.0, 10.0),
            IntervalReport::new(10.0, 5.0),  // start >= end
            IntervalReport::new(-1.0, 5.0),  // negative start
            IntervalReport::new(90.0, 120.0), // end past duration
            IntervalReport {
                start_time: Some(4.0),
                end_time: None,
            },
            IntervalReport::new(f64::NAN, 5.0),
            IntervalReport::new(20.0, 30.0),
        ];
        assert_eq!(
            filter_reported(&raw, 100.0),
            intervals(&[(0.0, 10.0), (20.0, 30.0)])
        );
    }

    #[test]
    fn filter_accepts_full_span() {
        let raw = vec![IntervalReport::new(0.0, 100.0)];
        assert_eq!(filter_reported(&raw, 100.0), intervals(&[(0.0, 100.0)]));
    }

    #[test]
    fn canonical_check_accepts_merge_output() {
        let merged = merge(
            &intervals(&[(0.0, 10.0), (9.0, 20.0), (30.0, 40.0)]),
            DEFAULT_GAP_TOLERANCE,
        );
        assert!(check_canonical(&merged, 100.0, DEFAULT_GAP_TOLERANCE).is_ok());
    }

    #[test]
    fn canonical_check_rejects_out_of_bounds() {
        let set = intervals(&[(0.0, 120.0)]);
        assert!(check_canonical(&set, 100.0, 1.0).is_err());
    }

    #[test]
    fn canonical_check_rejects_unmerged_neighbors() {
        let set = intervals(&[(0.0, 10.0), (10.5, 20.0)]);
        assert!(check_canonical(&set, 100.0, 1.0).is_err());
    }
}
