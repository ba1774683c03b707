use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::Sample;

/// Merge freshly fetched samples into the retained history.
///
/// Both inputs must be ascending by timestamp. Entries outside
/// `[from, to]` are dropped. From `new`, only entries strictly newer than
/// everything in `old` are appended, so old data wins on equal timestamps
/// and the result stays strictly ascending.
pub fn merge_samples(
    old: &[Sample],
    new: &[Sample],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<Sample> {
    let in_window = |s: &&Sample| s.timestamp >= from && s.timestamp <= to;

    let mut merged: Vec<Sample> = Vec::with_capacity(old.len() + new.len());
    merged.extend(old.iter().filter(in_window).cloned());

    let mut newest = old.iter().map(|s| s.timestamp).max();
    for sample in new.iter().filter(in_window) {
        if newest.is_some_and(|t| sample.timestamp <= t) {
            continue;
        }
        newest = Some(sample.timestamp);
        merged.push(sample.clone());
    }

    merged
}

/// Whether a sample is recent enough to be displayed as "now"
pub fn is_current(sample: &Sample, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
    sample.timestamp >= now - max_age
}

/// The newest sample, if it is still current
pub fn select_current(samples: &[Sample], now: DateTime<Utc>, max_age: TimeDelta) -> Option<Sample> {
    samples
        .iter()
        .max_by_key(|s| s.timestamp)
        .filter(|s| is_current(s, now, max_age))
        .cloned()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;
    use crate::application::testing::sample_at;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn minutes_ago(samples: &[Sample]) -> Vec<i64> {
        samples
            .iter()
            .map(|s| (now() - s.timestamp).num_minutes())
            .collect()
    }

    #[test]
    fn keeps_window_and_appends_newer() {
        let now = now();
        let old = vec![sample_at(now, 300, 1.0), sample_at(now, 30, 1.0), sample_at(now, 20, 1.0)];
        let new = vec![sample_at(now, 20, 2.0), sample_at(now, 10, 2.0), sample_at(now, 0, 2.0)];

        let merged = merge_samples(&old, &new, now - TimeDelta::hours(4), now);

        assert_eq!(minutes_ago(&merged), vec![30, 20, 10, 0]);
        // old wins the tie at -20
        assert_eq!(merged[1].wind_speed_kts, Some(1.0));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = now();
        let from = now - TimeDelta::hours(4);
        let new = vec![
            sample_at(now, 241, 1.0),
            sample_at(now, 240, 1.0),
            sample_at(now, 0, 1.0),
            sample_at(now, -1, 1.0),
        ];

        let merged = merge_samples(&[], &new, from, now);

        assert_eq!(minutes_ago(&merged), vec![240, 0]);
    }

    #[test]
    fn merging_nothing_only_trims_history() {
        let now = now();
        let old = vec![sample_at(now, 500, 1.0), sample_at(now, 5, 1.0)];

        let merged = merge_samples(&old, &[], now - TimeDelta::hours(4), now);

        assert_eq!(minutes_ago(&merged), vec![5]);
    }

    #[test]
    fn merging_same_batch_twice_does_not_duplicate() {
        let now = now();
        let from = now - TimeDelta::hours(4);
        let batch = vec![sample_at(now, 3, 1.0), sample_at(now, 2, 1.0), sample_at(now, 1, 1.0)];

        let once = merge_samples(&[], &batch, from, now);
        let twice = merge_samples(&once, &batch, from, now);

        assert_eq!(once, twice);
    }

    #[test]
    fn current_is_newest_within_max_age() {
        let now = now();
        let samples = vec![sample_at(now, 10, 1.0), sample_at(now, 2, 2.0), sample_at(now, 1, 3.0)];
        let max_age = TimeDelta::minutes(3);

        let current = select_current(&samples, now, max_age).unwrap();
        assert_eq!(current.wind_speed_kts, Some(3.0));

        let later = now + TimeDelta::minutes(3);
        assert_eq!(select_current(&samples, later, max_age), None);
    }

    #[test]
    fn current_age_boundary_is_inclusive() {
        let now = now();
        let samples = vec![sample_at(now, 3, 1.0)];

        assert!(select_current(&samples, now, TimeDelta::minutes(3)).is_some());
        assert!(select_current(&samples, now + TimeDelta::seconds(1), TimeDelta::minutes(3)).is_none());
    }

    fn ascending(offsets: Vec<i64>) -> Vec<Sample> {
        let mut offsets = offsets;
        offsets.sort_unstable_by(|a, b| b.cmp(a));
        offsets.dedup();
        offsets.into_iter().map(|m| sample_at(now(), m, 1.0)).collect()
    }

    proptest! {
        #[test]
        fn output_is_strictly_ascending(
            old in prop::collection::vec(-30i64..400, 0..40),
            new in prop::collection::vec(-30i64..400, 0..40),
        ) {
            let now = now();
            let from = now - TimeDelta::hours(4);
            let merged = merge_samples(&ascending(old), &ascending(new), from, now);

            for pair in merged.windows(2) {
                prop_assert!(pair[0].timestamp < pair[1].timestamp);
            }
            for sample in &merged {
                prop_assert!(sample.timestamp >= from && sample.timestamp <= now);
            }
        }

        #[test]
        fn remerging_is_idempotent(
            old in prop::collection::vec(0i64..400, 0..40),
            new in prop::collection::vec(0i64..400, 0..40),
        ) {
            let now = now();
            let from = now - TimeDelta::hours(4);
            let new = ascending(new);
            let once = merge_samples(&ascending(old), &new, from, now);
            let twice = merge_samples(&once, &new, from, now);

            prop_assert_eq!(once, twice);
        }
    }
}
