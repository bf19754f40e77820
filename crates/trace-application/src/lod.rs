//! The level-of-detail (time-slice) engine: pixel-budgeted aggregation of
//! real events/samples into synthesized, coarser ones (`spec.md` §4.6).

use trace_domain::entities::event::Event;
use trace_domain::entities::sample::Sample;

/// A single rendered item returned by a graph fetch: either a real event
/// (`name_id = Some`) or a synthesized aggregate (`name_id = None`,
/// `spec.md` §4.6 "Aggregated events carry an empty name").
#[derive(Debug, Clone, PartialEq)]
pub struct LodEvent {
    pub start_ts: u64,
    pub end_ts: u64,
    pub name_id: Option<u64>,
    pub child_count: u64,
}

/// Whether pointwise aggregation over a merged sample window uses the
/// minimum or maximum value (`spec.md` §4.6 point 3, configurable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleReduction {
    Min,
    Max,
}

/// A single aggregated or real sample point.
#[derive(Debug, Clone, PartialEq)]
pub struct LodSample {
    pub timestamp: u64,
    pub value: f64,
    pub child_count: u64,
}

/// The per-tier gap/duration merge thresholds, growing with `k`
/// (`spec.md` §4.6 point 2; the exact growth law is implementation-defined
/// per `spec.md` §9 Open Question (b) — linear in `k` here).
const GAP_BASE_NS: u64 = 10;
const DURATION_BASE_NS: u64 = 100;

/// Choose the LOD tier `k` such that real events are returned (`k = 0`)
/// only when they already fit the pixel budget; otherwise pick the
/// smallest `k` whose expected merge ratio brings the item count within
/// `pixel_resolution` (`spec.md` §4.6 point 2).
#[must_use]
pub fn choose_lod_tier(real_event_count: u64, pixel_resolution: u64) -> u32 {
    if pixel_resolution == 0 || real_event_count <= pixel_resolution {
        return 0;
    }
    let ratio = real_event_count.div_ceil(pixel_resolution.max(1));
    u32::try_from(ratio).unwrap_or(u32::MAX)
}

/// `(gap_threshold, duration_threshold)` for tier `k`.
#[must_use]
pub fn thresholds_for_tier(tier: u32) -> (u64, u64) {
    (GAP_BASE_NS * u64::from(tier), DURATION_BASE_NS * u64::from(tier))
}

/// Merge adjacent events (already sorted by `start_ts`) whenever the gap
/// to the next event is below `gap_threshold` and the resulting merged
/// span stays below `duration_threshold` (`spec.md` §4.6 point 2).
///
/// `tier = 0` returns every event unchanged.
#[must_use]
pub fn collapse_events(events: &[Event], tier: u32) -> Vec<LodEvent> {
    if tier == 0 {
        return events
            .iter()
            .map(|e| LodEvent {
                start_ts: e.start_ts(),
                end_ts: e.end_ts(),
                name_id: Some(e.id().raw()),
                child_count: 1,
            })
            .collect();
    }

    let (gap_threshold, duration_threshold) = thresholds_for_tier(tier);
    let mut out: Vec<LodEvent> = Vec::new();
    for event in events {
        match out.last_mut() {
            Some(last) if last.name_id.is_none() || last.child_count > 0 => {
                let gap = event.start_ts().saturating_sub(last.end_ts);
                let merged_end = last.end_ts.max(event.end_ts());
                let merged_duration = merged_end.saturating_sub(last.start_ts);
                if gap < gap_threshold && merged_duration < duration_threshold {
                    last.end_ts = merged_end;
                    last.name_id = None;
                    last.child_count += 1;
                    continue;
                }
                out.push(LodEvent {
                    start_ts: event.start_ts(),
                    end_ts: event.end_ts(),
                    name_id: Some(event.id().raw()),
                    child_count: 1,
                });
            }
            _ => out.push(LodEvent {
                start_ts: event.start_ts(),
                end_ts: event.end_ts(),
                name_id: Some(event.id().raw()),
                child_count: 1,
            }),
        }
    }
    out
}

/// Counter-track LOD: pointwise `min`/`max` over each merged window
/// instead of duration merging (`spec.md` §4.6 point 3).
#[must_use]
pub fn collapse_samples(samples: &[Sample], tier: u32, reduction: SampleReduction) -> Vec<LodSample> {
    if tier == 0 {
        return samples
            .iter()
            .map(|s| LodSample {
                timestamp: s.timestamp(),
                value: s.value(),
                child_count: 1,
            })
            .collect();
    }

    let window = thresholds_for_tier(tier).1.max(1);
    let mut out: Vec<LodSample> = Vec::new();
    let mut window_start = None;

    for sample in samples {
        let in_current_window = window_start.is_some_and(|ws: u64| sample.timestamp() - ws < window);
        if in_current_window {
            let last = out.last_mut().expect("window_start implies a pushed bucket");
            last.value = match reduction {
                SampleReduction::Min => last.value.min(sample.value()),
                SampleReduction::Max => last.value.max(sample.value()),
            };
            last.child_count += 1;
        } else {
            window_start = Some(sample.timestamp());
            out.push(LodSample {
                timestamp: sample.timestamp(),
                value: sample.value(),
                child_count: 1,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use trace_domain::entities::handle::HandleId;

    fn uniform_events(count: u64, span: u64) -> Vec<Event> {
        (0..count)
            .map(|i| {
                let start = i * span / count;
                Event::new(HandleId::new(i), start, start + 1, 0, 0, 0)
            })
            .collect()
    }

    #[rstest]
    #[case::fits_budget_stays_tier_zero(100, 1_000, 0)]
    #[case::ten_to_one_needs_tier_ten(10_000, 1_000, 10)]
    #[case::exact_multiple_needs_no_extra_tier(2_000, 1_000, 2)]
    #[case::zero_resolution_forces_tier_zero(10_000, 0, 0)]
    fn chooses_expected_tier(#[case] real_event_count: u64, #[case] pixel_resolution: u64, #[case] expected_tier: u32) {
        assert_eq!(choose_lod_tier(real_event_count, pixel_resolution), expected_tier);
    }

    #[rstest]
    #[case::tier_zero_has_no_merge_window(0, (0, 0))]
    #[case::tier_one_uses_the_base_thresholds(1, (GAP_BASE_NS, DURATION_BASE_NS))]
    #[case::tier_five_scales_linearly(5, (GAP_BASE_NS * 5, DURATION_BASE_NS * 5))]
    fn computes_expected_thresholds(#[case] tier: u32, #[case] expected: (u64, u64)) {
        assert_eq!(thresholds_for_tier(tier), expected);
    }

    #[test]
    fn scenario_2_lod_collapse_stays_within_budget() {
        let events = uniform_events(10_000, 1_000_000_000);
        let tier = choose_lod_tier(events.len() as u64, 1_000);
        let collapsed = collapse_events(&events, tier);
        assert!(collapsed.len() <= 1_100, "expected <= 1100, got {}", collapsed.len());
        assert!(collapsed.iter().all(|e| e.child_count == 1 || e.name_id.is_none()));
    }

    #[test]
    fn tier_zero_returns_every_event_unchanged() {
        let events = uniform_events(10, 1000);
        let collapsed = collapse_events(&events, 0);
        assert_eq!(collapsed.len(), 10);
        assert!(collapsed.iter().all(|e| e.name_id.is_some()));
    }

    #[rstest]
    #[case::min_reduction(SampleReduction::Min, 2.0)]
    #[case::max_reduction(SampleReduction::Max, 9.0)]
    fn counter_lod_reduces_pointwise(#[case] reduction: SampleReduction, #[case] expected_first_value: f64) {
        let samples = vec![
            Sample::new(HandleId::new(0), 0, 5.0),
            Sample::new(HandleId::new(1), 1, 2.0),
            Sample::new(HandleId::new(2), 2, 9.0),
        ];
        let collapsed = collapse_samples(&samples, 5, reduction);
        assert!(collapsed.len() <= samples.len());
        assert_eq!(collapsed[0].value, expected_first_value);
    }
}
