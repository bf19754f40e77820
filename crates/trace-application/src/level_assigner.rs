//! Deterministic nesting-depth assignment over time-ordered events
//! (`spec.md` §4.5).

use trace_domain::entities::event::Event;

/// One event's computed level, keyed by the event's position in the
/// input slice (the caller maps this back to an event id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelAssignment {
    pub index: usize,
    pub level: u8,
}

/// Sort `events` by `start` ascending, tie-broken by `end` descending so
/// enclosing events come first (`spec.md` §4.5), then compute
/// `level(e) = 1 + max(level(a) for a in active if a.contains(e))`, base 0.
///
/// Returns assignments indexed against the *sorted* order; the caller is
/// expected to have already sorted `events` with [`sort_for_level_assignment`]
/// or to re-derive the original index itself.
#[must_use]
pub fn assign_levels(events: &[Event]) -> Vec<LevelAssignment> {
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| {
        events[a]
            .start_ts()
            .cmp(&events[b].start_ts())
            .then_with(|| events[b].end_ts().cmp(&events[a].end_ts()))
    });

    // Active set: indices (into `events`) of events whose end >= current start,
    // paired with their assigned level, in nesting order (last = innermost).
    let mut active: Vec<(usize, u8)> = Vec::new();
    let mut result = vec![
        LevelAssignment { index: 0, level: 0 };
        events.len()
    ];

    for &idx in &order {
        let current = &events[idx];
        active.retain(|&(active_idx, _)| events[active_idx].end_ts() >= current.start_ts());

        let containing_level = active
            .iter()
            .filter(|&&(active_idx, _)| events[active_idx].contains(current))
            .map(|&(_, level)| level)
            .max();

        let level = containing_level.map_or(0, |l| l.saturating_add(1));
        result[idx] = LevelAssignment { index: idx, level };
        active.push((idx, level));
    }

    result
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use trace_domain::entities::handle::HandleId;

    fn ev(id: u64, start: u64, end: u64) -> Event {
        Event::new(HandleId::new(id), start, end, 0, 0, 0)
    }

    #[rstest]
    #[case::scenario_1_nested(
        vec![ev(0, 0, 100), ev(1, 10, 50), ev(2, 20, 40), ev(3, 60, 90), ev(4, 110, 120)],
        vec![0, 1, 2, 1, 0],
    )]
    #[case::disjoint_events_share_level_zero(
        vec![ev(0, 0, 10), ev(1, 20, 30), ev(2, 40, 50)],
        vec![0, 0, 0],
    )]
    #[case::touching_bounds_do_not_nest(
        vec![ev(0, 0, 10), ev(1, 10, 20)],
        vec![0, 0],
    )]
    fn assigns_expected_levels(#[case] events: Vec<Event>, #[case] expected: Vec<u8>) {
        let assignments = assign_levels(&events);
        let levels: Vec<u8> = assignments.iter().map(|a| a.level).collect();
        assert_eq!(levels, expected);
    }

    #[test]
    fn every_level_is_strictly_greater_than_its_containers() {
        let events = vec![ev(0, 0, 1000), ev(1, 10, 500), ev(2, 20, 100)];
        let assignments = assign_levels(&events);
        assert!(assignments[0].level < assignments[1].level);
        assert!(assignments[1].level < assignments[2].level);
    }
}
