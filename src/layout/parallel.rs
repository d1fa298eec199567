use std::ops::Range;

use crate::model::Step;

/// A run of the sorted step sequence that is placed as one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment<'a> {
    Single(&'a Step),
    Parallel { group: usize, members: &'a [&'a Step] },
}

/// Maximal runs of two or more consecutive steps flagged `can_parallel`.
/// A lone flagged step is not a group.
pub fn detect_parallel_groups(sorted: &[&Step]) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut idx = 0;
    while idx < sorted.len() {
        if !sorted[idx].can_parallel {
            idx += 1;
            continue;
        }
        let start = idx;
        while idx < sorted.len() && sorted[idx].can_parallel {
            idx += 1;
        }
        if idx - start >= 2 {
            groups.push(start..idx);
        }
    }
    groups
}

pub fn segment_steps<'a>(sorted: &'a [&'a Step]) -> Vec<Segment<'a>> {
    let groups = detect_parallel_groups(sorted);
    let mut segments = Vec::with_capacity(sorted.len());
    let mut next_group = groups.iter().enumerate().peekable();
    let mut idx = 0;
    while idx < sorted.len() {
        if let Some((group, range)) = next_group.peek()
            && range.start == idx
        {
            segments.push(Segment::Parallel {
                group: *group,
                members: &sorted[(*range).clone()],
            });
            idx = range.end;
            next_group.next();
            continue;
        }
        segments.push(Segment::Single(sorted[idx]));
        idx += 1;
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sort_steps;

    fn flagged(flags: &[bool]) -> Vec<Step> {
        flags
            .iter()
            .enumerate()
            .map(|(idx, flag)| Step::new(format!("s{idx}"), format!("Step {idx}"), idx as i64).parallel(*flag))
            .collect()
    }

    #[test]
    fn lone_flagged_step_is_not_a_group() {
        let steps = flagged(&[false, true, false]);
        let sorted = sort_steps(&steps);
        assert!(detect_parallel_groups(&sorted).is_empty());
        assert!(
            segment_steps(&sorted)
                .iter()
                .all(|segment| matches!(segment, Segment::Single(_)))
        );
    }

    #[test]
    fn groups_are_maximal_runs() {
        let steps = flagged(&[true, true, true, false, true, true, false, true]);
        let sorted = sort_steps(&steps);
        assert_eq!(detect_parallel_groups(&sorted), vec![0..3, 4..6]);
    }

    #[test]
    fn segments_cover_every_step_once() {
        let steps = flagged(&[false, true, true, false]);
        let sorted = sort_steps(&steps);
        let segments = segment_steps(&sorted);
        assert_eq!(segments.len(), 3);
        match segments[1] {
            Segment::Parallel { group, members } => {
                assert_eq!(group, 0);
                let ids: Vec<&str> = members.iter().map(|s| s.id.as_str()).collect();
                assert_eq!(ids, vec!["s1", "s2"]);
            }
            Segment::Single(_) => panic!("expected a parallel segment"),
        }
    }

    #[test]
    fn grouping_follows_sorted_order_not_input_order() {
        let steps = vec![
            Step::new("late", "Late", 9).parallel(true),
            Step::new("first", "First", 1).parallel(true),
            Step::new("middle", "Middle", 5),
        ];
        let sorted = sort_steps(&steps);
        assert!(detect_parallel_groups(&sorted).is_empty());
    }
}
