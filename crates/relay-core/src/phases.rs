use crate::events::ActivityEvent;
use crate::events::PhaseGroup;
use crate::events::IMPLICIT_PHASE_ID;
use crate::events::IMPLICIT_PHASE_TITLE;

/// Incremental form of [`derive_groups`].
///
/// Groups come out in first-opened order; the open stack only decides which
/// group receives the next non-marker event. The grouper never fails: an
/// unmatched `phase_end` drains the stack and is otherwise dropped.
#[derive(Debug, Default)]
pub struct PhaseGrouper {
    groups: Vec<PhaseGroup>,
    open: Vec<usize>,
    implicit: Option<usize>,
}

impl PhaseGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: &ActivityEvent) {
        match event {
            ActivityEvent::PhaseStart { id, title } => {
                self.groups.push(PhaseGroup {
                    id: id.clone(),
                    title: title.clone(),
                    events: Vec::new(),
                    is_implicit: false,
                });
                self.open.push(self.groups.len() - 1);
            }
            ActivityEvent::PhaseEnd { phase_id } => {
                while let Some(idx) = self.open.pop() {
                    if self.groups[idx].id == *phase_id {
                        break;
                    }
                }
            }
            other => {
                let idx = match self.open.last() {
                    Some(idx) => *idx,
                    None => self.implicit_group(),
                };
                self.groups[idx].events.push(other.clone());
            }
        }
    }

    pub fn open_depth(&self) -> usize {
        self.open.len()
    }

    pub fn open_phase_ids(&self) -> impl Iterator<Item = &str> {
        self.open.iter().map(|idx| self.groups[*idx].id.as_str())
    }

    pub fn finish(self) -> Vec<PhaseGroup> {
        self.groups
    }

    fn implicit_group(&mut self) -> usize {
        if let Some(idx) = self.implicit {
            return idx;
        }
        self.groups.push(PhaseGroup {
            id: IMPLICIT_PHASE_ID.to_string(),
            title: IMPLICIT_PHASE_TITLE.to_string(),
            events: Vec::new(),
            is_implicit: true,
        });
        let idx = self.groups.len() - 1;
        self.implicit = Some(idx);
        idx
    }
}

/// Rebuilds the phase view of a run from its full event history.
pub fn derive_groups(events: &[ActivityEvent]) -> Vec<PhaseGroup> {
    let mut grouper = PhaseGrouper::new();
    for event in events {
        grouper.push(event);
    }
    grouper.finish()
}

/// Ids of phases still open at the end of the history (started, never ended).
pub fn open_phase_ids(events: &[ActivityEvent]) -> Vec<String> {
    let mut grouper = PhaseGrouper::new();
    for event in events {
        grouper.push(event);
    }
    grouper.open_phase_ids().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn start(id: &str) -> ActivityEvent {
        ActivityEvent::PhaseStart {
            id: id.to_string(),
            title: format!("Phase {id}"),
        }
    }

    fn end(id: &str) -> ActivityEvent {
        ActivityEvent::PhaseEnd {
            phase_id: id.to_string(),
        }
    }

    fn note(text: &str) -> ActivityEvent {
        ActivityEvent::Analysis {
            text: text.to_string(),
        }
    }

    fn group_shape(groups: &[PhaseGroup]) -> Vec<(String, Vec<String>, bool)> {
        groups
            .iter()
            .map(|group| {
                (
                    group.id.clone(),
                    group
                        .events
                        .iter()
                        .map(|event| match event {
                            ActivityEvent::Analysis { text } => text.clone(),
                            other => other.label().to_string(),
                        })
                        .collect(),
                    group.is_implicit,
                )
            })
            .collect()
    }

    #[test]
    fn empty_history_has_no_groups() {
        assert!(derive_groups(&[]).is_empty());
    }

    #[test]
    fn only_phase_end_events_are_discarded() {
        let groups = derive_groups(&[end("a"), end("b"), end("c")]);
        assert!(groups.is_empty());
    }

    #[test]
    fn derivation_is_pure() {
        let events = vec![note("x"), start("p1"), note("y"), end("p1"), note("z")];
        assert_eq!(derive_groups(&events), derive_groups(&events));
    }

    #[test]
    fn ungrouped_events_share_one_implicit_group() {
        let events = vec![note("a"), start("p1"), note("b"), end("p1"), note("c")];
        let groups = derive_groups(&events);
        assert_eq!(
            group_shape(&groups),
            vec![
                (
                    IMPLICIT_PHASE_ID.to_string(),
                    vec!["a".to_string(), "c".to_string()],
                    true
                ),
                ("p1".to_string(), vec!["b".to_string()], false),
            ]
        );
        assert_eq!(groups[0].title, IMPLICIT_PHASE_TITLE);
        assert_eq!(groups.iter().filter(|group| group.is_implicit).count(), 1);
    }

    #[test]
    fn nested_phases_surface_in_first_opened_order() {
        let events = vec![
            start("outer"),
            note("1"),
            start("inner"),
            note("2"),
            end("inner"),
            note("3"),
            end("outer"),
        ];
        assert_eq!(
            group_shape(&derive_groups(&events)),
            vec![
                (
                    "outer".to_string(),
                    vec!["1".to_string(), "3".to_string()],
                    false
                ),
                ("inner".to_string(), vec!["2".to_string()], false),
            ]
        );
    }

    #[test]
    fn ending_an_outer_phase_closes_phases_opened_inside_it() {
        let events = vec![
            start("outer"),
            start("inner"),
            end("outer"),
            note("after"),
            end("inner"),
        ];
        let groups = derive_groups(&events);
        assert_eq!(
            group_shape(&groups),
            vec![
                ("outer".to_string(), Vec::new(), false),
                ("inner".to_string(), Vec::new(), false),
                (
                    IMPLICIT_PHASE_ID.to_string(),
                    vec!["after".to_string()],
                    true
                ),
            ]
        );
    }

    #[test]
    fn markers_never_appear_as_rows() {
        let events = vec![start("p1"), note("x"), end("p1")];
        let groups = derive_groups(&events);
        assert!(groups
            .iter()
            .flat_map(|group| group.events.iter())
            .all(|event| !event.is_phase_marker()));
    }

    #[test]
    fn every_non_marker_event_lands_in_exactly_one_group() {
        let events = vec![
            note("a"),
            start("p1"),
            note("b"),
            start("p2"),
            note("c"),
            end("missing"),
            note("d"),
            end("p2"),
        ];
        let grouped: usize = derive_groups(&events)
            .iter()
            .map(|group| group.events.len())
            .sum();
        let expected = events.iter().filter(|event| !event.is_phase_marker()).count();
        assert_eq!(grouped, expected);
    }

    #[test]
    fn unmatched_end_with_single_open_phase_drops_depth_by_one() {
        let mut grouper = PhaseGrouper::new();
        grouper.push(&start("p1"));
        assert_eq!(grouper.open_depth(), 1);
        grouper.push(&end("nope"));
        assert_eq!(grouper.open_depth(), 0);

        grouper.push(&end("nope"));
        assert_eq!(grouper.open_depth(), 0);
    }

    #[test]
    fn unmatched_end_drains_the_whole_stack() {
        let mut grouper = PhaseGrouper::new();
        grouper.push(&start("p1"));
        grouper.push(&start("p2"));
        grouper.push(&end("nope"));
        assert_eq!(grouper.open_depth(), 0);
        grouper.push(&note("late"));
        let groups = grouper.finish();
        assert_eq!(groups.last().map(|group| group.is_implicit), Some(true));
    }

    #[test]
    fn open_phase_ids_lists_unfinished_phases_bottom_up() {
        let events = vec![start("a"), start("b"), start("c"), end("c")];
        assert_eq!(
            open_phase_ids(&events),
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
