use chronomap::core::{ChronosTime, Event, EventId, EventLocation};
use chronomap::interaction::FocusStack;
use proptest::prelude::*;

fn id(raw: &str) -> EventId {
    EventId::new(raw)
}

fn container(raw: &str) -> Event {
    Event::new(
        raw,
        raw,
        9.0,
        ChronosTime::from_year(1914),
        EventLocation::new(48.0, 2.0),
    )
}

#[test]
fn drill_down_scenario() {
    let mut stack = FocusStack::new();
    assert!(stack.focus(id("A")));
    assert_eq!(stack.entries(), [id("A")]);
    assert!(stack.focus(id("B")));
    assert_eq!(stack.entries(), [id("A"), id("B")]);
    assert!(stack.can_go_up());

    assert!(stack.go_up());
    assert_eq!(stack.entries(), [id("A")]);
    assert!(!stack.can_go_up());

    assert!(stack.go_up());
    assert!(stack.entries().is_empty());
    assert!(!stack.go_up());
}

#[test]
fn focusing_the_top_twice_is_a_no_op() {
    let mut stack = FocusStack::new();
    assert!(stack.focus(id("A")));
    assert!(!stack.focus(id("A")));
    assert_eq!(stack.depth(), 1);
}

#[test]
fn focusing_an_ancestor_truncates() {
    let mut stack = FocusStack::new();
    for raw in ["A", "B", "C"] {
        stack.focus(id(raw));
    }
    assert!(stack.focus(id("A")));
    assert_eq!(stack.entries(), [id("A")]);
}

#[test]
fn go_up_at_depth_one_jumps_to_a_known_parent() {
    let mut stack = FocusStack::new();
    stack.focus(id("battle"));
    assert!(!stack.can_go_up());

    let battle = container("battle").with_parent("war");
    assert!(stack.resolve(&battle));
    assert_eq!(stack.focused_event().map(|event| &event.id), Some(&id("battle")));
    assert!(stack.can_go_up());

    assert!(stack.go_up());
    assert_eq!(stack.entries(), [id("war")]);
    assert!(stack.focused_event().is_none());
}

#[test]
fn resolve_ignores_events_that_are_not_the_top() {
    let mut stack = FocusStack::new();
    stack.focus(id("A"));
    assert!(!stack.resolve(&container("B")));
    assert!(stack.focused_event().is_none());

    stack.resolve(&container("A"));
    stack.focus(id("B"));
    assert!(stack.focused_event().is_none());
}

#[test]
fn exit_clears_everything() {
    let mut stack = FocusStack::new();
    stack.focus(id("A"));
    stack.resolve(&container("A"));
    stack.exit();
    assert_eq!(stack.depth(), 0);
    assert!(stack.active_root().is_none());
    assert!(stack.focused_event().is_none());
}

#[derive(Debug, Clone)]
enum Op {
    Focus(u8),
    GoUp,
    Exit,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..5).prop_map(Op::Focus),
        2 => Just(Op::GoUp),
        1 => Just(Op::Exit),
    ]
}

proptest! {
    #[test]
    fn adjacent_entries_never_repeat(ops in prop::collection::vec(op(), 0..64)) {
        let mut stack = FocusStack::new();
        for op in ops {
            match op {
                Op::Focus(n) => {
                    stack.focus(id(&format!("E{n}")));
                }
                Op::GoUp => {
                    stack.go_up();
                }
                Op::Exit => stack.exit(),
            }
            for pair in stack.entries().windows(2) {
                prop_assert_ne!(&pair[0], &pair[1]);
            }
        }
    }

    #[test]
    fn refocusing_the_first_entry_collapses_to_it(a in 0u8..5, b in 0u8..5) {
        prop_assume!(a != b);
        let mut stack = FocusStack::new();
        stack.focus(id(&format!("E{a}")));
        stack.focus(id(&format!("E{b}")));
        stack.focus(id(&format!("E{a}")));
        prop_assert_eq!(stack.entries(), [id(&format!("E{a}"))]);
    }
}
