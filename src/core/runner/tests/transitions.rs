use crate::core::runner::can_transition;
use crate::core::store::types::TaskStatus;

#[test]
fn legal_transitions() {
    assert!(can_transition(TaskStatus::Queued, TaskStatus::Running));
    assert!(can_transition(TaskStatus::Queued, TaskStatus::Error));
    assert!(can_transition(TaskStatus::Running, TaskStatus::Done));
    assert!(can_transition(TaskStatus::Running, TaskStatus::Error));
}

#[test]
fn terminal_states_have_no_exits() {
    for terminal in [TaskStatus::Done, TaskStatus::Error] {
        for to in [
            TaskStatus::Queued,
            TaskStatus::Running,
            TaskStatus::Done,
            TaskStatus::Error,
        ] {
            assert!(!can_transition(terminal, to));
        }
    }
}

#[test]
fn no_skipping_queued() {
    assert!(!can_transition(TaskStatus::Queued, TaskStatus::Done));
    assert!(!can_transition(TaskStatus::Running, TaskStatus::Queued));
}
