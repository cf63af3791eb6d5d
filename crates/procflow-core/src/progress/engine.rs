//! Stage transition engine: pure functions over a stage list.
//!
//! Invariants enforced here:
//! - a stage with index i > 0 only becomes actionable once every earlier
//!   stage is completed, skipped, or no_requirement (stage 0 is always
//!   enterable);
//! - per-stage moves are strictly forward: not_started → in_progress →
//!   completed, with skipped as an alternate terminal;
//! - no_requirement is permanent from creation.

use crate::progress::model::{StageInstance, StageStatus};

/// Predecessor gate: every stage before `index` is satisfied.
pub fn gate_open(stages: &[StageInstance], index: usize) -> bool {
    stages[..index].iter().all(|s| s.status.satisfies_gate())
}

/// Whether a stage can currently be acted on: its gate is open and it has
/// not already reached a terminal status. Kind (manual vs system-linked) is
/// checked by the caller, not here.
pub fn is_operable(stages: &[StageInstance], index: usize) -> bool {
    if index >= stages.len() {
        return false;
    }
    matches!(
        stages[index].status,
        StageStatus::NotStarted | StageStatus::InProgress
    ) && gate_open(stages, index)
}

/// Per-stage state machine. `no_requirement` never transitions; completed
/// and skipped are terminal; everything else only moves forward.
pub fn can_transition(from: StageStatus, to: StageStatus) -> bool {
    match (from, to) {
        (StageStatus::NotStarted, StageStatus::InProgress) => true,
        (StageStatus::NotStarted, StageStatus::Completed) => true,
        (StageStatus::NotStarted, StageStatus::Skipped) => true,
        (StageStatus::InProgress, StageStatus::Completed) => true,
        (StageStatus::InProgress, StageStatus::Skipped) => true,
        _ => false,
    }
}

/// Derived completion percentage. Truncating integer division: 1 of 8
/// stages reads as 12, matching the dashboard display.
pub fn overall_progress(stages: &[StageInstance]) -> u8 {
    if stages.is_empty() {
        return 0;
    }
    let satisfied = stages.iter().filter(|s| s.status.satisfies_gate()).count();
    (satisfied * 100 / stages.len()) as u8
}

/// Promote the first not-started stage whose gate is open to in_progress.
/// Called after a completion so the record always shows a current stage
/// while work remains.
pub fn advance_pointer(stages: &mut [StageInstance]) {
    for index in 0..stages.len() {
        if stages[index].status == StageStatus::NotStarted && gate_open(stages, index) {
            stages[index].status = StageStatus::InProgress;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::stages::StageKind;

    fn stage(key: &str, status: StageStatus) -> StageInstance {
        StageInstance {
            key: key.to_string(),
            label: key.to_string(),
            kind: StageKind::Manual,
            status,
            completed_date: None,
            remarks: None,
        }
    }

    #[test]
    fn test_stage_zero_always_enterable() {
        let stages = vec![stage("a", StageStatus::NotStarted), stage("b", StageStatus::NotStarted)];
        assert!(is_operable(&stages, 0));
        assert!(!is_operable(&stages, 1));
    }

    #[test]
    fn test_gate_requires_all_predecessors() {
        let stages = vec![
            stage("a", StageStatus::Completed),
            stage("b", StageStatus::NotStarted),
            stage("c", StageStatus::NotStarted),
        ];
        assert!(is_operable(&stages, 1));
        assert!(!is_operable(&stages, 2));
    }

    #[test]
    fn test_skipped_and_no_requirement_satisfy_gate() {
        let stages = vec![
            stage("a", StageStatus::NoRequirement),
            stage("b", StageStatus::Skipped),
            stage("c", StageStatus::NotStarted),
        ];
        assert!(is_operable(&stages, 2));
    }

    #[test]
    fn test_terminal_stages_not_operable() {
        let stages = vec![stage("a", StageStatus::Completed)];
        assert!(!is_operable(&stages, 0));
        let stages = vec![stage("a", StageStatus::NoRequirement)];
        assert!(!is_operable(&stages, 0));
        assert!(!is_operable(&stages, 5));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!can_transition(StageStatus::Completed, StageStatus::InProgress));
        assert!(!can_transition(StageStatus::Completed, StageStatus::NotStarted));
        assert!(!can_transition(StageStatus::Skipped, StageStatus::InProgress));
        assert!(!can_transition(StageStatus::InProgress, StageStatus::NotStarted));
    }

    #[test]
    fn test_no_requirement_is_permanent() {
        for target in [
            StageStatus::NotStarted,
            StageStatus::InProgress,
            StageStatus::Completed,
            StageStatus::Skipped,
        ] {
            assert!(!can_transition(StageStatus::NoRequirement, target));
        }
    }

    #[test]
    fn test_overall_progress_truncates() {
        let mut stages: Vec<StageInstance> =
            (0..8).map(|i| stage(&format!("s{i}"), StageStatus::NotStarted)).collect();
        assert_eq!(overall_progress(&stages), 0);
        stages[0].status = StageStatus::Completed;
        assert_eq!(overall_progress(&stages), 12); // 1/8
        stages[1].status = StageStatus::NoRequirement;
        stages[2].status = StageStatus::Skipped;
        assert_eq!(overall_progress(&stages), 37); // 3/8
        for s in stages.iter_mut() {
            s.status = StageStatus::Completed;
        }
        assert_eq!(overall_progress(&stages), 100);
    }

    #[test]
    fn test_advance_pointer_skips_no_requirement() {
        let mut stages = vec![
            stage("a", StageStatus::Completed),
            stage("b", StageStatus::NoRequirement),
            stage("c", StageStatus::NotStarted),
        ];
        advance_pointer(&mut stages);
        assert_eq!(stages[1].status, StageStatus::NoRequirement);
        assert_eq!(stages[2].status, StageStatus::InProgress);
    }

    #[test]
    fn test_advance_pointer_stops_at_closed_gate() {
        let mut stages = vec![
            stage("a", StageStatus::InProgress),
            stage("b", StageStatus::NotStarted),
        ];
        advance_pointer(&mut stages);
        // stage a is still open, so b must not start
        assert_eq!(stages[1].status, StageStatus::NotStarted);
    }
}
