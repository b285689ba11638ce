// tests/pipeline_tracking.rs

mod common;
use crate::common::{CatalogBuilder, TaskDefinitionBuilder, day, fan_out_catalog, init_tracing};

use chrono::Duration;

use approvaldag::errors::PipelineError;
use approvaldag::pipeline::{PipelineEvent, PipelineState, instantiate_pipeline};
use approvaldag::types::TaskStatus;

fn fan_out_state() -> PipelineState {
    instantiate_pipeline(fan_out_catalog().blueprint(), "INV-001")
}

/// A -> B -> C chain, durations 2, 4, 6.
fn chain_state() -> PipelineState {
    let bp = CatalogBuilder::new()
        .with_task(TaskDefinitionBuilder::new("A", 2).build())
        .with_task(TaskDefinitionBuilder::new("B", 4).after("A").build())
        .with_task(TaskDefinitionBuilder::new("C", 6).after("B").build())
        .blueprint();
    instantiate_pipeline(bp, "INV-CHAIN")
}

fn approve(state: &mut PipelineState, task: &str, started: i64, approved: i64) {
    state.start_task(task, day(started)).unwrap();
    state
        .set_status(task, TaskStatus::UnderReview, day(started))
        .unwrap();
    state
        .set_status(task, TaskStatus::Approved, day(approved))
        .unwrap();
}

#[test]
fn fresh_pipeline_has_every_task_not_started() {
    init_tracing();
    let state = fan_out_state();
    let snapshot = state.query(day(10));

    assert_eq!(snapshot.case_id, "INV-001");
    assert_eq!(snapshot.completed_count, 0);
    assert_eq!(snapshot.overall_progress_percent, 0.0);
    assert_eq!(snapshot.total_duration_days, 8);

    for task in &snapshot.tasks {
        let duration = state.blueprint().task(&task.task_id).unwrap().duration_days();
        assert_eq!(task.status, TaskStatus::NotStarted);
        assert_eq!(task.days_elapsed, 0);
        assert_eq!(task.days_remaining, duration);
    }
}

#[test]
fn start_is_gated_on_approved_prerequisites() {
    let mut state = fan_out_state();

    match state.start_task("B", day(0)) {
        Err(PipelineError::Prerequisite { task, blocking }) => {
            assert_eq!(task, "B");
            assert_eq!(blocking, vec!["A".to_string()]);
        }
        other => panic!("expected Prerequisite error, got {other:?}"),
    }

    approve(&mut state, "A", 0, 3);

    let step = state.start_task("B", day(3)).unwrap();
    assert_eq!(step.from, TaskStatus::NotStarted);
    assert_eq!(step.to, TaskStatus::InProgress);
    assert_eq!(state.status("B").unwrap(), TaskStatus::InProgress);
    assert_eq!(state.instance("B").unwrap().started_at, Some(day(3)));
}

#[test]
fn in_progress_dependency_still_blocks_start() {
    let mut state = fan_out_state();
    state.start_task("A", day(0)).unwrap();
    state
        .set_status("A", TaskStatus::UnderReview, day(1))
        .unwrap();

    assert!(matches!(
        state.set_status("C", TaskStatus::InProgress, day(1)),
        Err(PipelineError::Prerequisite { .. })
    ));
}

#[test]
fn restarting_a_running_task_is_a_noop() {
    let mut state = fan_out_state();
    state.start_task("A", day(0)).unwrap();

    let step = state.start_task("A", day(2)).unwrap();
    assert!(step.is_noop());
    assert_eq!(state.instance("A").unwrap().started_at, Some(day(0)));
}

#[test]
fn failed_updates_leave_state_untouched() {
    let mut state = fan_out_state();
    state.start_task("A", day(0)).unwrap();
    let before = state.clone();

    assert!(state.start_task("B", day(1)).is_err());
    assert!(state.set_status("A", TaskStatus::Approved, day(1)).is_err());
    assert!(state.set_status("nope", TaskStatus::OnHold, day(1)).is_err());

    assert_eq!(state, before);
}

#[test]
fn invalid_transition_names_current_and_requested_status() {
    let mut state = fan_out_state();

    match state.set_status("A", TaskStatus::Approved, day(0)) {
        Err(PipelineError::InvalidTransition { task, from, to }) => {
            assert_eq!(task, "A");
            assert_eq!(from, TaskStatus::NotStarted);
            assert_eq!(to, TaskStatus::Approved);
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }
}

#[test]
fn status_machine_accepts_only_listed_edges() {
    use TaskStatus::*;

    let allowed = [
        (NotStarted, InProgress),
        (NotStarted, Blocked),
        (InProgress, UnderReview),
        (InProgress, OnHold),
        (InProgress, Rejected),
        (UnderReview, Approved),
        (UnderReview, Rejected),
        (UnderReview, OnHold),
        (OnHold, InProgress),
        (Blocked, NotStarted),
        (Rejected, NotStarted),
    ];

    for from in TaskStatus::ALL {
        for to in TaskStatus::ALL {
            assert_eq!(
                from.allows_transition(to),
                allowed.contains(&(from, to)),
                "{from} -> {to}"
            );
        }
    }

    for status in TaskStatus::ALL {
        assert!(!Approved.allows_transition(status));
    }
}

#[test]
fn hold_and_resume_keeps_original_start() {
    let mut state = fan_out_state();
    state.start_task("A", day(0)).unwrap();
    state.set_status("A", TaskStatus::OnHold, day(1)).unwrap();

    let step = state.set_status("A", TaskStatus::InProgress, day(2)).unwrap();
    assert_eq!(step.from, TaskStatus::OnHold);
    assert_eq!(state.instance("A").unwrap().started_at, Some(day(0)));
}

#[test]
fn approval_sets_completion_and_emits_event() {
    let mut state = fan_out_state();
    state.start_task("A", day(0)).unwrap();
    state
        .set_status("A", TaskStatus::UnderReview, day(1))
        .unwrap();

    let step = state.set_status("A", TaskStatus::Approved, day(2)).unwrap();

    assert_eq!(
        step.events,
        vec![PipelineEvent::TaskApproved {
            case_id: "INV-001".to_string(),
            task_id: "A".to_string(),
            approved_at: day(2),
        }]
    );
    assert_eq!(state.instance("A").unwrap().completed_at, Some(day(2)));
    assert_eq!(state.completed_count(), 1);
}

#[test]
fn elapsed_and_remaining_follow_the_clock() {
    let mut state = fan_out_state();
    state.start_task("A", day(0)).unwrap();

    // Partial days are floored.
    let now = day(2) + Duration::hours(23);
    assert_eq!(state.days_elapsed("A", now).unwrap(), 2);
    assert_eq!(state.days_remaining("A", now).unwrap(), 1);

    // Overdue never goes negative.
    assert_eq!(state.days_elapsed("A", day(7)).unwrap(), 7);
    assert_eq!(state.days_remaining("A", day(7)).unwrap(), 0);

    // A clock behind the start time reads as zero elapsed.
    assert_eq!(state.days_elapsed("A", day(-1)).unwrap(), 0);

    assert!(matches!(
        state.days_elapsed("ghost", day(0)),
        Err(PipelineError::UnknownTask(id)) if id == "ghost"
    ));
}

#[test]
fn completed_task_stops_the_clock() {
    let mut state = fan_out_state();
    approve(&mut state, "A", 0, 4);

    assert_eq!(state.days_elapsed("A", day(30)).unwrap(), 4);
    assert_eq!(state.days_remaining("A", day(30)).unwrap(), 0);
}

#[test]
fn progress_is_share_of_approved_tasks() {
    let mut state = fan_out_state();
    approve(&mut state, "A", 0, 3);

    let expected = 100.0 / 3.0;
    assert!((state.overall_progress_percent() - expected).abs() < 1e-9);

    approve(&mut state, "B", 3, 8);
    approve(&mut state, "C", 3, 5);
    assert_eq!(state.overall_progress_percent(), 100.0);
    assert_eq!(state.query(day(9)).completed_count, 3);
}

#[test]
fn rejection_blocks_every_downstream_task() {
    let mut state = chain_state();
    state.start_task("A", day(0)).unwrap();

    let step = state.set_status("A", TaskStatus::Rejected, day(1)).unwrap();

    assert_eq!(step.newly_blocked, vec!["B".to_string(), "C".to_string()]);
    assert_eq!(step.events.len(), 2);
    assert!(
        step.events
            .iter()
            .all(|e| matches!(e, PipelineEvent::TaskBlocked { at, .. } if *at == day(1)))
    );
    assert_eq!(state.status("B").unwrap(), TaskStatus::Blocked);
    assert_eq!(state.status("C").unwrap(), TaskStatus::Blocked);
}

#[test]
fn resubmitted_task_starts_a_fresh_clock() {
    let mut state = chain_state();
    state.start_task("A", day(0)).unwrap();
    state.set_status("A", TaskStatus::Rejected, day(1)).unwrap();

    state.set_status("A", TaskStatus::NotStarted, day(2)).unwrap();
    let a = state.instance("A").unwrap();
    assert_eq!(a.started_at, None);
    assert_eq!(a.completed_at, None);

    state.start_task("A", day(3)).unwrap();
    assert_eq!(state.days_elapsed("A", day(4)).unwrap(), 1);

    // B stays blocked until explicitly released.
    assert!(state.start_task("B", day(4)).is_err());
    state.set_status("B", TaskStatus::NotStarted, day(4)).unwrap();
    assert_eq!(state.status("B").unwrap(), TaskStatus::NotStarted);
}

#[test]
fn started_tasks_are_only_blocked_by_an_upstream_rejection() {
    let mut state = chain_state();
    approve(&mut state, "A", 0, 2);
    state.start_task("B", day(2)).unwrap();

    // With every dependency approved, no direct call can block a started task.
    for next in [TaskStatus::UnderReview, TaskStatus::OnHold, TaskStatus::InProgress] {
        let before = state.clone();
        assert!(matches!(
            state.set_status("B", TaskStatus::Blocked, day(3)),
            Err(PipelineError::InvalidTransition { to: TaskStatus::Blocked, .. })
        ));
        assert_eq!(state, before);
        state.set_status("B", next, day(3)).unwrap();
    }

    // An approved dependency cannot regress either.
    for to in TaskStatus::ALL {
        assert!(state.set_status("A", to, day(4)).is_err());
    }

    // Rejecting the started task is what blocks what comes after it.
    state.start_task("C", day(4)).unwrap_err();
    let step = state.set_status("B", TaskStatus::Rejected, day(4)).unwrap();
    assert_eq!(step.newly_blocked, vec!["C".to_string()]);
    assert_eq!(state.status("C").unwrap(), TaskStatus::Blocked);

    // A task that has not started can always be parked as blocked.
    let mut fresh = fan_out_state();
    let step = fresh.set_status("C", TaskStatus::Blocked, day(0)).unwrap();
    assert_eq!(step.events.len(), 1);
}

#[test]
fn requirement_uploads_are_tracked_per_task() {
    let bp = CatalogBuilder::new()
        .with_task(
            TaskDefinitionBuilder::new("visa", 5)
                .requirement("passport")
                .requirement("photo")
                .build(),
        )
        .blueprint();
    let mut state = instantiate_pipeline(bp, "INV-DOCS");

    assert_eq!(
        state.missing_requirements("visa").unwrap(),
        vec!["passport".to_string(), "photo".to_string()]
    );

    state.record_upload("visa", "photo").unwrap();
    state.record_upload("visa", "bank-letter").unwrap();

    assert_eq!(
        state.missing_requirements("visa").unwrap(),
        vec!["passport".to_string()]
    );
    assert!(state.record_upload("ghost", "photo").is_err());
}
