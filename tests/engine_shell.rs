// tests/engine_shell.rs

mod common;
use crate::common::{day, fan_out_catalog, init_tracing, with_timeout};

use std::error::Error;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use approvaldag::detect::EscalationDetector;
use approvaldag::engine::{CaseHandle, Clock, EscalationSweeper, FixedClock, OutboundEvent};
use approvaldag::pipeline::{PipelineEvent, PipelineState, instantiate_pipeline};
use approvaldag::types::{EscalationReason, TaskStatus};

type TestResult = Result<(), Box<dyn Error>>;

/// Fan-out case with A approved on day 3 and B (5 days) started on day 3.
fn state_with_b_running() -> PipelineState {
    let mut state = instantiate_pipeline(fan_out_catalog().blueprint(), "INV-ENGINE");
    state.start_task("A", day(0)).unwrap();
    state.set_status("A", TaskStatus::UnderReview, day(1)).unwrap();
    state.set_status("A", TaskStatus::Approved, day(3)).unwrap();
    state.start_task("B", day(3)).unwrap();
    state
}

#[tokio::test]
async fn case_handle_forwards_approval_events() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::channel(16);
    let handle = CaseHandle::new(
        instantiate_pipeline(fan_out_catalog().blueprint(), "INV-7"),
        tx,
    );

    handle.start_task("A", day(0)).await?;
    handle.set_status("A", TaskStatus::UnderReview, day(1)).await?;
    handle.set_status("A", TaskStatus::Approved, day(2)).await?;

    let event = with_timeout(rx.recv()).await.expect("event expected");
    assert_eq!(
        event,
        OutboundEvent::Pipeline(PipelineEvent::TaskApproved {
            case_id: "INV-7".to_string(),
            task_id: "A".to_string(),
            approved_at: day(2),
        })
    );
    assert!(rx.try_recv().is_err());

    let progress = handle.read(|state| state.overall_progress_percent())?;
    assert!(progress > 33.0 && progress < 34.0);
    Ok(())
}

#[tokio::test]
async fn case_handle_rejects_gated_start_without_emitting() -> TestResult {
    let (tx, mut rx) = mpsc::channel(16);
    let handle = CaseHandle::new(
        instantiate_pipeline(fan_out_catalog().blueprint(), "INV-8"),
        tx,
    );

    assert!(handle.start_task("C", day(0)).await.is_err());
    assert_eq!(handle.read(|s| s.status("C").ok())?, Some(TaskStatus::NotStarted));
    assert!(rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn sweep_once_emits_new_escalations_only() -> TestResult {
    let (tx, mut rx) = mpsc::channel(16);
    let handle = CaseHandle::new(state_with_b_running(), tx);
    let clock = FixedClock::new(day(9));
    let mut sweeper = EscalationSweeper::new(handle, EscalationDetector::new(2), clock.clone());

    // B: started day 3, 5-day SLA, elapsed 6 on day 9.
    let found = sweeper.sweep_once().await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].task_id, "B");
    assert_eq!(found[0].reason, EscalationReason::SlaBreached);
    assert_eq!(found[0].detected_at, clock.now());

    match rx.try_recv()? {
        OutboundEvent::Escalation(e) => assert_eq!(e.task_id, "B"),
        other => panic!("unexpected event: {other:?}"),
    }

    clock.advance(chrono::Duration::days(1));
    assert!(sweeper.sweep_once().await?.is_empty());
    assert!(rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn sweeper_loop_runs_until_shutdown() -> TestResult {
    let (tx, mut rx) = mpsc::channel(16);
    let handle = CaseHandle::new(state_with_b_running(), tx);
    let sweeper = EscalationSweeper::new(
        handle,
        EscalationDetector::new(5),
        FixedClock::new(day(4)),
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(sweeper.run(Duration::from_millis(10), shutdown_rx));

    // B has 4 of 5 days left on day 4: approaching its SLA.
    let event = with_timeout(rx.recv()).await.expect("escalation expected");
    match event {
        OutboundEvent::Escalation(e) => {
            assert_eq!(e.task_id, "B");
            assert_eq!(e.reason, EscalationReason::ApproachingSla);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    shutdown_tx.send(()).expect("sweeper still running");
    with_timeout(task).await??;

    // The sweeper owned the last sender.
    assert!(with_timeout(rx.recv()).await.is_none());
    Ok(())
}
