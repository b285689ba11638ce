// src/lib.rs

pub mod catalog;
pub mod cli;
pub mod dag;
pub mod detect;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod types;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::catalog::{CatalogFile, load_and_validate, load_case};
use crate::cli::{CliArgs, Command};
use crate::dag::PipelineBlueprint;
use crate::detect::{EscalationDetector, detect_escalations};
use crate::engine::{CaseHandle, Clock, EscalationSweeper, OutboundEvent, SystemClock};
use crate::pipeline::{PipelineEvent, PipelineState};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Plan { catalog, dot } => {
            let cfg = load_and_validate(&catalog)?;
            if dot {
                println!("{}", cfg.blueprint().to_dot());
            } else {
                print_plan(&cfg.blueprint());
            }
            Ok(())
        }
        Command::Status { catalog, case, now } => {
            let (cfg, state) = load_case_state(&catalog, &case)?;
            let now = now.unwrap_or_else(|| SystemClock.now());
            print_status(&state, now, cfg.config.escalation_threshold_days);
            Ok(())
        }
        Command::Monitor {
            catalog,
            case,
            interval_secs,
        } => {
            let (cfg, state) = load_case_state(&catalog, &case)?;
            monitor(state, cfg.config.escalation_threshold_days, interval_secs).await
        }
    }
}

fn load_case_state(catalog: &Path, case: &Path) -> Result<(CatalogFile, PipelineState)> {
    let cfg = load_and_validate(catalog)?;
    let case_file = load_case(case)?;
    let state = case_file.replay(cfg.blueprint())?;
    Ok((cfg, state))
}

/// Sweep one case on an interval until Ctrl-C, logging everything it emits.
async fn monitor(state: PipelineState, threshold_days: u64, interval_secs: u64) -> Result<()> {
    let (events_tx, mut events_rx) = mpsc::channel::<OutboundEvent>(64);
    let case_id = state.case_id().to_string();

    let handle = CaseHandle::new(state, events_tx);
    let sweeper = EscalationSweeper::new(handle, EscalationDetector::new(threshold_days), SystemClock);

    // Ctrl-C -> graceful shutdown. If the signal handler cannot be installed
    // the sender is dropped, which stops the sweeper too.
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = shutdown_tx.send(());
    });

    let reporter = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                OutboundEvent::Escalation(e) => warn!(
                    case = %e.case_id,
                    task = %e.task_id,
                    reason = %e.reason,
                    severity = %e.severity,
                    "escalation"
                ),
                OutboundEvent::Pipeline(PipelineEvent::TaskApproved { task_id, .. }) => {
                    info!(task = %task_id, "task approved")
                }
                OutboundEvent::Pipeline(PipelineEvent::TaskBlocked { task_id, .. }) => {
                    info!(task = %task_id, "task blocked")
                }
            }
        }
    });

    info!(case = %case_id, threshold_days, "monitoring case");
    sweeper
        .run(Duration::from_secs(interval_secs.max(1)), shutdown_rx)
        .await?;
    reporter.await?;

    Ok(())
}

fn print_plan(blueprint: &PipelineBlueprint) {
    println!("approvaldag plan");
    println!("  total_duration_days = {}", blueprint.total_duration_days());
    println!(
        "  critical_path = {}",
        blueprint.critical_path_ids().join(" -> ")
    );
    println!();

    println!("tasks ({}):", blueprint.len());
    for task in blueprint.tasks() {
        let marker = if task.is_on_critical_path { "*" } else { " " };
        println!(
            "  {marker} {:<24} day {:>3} -> {:>3}  ({}d)",
            task.id(),
            task.earliest_start,
            task.earliest_finish,
            task.definition.duration_days
        );
        if !task.definition.dependencies.is_empty() {
            println!("        after: {:?}", task.definition.dependencies);
        }
    }

    if !blueprint.parallel_groups().is_empty() {
        println!();
        println!("parallel groups:");
        for group in blueprint.parallel_groups() {
            println!("  day {:>3}: {:?}", group.earliest_start, group.task_ids);
        }
    }
}

fn print_status(state: &PipelineState, now: DateTime<Utc>, threshold_days: u64) {
    let snapshot = state.query(now);

    println!("case {} at {}", snapshot.case_id, now.to_rfc3339());
    println!(
        "  progress = {}/{} ({:.1}%)",
        snapshot.completed_count,
        snapshot.tasks.len(),
        snapshot.overall_progress_percent
    );
    println!(
        "  critical_path = {} ({} days)",
        snapshot.critical_path_ids.join(" -> "),
        snapshot.total_duration_days
    );
    println!();

    for task in &snapshot.tasks {
        println!(
            "  {:<24} {:<13} elapsed {:>3}d  remaining {:>3}d",
            task.task_id,
            task.status.as_str(),
            task.days_elapsed,
            task.days_remaining
        );
    }

    let escalations = detect_escalations(state, now, threshold_days);
    if !escalations.is_empty() {
        println!();
        println!("escalations:");
        for e in escalations {
            println!("  {:<24} {} ({})", e.task_id, e.reason, e.severity);
        }
    }
}
