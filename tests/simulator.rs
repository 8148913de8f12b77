use std::time::Duration;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

use hypermail::config::FailurePolicy;
use hypermail::repl::SimulatorEvent;
use hypermail::simulator::{
    default_stages, PacingSettings, RunHandle, RunPhase, RunSnapshot, Settlement, StageStatus,
    WorkflowSimulator,
};

const LABEL: &str = "Acme Tunnels";

fn simulator(seed: u64) -> WorkflowSimulator {
    WorkflowSimulator::new(PacingSettings::default()).with_rng(StdRng::seed_from_u64(seed))
}

fn assert_invariants(snap: &RunSnapshot) {
    assert!(snap.running_count() <= 1, "two stages running: {:?}", snap.stages);
    let defs = default_stages();
    for (stage, def) in snap.stages.iter().zip(defs.iter()) {
        let templates = def.render_messages(LABEL);
        assert!(
            templates.starts_with(&stage.messages),
            "messages of {} are not a template prefix: {:?}",
            stage.id,
            stage.messages
        );
        if stage.status == StageStatus::Completed {
            assert_eq!(stage.progress, 100);
        }
    }
}

/// Sample the run every `step` until it finishes, checking invariants.
async fn observe_until_finished(run: &RunHandle, step: Duration) -> Vec<RunSnapshot> {
    let mut samples = Vec::new();
    let mut last_overall = 0;
    while !run.is_finished() {
        sleep(step).await;
        let snap = run.snapshot().await;
        assert!(
            snap.overall_progress >= last_overall,
            "overall went from {} to {}",
            last_overall,
            snap.overall_progress
        );
        last_overall = snap.overall_progress;
        assert_invariants(&snap);
        samples.push(snap);
    }
    samples
}

#[tokio::test(start_paused = true)]
async fn test_unsettled_run_completes_on_its_own() {
    let sim = simulator(1);
    let started = Instant::now();
    let run = sim.start(LABEL, &default_stages()).await;

    let initial = run.snapshot().await;
    assert_eq!(initial.stages[0].status, StageStatus::Running);
    assert_eq!(initial.overall_progress, 0);
    assert_eq!(initial.active_stage_index, 0);

    let samples = observe_until_finished(&run, Duration::from_millis(50)).await;
    assert!(samples.len() > 100);

    let took = started.elapsed();
    assert!(took >= Duration::from_secs(20), "finished too early: {:?}", took);
    assert!(took <= Duration::from_secs(33), "finished too late: {:?}", took);

    let done = run.snapshot().await;
    assert_eq!(done.overall_progress, 100);
    assert_eq!(done.phase, RunPhase::Finished);
    assert!(done.settlement.is_none());
    for (stage, def) in done.stages.iter().zip(default_stages().iter()) {
        assert_eq!(stage.status, StageStatus::Completed);
        assert_eq!(stage.messages, def.render_messages(LABEL));
    }
}

#[tokio::test(start_paused = true)]
async fn test_overall_held_below_100_until_the_end() {
    let sim = simulator(2);
    let run = sim.start(LABEL, &default_stages()).await;
    let samples = observe_until_finished(&run, Duration::from_millis(25)).await;
    for snap in &samples {
        let all_done = snap.stages.iter().all(|s| s.status == StageStatus::Completed);
        if !all_done {
            assert!(snap.overall_progress < 100);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_settled_at_start_fast_forwards() {
    let sim = simulator(3);
    let started = Instant::now();
    let run = sim.start(LABEL, &default_stages()).await;
    assert!(sim.notify_real_result_settled(true).await);

    observe_until_finished(&run, Duration::from_millis(10)).await;
    let took = started.elapsed();
    // Four waiting stages at one per 150 ms
    assert!(took <= Duration::from_millis(650), "fast-forward took {:?}", took);

    let done = run.snapshot().await;
    assert_eq!(done.overall_progress, 100);
    assert_eq!(done.settlement, Some(Settlement::Success));
    assert!(!done.failed);
    assert!(done.stages.iter().all(|s| s.status == StageStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn test_settle_mid_stage_keeps_delivered_messages() {
    let sim = simulator(4);
    let run = sim.start(LABEL, &default_stages()).await;
    sleep(Duration::from_millis(2500)).await;

    let before = run.snapshot().await;
    assert_eq!(before.stages[0].status, StageStatus::Running);
    let delivered = before.stages[0].messages.clone();
    assert!(!delivered.is_empty());

    assert!(sim.notify_real_result_settled(true).await);
    run.wait_finished().await;

    let done = run.snapshot().await;
    assert_eq!(done.stages[0].messages, delivered);
    assert_eq!(done.stages[0].progress, 100);
    assert_eq!(done.overall_progress, 100);
    assert_invariants(&done);
}

#[tokio::test(start_paused = true)]
async fn test_settlement_is_idempotent() {
    let sim = simulator(5);
    let run = sim.start(LABEL, &default_stages()).await;
    sleep(Duration::from_millis(1000)).await;

    assert!(sim.notify_real_result_settled(true).await);
    assert!(!sim.notify_real_result_settled(false).await);
    assert!(!sim.notify_real_result_settled(true).await);
    run.wait_finished().await;

    let done = run.snapshot().await;
    assert_eq!(done.settlement, Some(Settlement::Success));
    assert!(!done.failed);

    // Also a no-op once finished
    assert!(!sim.notify_real_result_settled(false).await);
    assert_eq!(run.snapshot().await.settlement, Some(Settlement::Success));
}

#[tokio::test(start_paused = true)]
async fn test_settle_without_run_is_noop() {
    let sim = simulator(6);
    assert!(!sim.notify_real_result_settled(true).await);
    sim.teardown().await;
    sim.teardown().await;
    assert!(sim.active_run().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failure_still_completes_by_default() {
    let sim = simulator(7);
    let run = sim.start(LABEL, &default_stages()).await;
    sleep(Duration::from_millis(7000)).await;
    assert!(sim.notify_real_result_settled(false).await);
    run.wait_finished().await;

    let done = run.snapshot().await;
    assert!(done.failed);
    assert_eq!(done.settlement, Some(Settlement::Failure));
    assert_eq!(done.overall_progress, 100);
    assert!(done.stages.iter().all(|s| s.status == StageStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn test_freeze_policy_stops_on_failure() {
    let settings = PacingSettings {
        failure_policy: FailurePolicy::Freeze,
        ..Default::default()
    };
    let sim = WorkflowSimulator::new(settings).with_rng(StdRng::seed_from_u64(8));
    let run = sim.start(LABEL, &default_stages()).await;
    sleep(Duration::from_millis(2000)).await;
    let before = run.snapshot().await;

    assert!(sim.notify_real_result_settled(false).await);
    run.wait_finished().await;

    let done = run.snapshot().await;
    assert!(done.failed);
    assert_eq!(done.phase, RunPhase::Finished);
    assert_eq!(done.stages[0].status, StageStatus::Error);
    assert!(done.stages[1..].iter().all(|s| s.status == StageStatus::Waiting));
    assert_eq!(done.overall_progress, before.overall_progress);
    assert!(done.overall_progress < 100);
}

#[tokio::test(start_paused = true)]
async fn test_no_mutation_after_teardown() {
    let sim = simulator(9);
    let run = sim.start(LABEL, &default_stages()).await;
    sleep(Duration::from_millis(1200)).await;

    sim.teardown().await;
    let frozen = run.snapshot().await;
    assert!(run.is_torn_down());
    assert_eq!(frozen.phase, RunPhase::TornDown);

    // Past every timer the run ever had
    sleep(Duration::from_secs(60)).await;
    let later = run.snapshot().await;
    assert_eq!(later.overall_progress, frozen.overall_progress);
    assert_eq!(later.active_stage_index, frozen.active_stage_index);
    for (a, b) in later.stages.iter().zip(frozen.stages.iter()) {
        assert_eq!(a.status, b.status);
        assert_eq!(a.progress, b.progress);
        assert_eq!(a.messages, b.messages);
    }

    // Settlement after teardown changes nothing either
    assert!(!sim.notify_real_result_settled(true).await);
    assert!(run.snapshot().await.settlement.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_during_fast_forward() {
    let sim = simulator(10);
    let run = sim.start(LABEL, &default_stages()).await;
    sleep(Duration::from_millis(500)).await;
    sim.notify_real_result_settled(true).await;
    sleep(Duration::from_millis(200)).await;

    sim.teardown().await;
    let frozen = run.snapshot().await;
    assert!(frozen.overall_progress < 100);

    sleep(Duration::from_secs(5)).await;
    let later = run.snapshot().await;
    assert_eq!(later.overall_progress, frozen.overall_progress);
    assert!(!run.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_new_start_tears_down_previous_run() {
    let sim = simulator(11);
    let first = sim.start("First Co", &default_stages()).await;
    sleep(Duration::from_millis(1500)).await;

    let second = sim.start("Second Co", &default_stages()).await;
    assert!(first.is_torn_down());
    assert_ne!(first.run_id(), second.run_id());
    let frozen = first.snapshot().await;

    sleep(Duration::from_secs(3)).await;
    assert_eq!(first.snapshot().await.overall_progress, frozen.overall_progress);
    assert!(second.snapshot().await.overall_progress > 0);

    let active = sim.active_run().await.unwrap();
    assert_eq!(active.run_id(), second.run_id());
}

#[tokio::test(start_paused = true)]
async fn test_event_stream_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sim = simulator(12).with_event_channel(tx);
    let run = sim.start(LABEL, &default_stages()).await;
    sleep(Duration::from_millis(3000)).await;
    sim.notify_real_result_settled(true).await;
    run.wait_finished().await;
    sim.teardown().await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(SimulatorEvent::RunStarted { .. })));
    assert!(matches!(events.last(), Some(SimulatorEvent::RunFinished { failed: false, .. })));
    assert!(events.iter().all(|e| e.run_id() == Some(run.run_id())));

    let started: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            SimulatorEvent::StageStarted { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![0, 1, 2, 3, 4]);

    let completed: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            SimulatorEvent::StageCompleted { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec![0, 1, 2, 3, 4]);

    let settled = events
        .iter()
        .filter(|e| matches!(e, SimulatorEvent::RunSettled { .. }))
        .count();
    assert_eq!(settled, 1);

    let mut last = 0;
    for event in &events {
        if let SimulatorEvent::ProgressUpdated { overall_progress, .. }
        | SimulatorEvent::StageCompleted { overall_progress, .. } = event
        {
            assert!(*overall_progress >= last);
            last = *overall_progress;
        }
    }
    assert_eq!(last, 100);
}

#[tokio::test(start_paused = true)]
async fn test_same_seed_same_pacing() {
    async fn completion_time(seed: u64) -> Duration {
        let sim = simulator(seed);
        let started = Instant::now();
        let run = sim.start(LABEL, &default_stages()).await;
        run.wait_finished().await;
        started.elapsed()
    }
    assert_eq!(completion_time(42).await, completion_time(42).await);
}
