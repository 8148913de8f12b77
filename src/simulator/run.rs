use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::FailurePolicy;
use crate::repl::events::SimulatorEvent;
use super::plan::{PacingSettings, RunPlan, StageEvent};
use super::stage::StageDefinition;
use super::state::{RunSnapshot, RunState, Settlement};

struct RunShared {
    run_id: Uuid,
    state: RwLock<RunState>,
    /// Teardown. Once cancelled, `state` is never written again.
    cancel: CancellationToken,
    /// One-shot signal from the real-result track.
    settled: CancellationToken,
    /// Fires when the run reaches `Finished`.
    finished: CancellationToken,
    event_tx: Option<mpsc::UnboundedSender<SimulatorEvent>>,
}

impl RunShared {
    fn emit(&self, event: SimulatorEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    fn finish(&self, failed: bool) {
        info!(run_id = %self.run_id, failed, "Workflow run finished");
        self.emit(SimulatorEvent::RunFinished { run_id: self.run_id, failed });
        self.finished.cancel();
    }

    fn stage_name(state: &RunState, index: usize) -> String {
        state
            .stages
            .get(index)
            .map(|s| s.display_name.clone())
            .unwrap_or_default()
    }
}

/// Read-only view of a live run, cheap to clone.
#[derive(Clone)]
pub struct RunHandle {
    shared: Arc<RunShared>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.shared.run_id
    }

    pub async fn snapshot(&self) -> RunSnapshot {
        let state = self.shared.state.read().await;
        state.snapshot(self.shared.cancel.is_cancelled())
    }

    pub async fn overall_progress(&self) -> u8 {
        self.shared.state.read().await.overall_progress
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.is_cancelled()
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Resolves once the run finishes or is torn down.
    pub async fn wait_finished(&self) {
        tokio::select! {
            _ = self.shared.finished.cancelled() => {}
            _ = self.shared.cancel.cancelled() => {}
        }
    }

    pub(crate) async fn settle(&self, success: bool) -> bool {
        let settlement = Settlement::from_success(success);
        let mut state = self.shared.state.write().await;
        if self.shared.cancel.is_cancelled() || !state.settle(settlement) {
            debug!(run_id = %self.shared.run_id, "Settlement ignored");
            return false;
        }
        info!(run_id = %self.shared.run_id, success, "Real result settled");
        self.shared.emit(SimulatorEvent::RunSettled { run_id: self.shared.run_id, success });
        self.shared.settled.cancel();
        true
    }
}

/// A run plus the task animating it. Dropping it stops the task.
pub(crate) struct ActiveRun {
    pub(crate) handle: RunHandle,
    task: JoinHandle<()>,
}

impl ActiveRun {
    pub(crate) fn launch(
        label: &str,
        definitions: &[StageDefinition],
        plan: RunPlan,
        settings: &PacingSettings,
        event_tx: Option<mpsc::UnboundedSender<SimulatorEvent>>,
    ) -> Self {
        let mut state = RunState::new(label, definitions, &plan, settings.tick_count);
        let run_id = state.run_id;
        let stage_names = state.stages.iter().map(|s| s.display_name.clone()).collect();
        // Stage 0 is running before anyone can observe the run
        let first_started = state.begin_stage(0);
        let already_finished = state.is_finished();

        let shared = Arc::new(RunShared {
            run_id,
            state: RwLock::new(state),
            cancel: CancellationToken::new(),
            settled: CancellationToken::new(),
            finished: CancellationToken::new(),
            event_tx,
        });

        shared.emit(SimulatorEvent::RunStarted {
            run_id,
            label: label.to_string(),
            stage_names,
        });
        if first_started {
            if let Some(def) = definitions.first() {
                shared.emit(SimulatorEvent::StageStarted {
                    run_id,
                    index: 0,
                    display_name: def.display_name.clone(),
                });
            }
        }
        if already_finished {
            shared.finish(false);
        }

        info!(
            run_id = %run_id,
            label,
            stages = definitions.len(),
            planned_ms = plan.total_duration().as_millis() as u64,
            "Workflow run started"
        );

        let task = tokio::spawn(drive(shared.clone(), plan, settings.clone()));
        Self {
            handle: RunHandle { shared },
            task,
        }
    }

    /// Cancel every pending timer and wait out any in-flight mutation.
    pub(crate) async fn shutdown(self) {
        let shared = self.handle.shared.clone();
        shared.cancel.cancel();
        self.task.abort();
        let _guard = shared.state.write().await;
        debug!(run_id = %shared.run_id, "Workflow run torn down");
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.handle.shared.cancel.cancel();
        self.task.abort();
    }
}

enum Wake {
    Elapsed,
    Settled,
    Cancelled,
}

async fn wait_for<F: Future<Output = ()>>(shared: &RunShared, timer: F) -> Wake {
    tokio::select! {
        biased;
        _ = shared.cancel.cancelled() => Wake::Cancelled,
        _ = shared.settled.cancelled() => Wake::Settled,
        _ = timer => Wake::Elapsed,
    }
}

/// Animation track: walk each stage's schedule in order, handing over to the
/// settle path the moment the real result lands.
async fn drive(shared: Arc<RunShared>, plan: RunPlan, settings: PacingSettings) {
    let run_id = shared.run_id;
    for (index, stage_plan) in plan.stages.iter().enumerate() {
        if index > 0 {
            let mut state = shared.state.write().await;
            if shared.cancel.is_cancelled() {
                return;
            }
            if state.is_real_result_ready() {
                drop(state);
                return settle(&shared, &settings).await;
            }
            if state.begin_stage(index) {
                debug!(run_id = %run_id, stage = index, "Stage started");
                shared.emit(SimulatorEvent::StageStarted {
                    run_id,
                    index,
                    display_name: RunShared::stage_name(&state, index),
                });
            }
        }

        let stage_start = Instant::now();
        for scheduled in &stage_plan.events {
            match wait_for(&shared, sleep_until(stage_start + scheduled.offset)).await {
                Wake::Cancelled => return,
                Wake::Settled => return settle(&shared, &settings).await,
                Wake::Elapsed => {}
            }

            let mut state = shared.state.write().await;
            if shared.cancel.is_cancelled() {
                return;
            }
            if state.is_real_result_ready() {
                drop(state);
                return settle(&shared, &settings).await;
            }

            match scheduled.event {
                StageEvent::Message(k) => {
                    let Some(message) = stage_plan.messages.get(k) else {
                        continue;
                    };
                    if state.append_message(index, k, message) {
                        shared.emit(SimulatorEvent::MessageAppended {
                            run_id,
                            index,
                            message: message.clone(),
                        });
                    }
                }
                StageEvent::Tick(_) => {
                    let last_tick = state.apply_tick(index);
                    shared.emit(SimulatorEvent::ProgressUpdated {
                        run_id,
                        index,
                        stage_progress: state.stages[index].progress,
                        overall_progress: state.overall_progress,
                    });
                    if last_tick && state.complete_stage(index) {
                        debug!(run_id = %run_id, stage = index, "Stage completed");
                        shared.emit(SimulatorEvent::StageCompleted {
                            run_id,
                            index,
                            display_name: RunShared::stage_name(&state, index),
                            overall_progress: state.overall_progress,
                        });
                        if state.is_finished() {
                            shared.finish(state.failed);
                            return;
                        }
                    }
                }
            }
        }

        if !stage_plan.delay_after.is_zero() {
            match wait_for(&shared, sleep(stage_plan.delay_after)).await {
                Wake::Cancelled => return,
                Wake::Settled => return settle(&shared, &settings).await,
                Wake::Elapsed => {}
            }
        }
    }
}

/// Real-result track: close the running stage, then complete the rest one
/// per fast-forward interval.
async fn settle(shared: &RunShared, settings: &PacingSettings) {
    let run_id = shared.run_id;
    {
        let mut state = shared.state.write().await;
        if shared.cancel.is_cancelled() || state.is_finished() {
            return;
        }

        if state.settlement == Some(Settlement::Failure)
            && settings.failure_policy == FailurePolicy::Freeze
        {
            if let Some(index) = state.freeze() {
                shared.emit(SimulatorEvent::StageErrored {
                    run_id,
                    index,
                    display_name: RunShared::stage_name(&state, index),
                });
            }
            shared.finish(true);
            return;
        }

        if let Some(index) = state.force_complete_active() {
            debug!(run_id = %run_id, stage = index, "Stage force-completed");
            shared.emit(SimulatorEvent::StageCompleted {
                run_id,
                index,
                display_name: RunShared::stage_name(&state, index),
                overall_progress: state.overall_progress,
            });
        }
        if state.is_finished() {
            shared.finish(state.failed);
            return;
        }
    }

    loop {
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => return,
            _ = sleep(settings.fast_forward_interval) => {}
        }

        let mut state = shared.state.write().await;
        if shared.cancel.is_cancelled() {
            return;
        }
        let Some(index) = state.fast_forward_next() else {
            return;
        };
        let display_name = RunShared::stage_name(&state, index);
        shared.emit(SimulatorEvent::StageStarted {
            run_id,
            index,
            display_name: display_name.clone(),
        });
        shared.emit(SimulatorEvent::StageCompleted {
            run_id,
            index,
            display_name,
            overall_progress: state.overall_progress,
        });
        if state.is_finished() {
            shared.finish(state.failed);
            return;
        }
    }
}
