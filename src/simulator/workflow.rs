use std::sync::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::mpsc;
use tracing::debug;

use crate::repl::events::SimulatorEvent;
use super::plan::{PacingSettings, RunPlan};
use super::run::{ActiveRun, RunHandle};
use super::stage::StageDefinition;

/// Animates a multi-stage pipeline while one real request is in flight.
///
/// Holds at most one live run. Starting a new run tears the previous one down
/// first, and `teardown` must be called when the view showing the run closes.
pub struct WorkflowSimulator {
    settings: PacingSettings,
    rng: Mutex<Box<dyn RngCore + Send>>,
    active: tokio::sync::Mutex<Option<ActiveRun>>,
    event_tx: Option<mpsc::UnboundedSender<SimulatorEvent>>,
}

impl WorkflowSimulator {
    pub fn new(settings: PacingSettings) -> Self {
        let rng: Box<dyn RngCore + Send> = match settings.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };
        Self {
            settings,
            rng: Mutex::new(rng),
            active: tokio::sync::Mutex::new(None),
            event_tx: None,
        }
    }

    /// Replace the random source used to pace runs.
    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    /// Attach an event channel for streaming run events to a renderer.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<SimulatorEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn settings(&self) -> &PacingSettings {
        &self.settings
    }

    pub async fn start(&self, label: &str, definitions: &[StageDefinition]) -> RunHandle {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            debug!(run_id = %previous.handle.run_id(), "Tearing down previous run");
            previous.shutdown().await;
        }

        let plan = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            RunPlan::generate(definitions, label, &self.settings, &mut **rng)
        };

        let run = ActiveRun::launch(label, definitions, plan, &self.settings, self.event_tx.clone());
        let handle = run.handle.clone();
        *active = Some(run);
        handle
    }

    /// Tell the live run the real request has come back. Returns whether the
    /// signal was taken; repeat calls and calls with no unfinished run are
    /// ignored.
    pub async fn notify_real_result_settled(&self, success: bool) -> bool {
        let active = self.active.lock().await;
        match active.as_ref() {
            Some(run) => run.handle.settle(success).await,
            None => {
                debug!("Settlement with no active run");
                false
            }
        }
    }

    /// Cancel every pending timer of the live run, finished or not.
    pub async fn teardown(&self) {
        let mut active = self.active.lock().await;
        if let Some(run) = active.take() {
            run.shutdown().await;
        }
    }

    pub async fn active_run(&self) -> Option<RunHandle> {
        self.active.lock().await.as_ref().map(|r| r.handle.clone())
    }
}

impl Default for WorkflowSimulator {
    fn default() -> Self {
        Self::new(PacingSettings::default())
    }
}
