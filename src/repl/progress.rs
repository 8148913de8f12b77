use std::sync::Arc;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use console::style;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::backend::GeneratedEmail;
use crate::coordinator::{RequestCoordinator, GENERATE_ABANDONED_MESSAGE};
use crate::errors::HyperMailError;
use crate::repl::events::SimulatorEvent;
use crate::repl::renderer::{render_event, render_info};

const OVERALL_TEMPLATE: &str = "  {bar:30.cyan/dark_gray} {pos:>3}% | {msg}";
const STAGE_TEMPLATE: &str = "    {prefix:<30} {bar:20.green/dark_gray} {pos:>3}% {msg}";

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

/// Live view of one workflow run: an overall bar plus a bar per stage.
pub struct GenerationProgress {
    multi: MultiProgress,
    run_id: Option<Uuid>,
    overall: Option<ProgressBar>,
    stage_bars: Vec<ProgressBar>,
    finished: Option<bool>,
}

impl GenerationProgress {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// No drawing at all; state is still tracked.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            run_id: None,
            overall: None,
            stage_bars: Vec::new(),
            finished: None,
        }
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// `Some(failed)` once the run reported it finished.
    pub fn finished(&self) -> Option<bool> {
        self.finished
    }

    pub fn overall_position(&self) -> u64 {
        self.overall.as_ref().map(|b| b.position()).unwrap_or(0)
    }

    pub fn stage_position(&self, index: usize) -> Option<u64> {
        self.stage_bars.get(index).map(|b| b.position())
    }

    /// Handle a simulator event and update the bars. Events from any run
    /// other than the one being shown are dropped.
    pub fn handle_event(&mut self, event: &SimulatorEvent) {
        if let SimulatorEvent::RunStarted { run_id, label, stage_names } = event {
            self.clear();
            self.start_run(*run_id, label, stage_names);
            return;
        }
        if let Some(id) = event.run_id() {
            if Some(id) != self.run_id {
                return;
            }
        }

        match event {
            SimulatorEvent::StageStarted { index, .. } => {
                if let Some(bar) = self.stage_bars.get(*index) {
                    bar.set_position(0);
                    bar.set_message(style("running").yellow().to_string());
                }
            }
            SimulatorEvent::MessageAppended { index, message, .. } => {
                if let Some(bar) = self.stage_bars.get(*index) {
                    bar.set_message(style(message).dim().to_string());
                }
            }
            SimulatorEvent::ProgressUpdated { index, stage_progress, overall_progress, .. } => {
                if let Some(bar) = self.stage_bars.get(*index) {
                    bar.set_position(*stage_progress as u64);
                }
                self.set_overall(*overall_progress);
            }
            SimulatorEvent::StageCompleted { index, overall_progress, .. } => {
                if let Some(bar) = self.stage_bars.get(*index) {
                    bar.set_position(100);
                    bar.finish_with_message(style("✓").green().to_string());
                }
                self.set_overall(*overall_progress);
            }
            SimulatorEvent::StageErrored { index, .. } => {
                if let Some(bar) = self.stage_bars.get(*index) {
                    bar.abandon_with_message(style("✗").red().to_string());
                }
            }
            SimulatorEvent::RunSettled { success, .. } => {
                if let Some(bar) = &self.overall {
                    let msg = if *success { "finishing up" } else { "request failed, finishing up" };
                    bar.set_message(msg);
                }
            }
            SimulatorEvent::RunFinished { failed, .. } => {
                self.finished = Some(*failed);
                if let Some(bar) = &self.overall {
                    if *failed {
                        bar.abandon_with_message(style("Workflow ended with an error").red().to_string());
                    } else {
                        bar.set_position(100);
                        bar.finish_with_message(style("Workflow complete").green().to_string());
                    }
                }
            }
            SimulatorEvent::Log { .. } => self.println(&render_event(event)),
            SimulatorEvent::RunStarted { .. } => {}
        }
    }

    fn start_run(&mut self, run_id: Uuid, label: &str, stage_names: &[String]) {
        self.run_id = Some(run_id);
        self.finished = None;

        let overall = self.multi.add(ProgressBar::new(100));
        overall.set_style(bar_style(OVERALL_TEMPLATE));
        overall.set_message(format!("Generating email for {}", label));
        self.overall = Some(overall);

        for name in stage_names {
            let bar = self.multi.add(ProgressBar::new(100));
            bar.set_style(bar_style(STAGE_TEMPLATE));
            bar.set_prefix(name.clone());
            bar.set_message(style("waiting").dim().to_string());
            self.stage_bars.push(bar);
        }
    }

    fn set_overall(&self, overall_progress: u8) {
        if let Some(bar) = &self.overall {
            // Bars only move forward
            if overall_progress as u64 > bar.position() {
                bar.set_position(overall_progress as u64);
            }
        }
    }

    /// Remove every bar, e.g. when the view is closed.
    pub fn clear(&mut self) {
        for bar in self.stage_bars.drain(..) {
            bar.finish_and_clear();
        }
        if let Some(bar) = self.overall.take() {
            bar.finish_and_clear();
        }
        let _ = self.multi.clear();
        self.run_id = None;
    }

    /// Print a line through the multi-progress (won't interfere with bars).
    pub fn println(&self, msg: &str) {
        let _ = self.multi.println(msg);
    }
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate an email while `progress` shows the workflow run. The view closes
/// once the run finishes, or on Ctrl-C when `allow_dismiss` is set, after which
/// the request is still awaited. A second Ctrl-C abandons the request.
pub async fn watch_generation(
    coordinator: &Arc<RequestCoordinator>,
    company: &str,
    event_rx: &mut mpsc::UnboundedReceiver<SimulatorEvent>,
    progress: &mut GenerationProgress,
    allow_dismiss: bool,
) -> Result<Result<GeneratedEmail, HyperMailError>, HyperMailError> {
    let request_coordinator = coordinator.clone();
    let company = company.to_string();
    let mut request = tokio::spawn(async move { request_coordinator.generate_email(&company).await });

    let mut result = None;
    let mut interrupts = 0u8;
    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => {
                    let done = matches!(event, SimulatorEvent::RunFinished { .. });
                    progress.handle_event(&event);
                    if done && result.is_some() {
                        break;
                    }
                }
                None => {
                    if result.is_some() {
                        break;
                    }
                }
            },
            joined = &mut request, if result.is_none() => {
                let outcome = joined
                    .map_err(|e| HyperMailError::Internal(format!("Generation task failed: {}", e)))?;
                result = Some(outcome);
                if run_is_over(coordinator).await {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c(), if allow_dismiss && interrupts < 2 => {
                if signal.is_ok() {
                    interrupts += 1;
                    if interrupts == 1 {
                        coordinator.close_progress_view().await;
                        progress.clear();
                        if result.is_some() {
                            break;
                        }
                        progress.println(&render_info(
                            "Progress view closed, waiting for the backend (Ctrl-C again to abandon)...",
                        ));
                    } else {
                        request.abort();
                        coordinator.abandon_generation().await;
                        result = Some(Err(HyperMailError::Internal(
                            GENERATE_ABANDONED_MESSAGE.to_string(),
                        )));
                        break;
                    }
                }
            }
        }
    }

    // Whatever is still queued belongs to the run that just ended
    while let Ok(event) = event_rx.try_recv() {
        progress.handle_event(&event);
    }
    coordinator.close_progress_view().await;
    debug!("Progress view closed");

    result.ok_or_else(|| HyperMailError::Internal("generation ended without a result".into()))
}

async fn run_is_over(coordinator: &RequestCoordinator) -> bool {
    match coordinator.active_run().await {
        Some(run) => run.is_finished() || run.is_torn_down(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(progress: &mut GenerationProgress) -> Uuid {
        let run_id = Uuid::new_v4();
        progress.handle_event(&SimulatorEvent::RunStarted {
            run_id,
            label: "Acme".into(),
            stage_names: vec!["Company Researcher".into(), "Email Composer".into()],
        });
        run_id
    }

    #[test]
    fn test_tracks_progress_events() {
        let mut progress = GenerationProgress::hidden();
        let run_id = started(&mut progress);
        progress.handle_event(&SimulatorEvent::ProgressUpdated {
            run_id,
            index: 0,
            stage_progress: 40,
            overall_progress: 20,
        });
        assert_eq!(progress.stage_position(0), Some(40));
        assert_eq!(progress.overall_position(), 20);

        progress.handle_event(&SimulatorEvent::StageCompleted {
            run_id,
            index: 0,
            display_name: "Company Researcher".into(),
            overall_progress: 50,
        });
        assert_eq!(progress.stage_position(0), Some(100));
        assert_eq!(progress.overall_position(), 50);
    }

    #[test]
    fn test_ignores_events_from_other_runs() {
        let mut progress = GenerationProgress::hidden();
        started(&mut progress);
        progress.handle_event(&SimulatorEvent::ProgressUpdated {
            run_id: Uuid::new_v4(),
            index: 0,
            stage_progress: 90,
            overall_progress: 45,
        });
        assert_eq!(progress.stage_position(0), Some(0));
        assert_eq!(progress.overall_position(), 0);
    }

    #[test]
    fn test_overall_never_moves_back() {
        let mut progress = GenerationProgress::hidden();
        let run_id = started(&mut progress);
        for overall in [30, 10] {
            progress.handle_event(&SimulatorEvent::ProgressUpdated {
                run_id,
                index: 0,
                stage_progress: 60,
                overall_progress: overall,
            });
        }
        assert_eq!(progress.overall_position(), 30);
    }

    #[test]
    fn test_finish_and_clear() {
        let mut progress = GenerationProgress::hidden();
        let run_id = started(&mut progress);
        progress.handle_event(&SimulatorEvent::RunFinished { run_id, failed: true });
        assert_eq!(progress.finished(), Some(true));
        progress.clear();
        assert!(progress.run_id().is_none());
        assert_eq!(progress.stage_position(0), None);
    }
}
