use std::time::Duration;
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use super::plan::RunPlan;
use super::stage::StageDefinition;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Waiting,
    Running,
    Completed,
    Error,
}

impl StageStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub status: StageStatus,
    pub progress: u8,
    pub messages: Vec<String>,
    pub estimated_duration_secs: f64,
    pub complexity_factor: f64,
}

impl Stage {
    pub fn planned_duration(&self) -> Duration {
        Duration::from_secs_f64((self.estimated_duration_secs * self.complexity_factor).max(0.0))
    }
}

/// Outcome of the real request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Settlement {
    Success,
    Failure,
}

impl Settlement {
    pub fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failure }
    }
}

/// Where the run sits between the animation track and the real-result track.
///
/// `Animating` -> `Settling` happens once, on the first settlement. Both
/// `Animating` and `Settling` end in `Finished`. `TornDown` is only ever
/// reported by snapshots of a run whose timers were cancelled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Animating,
    Settling,
    Finished,
    TornDown,
}

impl RunPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Animating => "animating",
            Self::Settling => "settling",
            Self::Finished => "finished",
            Self::TornDown => "torn down",
        }
    }
}

/// Point-in-time copy of a run handed to observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub label: String,
    pub stages: Vec<Stage>,
    pub active_stage_index: usize,
    pub overall_progress: u8,
    pub settlement: Option<Settlement>,
    pub failed: bool,
    pub phase: RunPhase,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub estimated_remaining_ms: u64,
}

impl RunSnapshot {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    pub fn estimated_remaining(&self) -> Duration {
        Duration::from_millis(self.estimated_remaining_ms)
    }

    pub fn running_count(&self) -> usize {
        self.stages.iter().filter(|s| s.status == StageStatus::Running).count()
    }
}

#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: Uuid,
    pub label: String,
    pub stages: Vec<Stage>,
    pub active_stage_index: usize,
    pub overall_progress: u8,
    pub settlement: Option<Settlement>,
    pub failed: bool,
    pub phase: RunPhase,
    pub started_at: DateTime<Utc>,
    /// Monotonic start, for elapsed time.
    pub started: Instant,
    pub tick_count: u32,
    /// Ticks applied to the active stage so far.
    pub active_ticks: u32,
}

impl RunState {
    pub fn new(label: &str, definitions: &[StageDefinition], plan: &RunPlan, tick_count: u32) -> Self {
        let stages = definitions
            .iter()
            .zip(plan.stages.iter())
            .map(|(def, sp)| Stage {
                id: def.id.clone(),
                display_name: def.display_name.clone(),
                description: def.description.clone(),
                status: StageStatus::Waiting,
                progress: 0,
                messages: Vec::new(),
                estimated_duration_secs: def.estimated_duration_secs,
                complexity_factor: sp.complexity_factor,
            })
            .collect::<Vec<_>>();
        let phase = if stages.is_empty() { RunPhase::Finished } else { RunPhase::Animating };
        Self {
            run_id: Uuid::new_v4(),
            label: label.to_string(),
            overall_progress: if stages.is_empty() { 100 } else { 0 },
            stages,
            active_stage_index: 0,
            settlement: None,
            failed: false,
            phase,
            started_at: Utc::now(),
            started: Instant::now(),
            tick_count: tick_count.max(1),
            active_ticks: 0,
        }
    }

    pub fn is_real_result_ready(&self) -> bool {
        self.settlement.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == RunPhase::Finished
    }

    pub fn all_completed(&self) -> bool {
        self.stages.iter().all(|s| s.status == StageStatus::Completed)
    }

    pub fn running_index(&self) -> Option<usize> {
        self.stages.iter().position(|s| s.status == StageStatus::Running)
    }

    pub fn next_waiting(&self) -> Option<usize> {
        self.stages.iter().position(|s| s.status == StageStatus::Waiting)
    }

    pub fn begin_stage(&mut self, index: usize) -> bool {
        if self.is_finished() || self.running_index().is_some() {
            return false;
        }
        let Some(stage) = self.stages.get_mut(index) else {
            return false;
        };
        if stage.status != StageStatus::Waiting {
            return false;
        }
        stage.status = StageStatus::Running;
        stage.progress = 0;
        self.active_stage_index = index;
        self.active_ticks = 0;
        true
    }

    /// Append message `message_index` of the running stage. Only the next
    /// message in sequence is accepted, so `messages` is always a prefix of
    /// the rendered templates.
    pub fn append_message(&mut self, index: usize, message_index: usize, message: &str) -> bool {
        match self.stages.get_mut(index) {
            Some(stage)
                if stage.status == StageStatus::Running && stage.messages.len() == message_index =>
            {
                stage.messages.push(message.to_string());
                true
            }
            _ => false,
        }
    }

    /// Apply one progress tick to the running stage. Returns true when this
    /// was the stage's final tick.
    pub fn apply_tick(&mut self, index: usize) -> bool {
        if self.running_index() != Some(index) {
            return false;
        }
        self.active_ticks = (self.active_ticks + 1).min(self.tick_count);
        let progress = (self.active_ticks as f64 * 100.0 / self.tick_count as f64).round() as u8;
        if let Some(stage) = self.stages.get_mut(index) {
            stage.progress = stage.progress.max(progress.min(100));
        }
        self.recompute_overall();
        self.active_ticks == self.tick_count
    }

    pub fn complete_stage(&mut self, index: usize) -> bool {
        let Some(stage) = self.stages.get_mut(index) else {
            return false;
        };
        if stage.status != StageStatus::Running {
            return false;
        }
        stage.status = StageStatus::Completed;
        stage.progress = 100;
        self.active_ticks = self.tick_count;
        self.recompute_overall();
        if self.all_completed() {
            self.overall_progress = 100;
            self.phase = RunPhase::Finished;
        }
        true
    }

    /// Record the real result. Only the first call on an unfinished run is
    /// accepted.
    pub fn settle(&mut self, settlement: Settlement) -> bool {
        if self.settlement.is_some() || self.is_finished() {
            return false;
        }
        self.settlement = Some(settlement);
        self.failed = settlement == Settlement::Failure;
        self.phase = RunPhase::Settling;
        true
    }

    /// Complete the running stage on the spot, keeping whatever messages it
    /// already has. Returns the index that was completed.
    pub fn force_complete_active(&mut self) -> Option<usize> {
        let index = self.running_index()?;
        self.complete_stage(index);
        Some(index)
    }

    /// Complete the next waiting stage in one step. Never leaves two stages
    /// running since the previous stage is already done.
    pub fn fast_forward_next(&mut self) -> Option<usize> {
        let index = self.next_waiting()?;
        if !self.begin_stage(index) {
            return None;
        }
        self.complete_stage(index);
        Some(index)
    }

    /// Stop the animation where it stands, marking the running stage as
    /// errored. Used by the freeze failure policy.
    pub fn freeze(&mut self) -> Option<usize> {
        let index = self.running_index();
        if let Some(i) = index {
            self.stages[i].status = StageStatus::Error;
        }
        self.phase = RunPhase::Finished;
        index
    }

    fn recompute_overall(&mut self) {
        if self.stages.is_empty() {
            self.overall_progress = 100;
            return;
        }
        let weight = 100.0 / self.stages.len() as f64;
        let sum: f64 = self
            .stages
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let fraction = match s.status {
                    StageStatus::Completed => 1.0,
                    StageStatus::Running if i == self.active_stage_index => {
                        self.active_ticks as f64 / self.tick_count as f64
                    }
                    _ => 0.0,
                };
                weight * fraction
            })
            .sum();
        let mut overall = sum.round().clamp(0.0, 100.0) as u8;
        if !self.all_completed() {
            overall = overall.min(99);
        }
        // Never regress within a run
        self.overall_progress = self.overall_progress.max(overall);
    }

    pub fn snapshot(&self, torn_down: bool) -> RunSnapshot {
        let phase = if torn_down && !self.is_finished() { RunPhase::TornDown } else { self.phase };
        RunSnapshot {
            run_id: self.run_id,
            label: self.label.clone(),
            stages: self.stages.clone(),
            active_stage_index: self.active_stage_index,
            overall_progress: self.overall_progress,
            settlement: self.settlement,
            failed: self.failed,
            phase,
            started_at: self.started_at,
            elapsed_ms: self.elapsed().as_millis() as u64,
            estimated_remaining_ms: self.estimated_remaining().as_millis() as u64,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Planned animation time left, ignoring inter-stage pauses.
    pub fn estimated_remaining(&self) -> Duration {
        if self.is_finished() {
            return Duration::ZERO;
        }
        self.stages
            .iter()
            .map(|s| match s.status {
                StageStatus::Waiting => s.planned_duration(),
                StageStatus::Running => {
                    let left = 1.0 - self.active_ticks as f64 / self.tick_count as f64;
                    s.planned_duration().mul_f64(left.clamp(0.0, 1.0))
                }
                _ => Duration::ZERO,
            })
            .sum()
    }
}
