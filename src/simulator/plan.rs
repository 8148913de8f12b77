use std::time::Duration;
use rand::Rng;
use crate::config::{FailurePolicy, SimulatorConfig};
use super::stage::StageDefinition;

pub const DEFAULT_TICK_COUNT: u32 = 20;
pub const DEFAULT_JITTER: f64 = 0.2;
pub const DEFAULT_COMPLEXITY: (f64, f64) = (0.8, 1.2);
pub const DEFAULT_INTER_STAGE_DELAY_MS: (u64, u64) = (200, 600);
pub const DEFAULT_FAST_FORWARD_MS: u64 = 150;

/// Knobs that shape how a run is paced.
#[derive(Debug, Clone, PartialEq)]
pub struct PacingSettings {
    pub tick_count: u32,
    /// Fraction of the nominal message interval each message may drift by.
    pub jitter: f64,
    pub complexity: (f64, f64),
    pub inter_stage_delay: (Duration, Duration),
    pub fast_forward_interval: Duration,
    pub failure_policy: FailurePolicy,
    pub seed: Option<u64>,
}

impl Default for PacingSettings {
    fn default() -> Self {
        Self {
            tick_count: DEFAULT_TICK_COUNT,
            jitter: DEFAULT_JITTER,
            complexity: DEFAULT_COMPLEXITY,
            inter_stage_delay: (
                Duration::from_millis(DEFAULT_INTER_STAGE_DELAY_MS.0),
                Duration::from_millis(DEFAULT_INTER_STAGE_DELAY_MS.1),
            ),
            fast_forward_interval: Duration::from_millis(DEFAULT_FAST_FORWARD_MS),
            failure_policy: FailurePolicy::Complete,
            seed: None,
        }
    }
}

impl PacingSettings {
    pub fn from_config(config: Option<&SimulatorConfig>) -> Self {
        let defaults = Self::default();
        let Some(cfg) = config else {
            return defaults;
        };
        Self {
            tick_count: cfg.tick_count.unwrap_or(defaults.tick_count).max(1),
            jitter: cfg.jitter.unwrap_or(defaults.jitter),
            complexity: cfg
                .complexity
                .map(|r| (r.min, r.max))
                .unwrap_or(defaults.complexity),
            inter_stage_delay: cfg
                .inter_stage_delay_ms
                .map(|r| (Duration::from_millis(r.min), Duration::from_millis(r.max)))
                .unwrap_or(defaults.inter_stage_delay),
            fast_forward_interval: cfg
                .fast_forward_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.fast_forward_interval),
            failure_policy: cfg.failure_policy.unwrap_or_default(),
            seed: cfg.seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    /// Append the message at this template index.
    Message(usize),
    /// Progress tick, 1-based.
    Tick(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Offset from the moment the stage started.
    pub offset: Duration,
    pub event: StageEvent,
}

#[derive(Debug, Clone)]
pub struct StagePlan {
    pub complexity_factor: f64,
    pub duration: Duration,
    pub messages: Vec<String>,
    /// Messages and ticks merged by offset. Messages sort ahead of a tick that
    /// lands on the same instant.
    pub events: Vec<ScheduledEvent>,
    /// Pause before the next stage starts; zero for the last stage.
    pub delay_after: Duration,
}

/// Every random decision for one run, rolled up front.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub stages: Vec<StagePlan>,
}

impl RunPlan {
    pub fn generate<R: Rng + ?Sized>(
        definitions: &[StageDefinition],
        label: &str,
        settings: &PacingSettings,
        rng: &mut R,
    ) -> Self {
        let last = definitions.len().saturating_sub(1);
        let stages = definitions
            .iter()
            .enumerate()
            .map(|(i, def)| {
                let (lo, hi) = settings.complexity;
                let complexity_factor = rng.gen_range(lo..=hi);
                let duration = Duration::from_secs_f64(
                    (def.estimated_duration_secs * complexity_factor).max(0.0),
                );
                let messages = def.render_messages(label);
                let events = schedule_events(messages.len(), duration, settings, rng);
                let delay_after = if i == last {
                    Duration::ZERO
                } else {
                    let (min, max) = settings.inter_stage_delay;
                    Duration::from_millis(rng.gen_range(min.as_millis() as u64..=max.as_millis() as u64))
                };
                StagePlan {
                    complexity_factor,
                    duration,
                    messages,
                    events,
                    delay_after,
                }
            })
            .collect();
        Self { stages }
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration + s.delay_after).sum()
    }
}

fn schedule_events<R: Rng + ?Sized>(
    message_count: usize,
    duration: Duration,
    settings: &PacingSettings,
    rng: &mut R,
) -> Vec<ScheduledEvent> {
    let mut events = Vec::with_capacity(message_count + settings.tick_count as usize);

    // Messages: first one as the stage opens, the rest on a jittered even grid.
    // Offsets stay strictly increasing and strictly before the final tick.
    if message_count > 0 {
        let slot = duration.as_secs_f64() / message_count as f64;
        let ceiling = duration.saturating_sub(Duration::from_millis(1));
        let mut prev: Option<Duration> = None;
        for k in 0..message_count {
            let nominal = if k == 0 {
                0.0
            } else {
                let drift = rng.gen_range(-settings.jitter..=settings.jitter);
                slot * (k as f64 + drift)
            };
            let mut offset = Duration::from_secs_f64(nominal.max(0.0)).min(ceiling);
            if let Some(p) = prev {
                if offset <= p {
                    offset = p + Duration::from_millis(1);
                }
            }
            prev = Some(offset);
            events.push(ScheduledEvent { offset, event: StageEvent::Message(k) });
        }
    }

    let ticks = settings.tick_count.max(1);
    for t in 1..=ticks {
        let offset = if t == ticks {
            duration
        } else {
            duration.mul_f64(t as f64 / ticks as f64)
        };
        events.push(ScheduledEvent { offset, event: StageEvent::Tick(t) });
    }

    // Stable sort keeps messages ahead of ticks sharing an offset
    events.sort_by_key(|e| e.offset);
    events
}
