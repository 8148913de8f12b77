use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::backend::HttpBackend;
use crate::cli::commands::Cli;
use crate::config::{self, HyperMailConfig};
use crate::coordinator::RequestCoordinator;
use crate::errors::HyperMailError;
use crate::repl::events::SimulatorEvent;
use crate::simulator::{stages_from_config, PacingSettings, StageDefinition, WorkflowSimulator};

/// Effective settings for one invocation: config file plus CLI overrides.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    pub config: HyperMailConfig,
    pub quiet: bool,
}

impl AppContext {
    pub async fn load(cli: &Cli) -> Result<Self, HyperMailError> {
        let mut config = match &cli.config {
            Some(path) => config::parse_config(path).await?,
            None => HyperMailConfig::default(),
        };
        apply_overrides(&mut config, cli.base_url.as_deref(), cli.seed);
        debug!(base_url = %config.base_url(), "Configuration loaded");
        Ok(Self { config, quiet: cli.quiet })
    }

    pub fn pacing(&self) -> PacingSettings {
        PacingSettings::from_config(self.config.simulator.as_ref())
    }

    pub fn stages(&self) -> Vec<StageDefinition> {
        let custom = self
            .config
            .simulator
            .as_ref()
            .and_then(|s| s.stages.as_deref());
        stages_from_config(custom)
    }

    pub fn backend(&self) -> Result<HttpBackend, HyperMailError> {
        HttpBackend::new(
            &self.config.base_url(),
            Duration::from_secs(self.config.timeout_secs()),
        )
    }

    pub fn simulator(&self, events: Option<mpsc::UnboundedSender<SimulatorEvent>>) -> WorkflowSimulator {
        let simulator = WorkflowSimulator::new(self.pacing());
        match events {
            Some(tx) => simulator.with_event_channel(tx),
            None => simulator,
        }
    }

    pub fn coordinator(
        &self,
        events: Option<mpsc::UnboundedSender<SimulatorEvent>>,
    ) -> Result<Arc<RequestCoordinator>, HyperMailError> {
        Ok(Arc::new(RequestCoordinator::new(
            Arc::new(self.backend()?),
            self.simulator(events),
            self.stages(),
            self.config.sender.clone(),
        )))
    }
}

fn apply_overrides(config: &mut HyperMailConfig, base_url: Option<&str>, seed: Option<u64>) {
    if let Some(url) = base_url {
        config.backend.get_or_insert_with(Default::default).base_url = Some(url.to_string());
    }
    if let Some(seed) = seed {
        config.simulator.get_or_insert_with(Default::default).seed = Some(seed);
    }
}

/// Read a file the user pointed at, e.g. an email body.
pub async fn read_text_file(path: &Path) -> Result<String, HyperMailError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        HyperMailError::Config(format!("Cannot read {}: {}", path.display(), e))
    })
}
