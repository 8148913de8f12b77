use std::path::PathBuf;

use crate::cli::commands::ValidateArgs;
use crate::config::{self, FailurePolicy};
use crate::errors::HyperMailError;
use crate::repl::renderer;
use crate::simulator::stages_from_config;

pub async fn handle_validate(args: ValidateArgs, global: Option<PathBuf>) -> Result<(), HyperMailError> {
    let path = args
        .path
        .or(global)
        .ok_or_else(|| HyperMailError::Config("No config file given; pass a path or --config".into()))?;
    let config = config::parse_config(&path).await?;

    let simulator = config.simulator.as_ref();
    let stages = stages_from_config(simulator.and_then(|s| s.stages.as_deref()));
    let policy = simulator.and_then(|s| s.failure_policy).unwrap_or(FailurePolicy::Complete);

    println!("{}", renderer::render_success(&format!("Configuration is valid: {}", path.display())));
    println!(
        "{}",
        renderer::render_info(&format!(
            "  backend {} (timeout {}s), {} stages, failure policy {}",
            config.base_url(),
            config.timeout_secs(),
            stages.len(),
            policy,
        ))
    );
    Ok(())
}
