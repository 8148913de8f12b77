use tokio::sync::mpsc;
use tracing::info;

use crate::cli::context::AppContext;
use crate::errors::HyperMailError;
use crate::repl::ReplSession;

pub async fn handle_start(ctx: &AppContext) -> Result<(), HyperMailError> {
    info!(base_url = %ctx.config.base_url(), "Starting interactive session");
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let coordinator = ctx.coordinator(Some(event_tx))?;
    ReplSession::new(coordinator, event_rx).run().await
}
