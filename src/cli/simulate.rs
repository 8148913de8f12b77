use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::commands::SimulateArgs;
use crate::cli::context::AppContext;
use crate::errors::HyperMailError;
use crate::repl::events::SimulatorEvent;
use crate::repl::progress::GenerationProgress;
use crate::repl::renderer;

/// Drive one workflow run with a fake request, for demos and pacing checks.
pub async fn handle_simulate(ctx: &AppContext, args: SimulateArgs) -> Result<(), HyperMailError> {
    if args.company.trim().is_empty() {
        return Err(HyperMailError::MissingInput("Please enter a company name".into()));
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let simulator = ctx.simulator(Some(event_tx));
    let mut progress = if ctx.quiet || args.json {
        GenerationProgress::hidden()
    } else {
        GenerationProgress::new()
    };

    let run = simulator.start(args.company.trim(), &ctx.stages()).await;
    info!(run_id = %run.run_id(), settle_after_ms = ?args.settle_after_ms, fail = args.fail, "Simulating");

    let settle_at = args.settle_after_ms.map(Duration::from_millis);
    let settle_timer = async {
        match settle_at {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(settle_timer);
    let mut settled = false;

    loop {
        tokio::select! {
            _ = &mut settle_timer, if !settled => {
                settled = true;
                simulator.notify_real_result_settled(!args.fail).await;
            }
            event = event_rx.recv() => match event {
                Some(event) => {
                    let done = matches!(event, SimulatorEvent::RunFinished { .. });
                    progress.handle_event(&event);
                    if done {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                progress.clear();
                break;
            }
        }
    }

    let snapshot = run.snapshot().await;
    simulator.teardown().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else if !ctx.quiet {
        println!("{}", renderer::render_run_summary(&snapshot));
    }
    Ok(())
}
