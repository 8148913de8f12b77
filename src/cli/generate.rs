use serde_json::json;
use tokio::sync::mpsc;

use crate::cli::commands::GenerateArgs;
use crate::cli::context::AppContext;
use crate::errors::HyperMailError;
use crate::repl::progress::{watch_generation, GenerationProgress};
use crate::repl::renderer;

pub async fn handle_generate(ctx: &AppContext, args: GenerateArgs) -> Result<(), HyperMailError> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let coordinator = ctx.coordinator(Some(event_tx))?;

    let mut progress = if ctx.quiet || args.json {
        GenerationProgress::hidden()
    } else {
        GenerationProgress::new()
    };
    watch_generation(&coordinator, &args.company, &mut event_rx, &mut progress, true).await??;

    let ws = coordinator.workspace().await;
    if args.json {
        let draft = json!({
            "company_name": ws.company_name,
            "cc": ws.cc,
            "subject": ws.subject,
            "body": ws.body,
        });
        println!("{}", serde_json::to_string_pretty(&draft)?);
    } else {
        println!("{}", renderer::render_draft(&ws));
    }
    Ok(())
}
