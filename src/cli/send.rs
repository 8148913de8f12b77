use tracing::info;

use crate::backend::SendReceipt;
use crate::cli::commands::SendArgs;
use crate::cli::context::{read_text_file, AppContext};
use crate::errors::HyperMailError;
use crate::repl::renderer;

pub async fn handle_send(ctx: &AppContext, args: SendArgs) -> Result<(), HyperMailError> {
    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => read_text_file(path).await?,
        (None, None) => return Err(HyperMailError::MissingInput("Please provide --body or --body-file".into())),
    };

    let coordinator = ctx.coordinator(None)?;
    coordinator
        .edit(|ws| {
            ws.to = args.to.clone();
            if let Some(subject) = &args.subject {
                ws.subject = subject.clone();
            }
            if let Some(cc) = &args.cc {
                ws.cc = cc.clone();
            }
            ws.body = body;
        })
        .await;

    let receipt = coordinator.send_email().await?;
    info!(to = %args.to, "Send acknowledged");
    if !ctx.quiet {
        println!("{}", renderer::render_success(&format!("Email sent to {}", args.to.trim())));
        if let Some(detail) = describe_receipt(&receipt) {
            println!("{}", renderer::render_info(&detail));
        }
    }
    Ok(())
}

fn describe_receipt(receipt: &SendReceipt) -> Option<String> {
    match &receipt.raw {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
