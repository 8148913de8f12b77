use std::sync::{Arc, Mutex};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use tokio::sync::mpsc;

use crate::coordinator::RequestCoordinator;
use crate::errors::HyperMailError;
use crate::repl::commands::{self, SlashCommand};
use crate::repl::completer::ReplHelper;
use crate::repl::events::SimulatorEvent;
use crate::repl::progress::{watch_generation, GenerationProgress};
use crate::repl::renderer;

type ReplEditor = Editor<ReplHelper, DefaultHistory>;

const BODY_TERMINATOR: &str = ".";

/// Interactive compose session.
pub struct ReplSession {
    coordinator: Arc<RequestCoordinator>,
    /// Receiving end of the simulator's event channel.
    event_rx: mpsc::UnboundedReceiver<SimulatorEvent>,
}

impl ReplSession {
    pub fn new(
        coordinator: Arc<RequestCoordinator>,
        event_rx: mpsc::UnboundedReceiver<SimulatorEvent>,
    ) -> Self {
        Self { coordinator, event_rx }
    }

    pub async fn run(mut self) -> Result<(), HyperMailError> {
        let config = Config::builder()
            .auto_add_history(true)
            .build();
        let mut editor: ReplEditor = Editor::with_config(config)
            .map_err(|e| HyperMailError::Internal(format!("Failed to initialize REPL: {}", e)))?;
        editor.set_helper(Some(ReplHelper::default()));
        let editor = Arc::new(Mutex::new(editor));

        println!(
            "\n{} {}\n{}\n",
            style("HyperMail").cyan().bold(),
            style(env!("CARGO_PKG_VERSION")).dim(),
            renderer::render_info(&format!(
                "Backend: {}. Type /help for commands, /find to start.",
                self.coordinator.backend_name()
            )),
        );

        loop {
            let term_w = console::Term::stdout().size().1 as usize;
            let sep = format!("{}", style("─".repeat(term_w)).dim());
            let prompt = format!("{}\n{} ", sep, style("hypermail>").cyan().bold());

            match read_line(&editor, prompt).await? {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match commands::parse_command(trimmed) {
                        Ok(cmd) => {
                            if self.handle_command(cmd, &editor).await? {
                                break;
                            }
                        }
                        Err(msg) => {
                            println!("{}", renderer::render_error(&msg));
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    println!("{}", renderer::render_error(&format!("Input error: {}", err)));
                    break;
                }
            }
        }

        self.coordinator.close_progress_view().await;
        println!("{}", renderer::render_info("Goodbye."));
        Ok(())
    }

    /// Returns true when the session should end.
    async fn handle_command(
        &mut self,
        cmd: SlashCommand,
        editor: &Arc<Mutex<ReplEditor>>,
    ) -> Result<bool, HyperMailError> {
        match cmd {
            SlashCommand::Find { profile } => {
                let spinner = spinner(format!(
                    "Searching for {} companies in {}...",
                    profile.industry, profile.location
                ));
                let result = self.coordinator.find_companies(profile).await;
                spinner.finish_and_clear();
                match result {
                    Ok(companies) => println!("{}", renderer::render_companies(&companies)),
                    Err(e) => println!("{}", renderer::render_error(&e.to_string())),
                }
            }
            SlashCommand::Companies => {
                let ws = self.coordinator.workspace().await;
                println!("{}", renderer::render_companies(&ws.companies));
            }
            SlashCommand::Select { position } => {
                match self.coordinator.select_company(position - 1).await {
                    Ok(company) => {
                        let ws = self.coordinator.workspace().await;
                        let to = if ws.to.is_empty() { "no address listed".to_string() } else { ws.to };
                        println!(
                            "{}",
                            renderer::render_success(&format!("Selected {} ({})", company.name, to))
                        );
                    }
                    Err(e) => println!("{}", renderer::render_error(&e.to_string())),
                }
            }
            SlashCommand::Generate { company } => {
                let company = match company {
                    Some(c) => c,
                    None => self.coordinator.workspace().await.company_name,
                };
                let mut progress = GenerationProgress::new();
                let outcome = watch_generation(
                    &self.coordinator,
                    &company,
                    &mut self.event_rx,
                    &mut progress,
                    true,
                )
                .await?;
                match outcome {
                    Ok(_) => {
                        let ws = self.coordinator.workspace().await;
                        println!("{}", renderer::render_draft(&ws));
                    }
                    Err(e) => println!("{}", renderer::render_error(&e.to_string())),
                }
            }
            SlashCommand::To { address } => {
                self.show_or_set("To", address, |ws| &mut ws.to).await;
            }
            SlashCommand::Cc { address } => {
                self.show_or_set("CC", address, |ws| &mut ws.cc).await;
            }
            SlashCommand::Subject { text } => {
                self.show_or_set("Subject", text, |ws| &mut ws.subject).await;
            }
            SlashCommand::Body { text } => {
                let body = match text {
                    Some(text) => Some(text),
                    None => read_body(editor).await?,
                };
                match body {
                    Some(body) => {
                        let lines = body.lines().count();
                        self.coordinator.edit(|ws| ws.body = body).await;
                        println!("{}", renderer::render_success(&format!("Body updated ({} lines)", lines)));
                    }
                    None => println!("{}", renderer::render_info("Body unchanged.")),
                }
            }
            SlashCommand::Show => {
                let ws = self.coordinator.workspace().await;
                println!("{}", renderer::render_draft(&ws));
                if let Some(run) = self.coordinator.active_run().await {
                    println!("{}", renderer::render_run_summary(&run.snapshot().await));
                }
            }
            SlashCommand::Send => {
                let to = self.coordinator.workspace().await.to;
                let spinner = spinner(format!("Sending to {}...", to.trim()));
                let result = self.coordinator.send_email().await;
                spinner.finish_and_clear();
                match result {
                    Ok(_) => println!("{}", renderer::render_success(&format!("Email sent to {}", to.trim()))),
                    Err(e) => println!("{}", renderer::render_error(&e.to_string())),
                }
            }
            SlashCommand::Feedback { text } => match self.coordinator.submit_feedback(&text) {
                Ok(()) => println!("{}", renderer::render_success("Feedback submitted. Thank you!")),
                Err(e) => println!("{}", renderer::render_error(&e.to_string())),
            },
            SlashCommand::Clear => {
                self.coordinator.clear().await;
                println!("{}", renderer::render_success("Draft cleared"));
            }
            SlashCommand::Help { command } => {
                println!("{}", renderer::render_help(command.as_deref()));
            }
            SlashCommand::Exit => return Ok(true),
        }
        Ok(false)
    }

    async fn show_or_set<F>(&self, label: &str, value: Option<String>, field: F)
    where
        F: FnOnce(&mut crate::coordinator::DraftWorkspace) -> &mut String,
    {
        match value {
            Some(value) => {
                let shown = value.clone();
                self.coordinator.edit(|ws| *field(ws) = value).await;
                println!("{}", renderer::render_success(&format!("{} set to {}", label, shown)));
            }
            None => {
                let mut ws = self.coordinator.workspace().await;
                let current = field(&mut ws).clone();
                let current = if current.is_empty() { "(empty)".to_string() } else { current };
                println!("  {} {}", style(format!("{}:", label)).dim(), current);
            }
        }
    }
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

async fn read_line(
    editor: &Arc<Mutex<ReplEditor>>,
    prompt: String,
) -> Result<Result<String, ReadlineError>, HyperMailError> {
    // rustyline is blocking, so use spawn_blocking
    let editor = editor.clone();
    tokio::task::spawn_blocking(move || {
        let mut editor = editor.lock().unwrap_or_else(|e| e.into_inner());
        editor.readline(&prompt)
    })
    .await
    .map_err(|e| HyperMailError::Internal(format!("Readline task failed: {}", e)))
}

/// Collect body lines until a lone ".". Ctrl-C abandons the edit.
async fn read_body(editor: &Arc<Mutex<ReplEditor>>) -> Result<Option<String>, HyperMailError> {
    println!(
        "{}",
        renderer::render_info("Type the email body. Finish with a line containing only '.'")
    );
    let mut lines = Vec::new();
    loop {
        match read_line(editor, String::new()).await? {
            Ok(line) if line.trim() == BODY_TERMINATOR => break,
            Ok(line) => lines.push(line),
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => return Ok(None),
            Err(err) => {
                return Err(HyperMailError::Internal(format!("Input error: {}", err)));
            }
        }
    }
    Ok(Some(lines.join("\n")))
}
