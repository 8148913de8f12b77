use console::style;

use crate::backend::Company;
use crate::coordinator::DraftWorkspace;
use crate::repl::commands::{CommandHelp, COMMAND_HELP};
use crate::repl::events::SimulatorEvent;
use crate::simulator::{RunSnapshot, StageStatus};
use crate::utils::formatting::{format_duration, format_eta};
use crate::utils::truncation::preview;

/// Render a simulator event as a styled log line.
pub fn render_event(event: &SimulatorEvent) -> String {
    match event {
        SimulatorEvent::RunStarted { label, stage_names, .. } => {
            format!(
                "\n{} Generating email for {} ({} stages)",
                style("▶").green().bold(),
                style(label).white().bold(),
                stage_names.len(),
            )
        }
        SimulatorEvent::StageStarted { display_name, .. } => {
            format!(
                "\n{} {} {}",
                style("---").cyan().bold(),
                style(display_name).cyan().bold(),
                style("---").cyan().bold(),
            )
        }
        SimulatorEvent::MessageAppended { message, .. } => {
            format!("  {} {}", style("›").dim(), message)
        }
        SimulatorEvent::ProgressUpdated { stage_progress, overall_progress, .. } => {
            format!(
                "  {}",
                style(format!("stage {}% | overall {}%", stage_progress, overall_progress)).dim(),
            )
        }
        SimulatorEvent::StageCompleted { display_name, overall_progress, .. } => {
            format!(
                "  {} {} complete ({}%)",
                style("✓").green(),
                style(display_name).green(),
                overall_progress,
            )
        }
        SimulatorEvent::StageErrored { display_name, .. } => {
            format!("  {} {} stopped", style("✗").red(), style(display_name).red())
        }
        SimulatorEvent::RunSettled { success, .. } => {
            if *success {
                format!("  {}", style("Email received, wrapping up...").dim())
            } else {
                format!("  {}", style("Request failed, wrapping up...").yellow())
            }
        }
        SimulatorEvent::RunFinished { failed, .. } => {
            if *failed {
                format!("\n{}\n", style("✗ Workflow ended with an error").red().bold())
            } else {
                format!("\n{}\n", style("✓ Workflow complete").green().bold())
            }
        }
        SimulatorEvent::Log { message } => {
            format!("  {}", style(message).dim())
        }
    }
}

/// Render the help listing for all commands.
pub fn render_help(specific_command: Option<&str>) -> String {
    if let Some(cmd_name) = specific_command {
        if let Some(cmd) = COMMAND_HELP.iter().find(|c| c.name == cmd_name) {
            return format_command_detail(cmd);
        } else {
            return format!("{} Unknown command: /{}", style("✗").red(), cmd_name);
        }
    }

    let mut out = String::new();
    out.push_str(&format!("\n{}\n\n", style("Available commands:").white().bold()));
    for cmd in COMMAND_HELP {
        out.push_str(&format!(
            "  {:<16} {}\n",
            style(format!("/{}", cmd.name)).cyan().bold(),
            style(cmd.description).dim(),
        ));
    }
    out
}

fn format_command_detail(cmd: &CommandHelp) -> String {
    format!(
        "\n{}\n  {}\n\n  {}\n",
        style(format!("/{}", cmd.name)).cyan().bold(),
        style(cmd.description).dim(),
        style(cmd.usage).white(),
    )
}

/// Numbered company list, as picked from with /select.
pub fn render_companies(companies: &[Company]) -> String {
    if companies.is_empty() {
        return format!("\n  {}\n", style("No companies found. Try /find with a different profile.").dim());
    }

    let mut out = String::new();
    out.push_str(&format!(
        "\n{}\n\n",
        style(format!("Companies ({}):", companies.len())).white().bold(),
    ));
    for (i, company) in companies.iter().enumerate() {
        let email = if company.email.is_empty() { "-" } else { &company.email };
        out.push_str(&format!(
            "  {} {}  {}\n",
            style(format!("[{}]", i + 1)).cyan().bold(),
            style(&company.name).white().bold(),
            style(email).dim(),
        ));
        let meta: Vec<&str> = [&company.industry, &company.size, &company.location]
            .into_iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        if !meta.is_empty() {
            out.push_str(&format!("      {}\n", style(meta.join(" | ")).dim()));
        }
        if let Some(contact) = company.contact_person.as_deref() {
            out.push_str(&format!("      {} {}\n", style("Contact:").dim(), contact));
        }
        if let Some(description) = company.description.as_deref() {
            out.push_str(&format!("      {}\n", style(preview(description)).dim()));
        }
    }
    out
}

/// The draft as it would be sent.
pub fn render_draft(workspace: &DraftWorkspace) -> String {
    let field = |value: &str| {
        if value.trim().is_empty() {
            style("(empty)".to_string()).dim().to_string()
        } else {
            style(value.to_string()).white().to_string()
        }
    };

    let mut out = String::new();
    out.push_str(&format!("\n  {} {}\n", style("Company:").dim(), field(&workspace.company_name)));
    out.push_str(&format!("  {} {}\n", style("To:     ").dim(), field(&workspace.to)));
    out.push_str(&format!("  {} {}\n", style("CC:     ").dim(), field(&workspace.cc)));
    out.push_str(&format!("  {} {}\n", style("Subject:").dim(), field(&workspace.subject)));
    out.push_str(&format!("  {}\n", style("─".repeat(60)).dim()));
    if workspace.body.trim().is_empty() {
        out.push_str(&format!("  {}\n", style(workspace.display_body()).dim().italic()));
    } else {
        for line in workspace.body.lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }
    out.push_str(&format!("  {}\n", style("─".repeat(60)).dim()));
    if let Some(error) = workspace.error.as_deref() {
        out.push_str(&format!("  {}\n", render_error(error)));
    }
    out
}

/// One line per stage plus the overall figure.
pub fn render_run_summary(snapshot: &RunSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n  {} {}% | {} | {}\n",
        style("Overall:").dim(),
        style(snapshot.overall_progress).white().bold(),
        style(snapshot.phase.label()).cyan(),
        format_eta(snapshot.elapsed(), snapshot.estimated_remaining()),
    ));
    for stage in &snapshot.stages {
        let marker = match stage.status {
            StageStatus::Waiting => style("·").dim().to_string(),
            StageStatus::Running => style("⏳").yellow().to_string(),
            StageStatus::Completed => style("✓").green().to_string(),
            StageStatus::Error => style("✗").red().to_string(),
        };
        out.push_str(&format!(
            "  {} {:<30} {:>3}%  {}\n",
            marker,
            stage.display_name,
            stage.progress,
            style(format_duration(stage.planned_duration())).dim(),
        ));
    }
    out
}

/// Print an error message to the REPL.
pub fn render_error(msg: &str) -> String {
    format!("{} {}", style("✗").red(), style(msg).red())
}

/// Print a success message.
pub fn render_success(msg: &str) -> String {
    format!("{} {}", style("✓").green(), msg)
}

/// Print an info message.
pub fn render_info(msg: &str) -> String {
    format!("{}", style(msg).dim())
}
