use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hypermail", version, about = "Find prospects, generate outreach emails and send them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Fix the random pacing of the progress animation
    #[arg(long, global = true)]
    pub seed: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive session (default)
    Start,
    /// Find companies matching a target profile
    Companies(CompaniesArgs),
    /// Generate an outreach email for one company
    Generate(GenerateArgs),
    /// Send an email through the backend
    Send(SendArgs),
    /// Run the progress animation alone against a fake result
    Simulate(SimulateArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone, Default)]
pub struct CompaniesArgs {
    /// Industry (default: Technology)
    #[arg(long)]
    pub industry: Option<String>,

    /// Company size (default: Medium)
    #[arg(long)]
    pub size: Option<String>,

    /// Sector (default: Software)
    #[arg(long)]
    pub sector: Option<String>,

    /// Location (default: California)
    #[arg(long)]
    pub location: Option<String>,

    /// Email vibe (default: Professional)
    #[arg(long)]
    pub vibe: Option<String>,

    /// Free-form details for the search
    #[arg(long)]
    pub details: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct GenerateArgs {
    /// Company to write to
    #[arg(long)]
    pub company: String,

    /// Print the draft as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
#[command(group(clap::ArgGroup::new("body_source").required(true).args(["body", "body_file"])))]
pub struct SendArgs {
    /// Recipient address
    #[arg(long)]
    pub to: String,

    /// Subject line (falls back to sender.subject in the config)
    #[arg(long)]
    pub subject: Option<String>,

    /// CC address (falls back to sender.cc in the config)
    #[arg(long)]
    pub cc: Option<String>,

    /// Email body
    #[arg(long)]
    pub body: Option<String>,

    /// Read the email body from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct SimulateArgs {
    /// Company label used in stage messages
    #[arg(long)]
    pub company: String,

    /// Settle the run this many milliseconds after it starts
    #[arg(long)]
    pub settle_after_ms: Option<u64>,

    /// Settle as a failed request
    #[arg(long)]
    pub fail: bool,

    /// Print the final run snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate (defaults to --config)
    pub path: Option<PathBuf>,
}
