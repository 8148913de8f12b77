use clap::Parser;
use tracing_subscriber::EnvFilter;

use hypermail::cli::{self, AppContext, Cli, Commands};
use hypermail::HyperMailError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Start));

    // The interactive session keeps logs quiet so progress bars stay readable
    let log_level = match (cli.quiet, cli.verbose, interactive) {
        (true, _, _) => "error",
        (false, 0, true) => "warn",
        (false, 0, false) => "info",
        (false, 1, _) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    if let Err(e) = run(cli).await {
        let class = e.classify();
        eprintln!("Error: {}", e);
        tracing::debug!(error_type = class.error_type, "Command failed");
        std::process::exit(class.exit_code);
    }
}

async fn run(cli: Cli) -> Result<(), HyperMailError> {
    if let Some(Commands::Validate(args)) = cli.command {
        return cli::validate::handle_validate(args, cli.config).await;
    }

    let ctx = AppContext::load(&cli).await?;
    match cli.command {
        None | Some(Commands::Start) => cli::start::handle_start(&ctx).await,
        Some(Commands::Companies(args)) => cli::companies::handle_companies(&ctx, args).await,
        Some(Commands::Generate(args)) => cli::generate::handle_generate(&ctx, args).await,
        Some(Commands::Send(args)) => cli::send::handle_send(&ctx, args).await,
        Some(Commands::Simulate(args)) => cli::simulate::handle_simulate(&ctx, args).await,
        Some(Commands::Validate(_)) => Ok(()),
    }
}
