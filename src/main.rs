//! Duo Stitch CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use duo_stitch::cli::{
    config_cmd::handle_config_command, config_from_args, load_merged_config, run_compose,
    run_list, run_record, Cli, Commands, Presenter, RunSettings, EXIT_ERROR, EXIT_USAGE_ERROR,
};
use duo_stitch::infrastructure::XdgConfigStore;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "duo_stitch=debug"
    } else {
        "duo_stitch=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let presenter = Presenter::new();

    // Flags are validated before any device or file is touched
    let cli_config = config_from_args(&cli);

    let command = match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        other => other,
    };

    let cli_config = match cli_config {
        Ok(config) => config,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let config = load_merged_config(cli_config).await;
    let settings = match RunSettings::from_config(&config) {
        Ok(settings) => settings,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match command {
        Some(Commands::Compose { front, back }) => run_compose(settings, front, back).await,
        Some(Commands::List) => run_list(settings).await,
        Some(Commands::Config { .. }) | None => run_record(settings).await,
    }
}
