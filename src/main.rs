use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use iconscope::Settings;
use iconscope::cli::commands;
use iconscope::cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_settings(config: Option<&Path>) -> Settings {
    let loaded = match config {
        Some(path) => Settings::load_from(path).map(|mut settings| {
            // `<root>/.iconscope/settings.toml`
            if settings.workspace_root.is_none() {
                settings.workspace_root = path
                    .parent()
                    .and_then(|dir| dir.parent())
                    .map(Path::to_path_buf);
            }
            settings
        }),
        None => Settings::load(),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        Settings::default()
    })
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let command = match cli.command {
        Commands::Init { force } => {
            let root = std::env::current_dir()?;
            commands::init::run_init(&root, force)?;
            return Ok(true);
        }
        command => command,
    };

    let settings = Arc::new(load_settings(cli.config.as_deref()));
    iconscope::logging::init_with_config(&settings.logging);

    match command {
        Commands::Init { .. } | Commands::Config => commands::init::run_config(&settings)?,
        Commands::Scan { folder, json } => commands::scan::run(folder, json, settings).await?,
        Commands::Usages { name, json } => {
            return commands::usages::run(&name, json, settings).await;
        }
        Commands::Status => commands::status::run(settings).await?,
        Commands::Build { name } => commands::build::run(&name, settings).await?,
        Commands::Variant { action } => commands::variant::run(action, settings).await?,
        Commands::Rename { old, new } => commands::rename::run(&old, &new, settings).await?,
        Commands::Reveal { name } => commands::usages::run_reveal(&name, settings).await?,
        Commands::Watch => commands::watch::run(settings).await?,
    }
    Ok(true)
}
