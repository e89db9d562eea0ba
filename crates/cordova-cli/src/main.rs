//! Cordova CLI
//!
//! The command-line interface for managing a mobile app project's platforms
//! and plugins.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands, PlatformAction, PluginAction};
use error::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_ok() {
            tracing::debug!("Verbose mode enabled");
        }
    }

    match cli.command {
        Some(cmd) => execute_command(cmd).await,
        None => {
            println!("{} project orchestrator", "cordova".green().bold());
            println!();
            println!("Run {} for available commands.", "cordova --help".cyan());
            Ok(0)
        }
    }
}

async fn execute_command(cmd: Commands) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    match cmd {
        Commands::Platform { action } => match action {
            PlatformAction::Add { targets, save } => {
                commands::run_platform_add(&cwd, &targets, &save).await
            }
            PlatformAction::Remove { targets, save } => {
                commands::run_platform_remove(&cwd, &targets, &save).await
            }
            PlatformAction::Update { targets, save } => {
                commands::run_platform_update(&cwd, &targets, &save).await
            }
            PlatformAction::List => commands::run_platform_list(&cwd),
        },
        Commands::Plugin { action } => match action {
            PluginAction::Add {
                targets,
                variables,
                save,
            } => commands::run_plugin_add(&cwd, &targets, &variables, &save).await,
            PluginAction::Remove { targets, save } => {
                commands::run_plugin_remove(&cwd, &targets, &save).await
            }
            PluginAction::List { json } => commands::run_plugin_list(&cwd, json),
        },
        Commands::Prepare {
            platforms,
            searchpath,
        } => commands::run_prepare(&cwd, &platforms, searchpath).await,
    }
}
