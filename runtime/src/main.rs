// Copyright 2026 Scout Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use scout_runtime::cli;
use scout_runtime::config::ExplorerConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scout",
    about = "Scout: log into a web app and map what its pages offer",
    version,
    after_help = "Run 'scout <command> --help' for details on each command."
)]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in (if asked) and extract a structured record of each page
    Explore(cli::explore_cmd::ExploreArgs),
    /// Show the device emulation profiles
    Profiles {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "scout_runtime=debug"
    } else if cli.quiet {
        "scout_runtime=warn"
    } else {
        "scout_runtime=info"
    };
    let filter = match level.parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(&cli);
    let config = ExplorerConfig::from_env();

    let result = match &cli.command {
        Commands::Explore(args) => cli::explore_cmd::run(args, &config).await,
        Commands::Profiles { json } => cli::profiles_cmd::run(*json),
        Commands::Doctor => cli::doctor::run(&config).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "scout", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli.quiet {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
