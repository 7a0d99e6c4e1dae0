// SPDX-FileCopyrightText: 2026 Forumkeeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Forumkeeper - forum thread lifecycle bot for Discord.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod purge;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::purge::PurgeArgs;

/// Forumkeeper - reminds, closes and cleans up Discord forum threads.
#[derive(Parser, Debug)]
#[command(name = "forumkeeper", version, about, long_about = None)]
struct Cli {
    /// Load this TOML file instead of the standard config locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and run the daily lifecycle pass until stopped.
    Serve,
    /// Run one lifecycle pass now and print the result.
    Check,
    /// Delete a user's messages from the guild.
    Purge {
        /// Id of the user whose messages are deleted.
        #[arg(long)]
        user: u64,
        /// Only messages from the last N days (0 means all history).
        #[arg(long)]
        days: Option<u32>,
        /// Restrict to a single channel.
        #[arg(long)]
        channel: Option<u64>,
        /// Stop after this many deletions.
        #[arg(long)]
        count: Option<usize>,
        /// Guild to purge; defaults to `bot.guild_id`.
        #[arg(long)]
        guild: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => forumkeeper_config::load_and_validate_path(path),
        None => forumkeeper_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            forumkeeper_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let Some(command) = cli.command else {
        println!("forumkeeper: use --help for available commands");
        return;
    };

    serve::init_tracing(&config.bot.log_level);

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Check => check::run_check(config).await,
        Commands::Purge {
            user,
            days,
            channel,
            count,
            guild,
        } => {
            let args = PurgeArgs {
                user,
                days,
                channel,
                count,
                guild,
            };
            purge::run_purge(config, args).await
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
