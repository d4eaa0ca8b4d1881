//! boxfit: draw styled text, hashtags and emoji into a box on an image

mod cli;
mod commands;
mod options;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Batch(args) => {
            if args.jobs > 0 {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(args.jobs)
                    .build_global()
                    .context("Failed to initialize thread pool")?;
            }
            commands::batch::run(args, cli.quiet)
        },
    }
}

/// Warnings by default; `RUST_LOG` wins over the flags when set
fn init_logger(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, 2) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(level);
    }
    builder.init();
}
