use anyhow::Result;
use clap::Parser;

use electomap::cli::{Cli, Commands};
use electomap::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();

    match &cli.command {
        Commands::Render(args) => commands::render(&cli, args),
    }
}
