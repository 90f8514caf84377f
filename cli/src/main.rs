mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{generate, index};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Commands::Index(args) => index::run(&cli, args),
        Commands::Generate(args) => generate::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
