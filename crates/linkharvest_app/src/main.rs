mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    platform::logging::initialize(cli.log_level(), cli.log_file.as_deref());
    let settings = platform::config::resolve(&cli)?;
    platform::app::run(settings)
}
