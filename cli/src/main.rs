mod commands;
mod terminal;

use commands::{CommandLine, Commands, check, run};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose)?;

    match commands.command {
        Commands::Run { config, once } => run::run(&config, once).await,
        Commands::Check { config } => check::check(&config),
    }
}
