//! Licence Finder sector search tool.

use clap::Parser;
use licence_finder_cli::{Cli, init_logging, run};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    info!(
        nodes = %cli.nodes,
        index = %cli.index,
        command = ?cli.command,
        "Starting licence-search"
    );

    let mut stdout = std::io::stdout().lock();
    run(&cli, None, &mut stdout).await
}
