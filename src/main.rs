use clap::Parser;
use rivet::cli::{run_cli, Cli};
use rivet::logging::{init_logging_with_config, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging_with_config(&LogConfig::from_env())?;
    run_cli(cli)
}
