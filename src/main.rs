use anyhow::Result;
use clap::Parser;
use lifecourse::cli::{self, Cli};
use lifecourse::logging;

fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    cli::run(cli)
}
