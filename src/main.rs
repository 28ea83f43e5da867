//! Handoff CLI: run one producer/consumer pipeline over generated items.

use anyhow::Result;
use clap::Parser;
use handoff::engine::arg_parser::Cli;
use handoff::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
