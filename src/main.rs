//! Websift CLI: stream one page of image search results; --select analyzes one of them.

use anyhow::Result;
use clap::Parser;
use websift::engine::arg_parser::Cli;
use websift::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
