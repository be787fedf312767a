//! launchpad CLI - resolves a launcher's config into a launch decision

use std::io;

use anyhow::Result;
use clap::Parser;

use launchpad::ops::resolve;
use launchpad::util::logging;
use launchpad::RealHost;

mod cli;

use cli::Cli;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init();

    let argv = Cli::parse().argument_vector(io::stdin().lock())?;

    let host = RealHost::new();
    let resolution = resolve(&host, &argv, &mut io::stderr())?;

    // Only written once the whole decision is known.
    resolution.decision.write_to(&mut io::stdout().lock())?;
    Ok(())
}
