use clap::Parser;
use mafx::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{overlap, sort},
    utils::util::{handle_error_and_exit, Result},
};
use std::time;

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    log::trace!("CLI options set: {:?}", cli);

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        &**FULL_VERSION,
        cli.command.name()
    );

    let start_timer = time::Instant::now();
    match cli.command {
        Command::Sort(args) => {
            log::trace!("Sort arguments: {:#?}", args);
            sort(args)?
        }
        Command::Overlap(args) => {
            log::trace!("Overlap arguments: {:#?}", args);
            overlap(args)?
        }
    }
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());

    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
