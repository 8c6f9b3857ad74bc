mod cli;
mod logging;
mod run;

use clap::Parser;
use engine_logging::engine_warn;
use harvester_core::CancelToken;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::initialize(cli.log_level(), cli.log_file.as_deref());

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        engine_warn!("interrupt received; stopping after the current iteration");
        on_interrupt.cancel();
    }) {
        engine_warn!("Ctrl-C handler not installed: {}", err);
    }

    run::run(&cli, cancel)
}
