use clap::Parser;
use std::process::ExitCode;

use staticd::cli::Cli;
use staticd::config::Config;
use staticd::error::StartupError;
use staticd::{logger, server};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("staticd: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), StartupError> {
    let cfg = Config::load(cli)?;
    logger::init(&cfg.logging)?;

    // Tokio runtime sized by the workers setting, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers.filter(|w| *w > 0) {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(server::run(cfg))
}
