mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, engine_info};
use favlens_core::{RunConfig, RunSummary};
use favlens_engine::Engine;

use crate::cli::{Cli, USAGE_HINT};

const BANNER: &str = r"
 _____         __
|   __|___ _ _|  |   ___ ___ ___
|   __| .'| | |  |__| -_|   |_ -|
|__|  |__,|\_/|_____|___|_|_|___|
";

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = cli.verbosity();

    if verbosity.is_chatty() {
        eprintln!("{BANNER}");
        eprintln!("Compare favicons against a base URL using Ollama models\n");
    }

    let config = cli.to_config();
    if let Err(err) = config.validate() {
        if verbosity.is_chatty() {
            eprintln!("Error: {err}");
        }
        eprintln!("{USAGE_HINT}");
        return ExitCode::FAILURE;
    }

    engine_logging::initialize(verbosity, cli.log_file.as_deref());
    echo_config(&config);

    match run(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            engine_error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn echo_config(config: &RunConfig) {
    engine_info!("Base URL: {}", config.base_url);
    engine_info!("Ollama host: {}", config.ollama_base());
    engine_info!("Model: {}", config.model);
    engine_info!("Workers: {}", config.workers);
    engine_info!("Timeout: {}s", config.timeout.as_secs());
    engine_info!("Delay: {}ms", config.delay.as_millis());
    if let Some(output) = &config.output {
        engine_info!("Output file: {}", output.display());
    }
}

fn run(config: RunConfig) -> anyhow::Result<RunSummary> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let summary = runtime.block_on(Engine::new(config).run())?;
    Ok(summary)
}
