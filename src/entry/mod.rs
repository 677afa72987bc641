
use std::ffi::OsString;
use std::path::Path;

use clap::{CommandFactory, FromArgMatches};

use crate::args::BenchArgs;
use crate::config::{build_harness_config, load_config};
use crate::driver::{self, print_summary};
use crate::error::{AppError, AppResult};
use crate::ledger::DefaultConnector;
use crate::registry::Registries;
use crate::shutdown::{setup_signal_shutdown_handler, shutdown_channel};

/// Default config filenames checked when no CLI args are provided.
const DEFAULT_CONFIG_FILES: [&str; 2] = ["ledgerbench.toml", "ledgerbench.json"];

/// Binary entry point: parses the CLI, sets up logging and runs the
/// workload on a multi-threaded runtime.
///
/// # Errors
///
/// Returns configuration, setup and runtime errors for the binary to report.
pub fn run() -> AppResult<()> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };

    crate::logger::init_logging(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let registries = Registries::with_builtins();
    runtime.block_on(run_async(&args, &registries))
}

fn parse_args() -> AppResult<Option<BenchArgs>> {
    let mut cmd = BenchArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = BenchArgs::from_arg_matches(&matches)?;
    Ok(Some(args))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !has_default_config()
}

fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

/// Runs one benchmark with the given registries.
///
/// # Errors
///
/// Returns configuration errors, the first failing setup step, or a driver
/// failure.
pub async fn run_async(args: &BenchArgs, registries: &Registries) -> AppResult<()> {
    if args.list {
        for line in registry_lines(registries) {
            println!("{}", line);
        }
        return Ok(());
    }

    let file = load_config(args.config.as_deref())?;
    let config = build_harness_config(args, file.as_ref())?;
    tracing::info!(
        "host={}, workload={}, concurrency={}",
        config.host,
        config.workload,
        config.concurrency.get()
    );

    let generator = registries
        .build_workload(&config, &DefaultConnector)
        .map_err(|err| {
            tracing::error!("Failed to build workload ({:?}): {}", err.category(), err);
            AppError::workload(err)
        })?;

    let (shutdown_tx, _shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);
    let outcome = driver::run(generator, config.bounds, &shutdown_tx).await;
    drop(shutdown_tx.send(()));
    signal_handle.await?;

    let summary = outcome?;
    print_summary(&summary);
    Ok(())
}

pub(crate) fn registry_lines(registries: &Registries) -> Vec<String> {
    vec![
        format!("Workloads: {}", registries.workloads().keys_csv()),
        format!("Contracts: {}", registries.programs().keys_csv()),
    ]
}
