use crate::args::{
    BenchArgs, DEFAULT_CONCURRENCY, DEFAULT_DURATION, DEFAULT_SEED, PositiveU64, PositiveUsize,
};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::identity::IdentitySource;

use super::types::{ConfigFile, HarnessConfig, RunBounds};

/// Merges CLI arguments over the optional config file into a [`HarnessConfig`].
///
/// Workload arguments are merged per key, so `-a key=value` overrides only
/// that key from the file's `[args]` table.
///
/// # Errors
///
/// Returns an error when a required field is missing from both sources or a
/// config value is out of range.
pub fn build_harness_config(
    cli: &BenchArgs,
    file: Option<&ConfigFile>,
) -> AppResult<HarnessConfig> {
    let empty = ConfigFile::default();
    let file = file.unwrap_or(&empty);

    let host = cli
        .host
        .clone()
        .or_else(|| file.host.clone())
        .filter(|host| !host.trim().is_empty())
        .ok_or_else(|| AppError::validation(ValidationError::MissingHost))?;

    let concurrency = match (cli.concurrency, file.concurrency) {
        (Some(concurrency), _) => concurrency,
        (None, Some(value)) => ensure_positive_usize(value, "concurrency")?,
        (None, None) => ensure_positive_usize(DEFAULT_CONCURRENCY, "concurrency")?,
    };

    let workload = cli
        .workload
        .clone()
        .or_else(|| file.workload.clone())
        .filter(|kind| !kind.trim().is_empty())
        .ok_or_else(|| AppError::validation(ValidationError::MissingWorkload))?;

    let mut args = file.args.clone();
    for (key, value) in &cli.args {
        args.insert(key.clone(), value.clone());
    }

    let identities = match cli.identities.clone().or_else(|| file.identities.clone()) {
        Some(dir) => IdentitySource::Directory(dir),
        None => IdentitySource::Derived {
            seed: cli.seed.or(file.seed).unwrap_or(DEFAULT_SEED),
        },
    };

    let duration = match (cli.duration, file.duration.as_ref()) {
        (Some(duration), _) => Some(duration),
        (None, Some(value)) => Some(value.to_duration().map_err(|err| {
            AppError::config(ConfigError::InvalidDuration {
                field: "duration",
                source: err,
            })
        })?),
        (None, None) => None,
    };
    let iterations = match (cli.iterations, file.iterations) {
        (Some(iterations), _) => Some(iterations),
        (None, Some(value)) => Some(ensure_positive_u64(value, "iterations")?),
        (None, None) => None,
    };
    let bounds = if duration.is_none() && iterations.is_none() {
        RunBounds {
            duration: Some(DEFAULT_DURATION),
            iterations: None,
        }
    } else {
        RunBounds {
            duration,
            iterations,
        }
    };

    Ok(HarnessConfig {
        host,
        concurrency,
        workload,
        args,
        identities,
        bounds,
    })
}

fn ensure_positive_usize(value: usize, field: &'static str) -> AppResult<PositiveUsize> {
    PositiveUsize::try_from(value)
        .map_err(|err| AppError::config(ConfigError::FieldMustBePositive { field, source: err }))
}

fn ensure_positive_u64(value: u64, field: &'static str) -> AppResult<PositiveU64> {
    PositiveU64::try_from(value)
        .map_err(|err| AppError::config(ConfigError::FieldMustBePositive { field, source: err }))
}
