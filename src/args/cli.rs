use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use super::parsers::{
    parse_duration_arg, parse_key_value, parse_positive_u64, parse_positive_usize,
};
use super::types::{PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone, Default)]
#[clap(
    version,
    about = "Pluggable async load generator for ledger networks - per-worker identities, idempotent program provisioning, and concurrent invoke/query workloads."
)]
pub struct BenchArgs {
    /// Ledger gateway host (http://, https://, or memory:// for an in-process ledger)
    #[arg(long, env = "LEDGERBENCH_HOST")]
    pub host: Option<String>,

    /// Number of concurrent workers; each worker owns one identity
    #[arg(long, short = 'c', value_parser = parse_positive_usize)]
    pub concurrency: Option<PositiveUsize>,

    /// Workload kind to run (see --list)
    #[arg(long, short = 'w')]
    pub workload: Option<String>,

    /// Workload argument in 'key=value' format (repeatable)
    #[arg(long = "arg", short = 'a', value_parser = parse_key_value)]
    pub args: Vec<(String, String)>,

    /// Path to config file (TOML or JSON)
    #[arg(long)]
    pub config: Option<String>,

    /// Directory holding bank/ and per-worker identity files
    #[arg(long)]
    pub identities: Option<PathBuf>,

    /// Seed for derived identities when no identity directory is given
    #[arg(long)]
    pub seed: Option<u64>,

    /// Steady-state run duration (supports ms/s/m/h)
    #[arg(long, short = 't', value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Total number of generate calls across all workers
    #[arg(long, short = 'n', value_parser = parse_positive_u64)]
    pub iterations: Option<PositiveU64>,

    /// List registered workload and contract kinds and exit
    #[arg(long)]
    pub list: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
