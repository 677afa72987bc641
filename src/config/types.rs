use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::args::{PositiveU64, PositiveUsize, parse_duration_arg};
use crate::error::ValidationError;
use crate::identity::IdentitySource;

/// On-disk configuration. Every field is optional; CLI values take precedence.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub host: Option<String>,
    #[serde(alias = "workers")]
    pub concurrency: Option<usize>,
    #[serde(alias = "case")]
    pub workload: Option<String>,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
    pub identities: Option<PathBuf>,
    pub seed: Option<u64>,
    pub duration: Option<DurationValue>,
    pub iterations: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }
}

/// Immutable run parameters, created once at startup.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub host: String,
    pub concurrency: PositiveUsize,
    pub workload: String,
    pub args: BTreeMap<String, String>,
    pub identities: IdentitySource,
    pub bounds: RunBounds,
}

/// Steady-state stop conditions for the driver; whichever is hit first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunBounds {
    pub duration: Option<Duration>,
    pub iterations: Option<PositiveU64>,
}
