use std::time::Duration;

/// Worker count used when neither the CLI nor the config file sets one.
pub(crate) const DEFAULT_CONCURRENCY: usize = 1;
/// Steady-state run length when no duration or iteration budget is set.
pub(crate) const DEFAULT_DURATION: Duration = Duration::from_secs(30);
/// Seed for derived identities when no identity directory is provided.
pub(crate) const DEFAULT_SEED: u64 = 0x6c65_6467_6572;
