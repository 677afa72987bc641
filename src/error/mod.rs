mod app;
mod config;
mod identity;
mod ledger;
mod metrics;
mod validation;
mod workload;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use identity::IdentityError;
pub use ledger::LedgerError;
pub use metrics::MetricsError;
pub use validation::ValidationError;
pub use workload::{ErrorCategory, SetupStep, WorkloadError};
