use std::path::PathBuf;
use thiserror::Error;

use super::{IdentityError, LedgerError, ValidationError};

/// Setup steps of the `init` sequence, in execution order.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    #[error("create contract account")]
    CreateAccount,
    #[error("fund contract account")]
    FundAccount,
    #[error("deploy contract")]
    Publish,
    #[error("fund worker accounts")]
    FundWorkers,
    #[error("warm-up invoke")]
    WarmUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unknown kinds or malformed arguments. Terminal.
    Configuration,
    /// The resource was provisioned by an earlier run. Tolerated.
    ProvisioningConflict,
    /// Any other failure while running `init`. Terminal for the run.
    SetupFailure,
    /// A failed steady-state call. Local to one `generate` invocation.
    RuntimeCallFailure,
}

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("Unknown workload '{kind}'. Available: {available}.")]
    UnknownWorkload { kind: String, available: String },
    #[error("Contract not exist: '{name}'. Available: {available}.")]
    UnknownProgram { name: String, available: String },
    #[error("Missing workload argument '{key}'.")]
    MissingArg { key: &'static str },
    #[error("Invalid workload argument '{key}': {source}")]
    InvalidArg {
        key: &'static str,
        #[source]
        source: ValidationError,
    },
    #[error("Contract '{program}' is a {expected} module, but module_name is '{configured}'.")]
    ModuleMismatch {
        program: String,
        expected: &'static str,
        configured: &'static str,
    },
    #[error("Load account error: {source}")]
    LoadIdentities {
        #[source]
        source: IdentityError,
    },
    #[error("New ledger client error: {source}, host={host}")]
    Connect {
        host: String,
        #[source]
        source: LedgerError,
    },
    #[error("Read contract code error: {source}, path={}", path.display())]
    ReadCode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid contract code '{}': {reason}", path.display())]
    InvalidCode { path: PathBuf, reason: String },
    #[error("Bind contract account error: {source}")]
    BindContractAccount {
        #[source]
        source: ValidationError,
    },
    #[error("{step} error: {source}")]
    Setup {
        step: SetupStep,
        #[source]
        source: LedgerError,
    },
    #[error("Worker {worker} call error: {source}")]
    Call {
        worker: usize,
        #[source]
        source: LedgerError,
    },
    #[error("Worker id {worker} is outside 0..{concurrency}.")]
    WorkerOutOfRange { worker: usize, concurrency: usize },
    #[error("Generator used before init completed.")]
    NotInitialized,
}

impl WorkloadError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            WorkloadError::UnknownWorkload { .. }
            | WorkloadError::UnknownProgram { .. }
            | WorkloadError::MissingArg { .. }
            | WorkloadError::InvalidArg { .. }
            | WorkloadError::ModuleMismatch { .. }
            | WorkloadError::LoadIdentities { .. }
            | WorkloadError::Connect { .. } => ErrorCategory::Configuration,
            WorkloadError::Setup {
                step: SetupStep::CreateAccount | SetupStep::Publish,
                source: LedgerError::AlreadyExists { .. },
            } => ErrorCategory::ProvisioningConflict,
            WorkloadError::Setup { .. }
            | WorkloadError::ReadCode { .. }
            | WorkloadError::InvalidCode { .. }
            | WorkloadError::BindContractAccount { .. } => ErrorCategory::SetupFailure,
            WorkloadError::Call { .. }
            | WorkloadError::WorkerOutOfRange { .. }
            | WorkloadError::NotInitialized => ErrorCategory::RuntimeCallFailure,
        }
    }
}
