use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid argument '{value}'. Expected 'key=value'.")]
    InvalidKeyValue { value: String },
    #[error("Argument key must not be empty in '{value}'.")]
    EmptyArgKey { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Value must be >= {min}.")]
    ValueTooSmall { min: u64 },
    #[error("Invalid value: {source}")]
    InvalidNumber {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Invalid amount '{value}'. Expected a positive integer.")]
    InvalidAmount { value: String },
    #[error("Invalid module kind '{value}'. Use wasm, native, or evm.")]
    InvalidModuleKind { value: String },
    #[error("Invalid method type '{value}'. Use invoke or query.")]
    InvalidMethodMode { value: String },
    #[error("Missing host (set --host or provide in config).")]
    MissingHost,
    #[error("Missing workload (set --workload or provide in config).")]
    MissingWorkload,
    #[error("Contract account must not be empty.")]
    EmptyContractAccount,
    #[error("Contract account '{value}' must not contain whitespace.")]
    ContractAccountWhitespace { value: String },
}
