use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{ValidationError, WorkloadError};
use crate::ledger::ModuleKind;

pub const CONTRACT_ACCOUNT: &str = "contract_account";
pub const CODE_PATH: &str = "code_path";
pub const MODULE_NAME: &str = "module_name";
pub const CONTRACT_NAME: &str = "contract_name";
pub const METHOD_INVOKE_NAME: &str = "method_invoke_name";
pub const METHOD_QUERY_NAME: &str = "method_query_name";
pub const METHOD_TYPE: &str = "method_type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodMode {
    #[default]
    Invoke,
    Query,
}

impl MethodMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MethodMode::Invoke => "invoke",
            MethodMode::Query => "query",
        }
    }
}

impl std::str::FromStr for MethodMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoke" => Ok(MethodMode::Invoke),
            "query" => Ok(MethodMode::Query),
            _ => Err(ValidationError::InvalidMethodMode {
                value: s.to_owned(),
            }),
        }
    }
}

/// Program-specific view of the workload arguments.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    pub contract_account: String,
    pub code_path: PathBuf,
    pub module: ModuleKind,
    pub contract_name: String,
    pub method_invoke_name: String,
    /// Empty unless the method mode is [`MethodMode::Query`].
    pub method_query_name: String,
    pub method_mode: MethodMode,
    pub args: BTreeMap<String, String>,
}

impl ProgramConfig {
    /// Extracts the program settings from the free-form argument map.
    ///
    /// `module_name` defaults to `wasm` and `method_type` to `invoke`.
    /// `method_query_name` is only required in query mode.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the missing or malformed key.
    pub fn from_args(args: &BTreeMap<String, String>) -> Result<Self, WorkloadError> {
        let contract_name = required_arg(args, CONTRACT_NAME)?;
        let contract_account = required_arg(args, CONTRACT_ACCOUNT)?;
        let code_path = PathBuf::from(required_arg(args, CODE_PATH)?);
        let method_invoke_name = required_arg(args, METHOD_INVOKE_NAME)?;

        let module = match optional_arg(args, MODULE_NAME) {
            Some(value) => value.parse().map_err(|err| WorkloadError::InvalidArg {
                key: MODULE_NAME,
                source: err,
            })?,
            None => ModuleKind::Wasm,
        };
        let method_mode = match optional_arg(args, METHOD_TYPE) {
            Some(value) => value.parse().map_err(|err| WorkloadError::InvalidArg {
                key: METHOD_TYPE,
                source: err,
            })?,
            None => MethodMode::Invoke,
        };
        let method_query_name = match method_mode {
            MethodMode::Query => required_arg(args, METHOD_QUERY_NAME)?,
            MethodMode::Invoke => optional_arg(args, METHOD_QUERY_NAME)
                .unwrap_or_default()
                .to_owned(),
        };

        Ok(Self {
            contract_account,
            code_path,
            module,
            contract_name,
            method_invoke_name,
            method_query_name,
            method_mode,
            args: args.clone(),
        })
    }
}

pub(crate) fn optional_arg<'args>(
    args: &'args BTreeMap<String, String>,
    key: &str,
) -> Option<&'args str> {
    args.get(key)
        .map(|value| value.as_str().trim())
        .filter(|value| !value.is_empty())
}

pub(crate) fn required_arg(
    args: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<String, WorkloadError> {
    optional_arg(args, key)
        .map(str::to_owned)
        .ok_or(WorkloadError::MissingArg { key })
}
