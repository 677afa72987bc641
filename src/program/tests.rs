use std::collections::BTreeMap;
use std::sync::Arc;

use super::*;
use crate::error::WorkloadError;
use crate::identity::Identity;
use crate::ledger::{InMemoryLedger, LedgerClient, Operation, RequestOptions};

const EMPTY_MODULE: &[u8] = b"\0asm\x01\0\0\0";

fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect()
}

fn base_args() -> BTreeMap<String, String> {
    args(&[
        ("contract_name", "counter"),
        ("contract_account", "XC1111111111111111@xuper"),
        ("code_path", "/tmp/counter.wasm"),
        ("method_invoke_name", "increase"),
    ])
}

fn owner() -> Identity {
    Identity::derive(7, u64::MAX)
}

async fn ledger_with_account(account: &str) -> Result<Arc<InMemoryLedger>, String> {
    let ledger = Arc::new(InMemoryLedger::recording());
    ledger
        .create_contract_account(&owner(), account)
        .await
        .map_err(|err| err.to_string())?;
    Ok(ledger)
}

#[test]
fn program_config_applies_defaults() -> Result<(), String> {
    let config = ProgramConfig::from_args(&base_args()).map_err(|err| err.to_string())?;
    assert_eq!(config.module, crate::ledger::ModuleKind::Wasm);
    assert_eq!(config.method_mode, MethodMode::Invoke);
    assert!(config.method_query_name.is_empty());
    assert_eq!(config.contract_name, "counter");
    Ok(())
}

#[test]
fn program_config_reports_missing_keys() {
    for key in [
        "contract_name",
        "contract_account",
        "code_path",
        "method_invoke_name",
    ] {
        let mut values = base_args();
        values.remove(key);
        assert!(
            matches!(
                ProgramConfig::from_args(&values),
                Err(WorkloadError::MissingArg { key: missing }) if missing == key
            ),
            "expected missing {}",
            key
        );
    }
}

#[test]
fn query_mode_requires_query_method() {
    let mut values = base_args();
    values.insert("method_type".to_owned(), "query".to_owned());
    assert!(matches!(
        ProgramConfig::from_args(&values),
        Err(WorkloadError::MissingArg {
            key: "method_query_name"
        })
    ));

    values.insert("method_query_name".to_owned(), "get".to_owned());
    let config = ProgramConfig::from_args(&values);
    assert!(matches!(config, Ok(ref config) if config.method_mode == MethodMode::Query));
}

#[test]
fn invalid_module_and_mode_are_rejected() {
    let mut values = base_args();
    values.insert("module_name".to_owned(), "jvm".to_owned());
    assert!(matches!(
        ProgramConfig::from_args(&values),
        Err(WorkloadError::InvalidArg {
            key: "module_name",
            ..
        })
    ));

    let mut values = base_args();
    values.insert("method_type".to_owned(), "stream".to_owned());
    assert!(matches!(
        ProgramConfig::from_args(&values),
        Err(WorkloadError::InvalidArg {
            key: "method_type",
            ..
        })
    ));
}

#[test]
fn wasm_payload_validation_checks_header() {
    let program = WasmProgram::new(Arc::new(InMemoryLedger::recording()), BTreeMap::new());
    assert!(program.validate_payload(EMPTY_MODULE).is_ok());
    assert!(program.validate_payload(&[]).is_err());
    assert!(program.validate_payload(b"not wasm").is_err());
    assert!(program.validate_payload(b"\0asm\x02\0\0\0").is_err());
}

#[cfg(feature = "wasm")]
#[test]
fn wasm_payload_validation_parses_module() -> Result<(), String> {
    let program = WasmProgram::new(Arc::new(InMemoryLedger::recording()), BTreeMap::new());
    let module = wat::parse_str(r#"(module (func (export "increase")))"#)
        .map_err(|err| err.to_string())?;
    assert!(program.validate_payload(&module).is_ok());

    let mut truncated = module.clone();
    truncated.truncate(module.len().saturating_sub(2));
    assert!(program.validate_payload(&truncated).is_err());
    Ok(())
}

#[tokio::test]
async fn counter_publishes_with_creator_init_arg() -> Result<(), String> {
    let account = "XC1111111111111111@xuper";
    let ledger = ledger_with_account(account).await?;
    let mut values = base_args();
    values.insert("creator".to_owned(), "alice".to_owned());
    let config = ProgramConfig::from_args(&values).map_err(|err| err.to_string())?;
    let program = counter(&config, ledger.clone()).map_err(|err| err.to_string())?;

    let mut identity = owner();
    let bound = identity
        .bind_contract_account(account)
        .map_err(|err| err.to_string())?;
    program
        .publish(
            &bound,
            "counter",
            EMPTY_MODULE,
            &args(&[("extra", "1")]),
            RequestOptions::default(),
        )
        .await
        .map_err(|err| err.to_string())?;
    drop(bound);

    let deploys = ledger.calls_for(Operation::Deploy);
    let deploy = deploys.first().ok_or("no deploy recorded")?;
    assert_eq!(deploy.args.get("creator").map(String::as_str), Some("alice"));
    assert_eq!(deploy.args.get("extra").map(String::as_str), Some("1"));
    assert_eq!(deploy.contract_account.as_deref(), Some(account));
    assert_eq!(ledger.contract_owner("counter").as_deref(), Some(account));
    Ok(())
}

#[tokio::test]
async fn counter_defaults_creator() -> Result<(), String> {
    let account = "XC2222222222222222@xuper";
    let ledger = ledger_with_account(account).await?;
    let config = ProgramConfig::from_args(&base_args()).map_err(|err| err.to_string())?;
    let program = counter(&config, ledger.clone()).map_err(|err| err.to_string())?;

    let mut identity = owner();
    let bound = identity
        .bind_contract_account(account)
        .map_err(|err| err.to_string())?;
    program
        .publish(&bound, "counter", EMPTY_MODULE, &BTreeMap::new(), RequestOptions::default())
        .await
        .map_err(|err| err.to_string())?;

    let deploys = ledger.calls_for(Operation::Deploy);
    let creator = deploys
        .first()
        .and_then(|call| call.args.get("creator"))
        .cloned();
    assert_eq!(creator.as_deref(), Some("xchain"));
    Ok(())
}

#[tokio::test]
async fn short_content_has_no_init_args() -> Result<(), String> {
    let account = "XC3333333333333333@xuper";
    let ledger = ledger_with_account(account).await?;
    let config = ProgramConfig::from_args(&base_args()).map_err(|err| err.to_string())?;
    let program = short_content(&config, ledger.clone()).map_err(|err| err.to_string())?;

    let mut identity = owner();
    let bound = identity
        .bind_contract_account(account)
        .map_err(|err| err.to_string())?;
    program
        .publish(&bound, "notes", EMPTY_MODULE, &BTreeMap::new(), RequestOptions::default())
        .await
        .map_err(|err| err.to_string())?;

    let deploys = ledger.calls_for(Operation::Deploy);
    assert!(deploys.first().is_some_and(|call| call.args.is_empty()));
    Ok(())
}

#[tokio::test]
async fn call_and_read_reach_the_ledger() -> Result<(), String> {
    let account = "XC4444444444444444@xuper";
    let ledger = ledger_with_account(account).await?;
    let config = ProgramConfig::from_args(&base_args()).map_err(|err| err.to_string())?;
    let program = counter(&config, ledger.clone()).map_err(|err| err.to_string())?;

    let mut identity = owner();
    {
        let bound = identity
            .bind_contract_account(account)
            .map_err(|err| err.to_string())?;
        program
            .publish(&bound, "counter", EMPTY_MODULE, &BTreeMap::new(), RequestOptions::default())
            .await
            .map_err(|err| err.to_string())?;
    }

    let call_args = args(&[("id", "0")]);
    program
        .call(&identity, "counter", "increase", &call_args, RequestOptions::default())
        .await
        .map_err(|err| err.to_string())?;
    let receipt = program
        .read(&identity, "counter", "get", &call_args, RequestOptions::not_post())
        .await
        .map_err(|err| err.to_string())?;

    assert_eq!(
        receipt
            .payload
            .get("invocations")
            .and_then(serde_json::Value::as_u64),
        Some(1)
    );
    let queries = ledger.calls_for(Operation::Query);
    assert!(queries.first().is_some_and(|call| !call.posted));
    Ok(())
}

#[tokio::test]
async fn native_counter_uses_configured_runtime() -> Result<(), String> {
    let account = "XC5555555555555555@xuper";
    let ledger = ledger_with_account(account).await?;
    let mut values = base_args();
    values.insert("module_name".to_owned(), "native".to_owned());
    let config = ProgramConfig::from_args(&values).map_err(|err| err.to_string())?;
    let program = native_counter(&config, ledger.clone()).map_err(|err| err.to_string())?;
    assert_eq!(program.module(), crate::ledger::ModuleKind::Native);
    assert!(program.validate_payload(&[]).is_err());

    let mut identity = owner();
    let bound = identity
        .bind_contract_account(account)
        .map_err(|err| err.to_string())?;
    program
        .publish(&bound, "counter", b"ELF", &BTreeMap::new(), RequestOptions::default())
        .await
        .map_err(|err| err.to_string())?;
    drop(bound);

    let receipt = program
        .call(&identity, "counter", "increase", &BTreeMap::new(), RequestOptions::default())
        .await;
    assert!(receipt.is_ok());
    Ok(())
}

#[test]
fn native_runtime_defaults_to_go() {
    let program = NativeProgram::new(Arc::new(InMemoryLedger::recording()), "go");
    assert_eq!(program.runtime(), "go");
}
