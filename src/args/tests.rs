use clap::Parser;
use std::time::Duration;

use super::parsers::{parse_duration_arg, parse_key_value};
use super::{BenchArgs, PositiveUsize};

#[test]
fn parses_repeatable_workload_args() -> Result<(), String> {
    let args = BenchArgs::try_parse_from([
        "ledgerbench",
        "--host",
        "memory://",
        "-c",
        "4",
        "-w",
        "contract",
        "-a",
        "contract_name=counter",
        "--arg",
        "method_type = query",
    ])
    .map_err(|err| format!("parse failed: {}", err))?;

    if args.host.as_deref() != Some("memory://") {
        return Err(format!("Unexpected host: {:?}", args.host));
    }
    if args.concurrency.map(PositiveUsize::get) != Some(4) {
        return Err("Unexpected concurrency".to_owned());
    }
    let expected = vec![
        ("contract_name".to_owned(), "counter".to_owned()),
        ("method_type".to_owned(), "query".to_owned()),
    ];
    if args.args != expected {
        return Err(format!("Unexpected args: {:?}", args.args));
    }
    Ok(())
}

#[test]
fn zero_concurrency_is_rejected() {
    let parsed = BenchArgs::try_parse_from(["ledgerbench", "-c", "0"]);
    assert!(parsed.is_err());
}

#[test]
fn key_value_requires_separator_and_key() {
    assert!(parse_key_value("amount").is_err());
    assert!(parse_key_value("=10").is_err());
    assert!(matches!(
        parse_key_value("amount="),
        Ok((key, value)) if key == "amount" && value.is_empty()
    ));
}

#[test]
fn duration_units_are_supported() -> Result<(), String> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("5", Duration::from_secs(5)),
        ("2m", Duration::from_secs(120)),
        ("1h", Duration::from_secs(3600)),
    ];
    for (input, expected) in cases {
        let parsed = parse_duration_arg(input).map_err(|err| err.to_string())?;
        if parsed != expected {
            return Err(format!("{} parsed as {:?}", input, parsed));
        }
    }
    assert!(parse_duration_arg("0s").is_err());
    assert!(parse_duration_arg("10d").is_err());
    assert!(parse_duration_arg("").is_err());
    Ok(())
}
