use std::collections::BTreeMap;

use crate::error::{LedgerError, ValidationError, WorkloadError};
use crate::identity::Identity;
use crate::ledger::{LedgerClient, RequestOptions};
use crate::program::optional_arg;

/// Parses a required positive integer amount argument.
pub(super) fn parse_amount(
    args: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<u128, WorkloadError> {
    let raw = optional_arg(args, key).ok_or(WorkloadError::MissingArg { key })?;
    parse_positive_amount(raw).map_err(|source| WorkloadError::InvalidArg { key, source })
}

pub(super) fn parse_positive_amount(raw: &str) -> Result<u128, ValidationError> {
    match raw.trim().parse::<u128>() {
        Ok(value) if value > 0 => Ok(value),
        Ok(_) | Err(_) => Err(ValidationError::InvalidAmount {
            value: raw.to_owned(),
        }),
    }
}

/// Splits `amount` into `parts` sub-transfers. The remainder goes to the last
/// share and zero shares are dropped.
pub(super) fn split_amount(amount: u128, parts: usize) -> Vec<u128> {
    let divisor = u128::try_from(parts).unwrap_or(u128::MAX).max(1);
    let share = amount.checked_div(divisor).unwrap_or(0);
    let remainder = amount.checked_rem(divisor).unwrap_or(0);
    let mut shares = vec![share; parts.max(1)];
    if let Some(last) = shares.last_mut() {
        *last = last.saturating_add(remainder);
    }
    shares.retain(|share| *share > 0);
    shares
}

/// Sends `amount` to every worker, `split` sub-transfers each.
pub(super) async fn fund_workers(
    client: &dyn LedgerClient,
    from: &Identity,
    workers: &[Identity],
    amount: u128,
    split: usize,
) -> Result<(), LedgerError> {
    let shares = split_amount(amount, split);
    for worker in workers {
        for share in &shares {
            client
                .transfer(
                    from,
                    worker.address(),
                    &share.to_string(),
                    RequestOptions::default(),
                )
                .await?;
        }
        tracing::debug!("funded worker {} with {}", worker.address(), amount);
    }
    tracing::info!(
        "funded {} workers with {} each in {} transfers",
        workers.len(),
        amount,
        shares.len()
    );
    Ok(())
}
