use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::json;

use crate::error::LedgerError;
use crate::identity::Identity;

use super::{
    Connector, DeployRequest, InvokeRequest, LedgerClient, ModuleKind, Receipt, RequestOptions,
};

/// Balance given to an address the first time it sends funds without ever
/// having received any. Stands in for pre-funded genesis accounts.
const GENESIS_BALANCE: u128 = 1 << 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    CreateAccount,
    Transfer,
    Deploy,
    Invoke,
    Query,
}

/// One request as seen by the in-memory ledger, recorded whether or not it
/// succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub from: String,
    /// Account, transfer recipient, or contract name.
    pub target: String,
    pub method: Option<String>,
    pub args: BTreeMap<String, String>,
    pub amount: Option<String>,
    pub contract_account: Option<String>,
    pub posted: bool,
}

#[derive(Debug)]
struct DeployedContract {
    module: ModuleKind,
    account: String,
    invocations: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    record_calls: bool,
    next_tx: u64,
    accounts: BTreeSet<String>,
    balances: HashMap<String, u128>,
    contracts: BTreeMap<String, DeployedContract>,
    calls: Vec<RecordedCall>,
    rejected_operations: BTreeMap<Operation, String>,
    rejected_senders: BTreeSet<String>,
}

impl LedgerState {
    fn record(&mut self, call: impl FnOnce() -> RecordedCall) {
        if self.record_calls {
            self.calls.push(call());
        }
    }

    fn receipt(&mut self, payload: serde_json::Value) -> Receipt {
        self.next_tx = self.next_tx.saturating_add(1);
        Receipt {
            tx_id: format!("{:016x}", self.next_tx),
            payload,
        }
    }

    fn check_rejections(&self, operation: Operation, from: &str) -> Result<(), LedgerError> {
        if let Some(message) = self.rejected_operations.get(&operation) {
            return Err(LedgerError::from_message(message));
        }
        if self.rejected_senders.contains(from) {
            return Err(LedgerError::Rejected {
                message: format!("sender {} is rejected", from),
            });
        }
        Ok(())
    }

    fn contract(&self, name: &str, module: ModuleKind) -> Result<&DeployedContract, LedgerError> {
        let contract = self
            .contracts
            .get(name)
            .ok_or_else(|| LedgerError::Rejected {
                message: format!("contract {} not found", name),
            })?;
        if contract.module != module {
            return Err(LedgerError::Rejected {
                message: format!(
                    "contract {} is a {} module, not {}",
                    name,
                    contract.module.as_str(),
                    module.as_str()
                ),
            });
        }
        Ok(contract)
    }
}

/// In-process ledger implementing [`LedgerClient`].
///
/// Used for `memory://` dry runs and as the backend of the test suite. It keeps
/// accounts, balances and deployed contracts, and can be told to reject
/// operations or senders. Only a ledger built with [`InMemoryLedger::recording`]
/// keeps a log of requests; dry runs use [`InMemoryLedger::new`] so long runs
/// do not accumulate one entry per call.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that records every request for later inspection through
    /// [`InMemoryLedger::calls`].
    #[must_use]
    pub fn recording() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                record_calls: true,
                ..LedgerState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every later `operation` fail with `message`. Messages containing
    /// "already exists" surface as [`LedgerError::AlreadyExists`].
    pub fn reject_operation(&self, operation: Operation, message: &str) {
        self.lock()
            .rejected_operations
            .insert(operation, message.to_owned());
    }

    /// Makes every later request issued by `address` fail.
    pub fn reject_sender(&self, address: &str) {
        self.lock().rejected_senders.insert(address.to_owned());
    }

    pub fn clear_rejections(&self) {
        let mut state = self.lock();
        state.rejected_operations.clear();
        state.rejected_senders.clear();
    }

    /// Requests seen so far. Always empty unless built with
    /// [`InMemoryLedger::recording`].
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn calls_for(&self, operation: Operation) -> Vec<RecordedCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn balance(&self, address: &str) -> u128 {
        self.lock().balances.get(address).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn has_account(&self, account: &str) -> bool {
        self.lock().accounts.contains(account)
    }

    #[must_use]
    pub fn has_contract(&self, name: &str) -> bool {
        self.lock().contracts.contains_key(name)
    }

    /// Account that owns contract `name`, if deployed.
    #[must_use]
    pub fn contract_owner(&self, name: &str) -> Option<String> {
        self.lock()
            .contracts
            .get(name)
            .map(|contract| contract.account.clone())
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn create_contract_account(
        &self,
        from: &Identity,
        account: &str,
    ) -> Result<Receipt, LedgerError> {
        let mut state = self.lock();
        state.record(|| RecordedCall {
            operation: Operation::CreateAccount,
            from: from.address().to_owned(),
            target: account.to_owned(),
            method: None,
            args: BTreeMap::new(),
            amount: None,
            contract_account: None,
            posted: true,
        });
        state.check_rejections(Operation::CreateAccount, from.address())?;
        if state.accounts.contains(account) {
            return Err(LedgerError::AlreadyExists {
                message: format!("account {} already exists", account),
            });
        }
        state.accounts.insert(account.to_owned());
        Ok(state.receipt(json!({ "account": account })))
    }

    async fn transfer(
        &self,
        from: &Identity,
        to: &str,
        amount: &str,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let mut state = self.lock();
        state.record(|| RecordedCall {
            operation: Operation::Transfer,
            from: from.address().to_owned(),
            target: to.to_owned(),
            method: None,
            args: BTreeMap::new(),
            amount: Some(amount.to_owned()),
            contract_account: None,
            posted: opts.post,
        });
        state.check_rejections(Operation::Transfer, from.address())?;
        let value: u128 = amount.trim().parse().map_err(|_err: std::num::ParseIntError| {
            LedgerError::Rejected {
                message: format!("invalid amount {}", amount),
            }
        })?;
        let sender_balance = *state
            .balances
            .entry(from.address().to_owned())
            .or_insert(GENESIS_BALANCE);
        let remaining = sender_balance
            .checked_sub(value)
            .ok_or_else(|| LedgerError::Rejected {
                message: format!("insufficient balance for {}", from.address()),
            })?;
        if opts.post {
            state.balances.insert(from.address().to_owned(), remaining);
            let receiver = state.balances.entry(to.to_owned()).or_insert(0);
            *receiver = receiver.saturating_add(value);
        }
        Ok(state.receipt(json!({ "from": from.address(), "to": to, "amount": amount })))
    }

    async fn deploy(
        &self,
        from: &Identity,
        request: DeployRequest<'_>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let mut state = self.lock();
        state.record(|| RecordedCall {
            operation: Operation::Deploy,
            from: from.address().to_owned(),
            target: request.name.to_owned(),
            method: None,
            args: request.args.clone(),
            amount: None,
            contract_account: from.contract_account().map(str::to_owned),
            posted: opts.post,
        });
        state.check_rejections(Operation::Deploy, from.address())?;
        let account = from
            .contract_account()
            .ok_or_else(|| LedgerError::Rejected {
                message: "deploy requires a bound contract account".to_owned(),
            })?;
        if !state.accounts.contains(account) {
            return Err(LedgerError::Rejected {
                message: format!("contract account {} not found", account),
            });
        }
        if state.contracts.contains_key(request.name) {
            return Err(LedgerError::AlreadyExists {
                message: format!("contract {} already exists", request.name),
            });
        }
        if opts.post {
            state.contracts.insert(
                request.name.to_owned(),
                DeployedContract {
                    module: request.module,
                    account: account.to_owned(),
                    invocations: 0,
                },
            );
        }
        Ok(state.receipt(json!({
            "contract": request.name,
            "module": request.module,
            "code_len": request.code.len(),
        })))
    }

    async fn invoke(
        &self,
        from: &Identity,
        request: InvokeRequest<'_>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let mut state = self.lock();
        state.record(|| call_record(Operation::Invoke, from, &request, opts));
        state.check_rejections(Operation::Invoke, from.address())?;
        let invocations = state
            .contract(request.name, request.module)?
            .invocations
            .saturating_add(1);
        if opts.post
            && let Some(contract) = state.contracts.get_mut(request.name)
        {
            contract.invocations = invocations;
        }
        Ok(state.receipt(json!({
            "contract": request.name,
            "method": request.method,
            "args": request.args,
            "invocations": invocations,
        })))
    }

    async fn query(
        &self,
        from: &Identity,
        request: InvokeRequest<'_>,
        opts: RequestOptions,
    ) -> Result<Receipt, LedgerError> {
        let mut state = self.lock();
        state.record(|| call_record(Operation::Query, from, &request, opts));
        state.check_rejections(Operation::Query, from.address())?;
        let invocations = state.contract(request.name, request.module)?.invocations;
        Ok(state.receipt(json!({
            "contract": request.name,
            "method": request.method,
            "args": request.args,
            "invocations": invocations,
        })))
    }
}

fn call_record(
    operation: Operation,
    from: &Identity,
    request: &InvokeRequest<'_>,
    opts: RequestOptions,
) -> RecordedCall {
    RecordedCall {
        operation,
        from: from.address().to_owned(),
        target: request.name.to_owned(),
        method: Some(request.method.to_owned()),
        args: request.args.clone(),
        amount: None,
        contract_account: None,
        posted: opts.post,
    }
}

/// Connector that always hands out the same shared [`InMemoryLedger`] and
/// counts how many connections were opened.
#[derive(Debug)]
pub struct InMemoryConnector {
    ledger: Arc<InMemoryLedger>,
    connections: AtomicUsize,
}

impl InMemoryConnector {
    #[must_use]
    pub const fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self {
            ledger,
            connections: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

impl Connector for InMemoryConnector {
    fn connect(&self, _host: &str) -> Result<Arc<dyn LedgerClient>, LedgerError> {
        self.connections.fetch_add(1, Ordering::Relaxed);
        Ok(self.ledger.clone())
    }
}
