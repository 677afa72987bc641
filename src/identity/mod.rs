//! Worker identities and the funding ("bank") identity.
//!
//! Each worker slot `0..N` owns exactly one [`Identity`] for the lifetime of a
//! run. Sharing one identity between concurrent workers would make their
//! transactions race on the same account sequence, so the pool never hands the
//! same slot out twice.
mod loader;


use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as B64};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::args::PositiveUsize;
use crate::error::{IdentityError, ValidationError};

pub use loader::{ADDRESS_FILE, BANK_DIR, PRIVATE_KEY_FILE};

/// Length of an identity's private key material in bytes.
pub const KEY_LEN: usize = 32;
const ADDRESS_BYTES: usize = 20;
const ADDRESS_PREFIX: &str = "lb";
const FUNDING_SALT: u64 = u64::MAX;
const SLOT_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Where identities come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// Deterministically derived from a seed; repeated runs reuse the same
    /// addresses, which keeps funded accounts from earlier runs useful.
    Derived { seed: u64 },
    /// Loaded from `<dir>/bank` and `<dir>/<slot>`.
    Directory(PathBuf),
}

#[derive(Clone)]
pub struct Identity {
    address: String,
    key: [u8; KEY_LEN],
    contract_account: Option<String>,
}

impl Identity {
    #[must_use]
    pub const fn new(address: String, key: [u8; KEY_LEN]) -> Self {
        Self {
            address,
            key,
            contract_account: None,
        }
    }

    /// Derives an identity from `seed` and a per-slot salt.
    #[must_use]
    pub fn derive(seed: u64, salt: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed ^ salt.wrapping_mul(SLOT_MIX));
        let mut key = [0u8; KEY_LEN];
        rng.fill_bytes(&mut key);
        let address = address_from_key(&key);
        Self::new(address, key)
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub const fn key_material(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Contract account currently bound for deploys, if any.
    #[must_use]
    pub fn contract_account(&self) -> Option<&str> {
        self.contract_account.as_deref()
    }

    /// Binds `account` as the active contract account until the returned guard
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the account name is empty or contains whitespace.
    pub fn bind_contract_account(
        &mut self,
        account: &str,
    ) -> Result<ContractAccountBinding<'_>, ValidationError> {
        if account.is_empty() {
            return Err(ValidationError::EmptyContractAccount);
        }
        if account.chars().any(char::is_whitespace) {
            return Err(ValidationError::ContractAccountWhitespace {
                value: account.to_owned(),
            });
        }
        self.contract_account = Some(account.to_owned());
        Ok(ContractAccountBinding { identity: self })
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("contract_account", &self.contract_account)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Scoped contract-account binding. The binding is released when this guard
/// goes out of scope, on success and error paths alike.
pub struct ContractAccountBinding<'id> {
    identity: &'id mut Identity,
}

impl Deref for ContractAccountBinding<'_> {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        self.identity
    }
}

impl Drop for ContractAccountBinding<'_> {
    fn drop(&mut self) {
        self.identity.contract_account = None;
    }
}

fn address_from_key(key: &[u8; KEY_LEN]) -> String {
    let prefix: Vec<u8> = key.iter().take(ADDRESS_BYTES).copied().collect();
    format!("{}{}", ADDRESS_PREFIX, B64.encode(prefix))
}

/// Funding identity plus one identity per worker slot.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    funding: Identity,
    workers: Vec<Identity>,
}

impl IdentityPool {
    /// Allocates exactly `count` worker identities and the funding identity.
    ///
    /// # Errors
    ///
    /// Returns an error when a directory source is missing files or holds
    /// malformed keys.
    pub fn load(source: &IdentitySource, count: PositiveUsize) -> Result<Self, IdentityError> {
        let pool = match source {
            IdentitySource::Derived { seed } => Self {
                funding: Identity::derive(*seed, FUNDING_SALT),
                workers: (0..count.get())
                    .map(|slot| Identity::derive(*seed, slot_salt(slot)))
                    .collect(),
            },
            IdentitySource::Directory(dir) => Self {
                funding: loader::load_identity(&dir.join(BANK_DIR))?,
                workers: (0..count.get())
                    .map(|slot| loader::load_identity(&dir.join(slot.to_string())))
                    .collect::<Result<Vec<_>, _>>()?,
            },
        };
        tracing::debug!(
            "Loaded {} worker identities, bank={}",
            pool.workers.len(),
            pool.funding
        );
        Ok(pool)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    #[must_use]
    pub fn worker(&self, slot: usize) -> Option<&Identity> {
        self.workers.get(slot)
    }

    #[must_use]
    pub fn workers(&self) -> &[Identity] {
        &self.workers
    }

    #[must_use]
    pub const fn funding(&self) -> &Identity {
        &self.funding
    }

    pub const fn funding_mut(&mut self) -> &mut Identity {
        &mut self.funding
    }
}

fn slot_salt(slot: usize) -> u64 {
    u64::try_from(slot).unwrap_or(u64::MAX).wrapping_add(1)
}
