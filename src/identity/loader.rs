use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};

use crate::error::IdentityError;

use super::{Identity, KEY_LEN};

pub const BANK_DIR: &str = "bank";
pub const ADDRESS_FILE: &str = "address";
pub const PRIVATE_KEY_FILE: &str = "private.key";

/// Reads `address` and a base64 `private.key` from `dir`.
pub(super) fn load_identity(dir: &Path) -> Result<Identity, IdentityError> {
    let address_path = dir.join(ADDRESS_FILE);
    let address = read_trimmed(&address_path)?;
    if address.is_empty() {
        return Err(IdentityError::EmptyAddress { path: address_path });
    }

    let key_path = dir.join(PRIVATE_KEY_FILE);
    let encoded = read_trimmed(&key_path)?;
    let decoded = B64
        .decode(encoded.as_bytes())
        .map_err(|err| IdentityError::InvalidKey {
            path: key_path.clone(),
            source: err,
        })?;
    let key: [u8; KEY_LEN] =
        decoded
            .as_slice()
            .try_into()
            .map_err(|_err: std::array::TryFromSliceError| IdentityError::KeyLength {
                path: key_path.clone(),
                len: decoded.len(),
                expected: KEY_LEN,
            })?;

    Ok(Identity::new(address, key))
}

fn read_trimmed(path: &Path) -> Result<String, IdentityError> {
    std::fs::read_to_string(path)
        .map(|content| content.trim().to_owned())
        .map_err(|err| IdentityError::ReadFile {
            path: path.to_path_buf(),
            source: err,
        })
}
