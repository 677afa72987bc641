/// Largest contract payload accepted for publishing.
pub(super) const MAX_WASM_BYTES: usize = 16 * 1024 * 1024;
const WASM_MAGIC: [u8; 4] = *b"\0asm";
const WASM_VERSION: [u8; 4] = [1, 0, 0, 0];

pub(super) fn validate_wasm_payload(payload: &[u8]) -> Result<(), String> {
    if payload.is_empty() {
        return Err("contract code is empty".to_owned());
    }
    if payload.len() > MAX_WASM_BYTES {
        return Err(format!(
            "contract code is {} bytes, limit is {}",
            payload.len(),
            MAX_WASM_BYTES
        ));
    }
    if payload.get(..4) != Some(WASM_MAGIC.as_slice()) {
        return Err("missing WASM magic header".to_owned());
    }
    if payload.get(4..8) != Some(WASM_VERSION.as_slice()) {
        return Err("unsupported WASM binary version".to_owned());
    }

    #[cfg(feature = "wasm")]
    validate_wasm_module(payload)?;

    Ok(())
}

#[cfg(feature = "wasm")]
fn validate_wasm_module(payload: &[u8]) -> Result<(), String> {
    use wasmparser::{Parser, Payload};

    wasmparser::validate(payload).map_err(|err| format!("invalid WASM module: {}", err))?;

    for section in Parser::new(0).parse_all(payload) {
        let section = section.map_err(|err| format!("invalid WASM module: {}", err))?;
        if let Payload::MemorySection(reader) = section {
            for memory in reader {
                let memory = memory.map_err(|err| format!("invalid memory section: {}", err))?;
                if memory.shared {
                    return Err("shared memories are not supported by the ledger".to_owned());
                }
                if memory.memory64 {
                    return Err("64-bit memories are not supported by the ledger".to_owned());
                }
            }
        }
    }
    Ok(())
}
