use std::str::FromStr;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::keccak256;

use tron_signing_core::{PortError, TypedParam};

use crate::address::TronAddress;

/// ABI-encodes call parameters (without selector) as the bare hex string the
/// full node expects in `parameter`.
pub fn encode_parameters(params: &[TypedParam]) -> Result<String, PortError> {
    let mut values = Vec::with_capacity(params.len());
    for (idx, param) in params.iter().enumerate() {
        let value = match param {
            TypedParam::Address(raw) => {
                let addr = TronAddress::from_str(raw).map_err(|e| {
                    PortError::Validation(format!("param {idx} is not an address: {e}"))
                })?;
                DynSolValue::Address(addr.evm_address())
            }
            TypedParam::Uint256(v) => DynSolValue::Uint(*v, 256),
        };
        values.push(value);
    }
    let encoded = DynSolValue::Tuple(values).abi_encode_params();
    Ok(alloy::hex::encode(encoded))
}

pub fn function_selector(method_signature: &str) -> [u8; 4] {
    let hash = keccak256(method_signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_slice()[0..4]);
    selector
}
