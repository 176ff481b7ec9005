//! TRON account addresses.
//!
//! A TRON address is 21 bytes: the `0x41` network prefix followed by the
//! 20-byte account id shared with the EVM. The user-facing form is
//! base58check (`T...`), the node's internal form is hex (`41...`).

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use thiserror::Error;

use tron_signing_core::PortError;

pub const ADDRESS_PREFIX: u8 = 0x41;
const ADDRESS_LEN: usize = 21;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid base58check address {0}")]
    Base58(String),
    #[error("invalid hex address {0}")]
    Hex(String),
    #[error("expected 21 address bytes, got {0}")]
    Length(usize),
    #[error("address prefix must be 0x41, got {0:#04x}")]
    Prefix(u8),
}

impl From<AddressError> for PortError {
    fn from(err: AddressError) -> Self {
        PortError::Validation(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress([u8; ADDRESS_LEN]);

impl TronAddress {
    pub fn from_evm(address: Address) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(address.as_slice());
        Self(bytes)
    }

    pub fn from_base58(raw: &str) -> Result<Self, AddressError> {
        let bytes = bs58::decode(raw.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| AddressError::Base58(format!("{raw}: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Accepts `41`-prefixed node hex or a bare/`0x` 20-byte EVM address.
    pub fn from_hex(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes =
            alloy::hex::decode(digits).map_err(|e| AddressError::Hex(format!("{raw}: {e}")))?;
        match bytes.len() {
            20 => Ok(Self::from_evm(Address::from_slice(&bytes))),
            _ => Self::from_bytes(&bytes),
        }
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != ADDRESS_LEN {
            return Err(AddressError::Length(bytes.len()));
        }
        if bytes[0] != ADDRESS_PREFIX {
            return Err(AddressError::Prefix(bytes[0]));
        }
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    pub fn to_hex(&self) -> String {
        alloy::hex::encode(self.0)
    }

    /// The 20-byte account id used in ABI-encoded parameters.
    pub fn evm_address(&self) -> Address {
        Address::from_slice(&self.0[1..])
    }
}

impl FromStr for TronAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim_start().starts_with('T') {
            Self::from_base58(s)
        } else {
            Self::from_hex(s)
        }
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}
