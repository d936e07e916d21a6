//! TRON address parsing and validation
//!
//! Accepts the two textual forms wallets hand out:
//! - Base58Check (`T...`, 34 characters)
//! - Hex, either `41`-prefixed (21 bytes) or `0x`-prefixed EVM style

use crate::error::{Error, Result};
use std::fmt;

/// Version byte of every TRON mainnet/testnet address
pub const ADDRESS_PREFIX: u8 = 0x41;

/// A 20-byte account or contract address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Base58Check form (`T...`)
    pub fn to_base58(&self) -> String {
        let mut payload = Vec::with_capacity(21);
        payload.push(ADDRESS_PREFIX);
        payload.extend_from_slice(&self.0);
        bs58::encode(payload).with_check().into_string()
    }

    /// `41`-prefixed hex form used by the full node HTTP API
    pub fn to_hex(&self) -> String {
        format!("{:02x}{}", ADDRESS_PREFIX, hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl std::str::FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_address(s)
    }
}

/// Textual form an address was given in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFormat {
    Base58,
    Hex,
}

/// Detect which textual form an address string uses
pub fn address_format(address: &str) -> AddressFormat {
    if address.starts_with('T') {
        AddressFormat::Base58
    } else {
        AddressFormat::Hex
    }
}

/// Parse and validate a TRON address in Base58Check or hex form.
///
/// Short hex values are left-padded to 20 bytes, matching how the ABI pads an
/// address argument.
pub fn parse_address(address: &str) -> Result<Address> {
    let address = address.trim();
    if address.is_empty() {
        return Err(Error::Address("Address is empty".to_string()));
    }

    match address_format(address) {
        AddressFormat::Base58 => parse_base58(address),
        AddressFormat::Hex => parse_hex(address),
    }
}

fn parse_base58(address: &str) -> Result<Address> {
    let payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| Error::Address(format!("Failed to decode base58 address: {}", e)))?;

    if payload.len() != 21 || payload[0] != ADDRESS_PREFIX {
        return Err(Error::Address(format!(
            "Base58 address has unexpected payload of {} bytes",
            payload.len()
        )));
    }

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&payload[1..]);
    Ok(Address(bytes))
}

fn parse_hex(address: &str) -> Result<Address> {
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or_else(|| {
            if address.len() == 42
                && address.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("41"))
            {
                &address[2..]
            } else {
                address
            }
        });

    if digits.is_empty() || digits.len() > 40 {
        return Err(Error::Address(format!(
            "Hex address must have 1 to 40 digits, got {}",
            digits.len()
        )));
    }

    let padded = format!("{:0>40}", digits);
    let decoded = hex::decode(&padded)
        .map_err(|e| Error::Address(format!("Failed to decode hex address: {}", e)))?;

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&decoded);
    Ok(Address(bytes))
}

/// Validate an address format without keeping the parsed value
pub fn is_valid_address(address: &str) -> bool {
    parse_address(address).is_ok()
}

/// Redact an address or hash for safe display/logging.
///
/// Keeps the first N and last M visible characters, replaces the middle with '…'.
pub fn redact_middle(input: &str, keep_start: usize, keep_end: usize) -> String {
    if input.len() <= keep_start + keep_end + 1 || !input.is_ascii() {
        return input.to_string();
    }
    let start = &input[..keep_start];
    let end = &input[input.len() - keep_end..];
    format!("{start}…{end}")
}
