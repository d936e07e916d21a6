//! Contract call encoding for the TRC-20 token and batch payout contracts
//!
//! The full node computes the 4-byte selector from the textual function
//! signature, so only the argument block is ABI-encoded here.

use crate::address::Address;
use crate::error::{Error, Result};

/// ABI word size in bytes
const WORD: usize = 32;

pub const TRANSFER: &str = "transfer(address,uint256)";
pub const APPROVE: &str = "approve(address,uint256)";
pub const BALANCE_OF: &str = "balanceOf(address)";
pub const BATCH_TRANSFER: &str = "batchTransfer(address[],uint256[])";

/// A contract function invocation ready for `triggersmartcontract`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Textual signature, e.g. `transfer(address,uint256)`
    pub function_selector: &'static str,
    /// Hex-encoded argument block without selector
    pub parameter: String,
}

fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn usize_word(value: usize) -> [u8; WORD] {
    uint_word(value as u128)
}

/// `transfer(recipient, amount)` on the token contract
pub fn transfer_call(recipient: &Address, amount: u128) -> ContractCall {
    let mut data = Vec::with_capacity(2 * WORD);
    data.extend_from_slice(&address_word(recipient));
    data.extend_from_slice(&uint_word(amount));
    ContractCall {
        function_selector: TRANSFER,
        parameter: hex::encode(data),
    }
}

/// `approve(spender, amount)` on the token contract
pub fn approve_call(spender: &Address, amount: u128) -> ContractCall {
    let mut data = Vec::with_capacity(2 * WORD);
    data.extend_from_slice(&address_word(spender));
    data.extend_from_slice(&uint_word(amount));
    ContractCall {
        function_selector: APPROVE,
        parameter: hex::encode(data),
    }
}

/// `balanceOf(owner)` on the token contract
pub fn balance_of_call(owner: &Address) -> ContractCall {
    ContractCall {
        function_selector: BALANCE_OF,
        parameter: hex::encode(address_word(owner)),
    }
}

/// `batchTransfer(recipients, amounts)` on the batch contract.
///
/// Both arguments are dynamic arrays, so the head holds two offsets followed
/// by each array's length-prefixed tail.
pub fn batch_transfer_call(recipients: &[Address], amounts: &[u128]) -> ContractCall {
    let first_tail = 2 * WORD;
    let second_tail = first_tail + WORD * (1 + recipients.len());

    let mut data = Vec::with_capacity(second_tail + WORD * (1 + amounts.len()));
    data.extend_from_slice(&usize_word(first_tail));
    data.extend_from_slice(&usize_word(second_tail));

    data.extend_from_slice(&usize_word(recipients.len()));
    for recipient in recipients {
        data.extend_from_slice(&address_word(recipient));
    }

    data.extend_from_slice(&usize_word(amounts.len()));
    for amount in amounts {
        data.extend_from_slice(&uint_word(*amount));
    }

    ContractCall {
        function_selector: BATCH_TRANSFER,
        parameter: hex::encode(data),
    }
}

/// Decode a single `uint256` return value, such as a `balanceOf` result.
pub fn decode_uint(result_hex: &str) -> Result<u128> {
    let bytes = hex::decode(result_hex.trim_start_matches("0x"))?;
    if bytes.len() != WORD {
        return Err(Error::Abi(format!(
            "Expected a {} byte word, got {} bytes",
            WORD,
            bytes.len()
        )));
    }
    if bytes[..16].iter().any(|b| *b != 0) {
        return Err(Error::Abi("uint256 value does not fit in 128 bits".to_string()));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&bytes[16..]);
    Ok(u128::from_be_bytes(low))
}
