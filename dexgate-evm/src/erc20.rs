//! Minimal ERC-20 ABI encoding via `alloy_sol_types`, just the three calls
//! the gateway needs (`balanceOf`, `allowance`, `approve`).

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// Gateway's sentinel for "native asset", matching how the connectors this
/// crate serves represent ETH/native balances rather than an ERC-20 token.
pub fn is_native(token: &str) -> bool {
    token.eq_ignore_ascii_case("native") || token.eq_ignore_ascii_case("ETH")
}

/// The canonical Permit2 contract address, deployed at the same address on
/// every supported network. Two-hop allowance designs (§4.4.2 step 2) route
/// owner approvals through this bridge contract before the router itself can
/// pull funds.
pub const PERMIT2_ADDRESS: &str = "0x000000000022D473030F116dDEE9F6B43aC78BA3";

pub fn encode_balance_of(owner: Address) -> Vec<u8> {
    IERC20::balanceOfCall { owner }.abi_encode()
}

pub fn encode_allowance(owner: Address, spender: Address) -> Vec<u8> {
    IERC20::allowanceCall { owner, spender }.abi_encode()
}

pub fn encode_approve(spender: Address, amount: u128) -> Vec<u8> {
    IERC20::approveCall {
        spender,
        amount: U256::from(amount),
    }
    .abi_encode()
}

/// Decodes a raw `eth_call` return value as a single `uint256`.
pub fn decode_u256(raw: &Bytes) -> Result<U256, String> {
    if raw.len() < 32 {
        return Err("eth_call return value shorter than one word".to_owned());
    }
    Ok(U256::from_be_slice(&raw[raw.len() - 32..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_sentinel_is_case_insensitive() {
        assert!(is_native("native"));
        assert!(is_native("ETH"));
        assert!(!is_native("0xabc"));
    }

    #[test]
    fn decode_u256_reads_trailing_word() {
        let mut raw = vec![0u8; 32];
        raw[31] = 42;
        let value = decode_u256(&Bytes::from(raw)).unwrap();
        assert_eq!(value, U256::from(42));
    }
}
