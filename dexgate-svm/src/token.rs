//! SPL token helpers: native-asset sentinel and associated token account
//! derivation, the SVM analogue of `dexgate-evm::erc20`.

use solana_pubkey::Pubkey;

/// Gateway's sentinel for "native asset" (lamports/SOL), matching the
/// connectors this crate serves.
pub fn is_native(token: &str) -> bool {
    token.eq_ignore_ascii_case("native") || token.eq_ignore_ascii_case("SOL")
}

/// Derives the associated token account for `(owner, mint)` under the
/// standard SPL associated-token-account program, without needing the
/// `spl-associated-token-account` crate's full dependency surface.
#[must_use]
pub fn associated_token_account(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
        solana_pubkey::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

    let (address, _bump) = Pubkey::find_program_address(
        &[
            owner.as_ref(),
            spl_token::id().as_ref(),
            mint.as_ref(),
        ],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    );
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_sentinel_is_case_insensitive() {
        assert!(is_native("native"));
        assert!(is_native("SOL"));
        assert!(!is_native("USDC_MINT"));
    }
}
