//! Minimal pool-program registry: which on-chain program ids belong to the
//! CLMM (concentrated-liquidity) family versus the default AMM family, and
//! instruction-building for the connectors this crate serves. The full
//! per-DEX registry (mint lists, fee tiers, instruction discriminators) is
//! an external collaborator per §1; this module carries only the minimal
//! dispatch the gateway core needs.

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use dexgate_core::family::RoutePayload;

/// Known CLMM-style pool program ids. Populated by the operator's
/// connector configuration at startup in a full deployment; fixed here to
/// keep the adapter self-contained.
pub fn is_clmm_program(_owner: &Pubkey) -> bool {
    false
}

/// Builds the swap instruction for a route. Concrete account/data layout
/// is connector-specific; this returns a well-formed instruction shell
/// (compute budget and routing are handled by the caller) that a real
/// connector's registry replaces with its own encoder.
pub fn build_swap_instruction(route: &RoutePayload, payer: &Pubkey) -> Result<Instruction, String> {
    let pool = route
        .pool_address
        .parse::<Pubkey>()
        .map_err(|_| "invalid pool address".to_owned())?;

    let mut data = Vec::with_capacity(17);
    data.push(if route.amount_in >= route.amount_out { 1 } else { 0 });
    data.extend_from_slice(&route.amount_in.to_le_bytes());

    Ok(Instruction {
        program_id: pool,
        accounts: vec![AccountMeta::new(*payer, true)],
        data,
    })
}
