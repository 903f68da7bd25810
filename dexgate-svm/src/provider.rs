//! Solana RPC adapter: implements [`BalanceSource`], [`Submitter`] and
//! [`Poller`] over `solana-client`'s async RPC client. The signature-hash
//! family needs no nonce coordinator (§4.4: "no nonce coordinator needed;
//! the transaction itself is serialized, simulated, submitted, polled for
//! confirmation via an opaque signature").

use std::str::FromStr;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;

use dexgate_core::family::{BoxFuture, BalanceSource, PollOutcome, Poller, SignedTx, Submitter, TxHandle};

/// Wraps one network's Solana RPC endpoint.
pub struct SvmProvider {
    client: RpcClient,
}

impl SvmProvider {
    #[must_use]
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    fn parse_pubkey(address: &str) -> Result<Pubkey, String> {
        Pubkey::from_str(address).map_err(|_| format!("invalid Solana address: {address}"))
    }

    pub(crate) fn client(&self) -> &RpcClient {
        &self.client
    }
}

impl BalanceSource for SvmProvider {
    fn balance<'a>(&'a self, owner: &'a str, token: &'a str) -> BoxFuture<'a, Result<u128, String>> {
        Box::pin(async move {
            let owner_key = Self::parse_pubkey(owner)?;

            if crate::token::is_native(token) {
                let lamports = self
                    .client
                    .get_balance(&owner_key)
                    .await
                    .map_err(|e| e.to_string())?;
                return Ok(u128::from(lamports));
            }

            let mint_key = Self::parse_pubkey(token)?;
            let associated = crate::token::associated_token_account(&owner_key, &mint_key);
            let amount = self
                .client
                .get_token_account_balance(&associated)
                .await
                .map_err(|e| e.to_string())?;
            amount
                .amount
                .parse::<u128>()
                .map_err(|_| "unparseable token account amount".to_owned())
        })
    }
}

impl Submitter for SvmProvider {
    fn simulate<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let versioned: VersionedTransaction =
                bincode::deserialize(&tx.0).map_err(|e| e.to_string())?;
            let result = self
                .client
                .simulate_transaction(&versioned)
                .await
                .map_err(|e| e.to_string())?;
            match result.value.err {
                Some(err) => Err(err.to_string()),
                None => Ok(()),
            }
        })
    }

    fn submit<'a>(&'a self, tx: &'a SignedTx) -> BoxFuture<'a, Result<TxHandle, String>> {
        Box::pin(async move {
            let versioned: VersionedTransaction =
                bincode::deserialize(&tx.0).map_err(|e| e.to_string())?;
            let signature = self
                .client
                .send_transaction(&versioned)
                .await
                .map_err(|e| e.to_string())?;
            Ok(TxHandle(signature.to_string()))
        })
    }
}

impl Poller for SvmProvider {
    fn poll<'a>(&'a self, handle: &'a TxHandle) -> BoxFuture<'a, Result<PollOutcome, String>> {
        Box::pin(async move {
            let signature =
                Signature::from_str(&handle.0).map_err(|_| format!("invalid signature: {}", handle.0))?;

            let statuses = self
                .client
                .get_signature_statuses(&[signature])
                .await
                .map_err(|e| e.to_string())?;

            match statuses.value.into_iter().next().flatten() {
                None => Ok(PollOutcome::Pending),
                Some(status) => {
                    if let Some(err) = status.err {
                        Ok(PollOutcome::Failed { reason: err.to_string() })
                    } else {
                        // The RPC only reports a status once the cluster has
                        // observed the signature; absence of `err` here is
                        // as terminal as this poll adapter needs.
                        Ok(PollOutcome::Confirmed {
                            fee: None,
                            base_token_delta: 0,
                            quote_token_delta: 0,
                        })
                    }
                }
            }
        })
    }
}

/// Default commitment used when constructing the underlying RPC client.
#[must_use]
pub fn default_commitment() -> CommitmentConfig {
    CommitmentConfig::confirmed()
}
