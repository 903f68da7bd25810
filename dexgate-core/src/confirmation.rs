//! Confirmation Engine (C5): bounded polling of a submitted transaction
//! until it resolves, normalizing the result into a [`TransactionOutcome`].

use std::time::Instant;

use crate::config::Tunables;
use crate::family::{PollOutcome, Poller, TxHandle};
use crate::types::{OutcomeStatus, TransactionOutcome};

/// What the engine needs to know to normalize a poll result into balance
/// deltas for the response (§4.5 contract).
#[derive(Debug, Clone)]
pub struct ConfirmationRequest {
    pub chain_handle: TxHandle,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: u128,
    pub amount_out: u128,
}

/// Polls `poller` for `request.chain_handle` until it reaches a terminal
/// state or `tunables.confirmation_timeout` elapses. A timeout yields
/// `PENDING`, not an error (§4.5: "Transient polling errors MUST NOT fail
/// the call"); only an explicit terminal on-chain status ends the loop
/// early.
pub async fn confirm<P: Poller + ?Sized>(
    poller: &P,
    request: &ConfirmationRequest,
    tunables: &Tunables,
) -> TransactionOutcome {
    let deadline = Instant::now() + tunables.confirmation_timeout;

    loop {
        match poller.poll(&request.chain_handle).await {
            Ok(PollOutcome::Confirmed {
                fee,
                base_token_delta,
                quote_token_delta,
            }) => {
                return TransactionOutcome {
                    status: OutcomeStatus::Confirmed,
                    chain_handle: request.chain_handle.0.clone(),
                    fee,
                    token_in: request.token_in.clone(),
                    token_out: request.token_out.clone(),
                    amount_in: request.amount_in,
                    amount_out: request.amount_out,
                    base_token_balance_change: base_token_delta,
                    quote_token_balance_change: quote_token_delta,
                };
            }
            Ok(PollOutcome::Failed { reason: _ }) => {
                return TransactionOutcome {
                    status: OutcomeStatus::Failed,
                    chain_handle: request.chain_handle.0.clone(),
                    fee: None,
                    token_in: request.token_in.clone(),
                    token_out: request.token_out.clone(),
                    amount_in: request.amount_in,
                    amount_out: request.amount_out,
                    base_token_balance_change: 0,
                    quote_token_balance_change: 0,
                };
            }
            Ok(PollOutcome::Pending) => {}
            Err(_transient) => {
                // Logged by the caller via tracing; polling continues.
            }
        }

        if Instant::now() >= deadline {
            return TransactionOutcome {
                status: OutcomeStatus::Pending,
                chain_handle: request.chain_handle.0.clone(),
                fee: None,
                token_in: request.token_in.clone(),
                token_out: request.token_out.clone(),
                amount_in: request.amount_in,
                amount_out: request.amount_out,
                base_token_balance_change: 0,
                quote_token_balance_change: 0,
            };
        }

        tokio::time::sleep(tunables.polling_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct ScriptedPoller {
        calls: AtomicU32,
        confirm_after: u32,
    }

    impl Poller for ScriptedPoller {
        fn poll<'a>(
            &'a self,
            _handle: &'a TxHandle,
        ) -> crate::family::BoxFuture<'a, Result<PollOutcome, String>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Box::pin(async move {
                if n >= self.confirm_after {
                    Ok(PollOutcome::Confirmed {
                        fee: Some(100),
                        base_token_delta: -1_000,
                        quote_token_delta: 500,
                    })
                } else {
                    Ok(PollOutcome::Pending)
                }
            })
        }
    }

    fn request() -> ConfirmationRequest {
        ConfirmationRequest {
            chain_handle: TxHandle("0xhash".to_owned()),
            token_in: "USDC".to_owned(),
            token_out: "WETH".to_owned(),
            amount_in: 1_000,
            amount_out: 500,
        }
    }

    #[tokio::test]
    async fn confirms_after_polling() {
        let poller = ScriptedPoller {
            calls: AtomicU32::new(0),
            confirm_after: 3,
        };
        let mut tunables = Tunables::default();
        tunables.polling_interval = Duration::from_millis(1);
        tunables.confirmation_timeout = Duration::from_secs(5);

        let outcome = confirm(&poller, &request(), &tunables).await;
        assert_eq!(outcome.status, OutcomeStatus::Confirmed);
        assert_eq!(outcome.fee, Some(100));
    }

    #[tokio::test]
    async fn times_out_to_pending() {
        let poller = ScriptedPoller {
            calls: AtomicU32::new(0),
            confirm_after: u32::MAX,
        };
        let mut tunables = Tunables::default();
        tunables.polling_interval = Duration::from_millis(1);
        tunables.confirmation_timeout = Duration::from_millis(10);

        let outcome = confirm(&poller, &request(), &tunables).await;
        assert_eq!(outcome.status, OutcomeStatus::Pending);
    }
}
