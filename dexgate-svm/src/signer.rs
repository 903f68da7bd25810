//! Keypair [`Signer`] for the signature-hash family.

use solana_keypair::Keypair;
use solana_message::VersionedMessage;
use solana_signer::Signer as SolanaSigner;
use solana_transaction::versioned::VersionedTransaction;

use dexgate_core::family::{BoxFuture, Signer, SignedTx, UnsignedTx};

/// Wraps an in-process keypair. Solana has no ERC-20-style allowance and
/// no account nonce, so this is the only signer variant the family needs
/// for software wallets; a hardware path would implement [`Signer`]
/// directly against its own transport, same as `dexgate_evm::signer`.
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    #[must_use]
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    #[must_use]
    pub fn address(&self) -> String {
        self.keypair.pubkey().to_string()
    }
}

impl Signer for KeypairSigner {
    fn sign<'a>(&'a self, tx: &'a UnsignedTx, address: &'a str) -> BoxFuture<'a, Result<SignedTx, String>> {
        Box::pin(async move {
            if address != self.address() {
                return Err("signer address mismatch".to_owned());
            }

            let mut versioned: VersionedTransaction =
                bincode::deserialize(&tx.0).map_err(|e| e.to_string())?;

            let VersionedMessage::V0(message) = &versioned.message else {
                return Err("expected a v0 message".to_owned());
            };
            let signature = self.keypair.sign_message(&message.serialize());
            versioned.signatures = vec![signature];

            bincode::serialize(&versioned)
                .map(SignedTx)
                .map_err(|e| e.to_string())
        })
    }

    fn is_hardware(&self) -> bool {
        false
    }
}
