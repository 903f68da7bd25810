//! Software and hardware [`Signer`] implementations for the account-nonce
//! family.

use alloy_eips::eip2718::Encodable2718;
use alloy_network::TransactionBuilder;
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer::Signer as AlloySigner;
use alloy_signer_local::PrivateKeySigner;

use dexgate_core::family::{BoxFuture, Signer, SignedTx, UnsignedTx};

/// Wraps an in-process private key signer (`alloy_signer_local`).
pub struct SoftwareSigner {
    inner: PrivateKeySigner,
}

impl SoftwareSigner {
    #[must_use]
    pub fn new(inner: PrivateKeySigner) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn address(&self) -> String {
        format!("{:#x}", self.inner.address())
    }
}

impl Signer for SoftwareSigner {
    fn sign<'a>(&'a self, tx: &'a UnsignedTx, address: &'a str) -> BoxFuture<'a, Result<SignedTx, String>> {
        Box::pin(async move {
            if !address.eq_ignore_ascii_case(&self.address()) {
                return Err("signer address mismatch".to_owned());
            }
            let mut request: TransactionRequest =
                serde_json::from_slice(&tx.0).map_err(|e| e.to_string())?;
            request.set_from(self.inner.address());
            let envelope = request
                .build(&self.inner)
                .await
                .map_err(|e| e.to_string())?;
            Ok(SignedTx(envelope.encoded_2718()))
        })
    }

    fn is_hardware(&self) -> bool {
        false
    }
}

/// A hardware-wallet signer reached through an external transport (USB/HID
/// or a vendor daemon). The transport itself is an external collaborator
/// per §1; this type only carries the device-specific error vocabulary
/// (§7) through the `Signer` trait.
pub struct HardwareSigner<T> {
    transport: T,
    address: String,
}

/// The minimal contract a hardware-wallet transport must expose.
pub trait HardwareTransport: Send + Sync {
    fn sign<'a>(&'a self, unsigned: &'a [u8]) -> BoxFuture<'a, Result<Vec<u8>, String>>;
}

impl<T: HardwareTransport> HardwareSigner<T> {
    #[must_use]
    pub fn new(transport: T, address: String) -> Self {
        Self { transport, address }
    }
}

impl<T: HardwareTransport> Signer for HardwareSigner<T> {
    fn sign<'a>(&'a self, tx: &'a UnsignedTx, address: &'a str) -> BoxFuture<'a, Result<SignedTx, String>> {
        Box::pin(async move {
            if !address.eq_ignore_ascii_case(&self.address) {
                return Err("signer address mismatch".to_owned());
            }
            let signed = self.transport.sign(&tx.0).await?;
            Ok(SignedTx(signed))
        })
    }

    fn is_hardware(&self) -> bool {
        true
    }
}
