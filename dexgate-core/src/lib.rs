//! Per-wallet transaction coordination core.
//!
//! This crate is deliberately chain-agnostic: it knows nothing about RPC
//! transports, signing backends, or wire formats. Chain families
//! (`dexgate-evm`, `dexgate-svm`) implement the capability traits in
//! [`family`]; the HTTP layer (`dexgate-http`) and binary (`dexgate-server`)
//! drive [`coordination::CoordinationState`] and [`orchestrator`].

pub mod confirmation;
pub mod config;
pub mod coordination;
pub mod error;
pub mod family;
pub mod lock;
pub mod nonce;
pub mod orchestrator;
pub mod quote;
pub mod scope;
pub mod types;

pub use config::Tunables;
pub use coordination::CoordinationState;
pub use error::GatewayError;
pub use scope::WalletKey;
