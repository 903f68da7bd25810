//! Gateway server configuration.
//!
//! Loads configuration from a TOML file with support for environment
//! variable expansion in string values. Variables use `$VAR` or `${VAR}`
//! syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8787
//!
//! [networks.base]
//! family = "evm"
//! rpc_url = "https://mainnet.base.org"
//! signer_private_key = "$SIGNER_KEY_BASE"
//!
//! [networks.solana]
//! family = "svm"
//! rpc_url = "https://api.mainnet-beta.solana.com"
//! signer_keypair_path = "/run/secrets/solana-keypair.json"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `config.toml`)
//! - `HOST` — Override server bind address
//! - `PORT` — Override server port
//! - Per-network signer material referenced by `$VAR` in the config file

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `8787`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-network chain adapter configuration, keyed by network name
    /// (e.g. `"base"`, `"solana"`) — this is the `network` field callers
    /// pass in every request body.
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    /// Coordination tunables (§4.2, §4.4), overridable per deployment.
    #[serde(default)]
    pub tunables: TunablesConfig,

    /// Reaper sweep interval (§4.1, §5). Defaults to 5s.
    #[serde(default = "default_reaper_interval_ms")]
    pub reaper_interval_ms: u64,
}

/// Which transaction-family adapter a network uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Svm,
}

/// Per-network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub family: ChainFamily,

    /// HTTP RPC endpoint URL.
    pub rpc_url: String,

    /// EVM only: hex private key (with or without `0x`), supports `$VAR` /
    /// `${VAR}` expansion.
    #[serde(default)]
    pub signer_private_key: Option<String>,

    /// SVM only: path to a JSON keypair file, as written by `solana-keygen`.
    #[serde(default)]
    pub signer_keypair_path: Option<String>,
}

/// Mirrors `dexgate_core::config::Tunables`, kept separate so the wire
/// format (milliseconds, plain integers) stays decoupled from the
/// in-process `Duration`-based type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunablesConfig {
    #[serde(default = "default_max_nonce_gap")]
    pub max_nonce_gap: u64,
    #[serde(default = "default_max_cache_age_ms")]
    pub max_cache_age_ms: u64,
    #[serde(default = "default_lease_ttl_ms")]
    pub default_lease_ttl_ms: u64,
    #[serde(default = "default_max_lease_ttl_ms")]
    pub max_lease_ttl_ms: u64,
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
}

impl Default for TunablesConfig {
    fn default() -> Self {
        Self {
            max_nonce_gap: default_max_nonce_gap(),
            max_cache_age_ms: default_max_cache_age_ms(),
            default_lease_ttl_ms: default_lease_ttl_ms(),
            max_lease_ttl_ms: default_max_lease_ttl_ms(),
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
            polling_interval_ms: default_polling_interval_ms(),
        }
    }
}

impl TunablesConfig {
    #[must_use]
    pub fn into_tunables(self) -> dexgate_core::Tunables {
        dexgate_core::Tunables {
            max_nonce_gap: self.max_nonce_gap,
            max_cache_age: Duration::from_millis(self.max_cache_age_ms),
            default_lease_ttl: Duration::from_millis(self.default_lease_ttl_ms),
            max_lease_ttl: Duration::from_millis(self.max_lease_ttl_ms),
            confirmation_timeout: Duration::from_millis(self.confirmation_timeout_ms),
            polling_interval: Duration::from_millis(self.polling_interval_ms),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    8787
}

fn default_reaper_interval_ms() -> u64 {
    5_000
}

fn default_max_nonce_gap() -> u64 {
    5
}

fn default_max_cache_age_ms() -> u64 {
    120_000
}

fn default_lease_ttl_ms() -> u64 {
    60_000
}

fn default_max_lease_ttl_ms() -> u64 {
    300_000
}

fn default_confirmation_timeout_ms() -> u64 {
    60_000
}

fn default_polling_interval_ms() -> u64 {
    2_000
}

impl GatewayConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };

        let expanded = expand_env_vars(&content);
        let mut config: Self = toml::from_str(&expanded)?;

        if let Ok(host) = std::env::var("HOST") {
            if let Ok(addr) = host.parse() {
                config.host = addr;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        Ok(config)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment
/// variables. Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let braced = chars.peek() == Some(&'{');
            if braced {
                chars.next();
            }

            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if braced {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                } else if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                var_name.push(c);
                chars.next();
            }

            if var_name.is_empty() {
                result.push('$');
                if braced {
                    result.push('{');
                }
            } else if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            } else {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_braced_and_bare_vars() {
        // SAFETY: test-local env var, not shared with other tests' keys.
        unsafe {
            std::env::set_var("DEXGATE_TEST_VAR", "resolved");
        }
        assert_eq!(expand_env_vars("$DEXGATE_TEST_VAR"), "resolved");
        assert_eq!(expand_env_vars("${DEXGATE_TEST_VAR}"), "resolved");
        assert_eq!(expand_env_vars("prefix-${DEXGATE_TEST_VAR}-suffix"), "prefix-resolved-suffix");
        unsafe {
            std::env::remove_var("DEXGATE_TEST_VAR");
        }
    }

    #[test]
    fn unresolved_var_left_as_is() {
        assert_eq!(expand_env_vars("$DEXGATE_DEFINITELY_UNSET"), "$DEXGATE_DEFINITELY_UNSET");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = GatewayConfig::load_from("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.port, 8787);
        assert!(config.networks.is_empty());
    }
}
