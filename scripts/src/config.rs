//! The toolchain configuration: the networks the scripts can deploy to and the
//! compiler settings the contract artifacts are built with.
//!
//! Secrets never live in this table directly, they are read from the
//! environment (and a `.env` file, if present) when the configuration is built.

use std::{collections::BTreeMap, env};

use alloy::transports::http::reqwest::Url;
use serde::Serialize;
use tracing::info;

use crate::{
    constants::{
        API_URL_ENV_VAR, BSC_MAINNET_CHAIN_ID, BSC_MAINNET_URL, BSC_TESTNET_CHAIN_ID,
        DEFAULT_NETWORK, LOCAL_CHAIN_ID, LOCAL_DEV_PKEY, LOCAL_NODE_URL, PRIVATE_KEY_ENV_VAR,
        SEPOLIA_CHAIN_ID, SEPOLIA_ENV_VAR, SEPOLIA_PUBLIC_URL, SOLC_OPTIMIZER_RUNS, SOLC_VERSION,
    },
    errors::ScriptError,
};

/// The string substituted for private keys when printing the configuration
const REDACTED: &str = "<redacted>";

/// The environment variables the configuration is built from
#[derive(Clone, Debug, Default)]
pub struct Environment {
    /// The endpoint of the `bsc_testnet` network
    pub api_url: Option<String>,
    /// The deployer's private key
    pub private_key: Option<String>,
    /// The endpoint of the `sepolia` network
    pub sepolia_url: Option<String>,
}

impl Environment {
    /// Read the environment of the current process, loading a `.env` file from
    /// the working directory first. Variables that are already set take precedence.
    pub fn from_process() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            info!("loaded environment from {}", path.display());
        }

        Self {
            api_url: read_var(API_URL_ENV_VAR),
            private_key: read_var(PRIVATE_KEY_ENV_VAR),
            sepolia_url: read_var(SEPOLIA_ENV_VAR),
        }
    }
}

/// Read an environment variable, treating an empty value as unset
fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// The signing credentials of a network
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Accounts {
    /// Private keys, in order of preference. May be empty.
    Keys(Vec<String>),
    /// The credential list references an environment variable that is unset
    MissingEnv(&'static str),
}

impl Accounts {
    /// A single key read from the environment, or a marker naming the variable
    fn required(key: &Option<String>, var: &'static str) -> Self {
        match key {
            Some(key) => Accounts::Keys(vec![key.clone()]),
            None => Accounts::MissingEnv(var),
        }
    }

    /// A single key read from the environment, or no keys at all
    fn optional(key: &Option<String>) -> Self {
        Accounts::Keys(key.iter().cloned().collect())
    }
}

/// The connection parameters of a single network
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// The name of the network
    pub name: String,
    /// The RPC endpoint of the network
    pub url: Option<String>,
    /// The chain ID the endpoint is expected to report
    pub chain_id: u64,
    /// The accounts used to sign transactions
    pub accounts: Accounts,
}

impl NetworkConfig {
    /// Parse the network's RPC endpoint
    pub fn endpoint(&self) -> Result<Url, ScriptError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| ScriptError::MissingEndpoint(self.name.clone()))?;

        url.parse::<Url>()
            .map_err(|e| ScriptError::MissingEndpoint(format!("{}: {}", self.name, e)))
    }

    /// The private key transactions on this network are signed with
    pub fn signer_key(&self) -> Result<&str, ScriptError> {
        match &self.accounts {
            Accounts::MissingEnv(var) => Err(ScriptError::MissingCredential(var.to_string())),
            Accounts::Keys(keys) => keys
                .first()
                .map(String::as_str)
                .ok_or_else(|| ScriptError::NoSigner(self.name.clone())),
        }
    }
}

/// The Solidity optimizer settings
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct OptimizerSettings {
    /// Whether the optimizer is enabled
    pub enabled: bool,
    /// The number of optimizer runs
    pub runs: u32,
}

/// The Solidity compiler settings
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SolidityConfig {
    /// The compiler version
    pub version: String,
    /// The optimizer settings
    pub optimizer: OptimizerSettings,
}

/// The full toolchain configuration
#[derive(Clone, Debug)]
pub struct ToolchainConfig {
    /// The network used when none is selected
    pub default_network: String,
    /// The compiler settings
    pub solidity: SolidityConfig,
    /// The configured networks, keyed by name
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl ToolchainConfig {
    /// Build the configuration from the given environment
    pub fn from_env(env: &Environment) -> Self {
        let networks = [
            NetworkConfig {
                name: "hardhat".to_string(),
                url: Some(LOCAL_NODE_URL.to_string()),
                chain_id: LOCAL_CHAIN_ID,
                accounts: Accounts::Keys(vec![LOCAL_DEV_PKEY.to_string()]),
            },
            NetworkConfig {
                name: "bsc_testnet".to_string(),
                url: env.api_url.clone(),
                chain_id: BSC_TESTNET_CHAIN_ID,
                accounts: Accounts::required(&env.private_key, PRIVATE_KEY_ENV_VAR),
            },
            NetworkConfig {
                name: "sepolia".to_string(),
                url: Some(
                    env.sepolia_url
                        .clone()
                        .unwrap_or_else(|| SEPOLIA_PUBLIC_URL.to_string()),
                ),
                chain_id: SEPOLIA_CHAIN_ID,
                accounts: Accounts::required(&env.private_key, PRIVATE_KEY_ENV_VAR),
            },
            NetworkConfig {
                name: "bsc_mainnet".to_string(),
                url: Some(BSC_MAINNET_URL.to_string()),
                chain_id: BSC_MAINNET_CHAIN_ID,
                accounts: Accounts::optional(&env.private_key),
            },
        ]
        .into_iter()
        .map(|network| (network.name.clone(), network))
        .collect();

        Self {
            default_network: DEFAULT_NETWORK.to_string(),
            solidity: SolidityConfig {
                version: SOLC_VERSION.to_string(),
                optimizer: OptimizerSettings {
                    enabled: true,
                    runs: SOLC_OPTIMIZER_RUNS,
                },
            },
            networks,
        }
    }

    /// Look up a network by name. Unlisted names are an error, there is no
    /// fallback to the default network.
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ScriptError> {
        self.networks
            .get(name)
            .ok_or_else(|| ScriptError::UnknownNetwork(name.to_string()))
    }

    /// Look up the selected network, or the default network if none is selected
    pub fn select(&self, name: Option<&str>) -> Result<&NetworkConfig, ScriptError> {
        self.network(name.unwrap_or(&self.default_network))
    }

    /// A view of the configuration that is safe to print
    pub fn redacted(&self) -> RedactedConfig {
        let networks = self
            .networks
            .iter()
            .map(|(name, network)| {
                let accounts = match &network.accounts {
                    Accounts::Keys(keys) => keys.iter().map(|_| REDACTED.to_string()).collect(),
                    Accounts::MissingEnv(var) => vec![format!("${} (unset)", var)],
                };

                let view = RedactedNetwork {
                    url: network.url.clone(),
                    chain_id: network.chain_id,
                    accounts,
                };
                (name.clone(), view)
            })
            .collect();

        RedactedConfig {
            default_network: self.default_network.clone(),
            solidity: self.solidity.clone(),
            networks,
        }
    }
}

/// A network with its private keys masked
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedNetwork {
    /// The RPC endpoint
    pub url: Option<String>,
    /// The chain ID
    pub chain_id: u64,
    /// One masked entry per account
    pub accounts: Vec<String>,
}

/// The toolchain configuration with its private keys masked
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedConfig {
    /// The network used when none is selected
    pub default_network: String,
    /// The compiler settings
    pub solidity: SolidityConfig,
    /// The configured networks
    pub networks: BTreeMap<String, RedactedNetwork>,
}
