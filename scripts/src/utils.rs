//! Utilities for the deploy scripts.

use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

use alloy::{
    network::EthereumWallet,
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::NetworkConfig,
    constants::{NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT},
    deployer::RpcDeployer,
    errors::ScriptError,
};

/// Sets up a deployer for the given network, signing with the network's first account.
///
/// Fails if the endpoint reports a chain ID other than the configured one.
pub async fn setup_client(
    network: &NetworkConfig,
    confirmations: u64,
) -> Result<RpcDeployer<impl Provider>, ScriptError> {
    let url = network.endpoint()?;
    let signer = PrivateKeySigner::from_str(network.signer_key()?)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let sender = signer.address();

    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url);

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    if chain_id != network.chain_id {
        return Err(ScriptError::ChainIdMismatch {
            expected: network.chain_id,
            actual: chain_id,
        });
    }

    info!(
        "connected to {} (chain id {}) as {:#x}",
        network.name, chain_id, sender
    );
    Ok(RpcDeployer::new(provider, sender, confirmations))
}

/// Extract the address stored in the low-order bytes of a storage slot
pub fn address_from_slot(value: U256) -> Address {
    Address::from_slice(
        &value.to_be_bytes::<NUM_BYTES_STORAGE_SLOT>()
            [NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT],
    )
}

// ---------------
// | Deployments |
// ---------------

/// The addresses making up a proxied contract deployment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyDeployment {
    /// The proxy through which the contract is called
    pub proxy: Address,
    /// The implementation the proxy delegates to
    pub implementation: Address,
    /// The admin contract allowed to upgrade the proxy
    pub admin: Address,
}

/// The contents of the `deployments.json` file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeploymentsFile {
    /// Deployments keyed by network name, then by contract name
    #[serde(default)]
    pub deployments: BTreeMap<String, BTreeMap<String, ProxyDeployment>>,
}

impl DeploymentsFile {
    /// Look up the deployment of a contract on a network
    pub fn get(&self, network: &str, contract: &str) -> Option<&ProxyDeployment> {
        self.deployments.get(network)?.get(contract)
    }
}

/// Read the deployments file, treating a missing file as empty
pub fn read_deployments(file_path: &Path) -> Result<DeploymentsFile, ScriptError> {
    if !file_path.exists() {
        return Ok(DeploymentsFile::default());
    }

    let contents =
        fs::read_to_string(file_path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Parse the proxy address of a contract from the deployments file
pub fn parse_proxy_from_deployments_file(
    file_path: &Path,
    network: &str,
    contract: &str,
) -> Result<Address, ScriptError> {
    read_deployments(file_path)?
        .get(network, contract)
        .map(|deployment| deployment.proxy)
        .ok_or_else(|| {
            ScriptError::ReadDeployments(format!(
                "no deployment of {} on {} in {}",
                contract,
                network,
                file_path.display()
            ))
        })
}

/// Record a deployment in the deployments file, creating the file if it doesn't exist
pub fn write_deployment(
    file_path: &Path,
    network: &str,
    contract: &str,
    deployment: ProxyDeployment,
) -> Result<(), ScriptError> {
    let mut file = read_deployments(file_path)?;
    file.deployments
        .entry(network.to_string())
        .or_default()
        .insert(contract.to_string(), deployment);

    let contents = serde_json::to_string_pretty(&file)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(file_path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
}
