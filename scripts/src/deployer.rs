//! The interface through which the scripts deploy and interact with contracts,
//! and its implementation over an RPC provider

use alloy::{
    network::TransactionBuilder,
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use alloy_primitives::{Address, Bytes, TxHash, U256};
use tracing::debug;

use crate::errors::ScriptError;

/// A handle capable of sending deployment and contract transactions on behalf of a
/// single account.
///
/// Every transaction method resolves only once its transaction is confirmed.
#[allow(async_fn_in_trait)]
pub trait ContractDeployer {
    /// The account transactions are sent from
    fn sender(&self) -> Address;

    /// Send a contract creation transaction, returning the address of the created contract
    async fn deploy(&self, init_code: Bytes) -> Result<Address, ScriptError>;

    /// Send a transaction calling the contract at `to` with the given calldata
    async fn transact(&self, to: Address, data: Bytes) -> Result<TxHash, ScriptError>;

    /// Read a storage slot of the contract at `address`
    async fn storage_at(&self, address: Address, slot: U256) -> Result<U256, ScriptError>;
}

/// A [`ContractDeployer`] sending transactions through an RPC provider with a signer attached
pub struct RpcDeployer<P> {
    /// The provider transactions are sent through
    provider: P,
    /// The address of the attached signer
    sender: Address,
    /// The number of confirmations to wait for on each transaction
    confirmations: u64,
}

impl<P: Provider> RpcDeployer<P> {
    /// Create a deployer sending from `sender`, which must be the provider's signer
    pub fn new(provider: P, sender: Address, confirmations: u64) -> Self {
        Self {
            provider,
            sender,
            confirmations,
        }
    }

    /// Send a transaction and wait for its receipt
    async fn send(&self, tx: TransactionRequest) -> Result<TransactionReceipt, String> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| e.to_string())?;
        debug!("sent transaction {}", pending.tx_hash());

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|e| e.to_string())?;

        if !receipt.status() {
            return Err(format!("transaction {} reverted", receipt.transaction_hash));
        }

        Ok(receipt)
    }
}

impl<P: Provider> ContractDeployer for RpcDeployer<P> {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn deploy(&self, init_code: Bytes) -> Result<Address, ScriptError> {
        let tx = TransactionRequest::default()
            .from(self.sender)
            .with_deploy_code(init_code);

        let receipt = self.send(tx).await.map_err(ScriptError::ContractDeployment)?;
        receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractDeployment(format!(
                "no contract address in receipt of {}",
                receipt.transaction_hash
            ))
        })
    }

    async fn transact(&self, to: Address, data: Bytes) -> Result<TxHash, ScriptError> {
        let tx = TransactionRequest::default()
            .from(self.sender)
            .with_to(to)
            .with_input(data);

        let receipt = self
            .send(tx)
            .await
            .map_err(ScriptError::ContractInteraction)?;
        Ok(receipt.transaction_hash)
    }

    async fn storage_at(&self, address: Address, slot: U256) -> Result<U256, ScriptError> {
        self.provider
            .get_storage_at(address, slot)
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }
}
