//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// The selected network is not in the configuration
    UnknownNetwork(String),
    /// The selected network has no usable endpoint
    MissingEndpoint(String),
    /// The selected network's credential names an unset environment variable
    MissingCredential(String),
    /// The selected network has no accounts to sign with
    NoSigner(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// The endpoint reports a different chain than the one configured
    ChainIdMismatch {
        /// The chain ID in the configuration
        expected: u64,
        /// The chain ID reported by the endpoint
        actual: u64,
    },
    /// No artifact exists for the requested contract
    ArtifactNotFound(String),
    /// More than one artifact matches the requested contract
    AmbiguousArtifact(String),
    /// Error parsing a Solidity compilation artifact
    ArtifactParsing(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// The proxy's storage does not match what was deployed
    ProxyVerification(String),
    /// Error reading the `deployments.json` file
    ReadDeployments(String),
    /// Error writing the `deployments.json` file
    WriteDeployments(String),
    /// Error writing the script's output
    Output(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnknownNetwork(s) => write!(f, "unknown network: {}", s),
            ScriptError::MissingEndpoint(s) => write!(f, "missing endpoint for network: {}", s),
            ScriptError::MissingCredential(s) => {
                write!(f, "missing credential, set the {} environment variable", s)
            }
            ScriptError::NoSigner(s) => write!(f, "no accounts configured for network: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ChainIdMismatch { expected, actual } => write!(
                f,
                "configured chain id {} but connected to chain id {}",
                expected, actual
            ),
            ScriptError::ArtifactNotFound(s) => write!(f, "artifact not found: {}", s),
            ScriptError::AmbiguousArtifact(s) => write!(f, "ambiguous artifact: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::ProxyVerification(s) => write!(f, "error verifying proxy: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::Output(s) => write!(f, "error writing output: {}", s),
        }
    }
}

impl Error for ScriptError {}
