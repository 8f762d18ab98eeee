//! Constants used in the deploy scripts

use alloy_primitives::{b256, U256};

/// The name of the network used when none is selected
pub const DEFAULT_NETWORK: &str = "hardhat";

/// The name of the implementation contract deployed by default
pub const DEFAULT_CONTRACT_NAME: &str = "Land";

/// The name of the proxy contract artifact.
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
pub const PROXY_CONTRACT_NAME: &str = "TransparentUpgradeableProxy";

/// The path of the proxy artifact shipped with the `@openzeppelin/contracts` npm
/// package, relative to the project root
pub const OZ_PROXY_ARTIFACT_PATH: &str =
    "node_modules/@openzeppelin/contracts/build/contracts/TransparentUpgradeableProxy.json";

/// The name of the initializer method called through the proxy on deployment
pub const DEFAULT_INITIALIZER: &str = "initialize";

/// The default directory containing compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The default path of the deployments file
pub const DEFAULT_DEPLOYMENTS_PATH: &str = "deployments.json";

/// The name of the directory holding compiler build info, skipped when
/// searching for artifacts
pub const BUILD_INFO_DIR: &str = "build-info";

/// The extension of an artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The suffix of the debug files emitted next to each artifact
pub const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";

/// The number of confirmations to wait for each deployment transaction
pub const NUM_DEPLOY_CONFIRMATIONS: u64 = 1;

/// The storage slot containing the implementation contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const PROXY_IMPLEMENTATION_STORAGE_SLOT: U256 = U256::from_be_bytes(
    b256!("360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc").0,
);

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: U256 = U256::from_be_bytes(
    b256!("b53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103").0,
);

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

// -----------------
// | Configuration |
// -----------------

/// The environment variable holding the endpoint of the `bsc_testnet` network
pub const API_URL_ENV_VAR: &str = "API_URL";

/// The environment variable holding the deployer's private key
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// The environment variable holding the endpoint of the `sepolia` network
pub const SEPOLIA_ENV_VAR: &str = "SEPOLIA";

/// The environment variable selecting the network
pub const NETWORK_ENV_VAR: &str = "HARDHAT_NETWORK";

/// The Solidity compiler version the artifacts are built with
pub const SOLC_VERSION: &str = "0.8.12";

/// The number of optimizer runs the artifacts are built with
pub const SOLC_OPTIMIZER_RUNS: u32 = 200;

/// The endpoint of a local development node
pub const LOCAL_NODE_URL: &str = "http://127.0.0.1:8545";

/// The chain ID of a local development node
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// The private key of the first default account on a local development node
pub const LOCAL_DEV_PKEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// The chain ID of the BSC testnet
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;

/// The chain ID of the Sepolia testnet
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// The public Sepolia endpoint used when `SEPOLIA` is unset
pub const SEPOLIA_PUBLIC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// The endpoint of the BSC mainnet
pub const BSC_MAINNET_URL: &str = "https://bsc-dataseed.binance.org/";

/// The chain ID of the BSC mainnet
pub const BSC_MAINNET_CHAIN_ID: u64 = 56;
