//! Definitions of CLI arguments and commands for deploy scripts

use std::{io, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::{
    commands::{deploy_proxy, print_config, upgrade, ScriptContext},
    config::ToolchainConfig,
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_CONTRACT_NAME, DEFAULT_DEPLOYMENTS_PATH, NETWORK_ENV_VAR,
        NUM_DEPLOY_CONFIRMATIONS,
    },
    errors::ScriptError,
    utils::setup_client,
};

/// Deploy and upgrade contracts behind transparent upgradeable proxies
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The network to use, one of the configured networks.
    /// Defaults to the configured default network
    #[arg(short, long, global = true, env = NETWORK_ENV_VAR)]
    pub network: Option<String>,

    /// Directory containing the compiled contract artifacts
    #[arg(long, global = true, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Path to the file in which deployed addresses are recorded
    #[arg(long, global = true, default_value = DEFAULT_DEPLOYMENTS_PATH)]
    pub deployments_path: PathBuf,

    /// Don't record deployed addresses
    #[arg(long, global = true)]
    pub no_record: bool,

    /// The number of confirmations to wait for on each transaction
    #[arg(
        long,
        global = true,
        default_value_t = NUM_DEPLOY_CONFIRMATIONS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub confirmations: u64,

    /// The script to run
    #[command(subcommand)]
    pub command: Command,
}

/// The scripts that can be run
#[derive(Subcommand)]
pub enum Command {
    /// Deploy a contract behind a new upgradeable proxy
    DeployProxy(DeployProxyArgs),
    /// Upgrade the implementation behind an existing proxy
    Upgrade(UpgradeArgs),
    /// Print the resolved network and compiler configuration
    Networks,
}

impl Command {
    /// Run the command against the network selected by `cli`
    pub async fn run(self, cli: &CliSettings, config: &ToolchainConfig) -> Result<(), ScriptError> {
        let mut stdout = io::stdout();
        if let Command::Networks = self {
            return print_config(config, &mut stdout);
        }

        let network = config.select(cli.network.as_deref())?;
        info!("using network {}", network.name);
        let deployer = setup_client(network, cli.confirmations).await?;

        let ctx = ScriptContext {
            network: &network.name,
            artifacts_dir: &cli.artifacts,
            deployments_path: (!cli.no_record).then_some(cli.deployments_path.as_path()),
        };

        match self {
            Command::DeployProxy(args) => deploy_proxy(args, &ctx, &deployer, &mut stdout)
                .await
                .map(|_| ()),
            Command::Upgrade(args) => upgrade(args, &ctx, &deployer, &mut stdout)
                .await
                .map(|_| ()),
            Command::Networks => Ok(()),
        }
    }
}

/// The global settings shared by every command
pub struct CliSettings {
    /// The selected network, if any
    pub network: Option<String>,
    /// Directory containing the compiled contract artifacts
    pub artifacts: PathBuf,
    /// Path to the deployments file
    pub deployments_path: PathBuf,
    /// Whether to skip recording deployments
    pub no_record: bool,
    /// The number of confirmations to wait for
    pub confirmations: u64,
}

impl Cli {
    /// Split the parsed arguments into the global settings and the command
    pub fn into_parts(self) -> (CliSettings, Command) {
        let Cli {
            network,
            artifacts,
            deployments_path,
            no_record,
            confirmations,
            command,
        } = self;

        let settings = CliSettings {
            network,
            artifacts,
            deployments_path,
            no_record,
            confirmations,
        };
        (settings, command)
    }
}

/// Deploy a contract behind a [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` contract.
///
/// Calls made directly to the `TransparentUpgradeableProxy` contract will be forwarded to the implementation contract.
/// Upgrade calls can only be made to the `TransparentUpgradeableProxy` through the `ProxyAdmin`.
#[derive(Args)]
pub struct DeployProxyArgs {
    /// Name of the implementation contract, bare or fully qualified
    #[arg(short, long, default_value = DEFAULT_CONTRACT_NAME)]
    pub contract: String,

    /// Path to the proxy contract artifact, if it is not under the artifacts directory
    #[arg(long)]
    pub proxy_artifact: Option<PathBuf>,

    /// Address of the owner of the proxy admin contract, defaults to the deployer
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Name or signature of the initializer called through the proxy on deployment,
    /// e.g. `initialize(address,uint256)`. Defaults to `initialize` if the contract has one
    #[arg(long, value_name = "NAME")]
    pub initializer: Option<String>,

    /// Arguments to the initializer, in order
    #[arg(long = "init-arg", value_name = "ARG")]
    pub init_args: Vec<String>,

    /// Deploy the proxy without calling an initializer
    #[arg(long, conflicts_with_all = ["initializer", "init_args"])]
    pub no_initializer: bool,
}

/// Upgrade the implementation behind an existing proxy
#[derive(Args)]
pub struct UpgradeArgs {
    /// Name of the new implementation contract, bare or fully qualified
    #[arg(short, long, default_value = DEFAULT_CONTRACT_NAME)]
    pub contract: String,

    /// Address of the proxy contract, defaults to the one in the deployments file
    #[arg(long)]
    pub proxy: Option<String>,

    /// Optional calldata, in hex form, with which to
    /// call the implementation contract when upgrading
    #[arg(long)]
    pub calldata: Option<String>,
}
