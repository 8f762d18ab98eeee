//! Implementations of the various deploy scripts

use std::{io::Write, path::Path, str::FromStr};

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolCall, SolValue};
use tracing::{debug, info, warn};

use crate::{
    artifacts::ContractFactory,
    cli::{DeployProxyArgs, UpgradeArgs},
    config::ToolchainConfig,
    constants::{
        OZ_PROXY_ARTIFACT_PATH, PROXY_ADMIN_STORAGE_SLOT, PROXY_CONTRACT_NAME,
        PROXY_IMPLEMENTATION_STORAGE_SLOT,
    },
    deployer::ContractDeployer,
    errors::ScriptError,
    solidity::upgradeAndCallCall,
    utils::{
        address_from_slot, parse_proxy_from_deployments_file, read_deployments, write_deployment,
        ProxyDeployment,
    },
};

/// The constructor parameters of an OpenZeppelin v5 `TransparentUpgradeableProxy`:
/// the implementation, the owner of the created `ProxyAdmin`, and the initialization calldata
const PROXY_CONSTRUCTOR_TYPES: [&str; 3] = ["address", "address", "bytes"];

/// The settings a script runs with, independent of its arguments
pub struct ScriptContext<'a> {
    /// The name of the network being deployed to
    pub network: &'a str,
    /// The directory containing the compiled contract artifacts
    pub artifacts_dir: &'a Path,
    /// The deployments file to record addresses in, if recording is enabled
    pub deployments_path: Option<&'a Path>,
}

/// Deploy a contract behind a new transparent upgradeable proxy.
///
/// The proxy's address is written to `out` once both the implementation and
/// the proxy deployments are confirmed.
pub async fn deploy_proxy(
    args: DeployProxyArgs,
    ctx: &ScriptContext<'_>,
    deployer: &impl ContractDeployer,
    out: &mut impl Write,
) -> Result<ProxyDeployment, ScriptError> {
    // Get the implementation and proxy contract factories
    let implementation_factory = ContractFactory::resolve(ctx.artifacts_dir, &args.contract)?;
    implementation_factory.ensure_proxiable()?;

    let proxy_factory = resolve_proxy_factory(ctx.artifacts_dir, args.proxy_artifact.as_deref())?;
    if proxy_factory.constructor_types() != PROXY_CONSTRUCTOR_TYPES {
        return Err(ScriptError::ArtifactParsing(format!(
            "{} is not a transparent upgradeable proxy, expected constructor({})",
            proxy_factory.name(),
            PROXY_CONSTRUCTOR_TYPES.join(",")
        )));
    }

    // Parse proxy contract constructor arguments
    let owner = match &args.owner {
        Some(owner) => parse_address(owner)?,
        None => deployer.sender(),
    };

    let init_calldata = match (&args.initializer, args.no_initializer) {
        (_, true) => Bytes::new(),
        (Some(name), false) => implementation_factory.initializer_calldata(name, &args.init_args)?,
        (None, false) => implementation_factory.default_initializer_calldata(&args.init_args)?,
    };
    if init_calldata.is_empty() {
        warn!(
            "deploying {} without calling an initializer",
            implementation_factory.name()
        );
    }

    // A deployments file that can't be read would only be noticed after paying for gas
    check_deployments_file(ctx)?;

    // Deploy implementation contract
    info!("deploying {} implementation", implementation_factory.name());
    let implementation = deployer
        .deploy(implementation_factory.deploy_code(&[]))
        .await?;
    info!("implementation deployed at {:#x}", implementation);

    // Deploy proxy contract
    let constructor_args = (implementation, owner, init_calldata).abi_encode_params();
    let proxy = deployer
        .deploy(proxy_factory.deploy_code(&constructor_args))
        .await?;

    let deployment = verify_proxy(deployer, proxy, implementation).await?;
    info!("proxy admin deployed at {:#x}", deployment.admin);

    writeln!(out, "Contract deployed to address: {:#x}", proxy)
        .map_err(|e| ScriptError::Output(e.to_string()))?;

    record_deployment(ctx, implementation_factory.name(), deployment);
    Ok(deployment)
}

/// Deploy a new implementation of a contract and point its proxy at it
pub async fn upgrade(
    args: UpgradeArgs,
    ctx: &ScriptContext<'_>,
    deployer: &impl ContractDeployer,
    out: &mut impl Write,
) -> Result<ProxyDeployment, ScriptError> {
    let factory = ContractFactory::resolve(ctx.artifacts_dir, &args.contract)?;
    factory.ensure_proxiable()?;

    let proxy = match (&args.proxy, ctx.deployments_path) {
        (Some(proxy), _) => parse_address(proxy)?,
        (None, Some(path)) => parse_proxy_from_deployments_file(path, ctx.network, factory.name())?,
        (None, None) => {
            return Err(ScriptError::ReadDeployments(
                "no proxy address given and recording is disabled".to_string(),
            ))
        }
    };

    let data = match &args.calldata {
        Some(calldata) => Bytes::from_str(calldata)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?,
        None => Bytes::new(),
    };
    check_deployments_file(ctx)?;

    // Get proxy admin contract address
    // This is the recommended way to get the proxy admin address:
    // https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
    let proxy_admin = address_from_slot(
        deployer
            .storage_at(proxy, PROXY_ADMIN_STORAGE_SLOT)
            .await?,
    );
    if proxy_admin.is_zero() {
        return Err(ScriptError::ProxyVerification(format!(
            "{:#x} has no admin, it is not a transparent proxy",
            proxy
        )));
    }

    info!("deploying new {} implementation", factory.name());
    let implementation = deployer.deploy(factory.deploy_code(&[])).await?;
    info!("implementation deployed at {:#x}", implementation);

    let calldata = upgradeAndCallCall {
        proxy,
        implementation,
        data,
    }
    .abi_encode();
    deployer.transact(proxy_admin, calldata.into()).await?;

    let deployment = verify_proxy(deployer, proxy, implementation).await?;
    writeln!(
        out,
        "Proxy {:#x} upgraded to implementation {:#x}",
        proxy, implementation
    )
    .map_err(|e| ScriptError::Output(e.to_string()))?;

    record_deployment(ctx, factory.name(), deployment);
    Ok(deployment)
}

/// Print the toolchain configuration, with private keys redacted
pub fn print_config(config: &ToolchainConfig, out: &mut impl Write) -> Result<(), ScriptError> {
    let json = serde_json::to_string_pretty(&config.redacted())
        .map_err(|e| ScriptError::Output(e.to_string()))?;
    writeln!(out, "{}", json).map_err(|e| ScriptError::Output(e.to_string()))
}

/// Read the proxy's ERC-1967 slots, ensuring it points at the expected implementation
async fn verify_proxy(
    deployer: &impl ContractDeployer,
    proxy: Address,
    implementation: Address,
) -> Result<ProxyDeployment, ScriptError> {
    let stored_implementation = address_from_slot(
        deployer
            .storage_at(proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT)
            .await?,
    );
    if stored_implementation != implementation {
        return Err(ScriptError::ProxyVerification(format!(
            "proxy {:#x} points at {:#x}, expected {:#x}",
            proxy, stored_implementation, implementation
        )));
    }

    let admin = address_from_slot(deployer.storage_at(proxy, PROXY_ADMIN_STORAGE_SLOT).await?);
    if admin.is_zero() {
        return Err(ScriptError::ProxyVerification(format!(
            "proxy {:#x} has no admin",
            proxy
        )));
    }

    Ok(ProxyDeployment {
        proxy,
        implementation,
        admin,
    })
}

/// Resolve the proxy contract factory.
///
/// Without an explicit artifact, the proxy is looked up under `artifacts_dir`
/// and then in the OpenZeppelin package installed next to it.
fn resolve_proxy_factory(
    artifacts_dir: &Path,
    explicit: Option<&Path>,
) -> Result<ContractFactory, ScriptError> {
    if let Some(path) = explicit {
        return ContractFactory::from_file(path);
    }

    match ContractFactory::resolve(artifacts_dir, PROXY_CONTRACT_NAME) {
        Err(ScriptError::ArtifactNotFound(_)) => {
            let project_root = artifacts_dir.parent().unwrap_or(artifacts_dir);
            let fallback = project_root.join(OZ_PROXY_ARTIFACT_PATH);
            if !fallback.is_file() {
                return Err(ScriptError::ArtifactNotFound(format!(
                    "{} (also looked in {})",
                    PROXY_CONTRACT_NAME,
                    fallback.display()
                )));
            }

            debug!("using proxy artifact from {}", fallback.display());
            ContractFactory::from_file(&fallback)
        }
        res => res,
    }
}

/// Ensure the deployments file, if recording is enabled, can be read
fn check_deployments_file(ctx: &ScriptContext<'_>) -> Result<(), ScriptError> {
    if let Some(path) = ctx.deployments_path {
        read_deployments(path)?;
    }

    Ok(())
}

/// Write the deployment to the deployments file, if recording is enabled.
///
/// The deployment has already succeeded on chain, so a failure is only logged.
fn record_deployment(ctx: &ScriptContext<'_>, contract: &str, deployment: ProxyDeployment) {
    let Some(path) = ctx.deployments_path else {
        return;
    };

    match write_deployment(path, ctx.network, contract, deployment) {
        Ok(()) => info!("recorded {} deployment in {}", contract, path.display()),
        Err(e) => warn!(
            "failed to record {} deployment in {}: {}",
            contract,
            path.display(),
            e
        ),
    }
}

/// Parse a hex address given on the command line
fn parse_address(address: &str) -> Result<Address, ScriptError> {
    Address::from_str(address).map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}
