//! Resolution of compiled contract artifacts into contract factories.
//!
//! Artifacts are expected in the Hardhat layout, i.e. one JSON file per contract at
//! `<artifacts dir>/<source path>/<ContractName>.json`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt, Specifier},
    json_abi::{Function, JsonAbi},
};
use alloy_primitives::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::{ARTIFACT_EXTENSION, BUILD_INFO_DIR, DEBUG_ARTIFACT_SUFFIX, DEFAULT_INITIALIZER},
    errors::ScriptError,
};

/// The separator between the source path and the contract name in a fully
/// qualified contract name, e.g. `contracts/Land.sol:Land`
const FULLY_QUALIFIED_SEPARATOR: char = ':';

/// A compiled contract artifact
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// The name of the contract
    pub contract_name: String,
    /// The path of the source file the contract is defined in
    #[serde(default)]
    pub source_name: String,
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The contract's creation bytecode
    pub bytecode: Bytes,
}

/// A handle used to build deployment bytecode and calldata for a compiled contract
#[derive(Clone, Debug)]
pub struct ContractFactory {
    /// The artifact the factory was built from
    artifact: ContractArtifact,
}

impl ContractFactory {
    /// Resolve the artifact of the named contract under `artifacts_dir`.
    ///
    /// The name is either a bare contract name, which must match exactly one
    /// artifact, or a fully qualified `<source>:<contract>` name.
    pub fn resolve(artifacts_dir: &Path, name: &str) -> Result<Self, ScriptError> {
        if let Some((source, contract)) = name.split_once(FULLY_QUALIFIED_SEPARATOR) {
            let path = artifacts_dir
                .join(source)
                .join(contract)
                .with_extension(ARTIFACT_EXTENSION);
            if !path.is_file() {
                return Err(ScriptError::ArtifactNotFound(name.to_string()));
            }
            return Self::from_file(&path);
        }

        let file_name = format!("{}.{}", name, ARTIFACT_EXTENSION);
        let mut candidates = Vec::new();
        find_files(artifacts_dir, &file_name, &mut candidates).map_err(|e| {
            ScriptError::ArtifactNotFound(format!("{}: {}", artifacts_dir.display(), e))
        })?;

        match candidates.as_slice() {
            [] => Err(ScriptError::ArtifactNotFound(name.to_string())),
            [path] => Self::from_file(path),
            _ => {
                candidates.sort();
                let listing = candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(ScriptError::AmbiguousArtifact(format!(
                    "{} matches [{}], use a fully qualified name",
                    name, listing
                )))
            }
        }
    }

    /// Read a contract factory from an artifact file
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
        let artifact: ContractArtifact = serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        if artifact.bytecode.is_empty() {
            return Err(ScriptError::ArtifactParsing(format!(
                "{} has no bytecode, it may be abstract or an interface",
                artifact.contract_name
            )));
        }

        debug!("resolved {} from {}", artifact.contract_name, path.display());
        Ok(Self { artifact })
    }

    /// The name of the contract
    pub fn name(&self) -> &str {
        &self.artifact.contract_name
    }

    /// The underlying artifact
    pub fn artifact(&self) -> &ContractArtifact {
        &self.artifact
    }

    /// The Solidity types of the constructor's parameters
    pub fn constructor_types(&self) -> Vec<&str> {
        self.artifact
            .abi
            .constructor()
            .map(|c| c.inputs.iter().map(|p| p.ty.as_str()).collect())
            .unwrap_or_default()
    }

    /// Ensure the contract can sit behind a proxy, i.e. it is initialized
    /// through a method rather than a parameterized constructor
    pub fn ensure_proxiable(&self) -> Result<(), ScriptError> {
        let types = self.constructor_types();
        if types.is_empty() {
            Ok(())
        } else {
            Err(ScriptError::ArtifactParsing(format!(
                "{} has constructor parameters ({}), implementations must be set up via an initializer",
                self.name(),
                types.join(", ")
            )))
        }
    }

    /// The bytecode of a creation transaction, i.e. the contract's bytecode followed
    /// by its ABI-encoded constructor arguments
    pub fn deploy_code(&self, constructor_args: &[u8]) -> Bytes {
        [self.artifact.bytecode.as_ref(), constructor_args]
            .concat()
            .into()
    }

    /// Encode a call to the default initializer.
    ///
    /// If the contract has no `initialize` method and no arguments are given,
    /// the calldata is empty and the proxy is deployed without an initialization call.
    pub fn default_initializer_calldata(&self, args: &[String]) -> Result<Bytes, ScriptError> {
        if args.is_empty() && self.artifact.abi.function(DEFAULT_INITIALIZER).is_none() {
            return Ok(Bytes::new());
        }

        self.initializer_calldata(DEFAULT_INITIALIZER, args)
    }

    /// Encode a call to the named initializer, coercing each argument to the
    /// type declared in the ABI.
    ///
    /// The initializer is either a bare name or a full signature such as
    /// `initialize(address,uint256)`. A bare name must select exactly one
    /// overload that accepts the given arguments.
    pub fn initializer_calldata(&self, name: &str, args: &[String]) -> Result<Bytes, ScriptError> {
        let signature: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        let base_name = signature.split('(').next().unwrap_or_default();

        let overloads = self.artifact.abi.function(base_name).ok_or_else(|| {
            ScriptError::CalldataConstruction(format!("{} has no method {}", self.name(), name))
        })?;

        let candidates: Vec<&Function> = overloads
            .iter()
            .filter(|f| f.inputs.len() == args.len())
            .filter(|f| !signature.contains('(') || f.signature() == signature)
            .collect();

        let mut encoded = Vec::new();
        let mut last_err = None;
        for function in &candidates {
            match encode_call(function, args) {
                Ok(calldata) => encoded.push((function.signature(), calldata)),
                Err(e) => last_err = Some(e),
            }
        }

        match (encoded.len(), last_err) {
            (1, _) => Ok(encoded.remove(0).1),
            (0, Some(e)) if candidates.len() == 1 => Err(e),
            (0, _) => Err(ScriptError::CalldataConstruction(format!(
                "no overload of {} accepts the arguments [{}]",
                name,
                args.join(", ")
            ))),
            _ => {
                let listing = encoded
                    .iter()
                    .map(|(signature, _)| signature.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(ScriptError::CalldataConstruction(format!(
                    "{} is ambiguous, the arguments match [{}], use a full signature",
                    name, listing
                )))
            }
        }
    }
}

/// ABI-encode a call to `function`, coercing each argument to its declared type
fn encode_call(function: &Function, args: &[String]) -> Result<Bytes, ScriptError> {
    let values = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param
                .resolve()
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
            ty.coerce_str(arg).map_err(|e| {
                ScriptError::CalldataConstruction(format!("{} ({}): {}", param.name, param.ty, e))
            })
        })
        .collect::<Result<Vec<DynSolValue>, _>>()?;

    let calldata = function
        .abi_encode_input(&values)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

    Ok(calldata.into())
}

/// Recursively collect the files named `file_name` under `dir`, skipping
/// compiler build info and debug files
fn find_files(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == BUILD_INFO_DIR) {
                continue;
            }
            find_files(&path, file_name, found)?;
        } else if path.file_name().is_some_and(|n| n == file_name)
            && !path.to_string_lossy().ends_with(DEBUG_ARTIFACT_SUFFIX)
        {
            found.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{fs, path::Path};

    use alloy_primitives::{hex, Address, Bytes, U256};
    use alloy_sol_types::{sol, SolCall};
    use serde_json::json;
    use tempfile::TempDir;

    use crate::errors::ScriptError;

    use super::ContractFactory;

    sol! {
        function initialize() external;
        function initialize(address owner, uint256 supply) external;
    }

    /// Creation bytecode used for every test artifact
    pub(crate) const TEST_BYTECODE: &str = "0x6080604052348015600f57600080fd5b50";

    /// Write a Hardhat-style artifact for a contract with the given ABI
    pub(crate) fn write_artifact(
        root: &Path,
        source: &str,
        name: &str,
        abi: serde_json::Value,
        bytecode: &str,
    ) {
        let dir = root.join(source);
        fs::create_dir_all(&dir).unwrap();
        let artifact = json!({
            "_format": "hh-sol-artifact-1",
            "contractName": name,
            "sourceName": source,
            "abi": abi,
            "bytecode": bytecode,
            "deployedBytecode": bytecode,
            "linkReferences": {},
            "deployedLinkReferences": {},
        });
        fs::write(dir.join(format!("{name}.json")), artifact.to_string()).unwrap();
        fs::write(
            dir.join(format!("{name}.dbg.json")),
            json!({ "_format": "hh-sol-dbg-1", "buildInfo": "../../build-info/x.json" })
                .to_string(),
        )
        .unwrap();
    }

    /// The ABI of an upgradeable contract with two initializer overloads
    pub(crate) fn land_abi() -> serde_json::Value {
        json!([
            {
                "type": "function",
                "name": "initialize",
                "inputs": [],
                "outputs": [],
                "stateMutability": "nonpayable"
            },
            {
                "type": "function",
                "name": "initialize",
                "inputs": [
                    { "name": "owner", "type": "address", "internalType": "address" },
                    { "name": "supply", "type": "uint256", "internalType": "uint256" }
                ],
                "outputs": [],
                "stateMutability": "nonpayable"
            }
        ])
    }

    /// The ABI of an OpenZeppelin v5 transparent proxy's constructor
    pub(crate) fn proxy_abi() -> serde_json::Value {
        json!([
            {
                "type": "constructor",
                "inputs": [
                    { "name": "_logic", "type": "address", "internalType": "address" },
                    { "name": "initialOwner", "type": "address", "internalType": "address" },
                    { "name": "_data", "type": "bytes", "internalType": "bytes" }
                ],
                "stateMutability": "payable"
            }
        ])
    }

    /// An artifacts directory with the `Land` contract and the proxy
    pub(crate) fn artifacts_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "contracts/Land.sol", "Land", land_abi(), TEST_BYTECODE);
        write_artifact(
            dir.path(),
            "@openzeppelin/contracts/proxy/transparent/TransparentUpgradeableProxy.sol",
            "TransparentUpgradeableProxy",
            proxy_abi(),
            TEST_BYTECODE,
        );
        fs::create_dir_all(dir.path().join("build-info")).unwrap();
        dir
    }

    #[test]
    fn test_resolve_by_name() {
        let dir = artifacts_dir();
        let factory = ContractFactory::resolve(dir.path(), "Land").unwrap();

        assert_eq!(factory.name(), "Land");
        assert_eq!(factory.artifact().source_name, "contracts/Land.sol");
        assert!(factory.ensure_proxiable().is_ok());
    }

    #[test]
    fn test_resolve_missing() {
        let dir = artifacts_dir();
        let err = ContractFactory::resolve(dir.path(), "Estate").unwrap_err();

        assert_eq!(err, ScriptError::ArtifactNotFound("Estate".to_string()));
    }

    #[test]
    fn test_resolve_ambiguous() {
        let dir = artifacts_dir();
        write_artifact(dir.path(), "contracts/v2/Land.sol", "Land", land_abi(), TEST_BYTECODE);

        let err = ContractFactory::resolve(dir.path(), "Land").unwrap_err();
        assert!(matches!(err, ScriptError::AmbiguousArtifact(_)));

        // A fully qualified name picks one of them
        let factory = ContractFactory::resolve(dir.path(), "contracts/v2/Land.sol:Land").unwrap();
        assert_eq!(factory.artifact().source_name, "contracts/v2/Land.sol");
    }

    #[test]
    fn test_interface_has_no_bytecode() {
        let dir = artifacts_dir();
        write_artifact(dir.path(), "contracts/ILand.sol", "ILand", land_abi(), "0x");

        let err = ContractFactory::resolve(dir.path(), "ILand").unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactParsing(_)));
    }

    #[test]
    fn test_constructor_params_not_proxiable() {
        let dir = artifacts_dir();
        let proxy = ContractFactory::resolve(dir.path(), "TransparentUpgradeableProxy").unwrap();

        assert_eq!(proxy.constructor_types(), vec!["address", "address", "bytes"]);
        assert!(proxy.ensure_proxiable().is_err());
    }

    #[test]
    fn test_deploy_code_appends_args() {
        let dir = artifacts_dir();
        let factory = ContractFactory::resolve(dir.path(), "Land").unwrap();

        let code = factory.deploy_code(&[0xaa, 0xbb]);
        let mut expected = hex::decode(TEST_BYTECODE).unwrap();
        expected.extend([0xaa, 0xbb]);
        assert_eq!(code, Bytes::from(expected));
    }

    #[test]
    fn test_initializer_without_args() {
        let dir = artifacts_dir();
        let factory = ContractFactory::resolve(dir.path(), "Land").unwrap();

        let calldata = factory.initializer_calldata("initialize", &[]).unwrap();
        assert_eq!(calldata, Bytes::from(initialize_0Call {}.abi_encode()));
    }

    #[test]
    fn test_initializer_with_args() {
        let dir = artifacts_dir();
        let factory = ContractFactory::resolve(dir.path(), "Land").unwrap();
        let owner = Address::repeat_byte(0x11);

        let args = vec![format!("{owner:#x}"), "1000".to_string()];
        let calldata = factory.initializer_calldata("initialize", &args).unwrap();

        let expected = initialize_1Call {
            owner,
            supply: U256::from(1000),
        }
        .abi_encode();
        assert_eq!(calldata, Bytes::from(expected));
    }

    #[test]
    fn test_initializer_bad_args() {
        let dir = artifacts_dir();
        let factory = ContractFactory::resolve(dir.path(), "Land").unwrap();

        let wrong_count = factory.initializer_calldata("initialize", &["1".to_string()]);
        assert!(matches!(wrong_count, Err(ScriptError::CalldataConstruction(_))));

        let args = vec!["not-an-address".to_string(), "1".to_string()];
        let wrong_type = factory.initializer_calldata("initialize", &args);
        assert!(matches!(wrong_type, Err(ScriptError::CalldataConstruction(_))));
    }

    #[test]
    fn test_missing_initializer() {
        let dir = artifacts_dir();
        let factory = ContractFactory::resolve(dir.path(), "Land").unwrap();

        // A named initializer must exist, with or without arguments
        assert!(matches!(
            factory.initializer_calldata("setup", &[]),
            Err(ScriptError::CalldataConstruction(_))
        ));
        assert!(factory
            .initializer_calldata("setup", &["1".to_string()])
            .is_err());
    }

    #[test]
    fn test_default_initializer() {
        let dir = artifacts_dir();
        write_artifact(dir.path(), "contracts/Plain.sol", "Plain", json!([]), TEST_BYTECODE);

        let land = ContractFactory::resolve(dir.path(), "Land").unwrap();
        let calldata = land.default_initializer_calldata(&[]).unwrap();
        assert_eq!(calldata, Bytes::from(initialize_0Call {}.abi_encode()));

        // Only a contract without `initialize` is deployed uninitialized
        let plain = ContractFactory::resolve(dir.path(), "Plain").unwrap();
        assert!(plain.default_initializer_calldata(&[]).unwrap().is_empty());
        assert!(plain
            .default_initializer_calldata(&["1".to_string()])
            .is_err());
    }

    #[test]
    fn test_initializer_by_signature() {
        let dir = artifacts_dir();
        let factory = ContractFactory::resolve(dir.path(), "Land").unwrap();
        let owner = Address::repeat_byte(0x22);

        let zero_args = factory.initializer_calldata("initialize()", &[]).unwrap();
        assert_eq!(zero_args, Bytes::from(initialize_0Call {}.abi_encode()));

        let args = vec![format!("{owner:#x}"), "7".to_string()];
        let calldata = factory
            .initializer_calldata("initialize(address, uint256)", &args)
            .unwrap();
        let expected = initialize_1Call {
            owner,
            supply: U256::from(7),
        }
        .abi_encode();
        assert_eq!(calldata, Bytes::from(expected));

        // A signature absent from the ABI is an error, never an uninitialized proxy
        assert!(matches!(
            factory.initializer_calldata("initialize(address)", &[]),
            Err(ScriptError::CalldataConstruction(_))
        ));
    }

    mod single_arg_overloads {
        alloy_sol_types::sol! {
            function initialize(uint256 value) external;
            function initialize(address account) external;
        }
    }

    #[test]
    fn test_initializer_same_arity_overloads() {
        use single_arg_overloads::{initialize_0Call, initialize_1Call};

        let dir = artifacts_dir();
        let abi = json!([
            {
                "type": "function",
                "name": "initialize",
                "inputs": [{ "name": "value", "type": "uint256", "internalType": "uint256" }],
                "outputs": [],
                "stateMutability": "nonpayable"
            },
            {
                "type": "function",
                "name": "initialize",
                "inputs": [{ "name": "account", "type": "address", "internalType": "address" }],
                "outputs": [],
                "stateMutability": "nonpayable"
            }
        ]);
        write_artifact(dir.path(), "contracts/Parcel.sol", "Parcel", abi, TEST_BYTECODE);
        let factory = ContractFactory::resolve(dir.path(), "Parcel").unwrap();
        let account = Address::repeat_byte(0x33);

        // An address also parses as a uint256, so the bare name is ambiguous
        let err = factory
            .initializer_calldata("initialize", &[format!("{account:#x}")])
            .unwrap_err();
        let ScriptError::CalldataConstruction(msg) = err else {
            panic!("expected a calldata error");
        };
        assert!(msg.contains("initialize(uint256)"));
        assert!(msg.contains("initialize(address)"));

        // Only the uint256 overload accepts a decimal
        let calldata = factory
            .initializer_calldata("initialize", &["42".to_string()])
            .unwrap();
        let expected = initialize_0Call {
            value: U256::from(42),
        }
        .abi_encode();
        assert_eq!(calldata, Bytes::from(expected));

        // A signature resolves the ambiguity
        let calldata = factory
            .initializer_calldata("initialize(address)", &[format!("{account:#x}")])
            .unwrap();
        assert_eq!(calldata, Bytes::from(initialize_1Call { account }.abi_encode()));
    }

    #[test]
    fn test_debug_files_are_not_artifacts() {
        let dir = artifacts_dir();
        let err = ContractFactory::resolve(dir.path(), "Land.dbg").unwrap_err();

        assert_eq!(err, ScriptError::ArtifactNotFound("Land.dbg".to_string()));
    }
}
