//! Scripts for deploying and upgrading contracts behind transparent upgradeable proxies.

#![deny(missing_docs)]

pub mod artifacts;
pub mod cli;
mod commands;
pub mod config;
pub mod constants;
pub mod deployer;
pub mod errors;
mod solidity;
pub mod utils;
