//! Upgradeable-implementation component shared by every wallet contract.
//!
//! A contract keeps its address and its storage while its code is swapped
//! by the proxy admin. Installed wasm hashes form a versioned table, so a
//! rollback re-points the contract at the previous entry instead of
//! rebuilding it.

use soroban_sdk::{contractevent, contracttype, log, Address, BytesN, Env, Vec};

use crate::errors::WalletError;
use crate::storage::extend_instance;

#[contracttype]
#[derive(Clone)]
enum UpgradeKey {
    ProxyAdmin,
    ProxyImplementations,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImplementationUpdated {
    pub wasm_hash: BytesN<32>,
    pub version: u32,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminChanged {
    #[topic]
    pub previous: Address,
    pub admin: Address,
}

/// `implementation` is the wasm hash the contract was deployed with. It is
/// version 1 of the table, so the first upgrade can be rolled back.
pub fn init(env: &Env, admin: &Address, implementation: &BytesN<32>) {
    env.storage().instance().set(&UpgradeKey::ProxyAdmin, admin);
    record(env, implementation.clone());
}

pub fn admin(env: &Env) -> Result<Address, WalletError> {
    env.storage()
        .instance()
        .get(&UpgradeKey::ProxyAdmin)
        .ok_or(WalletError::NotInitialized)
}

/// Hands upgrade authority to `new_admin`, normally a governance timelock.
pub fn set_admin(env: &Env, new_admin: Address) -> Result<(), WalletError> {
    let previous = admin(env)?;
    previous.require_auth();

    env.storage().instance().set(&UpgradeKey::ProxyAdmin, &new_admin);
    extend_instance(env);
    AdminChanged {
        previous,
        admin: new_admin,
    }
    .publish(env);
    Ok(())
}

pub fn implementation(env: &Env) -> Option<BytesN<32>> {
    history(env).last()
}

pub fn version(env: &Env) -> u32 {
    history(env).len()
}

pub fn set_implementation(env: &Env, wasm_hash: BytesN<32>) -> Result<(), WalletError> {
    admin(env)?.require_auth();

    let version = record(env, wasm_hash.clone());
    log!(env, "installing implementation version {}", version);
    ImplementationUpdated {
        wasm_hash: wasm_hash.clone(),
        version,
    }
    .publish(env);
    env.deployer().update_current_contract_wasm(wasm_hash);
    Ok(())
}

/// Re-installs the implementation that preceded the current one.
pub fn rollback(env: &Env) -> Result<BytesN<32>, WalletError> {
    admin(env)?.require_auth();

    let previous = retract(env)?;
    let version = version(env);
    log!(env, "rolling back to implementation version {}", version);
    ImplementationUpdated {
        wasm_hash: previous.clone(),
        version,
    }
    .publish(env);
    env.deployer().update_current_contract_wasm(previous.clone());
    Ok(previous)
}

fn history(env: &Env) -> Vec<BytesN<32>> {
    env.storage()
        .instance()
        .get(&UpgradeKey::ProxyImplementations)
        .unwrap_or(Vec::new(env))
}

/// Appends `wasm_hash` to the table and returns its version number.
pub(crate) fn record(env: &Env, wasm_hash: BytesN<32>) -> u32 {
    let mut implementations = history(env);
    implementations.push_back(wasm_hash);
    env.storage()
        .instance()
        .set(&UpgradeKey::ProxyImplementations, &implementations);
    extend_instance(env);
    implementations.len()
}

/// Drops the current entry and returns the one that becomes current.
pub(crate) fn retract(env: &Env) -> Result<BytesN<32>, WalletError> {
    let mut implementations = history(env);
    if implementations.len() < 2 {
        return Err(WalletError::NoPreviousImplementation);
    }
    implementations.pop_back();
    let previous = implementations
        .last()
        .ok_or(WalletError::NoPreviousImplementation)?;
    env.storage()
        .instance()
        .set(&UpgradeKey::ProxyImplementations, &implementations);
    extend_instance(env);
    Ok(previous)
}
