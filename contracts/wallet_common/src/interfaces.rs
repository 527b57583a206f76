//! Cross-contract surfaces.
//!
//! Contracts never link each other's code; they call through these clients
//! so a module can be upgraded or replaced without rebuilding its callers.

use soroban_sdk::{contractclient, Address, Bytes, Env, Symbol, Vec};

use crate::types::{LockKind, Operation};

/// What the factory and policy modules may read from and ask of an account.
#[contractclient(name = "AccountClient")]
pub trait AccountInterface {
    fn initialize(
        env: Env,
        owner: Address,
        signers: Vec<Address>,
        modules: Vec<Address>,
        payloads: Vec<Bytes>,
    );
    fn owner(env: Env) -> Address;
    fn signers(env: Env) -> Vec<Address>;
    fn is_signer(env: Env, signer: Address) -> bool;
    fn is_module(env: Env, module: Address) -> bool;
    fn get_next_sequence_id(env: Env) -> u64;
    fn consume_sequence(env: Env, module: Address, sequence_id: u64);
    fn execute(env: Env, module: Address, operation: Operation);
    fn set_owner(env: Env, module: Address, new_owner: Address);
    fn add_signer(env: Env, module: Address, signer: Address);
    fn remove_signer(env: Env, module: Address, signer: Address);
    fn replace_signer(env: Env, module: Address, old_signer: Address, new_signer: Address);
}

#[contractclient(name = "RegistryClient")]
pub trait RegistryInterface {
    fn get_module(env: Env, name: Symbol) -> Option<Address>;
    fn is_registered(env: Env, module: Address) -> bool;
}

/// Every policy module accepts a per-account configuration payload.
#[contractclient(name = "PolicyModuleClient")]
pub trait PolicyModuleInterface {
    fn init(env: Env, account: Address, payload: Bytes);
}

/// Read side of the security module's per-account lock state.
#[contractclient(name = "LockStateClient")]
pub trait LockStateInterface {
    fn is_locked(env: Env, account: Address, kind: LockKind) -> bool;
}
