use soroban_sdk::{contract, contractimpl, Address, BytesN, Env, Symbol, Vec};
use wallet_common::storage::{PERSISTENT_BUMP_AMOUNT, PERSISTENT_LIFETIME_THRESHOLD};
use wallet_common::{upgrade, WalletError};

use crate::types::{DataKey, ModuleRegistered};

/// Name to address table of legitimate policy modules.
///
/// Entries are only ever added or re-pointed. An address that was once
/// registered stays registered, so accounts that still list it keep working.
#[contract]
pub struct ModuleRegistry;

#[contractimpl]
impl ModuleRegistry {
    pub fn __constructor(env: Env, admin: Address, implementation: BytesN<32>) {
        upgrade::init(&env, &admin, &implementation);
    }

    pub fn register_module(env: Env, module: Address, name: Symbol) -> Result<(), WalletError> {
        upgrade::admin(&env)?.require_auth();
        Self::store(&env, module, name);
        Ok(())
    }

    pub fn register_modules(
        env: Env,
        modules: Vec<Address>,
        names: Vec<Symbol>,
    ) -> Result<(), WalletError> {
        upgrade::admin(&env)?.require_auth();
        if modules.len() != names.len() {
            return Err(WalletError::InvalidModuleConfig);
        }
        for (module, name) in modules.iter().zip(names.iter()) {
            Self::store(&env, module, name);
        }
        Ok(())
    }

    pub fn get_module(env: Env, name: Symbol) -> Option<Address> {
        env.storage()
            .persistent()
            .get(&DataKey::ModuleByName(name))
    }

    pub fn module_name(env: Env, module: Address) -> Option<Symbol> {
        env.storage()
            .persistent()
            .get(&DataKey::NameOfModule(module))
    }

    pub fn is_registered(env: Env, module: Address) -> bool {
        env.storage()
            .persistent()
            .has(&DataKey::NameOfModule(module))
    }

    pub fn set_implementation(env: Env, wasm_hash: BytesN<32>) -> Result<(), WalletError> {
        upgrade::set_implementation(&env, wasm_hash)
    }

    pub fn rollback_implementation(env: Env) -> Result<BytesN<32>, WalletError> {
        upgrade::rollback(&env)
    }

    pub fn get_implementation(env: Env) -> Option<BytesN<32>> {
        upgrade::implementation(&env)
    }

    pub fn implementation_version(env: Env) -> u32 {
        upgrade::version(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), WalletError> {
        upgrade::set_admin(&env, new_admin)
    }

    pub fn admin(env: Env) -> Result<Address, WalletError> {
        upgrade::admin(&env)
    }

    fn store(env: &Env, module: Address, name: Symbol) {
        let storage = env.storage().persistent();
        let by_name = DataKey::ModuleByName(name.clone());
        let name_of = DataKey::NameOfModule(module.clone());

        storage.set(&by_name, &module);
        storage.set(&name_of, &name);
        storage.extend_ttl(&by_name, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
        storage.extend_ttl(&name_of, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);

        ModuleRegistered { name, module }.publish(env);
    }
}
