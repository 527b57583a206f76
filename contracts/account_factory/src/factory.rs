use soroban_sdk::{contract, contractimpl, log, Address, Bytes, BytesN, Env, Vec};
use wallet_common::storage::extend_instance;
use wallet_common::{upgrade, AccountClient, WalletError};

use crate::types::{AccountCreated, DataKey, MasterChanged};

/// Deploys accounts at addresses derived from this contract and a salt.
///
/// Every clone runs the uploaded master wasm and is constructed with the
/// factory's admin as its upgrade admin and the factory's registry.
#[contract]
pub struct AccountFactory;

#[contractimpl]
impl AccountFactory {
    pub fn __constructor(
        env: Env,
        admin: Address,
        registry: Address,
        master: BytesN<32>,
        implementation: BytesN<32>,
    ) {
        upgrade::init(&env, &admin, &implementation);
        let storage = env.storage().instance();
        storage.set(&DataKey::Registry, &registry);
        storage.set(&DataKey::Master, &master);
    }

    /// Address `create(salt)` deploys to. Does not depend on the master.
    pub fn get_address(env: Env, salt: BytesN<32>) -> Address {
        env.deployer().with_current_contract(salt).deployed_address()
    }

    /// Deploys a new uninitialized account. A salt can be used only once;
    /// the host rejects a second deployment to the same address.
    pub fn create(env: Env, salt: BytesN<32>) -> Result<Address, WalletError> {
        Self::deploy(&env, salt)
    }

    /// Deploys an account and initializes it in the same call.
    pub fn create_initialized(
        env: Env,
        salt: BytesN<32>,
        owner: Address,
        signers: Vec<Address>,
        modules: Vec<Address>,
        payloads: Vec<Bytes>,
    ) -> Result<Address, WalletError> {
        let account = Self::deploy(&env, salt)?;
        AccountClient::new(&env, &account).initialize(&owner, &signers, &modules, &payloads);
        Ok(account)
    }

    pub fn master(env: Env) -> Result<BytesN<32>, WalletError> {
        env.storage()
            .instance()
            .get(&DataKey::Master)
            .ok_or(WalletError::NotInitialized)
    }

    /// Points future clones at `wasm_hash`. Existing accounts are upgraded
    /// through their own proxy surface instead.
    pub fn set_master(env: Env, wasm_hash: BytesN<32>) -> Result<(), WalletError> {
        upgrade::admin(&env)?.require_auth();
        env.storage().instance().set(&DataKey::Master, &wasm_hash);
        extend_instance(&env);

        log!(&env, "factory master replaced");
        MasterChanged { wasm_hash }.publish(&env);
        Ok(())
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), WalletError> {
        upgrade::set_admin(&env, new_admin)
    }

    pub fn admin(env: Env) -> Result<Address, WalletError> {
        upgrade::admin(&env)
    }
}

impl AccountFactory {
    fn deploy(env: &Env, salt: BytesN<32>) -> Result<Address, WalletError> {
        let master = Self::master(env.clone())?;
        let admin = upgrade::admin(env)?;
        let registry: Address = env
            .storage()
            .instance()
            .get(&DataKey::Registry)
            .ok_or(WalletError::NotInitialized)?;

        // a clone records the master as its first implementation
        let account = env
            .deployer()
            .with_current_contract(salt.clone())
            .deploy_v2(master.clone(), (admin, registry, master));
        extend_instance(env);

        AccountCreated {
            account: account.clone(),
            salt,
        }
        .publish(env);
        Ok(account)
    }
}
