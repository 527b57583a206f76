use soroban_sdk::{contract, contractimpl, log, token, Address, Bytes, BytesN, Env, Val, Vec};
use wallet_common::storage::extend_instance;
use wallet_common::{
    signature, upgrade, LockKind, LockStateClient, Operation, PolicyModuleClient, RegistryClient,
    SequenceGuard, Signature, WalletError, SECURITY_MODULE,
};

use crate::types::{DataKey, ModuleAuthorised, OwnerChanged, SignerAdded, SignerRemoved, Transacted};

#[contract]
pub struct SmartAccount;

#[contractimpl]
impl SmartAccount {
    /// Runs at deployment. `admin` controls code upgrades of this account,
    /// `registry` is the source of truth for legitimate policy modules and
    /// `implementation` is the wasm hash being deployed.
    pub fn __constructor(
        env: Env,
        admin: Address,
        registry: Address,
        implementation: BytesN<32>,
    ) {
        upgrade::init(&env, &admin, &implementation);
        env.storage().instance().set(&DataKey::Registry, &registry);
    }

    /// One-shot setup of the owner, the signer set and at least one policy
    /// module. `payloads[i]` is handed to `modules[i]`'s own `init`.
    pub fn initialize(
        env: Env,
        owner: Address,
        signers: Vec<Address>,
        modules: Vec<Address>,
        payloads: Vec<Bytes>,
    ) -> Result<(), WalletError> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(WalletError::AlreadyInitialized);
        }
        owner.require_auth();

        if modules.is_empty() {
            return Err(WalletError::NoModules);
        }
        if modules.len() != payloads.len() {
            return Err(WalletError::InvalidModuleConfig);
        }
        Self::check_signer_set(&signers)?;

        let registry = Self::registry(&env)?;
        for i in 0..modules.len() {
            let module = modules.get_unchecked(i);
            if !registry.is_registered(&module) {
                return Err(WalletError::ModuleNotRegistered);
            }
            for j in (i + 1)..modules.len() {
                if module == modules.get_unchecked(j) {
                    return Err(WalletError::InvalidModuleConfig);
                }
            }
        }

        let storage = env.storage().instance();
        storage.set(&DataKey::Initialized, &true);
        storage.set(&DataKey::Owner, &owner);
        storage.set(&DataKey::Signers, &signers);
        storage.set(&DataKey::Modules, &modules);
        storage.set(&DataKey::Sequence, &SequenceGuard::new(&env));
        extend_instance(&env);

        let account = env.current_contract_address();
        for (module, payload) in modules.iter().zip(payloads.iter()) {
            PolicyModuleClient::new(&env, &module).init(&account, &payload);
            ModuleAuthorised {
                module,
                allowed: true,
            }
            .publish(&env);
        }
        Ok(())
    }

    /// Spends with two signers: `caller` submits, `signature` carries the
    /// approval of a second, different signer over the operation digest.
    pub fn send_multi_sig(
        env: Env,
        caller: Address,
        operation: Operation,
        expire_time: u64,
        sequence_id: u64,
        signature: Signature,
    ) -> Result<(), WalletError> {
        Self::require_initialized(&env)?;
        caller.require_auth();

        let signers = Self::load_signers(&env);
        if !signers.contains(&caller) {
            return Err(WalletError::UnauthorizedSigner);
        }
        if expire_time <= env.ledger().timestamp() {
            return Err(WalletError::Expired);
        }

        let account = env.current_contract_address();
        let digest =
            signature::operation_digest(&env, &account, &operation, expire_time, sequence_id);
        if signature.signer == caller {
            return Err(WalletError::SelfSign);
        }
        let cosigner = signature::recover_signer(&env, &digest, &signature)?;
        if !signers.contains(&cosigner) {
            return Err(WalletError::UnauthorizedSigner);
        }

        Self::ensure_not_globally_locked(&env, &account)?;
        Self::insert_sequence(&env, sequence_id)?;
        Self::perform(&env, &operation)?;

        Transacted {
            caller,
            cosigner,
            target: operation.target(),
            amount: operation.amount(),
            digest,
        }
        .publish(&env);
        Ok(())
    }

    /// Adds or removes a policy module. Only an already authorised module may
    /// call this; the last module can never be removed.
    pub fn authorise_module(
        env: Env,
        module: Address,
        target: Address,
        allowed: bool,
        payload: Bytes,
    ) -> Result<(), WalletError> {
        Self::require_module(&env, &module)?;
        let mut modules = Self::load_modules(&env);

        if allowed {
            if modules.contains(&target) {
                return Err(WalletError::ModuleAlreadyAuthorised);
            }
            if !Self::registry(&env)?.is_registered(&target) {
                return Err(WalletError::ModuleNotRegistered);
            }
            modules.push_back(target.clone());
            env.storage().instance().set(&DataKey::Modules, &modules);
            PolicyModuleClient::new(&env, &target).init(&env.current_contract_address(), &payload);
        } else {
            let index = modules
                .first_index_of(&target)
                .ok_or(WalletError::ModuleNotFound)?;
            if modules.len() == 1 {
                return Err(WalletError::LastModule);
            }
            modules.remove(index);
            env.storage().instance().set(&DataKey::Modules, &modules);
        }
        extend_instance(&env);

        ModuleAuthorised {
            module: target,
            allowed,
        }
        .publish(&env);
        Ok(())
    }

    pub fn execute(env: Env, module: Address, operation: Operation) -> Result<(), WalletError> {
        Self::require_module(&env, &module)?;
        Self::perform(&env, &operation)
    }

    pub fn consume_sequence(env: Env, module: Address, sequence_id: u64) -> Result<(), WalletError> {
        Self::require_module(&env, &module)?;
        Self::insert_sequence(&env, sequence_id)
    }

    pub fn set_owner(env: Env, module: Address, new_owner: Address) -> Result<(), WalletError> {
        Self::require_module(&env, &module)?;
        env.storage().instance().set(&DataKey::Owner, &new_owner);
        extend_instance(&env);
        log!(&env, "owner replaced by module {}", module);
        OwnerChanged { owner: new_owner }.publish(&env);
        Ok(())
    }

    pub fn add_signer(env: Env, module: Address, signer: Address) -> Result<(), WalletError> {
        Self::require_module(&env, &module)?;
        let mut signers = Self::load_signers(&env);
        if signers.contains(&signer) {
            return Err(WalletError::DuplicateSigner);
        }
        signers.push_back(signer.clone());
        Self::store_signers(&env, &signers);
        SignerAdded { signer }.publish(&env);
        Ok(())
    }

    pub fn remove_signer(env: Env, module: Address, signer: Address) -> Result<(), WalletError> {
        Self::require_module(&env, &module)?;
        let mut signers = Self::load_signers(&env);
        let index = signers
            .first_index_of(&signer)
            .ok_or(WalletError::SignerNotFound)?;
        if signers.len() == 1 {
            return Err(WalletError::LastSigner);
        }
        signers.remove(index);
        Self::store_signers(&env, &signers);
        SignerRemoved { signer }.publish(&env);
        Ok(())
    }

    /// Swaps `old_signer` for `new_signer` in place, keeping signer order.
    pub fn replace_signer(
        env: Env,
        module: Address,
        old_signer: Address,
        new_signer: Address,
    ) -> Result<(), WalletError> {
        Self::require_module(&env, &module)?;
        let mut signers = Self::load_signers(&env);
        let index = signers
            .first_index_of(&old_signer)
            .ok_or(WalletError::SignerNotFound)?;
        if signers.contains(&new_signer) {
            return Err(WalletError::DuplicateSigner);
        }
        signers.set(index, new_signer.clone());
        Self::store_signers(&env, &signers);
        SignerRemoved { signer: old_signer }.publish(&env);
        SignerAdded { signer: new_signer }.publish(&env);
        Ok(())
    }

    pub fn owner(env: Env) -> Result<Address, WalletError> {
        env.storage()
            .instance()
            .get(&DataKey::Owner)
            .ok_or(WalletError::NotInitialized)
    }

    pub fn signers(env: Env) -> Vec<Address> {
        Self::load_signers(&env)
    }

    pub fn is_signer(env: Env, signer: Address) -> bool {
        Self::load_signers(&env).contains(&signer)
    }

    pub fn modules(env: Env) -> Vec<Address> {
        Self::load_modules(&env)
    }

    pub fn is_module(env: Env, module: Address) -> bool {
        Self::load_modules(&env).contains(&module)
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&DataKey::Initialized)
    }

    pub fn get_next_sequence_id(env: Env) -> Result<u64, WalletError> {
        Ok(Self::load_sequence(&env)?.next_id())
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

    fn require_initialized(env: &Env) -> Result<(), WalletError> {
        if !env.storage().instance().has(&DataKey::Initialized) {
            return Err(WalletError::NotInitialized);
        }
        Ok(())
    }

    fn require_module(env: &Env, module: &Address) -> Result<(), WalletError> {
        Self::require_initialized(env)?;
        module.require_auth();
        if !Self::load_modules(env).contains(module) {
            return Err(WalletError::UnauthorizedModule);
        }
        Ok(())
    }

    fn check_signer_set(signers: &Vec<Address>) -> Result<(), WalletError> {
        if signers.is_empty() {
            return Err(WalletError::EmptySignerSet);
        }
        for i in 0..signers.len() {
            for j in (i + 1)..signers.len() {
                if signers.get_unchecked(i) == signers.get_unchecked(j) {
                    return Err(WalletError::DuplicateSigner);
                }
            }
        }
        Ok(())
    }

    fn registry(env: &Env) -> Result<RegistryClient<'_>, WalletError> {
        let registry: Address = env
            .storage()
            .instance()
            .get(&DataKey::Registry)
            .ok_or(WalletError::NotInitialized)?;
        Ok(RegistryClient::new(env, &registry))
    }

    /// Spends are refused while the security module holds a global lock.
    fn ensure_not_globally_locked(env: &Env, account: &Address) -> Result<(), WalletError> {
        let Some(security) = Self::registry(env)?.get_module(&SECURITY_MODULE) else {
            return Ok(());
        };
        if !Self::load_modules(env).contains(&security) {
            return Ok(());
        }
        if LockStateClient::new(env, &security).is_locked(account, &LockKind::Global) {
            return Err(WalletError::AccountLockedGlobally);
        }
        Ok(())
    }

    fn perform(env: &Env, operation: &Operation) -> Result<(), WalletError> {
        match operation {
            Operation::Transfer(token, to, amount) => {
                if *amount <= 0 {
                    return Err(WalletError::InvalidAmount);
                }
                let token_client = token::Client::new(env, token);
                token_client.transfer(&env.current_contract_address(), to, amount);
            }
            Operation::Invoke(contract, func, args) => {
                env.invoke_contract::<Val>(contract, func, args.clone());
            }
        }
        Ok(())
    }

    fn insert_sequence(env: &Env, sequence_id: u64) -> Result<(), WalletError> {
        let mut guard = Self::load_sequence(env)?;
        guard.try_insert(sequence_id)?;
        env.storage().instance().set(&DataKey::Sequence, &guard);
        extend_instance(env);
        Ok(())
    }

    fn load_sequence(env: &Env) -> Result<SequenceGuard, WalletError> {
        env.storage()
            .instance()
            .get(&DataKey::Sequence)
            .ok_or(WalletError::NotInitialized)
    }

    fn load_signers(env: &Env) -> Vec<Address> {
        env.storage()
            .instance()
            .get(&DataKey::Signers)
            .unwrap_or(Vec::new(env))
    }

    fn store_signers(env: &Env, signers: &Vec<Address>) {
        env.storage().instance().set(&DataKey::Signers, signers);
        extend_instance(env);
    }

    fn load_modules(env: &Env) -> Vec<Address> {
        env.storage()
            .instance()
            .get(&DataKey::Modules)
            .unwrap_or(Vec::new(env))
    }
}
