use soroban_sdk::{
    contract, contractimpl, log, panic_with_error, xdr::FromXdr, Address, Bytes, BytesN, Env,
    Symbol, TryFromVal, Val, Vec,
};
use wallet_common::storage::{
    extend_instance, PERSISTENT_BUMP_AMOUNT, PERSISTENT_LIFETIME_THRESHOLD,
};
use wallet_common::{
    signature, upgrade, AccountClient, Call, LockKind, RegistryClient, SecurityConfig, Signature,
    WalletError,
};

use crate::state::{AccountSecurity, LockState};
use crate::types::{
    DataKey, Locked, RecoveryCancelled, RecoveryExecuted, RecoveryRequest, RecoveryTriggered,
    Unlocked,
};

/// Distinct signer approvals a `multicall` needs.
const QUORUM: u32 = 2;

#[contract]
pub struct SecurityModule;

#[contractimpl]
impl SecurityModule {
    /// `lock_period` and `recovery_period` (seconds) apply to every account
    /// that initializes the module with an empty payload.
    pub fn __constructor(
        env: Env,
        admin: Address,
        registry: Address,
        lock_period: u64,
        recovery_period: u64,
        implementation: BytesN<32>,
    ) {
        if lock_period == 0 || recovery_period == 0 {
            panic_with_error!(&env, WalletError::InvalidPeriod);
        }
        upgrade::init(&env, &admin, &implementation);
        let storage = env.storage().instance();
        storage.set(&DataKey::Registry, &registry);
        storage.set(
            &DataKey::Defaults,
            &SecurityConfig {
                lock_period,
                recovery_period,
            },
        );
    }

    /// Called by an account when it authorises this module. `payload` is an
    /// XDR `SecurityConfig`, or empty for the deployment defaults.
    ///
    /// Re-authorising keeps existing lock and recovery state and only
    /// replaces the periods.
    pub fn init(env: Env, account: Address, payload: Bytes) -> Result<(), WalletError> {
        account.require_auth();
        if !Self::registry(&env)?.is_registered(&env.current_contract_address()) {
            return Err(WalletError::ModuleNotRegistered);
        }

        let config = if payload.is_empty() {
            Self::defaults(&env)?
        } else {
            SecurityConfig::from_xdr(&env, &payload)
                .map_err(|_| WalletError::InvalidModuleConfig)?
        };
        if config.lock_period == 0 || config.recovery_period == 0 {
            return Err(WalletError::InvalidPeriod);
        }

        let record = match Self::try_load(&env, &account) {
            Some(mut record) => {
                record.configure(&config);
                record
            }
            None => AccountSecurity::new(&config),
        };
        Self::save(&env, &account, &record);
        Ok(())
    }

    /// Freezes the account for its lock period: no spends, no signer
    /// changes, and only unlock and recovery calls pass the quorum path.
    pub fn lock(env: Env, caller: Address, account: Address) -> Result<(), WalletError> {
        let mut record = Self::load(&env, &account)?;
        Self::require_member(&env, &caller, &account)?;
        Self::apply_lock(&env, &account, &mut record)
    }

    pub fn unlock(env: Env, caller: Address, account: Address) -> Result<(), WalletError> {
        let mut record = Self::load(&env, &account)?;
        Self::require_member(&env, &caller, &account)?;
        Self::apply_unlock(&env, &account, &mut record)
    }

    pub fn is_locked(env: Env, account: Address, kind: LockKind) -> bool {
        Self::try_load(&env, &account)
            .map(|record| record.is_locked(kind, env.ledger().timestamp()))
            .unwrap_or(false)
    }

    /// Timestamp at which the lock of `kind` ends, or 0 when it is not held.
    pub fn lock_until(env: Env, account: Address, kind: LockKind) -> u64 {
        Self::try_load(&env, &account)
            .map(|record| record.lock_until(kind, env.ledger().timestamp()))
            .unwrap_or(0)
    }

    pub fn trigger_recovery(
        env: Env,
        caller: Address,
        account: Address,
        new_owner: Address,
    ) -> Result<(), WalletError> {
        let mut record = Self::load(&env, &account)?;
        Self::require_member(&env, &caller, &account)?;
        Self::apply_trigger_recovery(&env, &account, &mut record, new_owner)
    }

    /// Signers, the account and the current owner may cancel.
    pub fn cancel_recovery(env: Env, caller: Address, account: Address) -> Result<(), WalletError> {
        let mut record = Self::load(&env, &account)?;
        caller.require_auth();
        if caller != account {
            let account_client = AccountClient::new(&env, &account);
            if !account_client.is_signer(&caller) && account_client.owner() != caller {
                return Err(WalletError::CallerNotSignerOrAccount);
            }
        }
        Self::apply_cancel_recovery(&env, &account, &mut record)
    }

    /// Hands the account to the proposed owner once the request has matured.
    pub fn execute_recovery(
        env: Env,
        caller: Address,
        account: Address,
    ) -> Result<(), WalletError> {
        let mut record = Self::load(&env, &account)?;
        caller.require_auth();

        let request = record.recovery.clone().ok_or(WalletError::NoRecoveryPending)?;
        if request.proposed_owner != caller {
            return Err(WalletError::NotProposedOwner);
        }
        record.check_recovery_window(&request, env.ledger().timestamp())?;

        record.recovery = None;
        Self::save(&env, &account, &record);
        AccountClient::new(&env, &account).set_owner(&env.current_contract_address(), &caller);

        log!(&env, "recovery executed for {}", account);
        RecoveryExecuted {
            account,
            owner: caller,
        }
        .publish(&env);
        Ok(())
    }

    pub fn is_in_recovery(env: Env, account: Address) -> bool {
        Self::get_recovery(env, account).is_some()
    }

    pub fn get_recovery(env: Env, account: Address) -> Option<RecoveryRequest> {
        Self::try_load(&env, &account)?.pending_recovery(env.ledger().timestamp())
    }

    pub fn add_signer(
        env: Env,
        caller: Address,
        account: Address,
        signer: Address,
    ) -> Result<(), WalletError> {
        let mut record = Self::load(&env, &account)?;
        Self::require_owner(&env, &caller, &account)?;
        Self::apply_add_signer(&env, &account, &mut record, signer)
    }

    pub fn remove_signer(
        env: Env,
        caller: Address,
        account: Address,
        signer: Address,
    ) -> Result<(), WalletError> {
        let mut record = Self::load(&env, &account)?;
        Self::require_owner(&env, &caller, &account)?;
        Self::apply_remove_signer(&env, &account, &mut record, signer)
    }

    pub fn replace_signer(
        env: Env,
        caller: Address,
        account: Address,
        old_signer: Address,
        new_signer: Address,
    ) -> Result<(), WalletError> {
        let mut record = Self::load(&env, &account)?;
        Self::require_owner(&env, &caller, &account)?;
        Self::apply_replace_signer(&env, &account, &mut record, old_signer, new_signer)
    }

    pub fn is_signer(env: Env, account: Address, signer: Address) -> bool {
        AccountClient::new(&env, &account).is_signer(&signer)
    }

    /// Quorum entry point. `signatures` must hold approvals of `call` from at
    /// least two distinct signers of `account`; `caller` must be the owner or
    /// a signer.
    ///
    /// `call` may target this module, the account's `execute` or
    /// `authorise_module`, or another registered module whose first argument
    /// is `account`. Owner and signer changes only go through this module.
    pub fn multicall(
        env: Env,
        caller: Address,
        account: Address,
        call: Call,
        signatures: Vec<Signature>,
    ) -> Result<(), WalletError> {
        let mut record = Self::load(&env, &account)?;
        caller.require_auth();
        if caller == account {
            return Err(WalletError::CallerNotSignerOrAccount);
        }

        let account_client = AccountClient::new(&env, &account);
        let signers = account_client.signers();
        if !signers.contains(&caller) && account_client.owner() != caller {
            return Err(WalletError::CallerNotSignerOrAccount);
        }

        let now = env.ledger().timestamp();
        if call.expire_time <= now {
            return Err(WalletError::Expired);
        }

        let digest = signature::call_digest(&env, &account, &call);
        let mut approvals: Vec<Address> = Vec::new(&env);
        for sig in signatures.iter() {
            let signer = signature::recover_signer(&env, &digest, &sig)?;
            if !signers.contains(&signer) {
                return Err(WalletError::UnauthorizedSigner);
            }
            if !approvals.contains(&signer) {
                approvals.push_back(signer);
            }
        }
        if approvals.len() < QUORUM {
            return Err(WalletError::InsufficientSignatures);
        }

        let this = env.current_contract_address();
        if call.target == account && !Self::allowed_on_account(&env, &call.func) {
            return Err(WalletError::InvalidCall);
        }
        account_client.consume_sequence(&this, &call.sequence_id);

        if record.is_locked(LockKind::Global, now) && !Self::allowed_while_locked(&env, &this, &call)
        {
            return Err(WalletError::AccountLockedGlobally);
        }

        if call.target == this {
            return Self::dispatch(&env, &account, &mut record, &call);
        }
        if call.target != account {
            if !Self::registry(&env)?.is_registered(&call.target) {
                return Err(WalletError::ModuleNotRegistered);
            }
            let subject: Address = Self::arg(&env, &call.args, 0)?;
            if subject != account {
                return Err(WalletError::InvalidCall);
            }
        }
        env.invoke_contract::<Val>(&call.target, &call.func, call.args.clone());
        Ok(())
    }

    pub fn get_lock_period(env: Env, account: Address) -> Result<u64, WalletError> {
        Ok(Self::load(&env, &account)?.lock_period)
    }

    pub fn get_recovery_period(env: Env, account: Address) -> Result<u64, WalletError> {
        Ok(Self::load(&env, &account)?.recovery_period)
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
}

impl SecurityModule {
    /// Runs a quorum-approved call addressed to this module. Arguments are
    /// those of the public entry point without its `caller`.
    fn dispatch(
        env: &Env,
        account: &Address,
        record: &mut AccountSecurity,
        call: &Call,
    ) -> Result<(), WalletError> {
        let subject: Address = Self::arg(env, &call.args, 0)?;
        if subject != *account {
            return Err(WalletError::InvalidCall);
        }

        let func = &call.func;
        if *func == Symbol::new(env, "lock") {
            Self::apply_lock(env, account, record)
        } else if *func == Symbol::new(env, "unlock") {
            Self::apply_unlock(env, account, record)
        } else if *func == Symbol::new(env, "trigger_recovery") {
            let new_owner = Self::arg(env, &call.args, 1)?;
            Self::apply_trigger_recovery(env, account, record, new_owner)
        } else if *func == Symbol::new(env, "cancel_recovery") {
            Self::apply_cancel_recovery(env, account, record)
        } else if *func == Symbol::new(env, "add_signer") {
            let signer = Self::arg(env, &call.args, 1)?;
            Self::apply_add_signer(env, account, record, signer)
        } else if *func == Symbol::new(env, "remove_signer") {
            let signer = Self::arg(env, &call.args, 1)?;
            Self::apply_remove_signer(env, account, record, signer)
        } else if *func == Symbol::new(env, "replace_signer") {
            let old_signer = Self::arg(env, &call.args, 1)?;
            let new_signer = Self::arg(env, &call.args, 2)?;
            Self::apply_replace_signer(env, account, record, old_signer, new_signer)
        } else if *func == Symbol::new(env, "set_security_period") {
            let lock_period = Self::arg(env, &call.args, 1)?;
            let recovery_period = Self::arg(env, &call.args, 2)?;
            Self::apply_security_period(env, account, record, lock_period, recovery_period)
        } else {
            Err(WalletError::InvalidCall)
        }
    }

    fn allowed_on_account(env: &Env, func: &Symbol) -> bool {
        *func == Symbol::new(env, "execute") || *func == Symbol::new(env, "authorise_module")
    }

    fn allowed_while_locked(env: &Env, this: &Address, call: &Call) -> bool {
        call.target == *this
            && (call.func == Symbol::new(env, "unlock")
                || call.func == Symbol::new(env, "trigger_recovery")
                || call.func == Symbol::new(env, "cancel_recovery"))
    }

    fn apply_lock(
        env: &Env,
        account: &Address,
        record: &mut AccountSecurity,
    ) -> Result<(), WalletError> {
        let now = env.ledger().timestamp();
        if record.is_locked(LockKind::Global, now) {
            return Err(WalletError::AlreadyLockedGlobally);
        }
        let until = now.saturating_add(record.lock_period);
        record.acquire(LockKind::Global, until);
        Self::save(env, account, record);

        log!(env, "account {} locked until {}", account, until);
        Locked {
            account: account.clone(),
            kind: LockKind::Global,
            until,
        }
        .publish(env);
        Ok(())
    }

    fn apply_unlock(
        env: &Env,
        account: &Address,
        record: &mut AccountSecurity,
    ) -> Result<(), WalletError> {
        if !record.is_locked(LockKind::Global, env.ledger().timestamp()) {
            return Err(WalletError::NotLocked);
        }
        record.release(LockKind::Global);
        Self::save(env, account, record);

        log!(env, "account {} unlocked", account);
        Unlocked {
            account: account.clone(),
            kind: LockKind::Global,
        }
        .publish(env);
        Ok(())
    }

    fn apply_trigger_recovery(
        env: &Env,
        account: &Address,
        record: &mut AccountSecurity,
        new_owner: Address,
    ) -> Result<(), WalletError> {
        let now = env.ledger().timestamp();
        if record.pending_recovery(now).is_some() {
            return Err(WalletError::RecoveryInProgress);
        }
        record.recovery = Some(RecoveryRequest {
            proposed_owner: new_owner.clone(),
            triggered_at: now,
        });
        Self::save(env, account, record);

        log!(env, "recovery triggered for {}", account);
        RecoveryTriggered {
            account: account.clone(),
            proposed_owner: new_owner,
            triggered_at: now,
        }
        .publish(env);
        Ok(())
    }

    fn apply_cancel_recovery(
        env: &Env,
        account: &Address,
        record: &mut AccountSecurity,
    ) -> Result<(), WalletError> {
        if record.pending_recovery(env.ledger().timestamp()).is_none() {
            return Err(WalletError::NoRecoveryPending);
        }
        record.recovery = None;
        Self::save(env, account, record);

        log!(env, "recovery cancelled for {}", account);
        RecoveryCancelled {
            account: account.clone(),
        }
        .publish(env);
        Ok(())
    }

    fn apply_add_signer(
        env: &Env,
        account: &Address,
        record: &mut AccountSecurity,
        signer: Address,
    ) -> Result<(), WalletError> {
        Self::begin_signer_change(env, record)?;
        AccountClient::new(env, account).add_signer(&env.current_contract_address(), &signer);
        Self::finish_signer_change(env, account, record);
        Ok(())
    }

    fn apply_remove_signer(
        env: &Env,
        account: &Address,
        record: &mut AccountSecurity,
        signer: Address,
    ) -> Result<(), WalletError> {
        Self::begin_signer_change(env, record)?;
        AccountClient::new(env, account).remove_signer(&env.current_contract_address(), &signer);
        Self::finish_signer_change(env, account, record);
        Ok(())
    }

    fn apply_replace_signer(
        env: &Env,
        account: &Address,
        record: &mut AccountSecurity,
        old_signer: Address,
        new_signer: Address,
    ) -> Result<(), WalletError> {
        Self::begin_signer_change(env, record)?;
        AccountClient::new(env, account).replace_signer(
            &env.current_contract_address(),
            &old_signer,
            &new_signer,
        );
        Self::finish_signer_change(env, account, record);
        Ok(())
    }

    fn apply_security_period(
        env: &Env,
        account: &Address,
        record: &mut AccountSecurity,
        lock_period: u64,
        recovery_period: u64,
    ) -> Result<(), WalletError> {
        if lock_period == 0 || recovery_period == 0 {
            return Err(WalletError::InvalidPeriod);
        }
        record.configure(&SecurityConfig {
            lock_period,
            recovery_period,
        });
        Self::save(env, account, record);
        log!(
            env,
            "security periods of {} set to {} and {}",
            account,
            lock_period,
            recovery_period
        );
        Ok(())
    }

    fn begin_signer_change(env: &Env, record: &AccountSecurity) -> Result<(), WalletError> {
        let now = env.ledger().timestamp();
        if record.is_locked(LockKind::Global, now) {
            return Err(WalletError::AccountLockedGlobally);
        }
        if record.is_locked(LockKind::SignerRelated, now) {
            return Err(WalletError::SignerOperationLocked);
        }
        Ok(())
    }

    fn finish_signer_change(env: &Env, account: &Address, record: &mut AccountSecurity) {
        let until = env.ledger().timestamp().saturating_add(record.lock_period);
        record.acquire(LockKind::SignerRelated, until);
        Self::save(env, account, record);
        Locked {
            account: account.clone(),
            kind: LockKind::SignerRelated,
            until,
        }
        .publish(env);
    }

    /// Signers of `account`, or the account itself. The account is accepted
    /// without reading it since it may be the one calling.
    fn require_member(env: &Env, caller: &Address, account: &Address) -> Result<(), WalletError> {
        caller.require_auth();
        if caller == account || AccountClient::new(env, account).is_signer(caller) {
            return Ok(());
        }
        Err(WalletError::CallerNotSignerOrAccount)
    }

    fn require_owner(env: &Env, caller: &Address, account: &Address) -> Result<(), WalletError> {
        caller.require_auth();
        if AccountClient::new(env, account).owner() != *caller {
            return Err(WalletError::CallerNotOwner);
        }
        Ok(())
    }

    fn arg<T: TryFromVal<Env, Val>>(env: &Env, args: &Vec<Val>, index: u32) -> Result<T, WalletError> {
        let value = args.get(index).ok_or(WalletError::InvalidCall)?;
        T::try_from_val(env, &value).map_err(|_| WalletError::InvalidCall)
    }

    fn registry(env: &Env) -> Result<RegistryClient<'_>, WalletError> {
        let registry: Address = env
            .storage()
            .instance()
            .get(&DataKey::Registry)
            .ok_or(WalletError::NotInitialized)?;
        Ok(RegistryClient::new(env, &registry))
    }

    fn defaults(env: &Env) -> Result<SecurityConfig, WalletError> {
        env.storage()
            .instance()
            .get(&DataKey::Defaults)
            .ok_or(WalletError::NotInitialized)
    }

    fn try_load(env: &Env, account: &Address) -> Option<AccountSecurity> {
        env.storage()
            .persistent()
            .get(&DataKey::Account(account.clone()))
    }

    fn load(env: &Env, account: &Address) -> Result<AccountSecurity, WalletError> {
        Self::try_load(env, account).ok_or(WalletError::NotInitialized)
    }

    fn save(env: &Env, account: &Address, record: &AccountSecurity) {
        let key = DataKey::Account(account.clone());
        let storage = env.storage().persistent();
        storage.set(&key, record);
        storage.extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
        extend_instance(env);
    }
}
