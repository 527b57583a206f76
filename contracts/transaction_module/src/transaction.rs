use soroban_sdk::{contract, contractimpl, log, xdr::FromXdr, Address, Bytes, BytesN, Env};
use wallet_common::storage::{
    extend_instance, PERSISTENT_BUMP_AMOUNT, PERSISTENT_LIFETIME_THRESHOLD,
};
use wallet_common::{
    upgrade, AccountClient, LockKind, LockStateClient, Operation, RegistryClient, SpendingLimits,
    Transaction, WalletError, SECURITY_MODULE,
};

use crate::types::{DataKey, LimitsUpdated, SpendingState, TransactionExecuted};

#[contract]
pub struct TransactionModule;

#[contractimpl]
impl TransactionModule {
    pub fn __constructor(
        env: Env,
        admin: Address,
        registry: Address,
        implementation: BytesN<32>,
    ) {
        upgrade::init(&env, &admin, &implementation);
        env.storage().instance().set(&DataKey::Registry, &registry);
    }

    /// Called by an account when it authorises this module. `payload` is an
    /// XDR `SpendingLimits`. Re-authorising keeps today's counter.
    pub fn init(env: Env, account: Address, payload: Bytes) -> Result<(), WalletError> {
        account.require_auth();
        if !Self::registry(&env)?.is_registered(&env.current_contract_address()) {
            return Err(WalletError::ModuleNotRegistered);
        }

        if payload.is_empty() {
            return Err(WalletError::InvalidModuleConfig);
        }
        let limits = SpendingLimits::from_xdr(&env, &payload)
            .map_err(|_| WalletError::InvalidModuleConfig)?;
        Self::check_limits(limits.daily_limit, limits.large_threshold)?;

        let state = match Self::try_load(&env, &account) {
            Some(mut state) => {
                state.daily_limit = limits.daily_limit;
                state.large_threshold = limits.large_threshold;
                state
            }
            None => SpendingState {
                daily_limit: limits.daily_limit,
                large_threshold: limits.large_threshold,
                spent_today: 0,
                window_start: SpendingState::window_of(env.ledger().timestamp()),
            },
        };
        Self::save(&env, &account, &state);
        Ok(())
    }

    /// Single-signer token transfer, capped by the daily limit. Amounts at
    /// or above the large-payment threshold, and any `Invoke`, must go
    /// through the security module's quorum path instead.
    pub fn execute_transaction(
        env: Env,
        caller: Address,
        account: Address,
        transaction: Transaction,
    ) -> Result<(), WalletError> {
        let mut state = Self::load(&env, &account)?;
        caller.require_auth();

        let account_client = AccountClient::new(&env, &account);
        if !account_client.is_signer(&caller) && account_client.owner() != caller {
            return Err(WalletError::UnauthorizedSigner);
        }

        let now = env.ledger().timestamp();
        if transaction.expire_time <= now {
            return Err(WalletError::Expired);
        }
        Self::ensure_not_globally_locked(&env, &account_client, &account)?;

        // only plain transfers are metered
        let amount = match &transaction.operation {
            Operation::Transfer(_, _, amount) => *amount,
            Operation::Invoke(..) => return Err(WalletError::InvokeRequiresQuorum),
        };
        if amount <= 0 {
            return Err(WalletError::InvalidAmount);
        }
        if amount >= state.large_threshold {
            return Err(WalletError::LargeTransactionRequiresQuorum);
        }

        let window = SpendingState::window_of(now);
        if state.window_start != window {
            state.window_start = window;
            state.spent_today = 0;
        }
        let spent = state
            .spent_today
            .checked_add(amount)
            .ok_or(WalletError::DailyLimitReached)?;
        if spent > state.daily_limit {
            return Err(WalletError::DailyLimitReached);
        }
        state.spent_today = spent;
        Self::save(&env, &account, &state);

        let this = env.current_contract_address();
        account_client.consume_sequence(&this, &transaction.sequence_id);
        account_client.execute(&this, &transaction.operation);

        TransactionExecuted {
            account,
            target: transaction.operation.target(),
            amount,
            large: false,
        }
        .publish(&env);
        Ok(())
    }

    /// Quorum-approved spend. Only the registered security module may call
    /// this, from `multicall`; the daily counter is left untouched.
    pub fn execute_large_transaction(
        env: Env,
        account: Address,
        operation: Operation,
    ) -> Result<(), WalletError> {
        Self::load(&env, &account)?;
        Self::require_security_module(&env)?;

        AccountClient::new(&env, &account).execute(&env.current_contract_address(), &operation);

        log!(&env, "large transaction executed for {}", account);
        TransactionExecuted {
            account,
            target: operation.target(),
            amount: operation.amount(),
            large: true,
        }
        .publish(&env);
        Ok(())
    }

    /// Replaces both limits. Only the registered security module may call
    /// this, from `multicall`.
    pub fn set_tm_parameter(
        env: Env,
        account: Address,
        daily_limit: i128,
        large_threshold: i128,
    ) -> Result<(), WalletError> {
        let mut state = Self::load(&env, &account)?;
        Self::require_security_module(&env)?;
        Self::check_limits(daily_limit, large_threshold)?;

        state.daily_limit = daily_limit;
        state.large_threshold = large_threshold;
        Self::save(&env, &account, &state);

        LimitsUpdated {
            account,
            daily_limit,
            large_threshold,
        }
        .publish(&env);
        Ok(())
    }

    pub fn get_daily_upbound(env: Env, account: Address) -> Result<i128, WalletError> {
        Ok(Self::load(&env, &account)?.daily_limit)
    }

    pub fn get_large_amount_payment(env: Env, account: Address) -> Result<i128, WalletError> {
        Ok(Self::load(&env, &account)?.large_threshold)
    }

    pub fn get_spent_today(env: Env, account: Address) -> Result<i128, WalletError> {
        Ok(Self::load(&env, &account)?.spent_at(env.ledger().timestamp()))
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

    fn check_limits(daily_limit: i128, large_threshold: i128) -> Result<(), WalletError> {
        if daily_limit <= 0 || large_threshold <= 0 {
            return Err(WalletError::InvalidAmount);
        }
        Ok(())
    }

    fn require_security_module(env: &Env) -> Result<(), WalletError> {
        let security = Self::registry(env)?
            .get_module(&SECURITY_MODULE)
            .ok_or(WalletError::CallerNotSecurityModule)?;
        security.require_auth();
        Ok(())
    }

    /// The lock lives in the security module currently registered under its
    /// name, if the account uses it at all.
    fn ensure_not_globally_locked(
        env: &Env,
        account_client: &AccountClient<'_>,
        account: &Address,
    ) -> Result<(), WalletError> {
        let Some(security) = Self::registry(env)?.get_module(&SECURITY_MODULE) else {
            return Ok(());
        };
        if !account_client.is_module(&security) {
            return Ok(());
        }
        if LockStateClient::new(env, &security).is_locked(account, &LockKind::Global) {
            return Err(WalletError::AccountLockedGlobally);
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

    fn try_load(env: &Env, account: &Address) -> Option<SpendingState> {
        env.storage()
            .persistent()
            .get(&DataKey::Spending(account.clone()))
    }

    fn load(env: &Env, account: &Address) -> Result<SpendingState, WalletError> {
        Self::try_load(env, account).ok_or(WalletError::NotInitialized)
    }

    fn save(env: &Env, account: &Address, state: &SpendingState) {
        let key = DataKey::Spending(account.clone());
        let storage = env.storage().persistent();
        storage.set(&key, state);
        storage.extend_ttl(&key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
        extend_instance(env);
    }
}
