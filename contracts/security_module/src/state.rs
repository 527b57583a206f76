use soroban_sdk::contracttype;
use wallet_common::{LockKind, SecurityConfig, WalletError};

use crate::types::RecoveryRequest;

/// Per-account lock bookkeeping.
///
/// Locks expire on their own once `now >= until`; nothing clears them
/// eagerly, every reader passes the current ledger time instead.
pub trait LockState {
    fn is_locked(&self, kind: LockKind, now: u64) -> bool;
    fn acquire(&mut self, kind: LockKind, until: u64);
    fn release(&mut self, kind: LockKind);
}

/// Everything the security module keeps for one account.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountSecurity {
    pub lock_flags: u32,
    pub global_until: u64,
    pub signer_until: u64,
    pub recovery: Option<RecoveryRequest>,
    pub lock_period: u64,
    pub recovery_period: u64,
}

impl AccountSecurity {
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            lock_flags: 0,
            global_until: 0,
            signer_until: 0,
            recovery: None,
            lock_period: config.lock_period,
            recovery_period: config.recovery_period,
        }
    }

    pub fn configure(&mut self, config: &SecurityConfig) {
        self.lock_period = config.lock_period;
        self.recovery_period = config.recovery_period;
    }

    pub fn lock_until(&self, kind: LockKind, now: u64) -> u64 {
        if !self.is_locked(kind, now) {
            return 0;
        }
        match kind {
            LockKind::Global => self.global_until,
            LockKind::SignerRelated => self.signer_until,
        }
    }

    /// The recovery request, unless it was never triggered or has expired.
    ///
    /// A request matures `recovery_period` after it is triggered and stays
    /// executable for one more `recovery_period`.
    pub fn pending_recovery(&self, now: u64) -> Option<RecoveryRequest> {
        let request = self.recovery.clone()?;
        if now >= self.recovery_expires_at(&request) {
            return None;
        }
        Some(request)
    }

    /// Checks that `request` may be executed at `now`.
    pub fn check_recovery_window(
        &self,
        request: &RecoveryRequest,
        now: u64,
    ) -> Result<(), WalletError> {
        let matures_at = request.triggered_at.saturating_add(self.recovery_period);
        if now < matures_at {
            return Err(WalletError::RecoveryNotMatured);
        }
        if now >= self.recovery_expires_at(request) {
            return Err(WalletError::RecoveryExpired);
        }
        Ok(())
    }

    fn recovery_expires_at(&self, request: &RecoveryRequest) -> u64 {
        request
            .triggered_at
            .saturating_add(self.recovery_period)
            .saturating_add(self.recovery_period)
    }
}

impl LockState for AccountSecurity {
    fn is_locked(&self, kind: LockKind, now: u64) -> bool {
        if self.lock_flags & kind.flag() == 0 {
            return false;
        }
        let until = match kind {
            LockKind::Global => self.global_until,
            LockKind::SignerRelated => self.signer_until,
        };
        now < until
    }

    fn acquire(&mut self, kind: LockKind, until: u64) {
        self.lock_flags |= kind.flag();
        match kind {
            LockKind::Global => self.global_until = until,
            LockKind::SignerRelated => self.signer_until = until,
        }
    }

    fn release(&mut self, kind: LockKind) {
        self.lock_flags &= !kind.flag();
        match kind {
            LockKind::Global => self.global_until = 0,
            LockKind::SignerRelated => self.signer_until = 0,
        }
    }
}
