use soroban_sdk::{contractevent, contracttype, Address};
use wallet_common::LockKind;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Registry,
    Defaults,
    Account(Address),
}

/// A pending owner replacement.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryRequest {
    pub proposed_owner: Address,
    pub triggered_at: u64,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Locked {
    #[topic]
    pub account: Address,
    pub kind: LockKind,
    pub until: u64,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unlocked {
    #[topic]
    pub account: Address,
    pub kind: LockKind,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryTriggered {
    #[topic]
    pub account: Address,
    pub proposed_owner: Address,
    pub triggered_at: u64,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryCancelled {
    #[topic]
    pub account: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecoveryExecuted {
    #[topic]
    pub account: Address,
    pub owner: Address,
}
