use soroban_sdk::{contractevent, contracttype, Address};

pub const SECONDS_PER_DAY: u64 = 86_400;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Registry,
    Spending(Address),
}

/// Limits and the running daily counter of one account.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpendingState {
    pub daily_limit: i128,
    pub large_threshold: i128,
    pub spent_today: i128,
    pub window_start: u64,
}

impl SpendingState {
    /// Start of the UTC day containing `now`.
    pub fn window_of(now: u64) -> u64 {
        now - now % SECONDS_PER_DAY
    }

    /// Amount spent in the day window containing `now`.
    pub fn spent_at(&self, now: u64) -> i128 {
        if self.window_start == Self::window_of(now) {
            self.spent_today
        } else {
            0
        }
    }
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionExecuted {
    #[topic]
    pub account: Address,
    pub target: Address,
    pub amount: i128,
    pub large: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LimitsUpdated {
    #[topic]
    pub account: Address,
    pub daily_limit: i128,
    pub large_threshold: i128,
}
