use soroban_sdk::{contracttype, Env, Vec};

use crate::errors::WalletError;

pub const SEQUENCE_WINDOW_SIZE: u32 = 10;
/// Largest accepted jump above the lowest id still in the window.
pub const MAX_SEQUENCE_ID_INCREASE: u64 = 10_000;

/// Replay protection for off-chain collected authorizations.
///
/// Keeps the last `SEQUENCE_WINDOW_SIZE` accepted ids. A new id must be
/// unused and above the lowest id in the window; it then evicts that lowest
/// id. Ids may arrive out of order as long as they stay inside the window.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SequenceGuard {
    pub recent: Vec<u64>,
}

impl SequenceGuard {
    pub fn new(env: &Env) -> Self {
        let mut recent = Vec::new(env);
        for _ in 0..SEQUENCE_WINDOW_SIZE {
            recent.push_back(0u64);
        }
        Self { recent }
    }

    pub fn highest(&self) -> u64 {
        self.recent.iter().max().unwrap_or(0)
    }

    pub fn next_id(&self) -> u64 {
        self.highest() + 1
    }

    pub fn try_insert(&mut self, id: u64) -> Result<(), WalletError> {
        let mut lowest = u64::MAX;
        let mut lowest_index = 0u32;
        for (index, used) in self.recent.iter().enumerate() {
            if used == id {
                return Err(WalletError::SequenceIdReused);
            }
            if used < lowest {
                lowest = used;
                lowest_index = index as u32;
            }
        }

        if id <= lowest {
            return Err(WalletError::SequenceIdOutsideWindow);
        }
        if id > lowest.saturating_add(MAX_SEQUENCE_ID_INCREASE) {
            return Err(WalletError::SequenceIdTooHigh);
        }

        self.recent.set(lowest_index, id);
        Ok(())
    }
}
