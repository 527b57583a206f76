#![no_std]

mod security;
mod state;
mod types;

pub use security::{SecurityModule, SecurityModuleClient};
pub use state::{AccountSecurity, LockState};
pub use types::{
    Locked, RecoveryCancelled, RecoveryExecuted, RecoveryRequest, RecoveryTriggered, Unlocked,
};
