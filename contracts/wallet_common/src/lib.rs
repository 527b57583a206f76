#![no_std]

pub mod errors;
pub mod interfaces;
pub mod sequence;
pub mod signature;
pub mod storage;
pub mod types;
pub mod upgrade;

pub use errors::WalletError;
pub use interfaces::{AccountClient, LockStateClient, PolicyModuleClient, RegistryClient};
pub use sequence::SequenceGuard;
pub use types::{
    Call, LockKind, Operation, SecurityConfig, Signature, SpendingLimits, Transaction,
    SECURITY_MODULE, TRANSACTION_MODULE,
};

mod test;
