#![no_std]

mod transaction;
mod types;

pub use transaction::{TransactionModule, TransactionModuleClient};
pub use types::{LimitsUpdated, SpendingState, TransactionExecuted};
