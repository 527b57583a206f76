#![no_std]

mod account;
mod types;

pub use account::{SmartAccount, SmartAccountClient};
pub use types::{ModuleAuthorised, OwnerChanged, SignerAdded, SignerRemoved, Transacted};
