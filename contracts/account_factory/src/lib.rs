#![no_std]

mod factory;
mod types;

pub use factory::{AccountFactory, AccountFactoryClient};
pub use types::{AccountCreated, MasterChanged};
