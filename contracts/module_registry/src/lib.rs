#![no_std]

mod registry;
mod types;

pub use registry::{ModuleRegistry, ModuleRegistryClient};
pub use types::ModuleRegistered;
