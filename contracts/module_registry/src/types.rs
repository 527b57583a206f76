use soroban_sdk::{contractevent, contracttype, Address, Symbol};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    ModuleByName(Symbol),
    NameOfModule(Address),
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModuleRegistered {
    #[topic]
    pub name: Symbol,
    pub module: Address,
}
