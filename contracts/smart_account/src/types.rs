use soroban_sdk::{contractevent, contracttype, Address, BytesN};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Initialized,
    Registry,
    Owner,
    Signers,
    Modules,
    Sequence,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transacted {
    #[topic]
    pub caller: Address,
    pub cosigner: Address,
    pub target: Address,
    pub amount: i128,
    pub digest: BytesN<32>,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModuleAuthorised {
    #[topic]
    pub module: Address,
    pub allowed: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OwnerChanged {
    #[topic]
    pub owner: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignerAdded {
    #[topic]
    pub signer: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignerRemoved {
    #[topic]
    pub signer: Address,
}
