use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Symbol, Val, Vec};

/// Registry name of the security policy module.
pub const SECURITY_MODULE: Symbol = symbol_short!("SM");
/// Registry name of the transaction policy module.
pub const TRANSACTION_MODULE: Symbol = symbol_short!("TM");

/// Something an account can be asked to do with its funds.
#[contracttype]
#[derive(Clone)]
pub enum Operation {
    /// `(token, to, amount)`: move `amount` of a SEP-41 token out of the account.
    Transfer(Address, Address, i128),
    /// `(contract, function, args)`: call an arbitrary contract as the account.
    Invoke(Address, Symbol, Vec<Val>),
}

impl Operation {
    /// Contract or recipient the operation reaches.
    pub fn target(&self) -> Address {
        match self {
            Operation::Transfer(_, to, _) => to.clone(),
            Operation::Invoke(contract, _, _) => contract.clone(),
        }
    }

    /// Token amount leaving the account. Invocations carry no amount.
    pub fn amount(&self) -> i128 {
        match self {
            Operation::Transfer(_, _, amount) => *amount,
            Operation::Invoke(_, _, _) => 0,
        }
    }
}

/// A call collected off-chain and approved by a quorum of signers.
#[contracttype]
#[derive(Clone)]
pub struct Call {
    pub target: Address,
    pub func: Symbol,
    pub args: Vec<Val>,
    pub sequence_id: u64,
    pub expire_time: u64,
}

/// Single-signer spend request handled by the transaction module.
#[contracttype]
#[derive(Clone)]
pub struct Transaction {
    pub operation: Operation,
    pub sequence_id: u64,
    pub expire_time: u64,
}

/// A signer's approval of one digest.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    pub signer: Address,
    pub digest: BytesN<32>,
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum LockKind {
    Global = 1,
    SignerRelated = 2,
}

impl LockKind {
    pub fn flag(self) -> u32 {
        self as u32
    }
}

/// Per-account payload for the security module's `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecurityConfig {
    pub lock_period: u64,
    pub recovery_period: u64,
}

/// Per-account payload for the transaction module's `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpendingLimits {
    pub daily_limit: i128,
    pub large_threshold: i128,
}
