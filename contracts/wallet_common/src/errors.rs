use soroban_sdk::contracterror;

/// Error codes shared by every wallet contract.
///
/// A contract that fails inside a nested call surfaces the callee's code
/// unchanged, so the codes are unique across the whole wallet.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum WalletError {
    // lifecycle
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NoModules = 3,
    InvalidModuleConfig = 4,
    EmptySignerSet = 5,
    DuplicateSigner = 6,
    SignerNotFound = 7,
    LastSigner = 8,
    ModuleNotFound = 9,

    // authorization
    UnauthorizedSigner = 10,
    SelfSign = 11,
    UnauthorizedModule = 12,
    ModuleNotRegistered = 13,
    ModuleAlreadyAuthorised = 14,
    LastModule = 15,
    CallerNotSignerOrAccount = 16,
    NotProposedOwner = 17,
    InsufficientSignatures = 18,
    InvalidSignatureFormat = 19,
    CallerNotSecurityModule = 20,
    InvalidCall = 21,
    CallerNotOwner = 22,
    InvokeRequiresQuorum = 23,

    // temporal and locking
    Expired = 30,
    RecoveryNotMatured = 31,
    RecoveryExpired = 32,
    AlreadyLockedGlobally = 33,
    AccountLockedGlobally = 34,
    SignerOperationLocked = 35,
    NotLocked = 36,
    RecoveryInProgress = 37,
    NoRecoveryPending = 38,

    // replay
    SequenceIdReused = 40,
    SequenceIdOutsideWindow = 41,
    SequenceIdTooHigh = 42,

    // policy thresholds
    DailyLimitReached = 50,
    LargeTransactionRequiresQuorum = 51,
    InvalidAmount = 52,
    InvalidPeriod = 53,

    // upgrades
    NoPreviousImplementation = 60,
}
