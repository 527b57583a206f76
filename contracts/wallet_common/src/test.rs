#![cfg(test)]

use soroban_sdk::{
    contract, contractimpl, symbol_short, testutils::Address as _, vec, Address, BytesN, Env,
    IntoVal,
};

use crate::sequence::{SequenceGuard, MAX_SEQUENCE_ID_INCREASE, SEQUENCE_WINDOW_SIZE};
use crate::signature::{call_digest, operation_digest, recover_signer};
use crate::types::{Call, Operation, Signature};
use crate::{upgrade, WalletError};

#[contract]
struct Harness;

#[contractimpl]
impl Harness {
    pub fn __constructor(env: Env, admin: Address, implementation: BytesN<32>) {
        upgrade::init(&env, &admin, &implementation);
    }

    pub fn admin(env: Env) -> Result<Address, WalletError> {
        upgrade::admin(&env)
    }

    pub fn set_admin(env: Env, new_admin: Address) -> Result<(), WalletError> {
        upgrade::set_admin(&env, new_admin)
    }
}

fn hash(env: &Env, byte: u8) -> BytesN<32> {
    BytesN::from_array(env, &[byte; 32])
}

#[test]
fn test_sequence_starts_at_one() {
    let env = Env::default();
    let guard = SequenceGuard::new(&env);

    assert_eq!(guard.recent.len(), SEQUENCE_WINDOW_SIZE);
    assert_eq!(guard.next_id(), 1);
}

#[test]
fn test_sequence_insert_advances_next_id() {
    let env = Env::default();
    let mut guard = SequenceGuard::new(&env);

    guard.try_insert(1).unwrap();
    assert_eq!(guard.next_id(), 2);

    // holes are fine
    guard.try_insert(100).unwrap();
    assert_eq!(guard.next_id(), 101);
}

#[test]
fn test_sequence_rejects_reuse() {
    let env = Env::default();
    let mut guard = SequenceGuard::new(&env);

    guard.try_insert(7).unwrap();
    assert_eq!(guard.try_insert(7), Err(WalletError::SequenceIdReused));
}

#[test]
fn test_sequence_accepts_unused_ids_inside_window() {
    let env = Env::default();
    let mut guard = SequenceGuard::new(&env);

    for round in 1..=30u64 {
        guard.try_insert(round * 100).unwrap();
    }
    let next = guard.next_id();

    // the window now holds 2_100..=3_000; unused ids between them are free
    for offset in 1..SEQUENCE_WINDOW_SIZE as u64 {
        guard.try_insert(3_000 - offset).unwrap();
    }

    assert_eq!(guard.next_id(), next);
}

#[test]
fn test_sequence_rejects_ids_below_window() {
    let env = Env::default();
    let mut guard = SequenceGuard::new(&env);

    for id in 1..=20u64 {
        guard.try_insert(id).unwrap();
    }

    // 1..=10 were evicted from the window and can never come back
    assert_eq!(guard.try_insert(1), Err(WalletError::SequenceIdOutsideWindow));
    assert_eq!(guard.try_insert(10), Err(WalletError::SequenceIdOutsideWindow));
    assert_eq!(guard.try_insert(15), Err(WalletError::SequenceIdReused));
}

#[test]
fn test_sequence_rejects_large_jump() {
    let env = Env::default();
    let mut guard = SequenceGuard::new(&env);

    assert_eq!(
        guard.try_insert(MAX_SEQUENCE_ID_INCREASE + 1),
        Err(WalletError::SequenceIdTooHigh)
    );
    guard.try_insert(MAX_SEQUENCE_ID_INCREASE).unwrap();
}

#[test]
fn test_sequence_ids_accepted_once_each() {
    let env = Env::default();
    let mut guard = SequenceGuard::new(&env);

    let ids = [5u64, 3, 9, 4, 12, 6];
    for id in ids {
        guard.try_insert(id).unwrap();
    }
    for id in ids {
        assert!(guard.try_insert(id).is_err());
    }
}

#[test]
fn test_operation_digest_binds_every_field() {
    let env = Env::default();
    let account = Address::generate(&env);
    let other_account = Address::generate(&env);
    let token = Address::generate(&env);
    let to = Address::generate(&env);
    let operation = Operation::Transfer(token.clone(), to.clone(), 500);

    let digest = operation_digest(&env, &account, &operation, 1_000, 1);

    assert_eq!(digest, operation_digest(&env, &account, &operation, 1_000, 1));
    assert_ne!(digest, operation_digest(&env, &account, &operation, 1_000, 2));
    assert_ne!(digest, operation_digest(&env, &account, &operation, 1_001, 1));
    assert_ne!(digest, operation_digest(&env, &other_account, &operation, 1_000, 1));
    assert_ne!(
        digest,
        operation_digest(&env, &account, &Operation::Transfer(token, to, 501), 1_000, 1)
    );
}

#[test]
fn test_call_digest_differs_from_operation_digest() {
    let env = Env::default();
    let account = Address::generate(&env);
    let target = Address::generate(&env);
    let call = Call {
        target: target.clone(),
        func: symbol_short!("lock"),
        args: vec![&env, account.into_val(&env)],
        sequence_id: 1,
        expire_time: 1_000,
    };
    let operation = Operation::Invoke(target, symbol_short!("lock"), call.args.clone());

    assert_ne!(
        call_digest(&env, &account, &call),
        operation_digest(&env, &account, &operation, 1_000, 1)
    );
}

#[test]
fn test_signature_over_other_digest_is_rejected() {
    let env = Env::default();
    let signature = Signature {
        signer: Address::generate(&env),
        digest: hash(&env, 1),
    };

    assert_eq!(
        recover_signer(&env, &hash(&env, 2), &signature),
        Err(WalletError::InvalidSignatureFormat)
    );
}

#[test]
fn test_implementation_table_versions_and_rollback() {
    let env = Env::default();
    let admin = Address::generate(&env);
    let contract_id = env.register(Harness, (admin.clone(), hash(&env, 0)));

    env.as_contract(&contract_id, || {
        assert_eq!(upgrade::implementation(&env), Some(hash(&env, 0)));
        assert_eq!(upgrade::version(&env), 1);
        assert_eq!(
            upgrade::retract(&env),
            Err(WalletError::NoPreviousImplementation)
        );

        assert_eq!(upgrade::record(&env, hash(&env, 1)), 2);
        assert_eq!(upgrade::record(&env, hash(&env, 2)), 3);
        assert_eq!(upgrade::implementation(&env), Some(hash(&env, 2)));

        assert_eq!(upgrade::retract(&env), Ok(hash(&env, 1)));
        assert_eq!(upgrade::implementation(&env), Some(hash(&env, 1)));
        assert_eq!(upgrade::version(&env), 2);
    });
}

#[test]
fn test_first_upgrade_rolls_back_to_deployed_code() {
    let env = Env::default();
    let admin = Address::generate(&env);
    let contract_id = env.register(Harness, (admin.clone(), hash(&env, 0)));

    env.as_contract(&contract_id, || {
        assert_eq!(upgrade::record(&env, hash(&env, 1)), 2);
        assert_eq!(upgrade::retract(&env), Ok(hash(&env, 0)));
        assert_eq!(upgrade::implementation(&env), Some(hash(&env, 0)));
        assert_eq!(upgrade::version(&env), 1);
    });
}

#[test]
fn test_admin_handoff() {
    let env = Env::default();
    env.mock_all_auths();
    let admin = Address::generate(&env);
    let governance = Address::generate(&env);
    let contract_id = env.register(Harness, (admin.clone(), hash(&env, 0)));
    let client = HarnessClient::new(&env, &contract_id);

    assert_eq!(client.admin(), admin);
    client.set_admin(&governance);
    assert_eq!(client.admin(), governance);
}

#[test]
#[should_panic(expected = "Error(Auth, InvalidAction)")]
fn test_admin_handoff_requires_admin_auth() {
    let env = Env::default();
    let admin = Address::generate(&env);
    let contract_id = env.register(Harness, (admin.clone(), hash(&env, 0)));
    let client = HarnessClient::new(&env, &contract_id);

    client.set_admin(&Address::generate(&env));
}
