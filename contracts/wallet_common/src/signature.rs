use soroban_sdk::{symbol_short, xdr::ToXdr, Address, BytesN, Env, IntoVal};

use crate::errors::WalletError;
use crate::types::{Call, Operation, Signature};

/// Digest a cosigner signs to approve `Account::send_multi_sig`.
pub fn operation_digest(
    env: &Env,
    account: &Address,
    operation: &Operation,
    expire_time: u64,
    sequence_id: u64,
) -> BytesN<32> {
    let payload = (
        symbol_short!("send"),
        account.clone(),
        operation.clone(),
        expire_time,
        sequence_id,
    )
        .to_xdr(env);
    env.crypto().sha256(&payload).to_bytes()
}

/// Digest every quorum member signs to approve a `multicall`.
pub fn call_digest(env: &Env, account: &Address, call: &Call) -> BytesN<32> {
    let payload = (
        symbol_short!("call"),
        account.clone(),
        call.target.clone(),
        call.func.clone(),
        call.args.clone(),
        call.sequence_id,
        call.expire_time,
    )
        .to_xdr(env);
    env.crypto().sha256(&payload).to_bytes()
}

/// Returns the address that signed `digest`.
///
/// The host checks the signer's credentials over exactly `[digest]`; a
/// signature produced for any other digest never reaches that check.
pub fn recover_signer(
    env: &Env,
    digest: &BytesN<32>,
    signature: &Signature,
) -> Result<Address, WalletError> {
    if signature.digest != *digest {
        return Err(WalletError::InvalidSignatureFormat);
    }
    signature
        .signer
        .require_auth_for_args((digest.clone(),).into_val(env));
    Ok(signature.signer.clone())
}
