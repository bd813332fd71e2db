//! EIP-191 `personal_sign` signature recovery.

use secp256k1::{
    Message, Secp256k1,
    ecdsa::{RecoverableSignature, RecoveryId},
};
use tiny_keccak::{Hasher, Keccak};

use super::error::ValidationError;
use super::types::WalletAddress;

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Digest signed by `personal_sign`:
/// keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)
#[must_use]
pub fn personal_sign_digest(message: &str) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    keccak256(&[prefix.as_bytes(), message.as_bytes()].concat())
}

/// Address derived from an uncompressed secp256k1 public key
pub fn address_from_public_key(public_key: &secp256k1::PublicKey) -> WalletAddress {
    let uncompressed = public_key.serialize_uncompressed();
    let hashed = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hashed[12..]);
    WalletAddress::from_bytes(bytes)
}

/// Recover the address that produced `signature` over `message`.
///
/// `signature` is hex (optional `0x`) of 65 bytes `r || s || v`, with `v`
/// either 0/1 or the legacy 27/28.
pub fn recover_personal_sign_address(
    message: &str,
    signature: &str,
) -> Result<WalletAddress, ValidationError> {
    let invalid = |message: &str| ValidationError::InvalidField {
        field: "signature".to_string(),
        message: message.to_string(),
    };

    let sig_hex = signature.strip_prefix("0x").unwrap_or(signature);
    let sig_bytes = hex::decode(sig_hex).map_err(|_| invalid("Signature is not valid hex"))?;
    if sig_bytes.len() != 65 {
        return Err(invalid("Signature must be 65 bytes"));
    }

    let recovery_byte = match sig_bytes[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        _ => return Err(invalid("Invalid recovery id")),
    };
    let recovery_id =
        RecoveryId::try_from(i32::from(recovery_byte)).map_err(|_| invalid("Invalid recovery id"))?;
    let recoverable = RecoverableSignature::from_compact(&sig_bytes[..64], recovery_id)
        .map_err(|_| invalid("Malformed signature"))?;

    let digest = Message::from_digest(personal_sign_digest(message));
    let public_key = Secp256k1::new()
        .recover_ecdsa(&digest, &recoverable)
        .map_err(|_| invalid("Signature does not recover to a public key"))?;

    Ok(address_from_public_key(&public_key))
}
