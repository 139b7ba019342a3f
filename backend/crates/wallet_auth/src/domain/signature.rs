//! Signature Verifier
//!
//! EIP-191 `personal_sign` verification by secp256k1 public-key recovery.
//! The signer's address is always recovered server-side from the message
//! and signature; nothing the client claims about the signer is trusted
//! except the address being compared against.

use crate::domain::value_objects::WalletAddress;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use platform::crypto::{constant_time_eq, from_hex, keccak256};

/// `r || s || v`
pub const SIGNATURE_LEN: usize = 65;

/// Verification outcome other than success
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// Structural failure, detected before any recovery is attempted
    #[error("malformed signature: {0}")]
    Malformed(&'static str),
    #[error("signature does not match the claimed address")]
    Mismatch,
}

/// EIP-191 digest: `keccak256("\x19Ethereum Signed Message:\n" || len || message)`
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let mut data = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Address of a public key: last 20 bytes of keccak256 over the
/// uncompressed point without its `0x04` tag
pub fn address_from_key(key: &VerifyingKey) -> WalletAddress {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash[12..]);
    WalletAddress::from_bytes(bytes)
}

/// Decode a hex `r || s || v` signature
///
/// `v` is accepted as 27/28 or 0/1. High-`s` signatures are normalized to
/// low-`s`, flipping the recovery id's parity to keep the same signer.
pub fn decode_signature(signature_hex: &str) -> Result<(Signature, RecoveryId), SignatureError> {
    let bytes = from_hex(signature_hex.trim()).map_err(|_| SignatureError::Malformed("not hex"))?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(SignatureError::Malformed("expected 65 bytes"));
    }

    let v = match bytes[64] {
        27 | 28 => bytes[64] - 27,
        0 | 1 => bytes[64],
        _ => return Err(SignatureError::Malformed("invalid recovery id")),
    };
    let recovery_id =
        RecoveryId::from_byte(v).ok_or(SignatureError::Malformed("invalid recovery id"))?;
    let signature = Signature::from_slice(&bytes[..64])
        .map_err(|_| SignatureError::Malformed("r or s out of range"))?;

    Ok(match signature.normalize_s() {
        Some(low_s) => (
            low_s,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    })
}

/// Recover the address that signed `message`
pub fn recover_address(message: &str, signature_hex: &str) -> Result<WalletAddress, SignatureError> {
    let (signature, recovery_id) = decode_signature(signature_hex)?;
    let digest = eip191_hash(message.as_bytes());
    let key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
        .map_err(|_| SignatureError::Mismatch)?;
    Ok(address_from_key(&key))
}

/// Check that `claimed` signed exactly `message`
pub fn verify_signature(
    message: &str,
    signature_hex: &str,
    claimed: &WalletAddress,
) -> Result<(), SignatureError> {
    let recovered = recover_address(message, signature_hex)?;
    if constant_time_eq(recovered.as_bytes(), claimed.as_bytes()) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use platform::crypto::to_hex;

    /// secp256k1 group order
    const CURVE_ORDER: [u8; 32] = [
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36,
        0x41, 0x41,
    ];

    fn sub_be(a: &[u8; 32], b: &[u8]) -> [u8; 32] {
        let mut out = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut d = a[i] as i16 - b[i] as i16 - borrow;
            borrow = if d < 0 {
                d += 256;
                1
            } else {
                0
            };
            out[i] = d as u8;
        }
        out
    }

    #[test]
    fn test_known_key_address() {
        assert_eq!(key_address(&test_key()).to_checksum(), TEST_ADDRESS);
    }

    #[test]
    fn test_eip191_prefix() {
        let digest = eip191_hash(b"hello");
        let mut expected = b"\x19Ethereum Signed Message:\n5".to_vec();
        expected.extend_from_slice(b"hello");
        assert_eq!(digest, keccak256(&expected));
    }

    #[test]
    fn test_verify_roundtrip() {
        let key = test_key();
        let signature = personal_sign(&key, "Sign in please");
        let address = WalletAddress::parse(TEST_ADDRESS).unwrap();

        assert_eq!(recover_address("Sign in please", &signature), Ok(address));
        assert_eq!(
            verify_signature("Sign in please", &signature, &address),
            Ok(())
        );
    }

    #[test]
    fn test_verify_rejects_other_message_or_signer() {
        let key = test_key();
        let signature = personal_sign(&key, "Sign in please");
        let address = key_address(&key);

        assert_eq!(
            verify_signature("Sign in please!", &signature, &address),
            Err(SignatureError::Mismatch)
        );

        let other = key_address(&signing_key(
            "0101010101010101010101010101010101010101010101010101010101010101",
        ));
        assert_eq!(
            verify_signature("Sign in please", &signature, &other),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_accepts_zero_one_recovery_ids() {
        let key = test_key();
        let signature = personal_sign(&key, "msg");
        let mut bytes = from_hex(&signature).unwrap();
        bytes[64] -= 27;
        let raw = to_hex(&bytes);

        assert_eq!(recover_address("msg", &raw), Ok(key_address(&key)));
    }

    #[test]
    fn test_high_s_is_normalized() {
        let key = test_key();
        let signature = personal_sign(&key, "msg");
        let mut bytes = from_hex(&signature).unwrap();

        // (r, n - s) with flipped parity is the same signature in high-s form
        let high_s = sub_be(&CURVE_ORDER, &bytes[32..64]);
        bytes[32..64].copy_from_slice(&high_s);
        bytes[64] = if bytes[64] == 27 { 28 } else { 27 };

        assert_eq!(
            recover_address("msg", &to_hex(&bytes)),
            Ok(key_address(&key))
        );
    }

    #[test]
    fn test_structural_rejections() {
        let key = test_key();
        let signature = personal_sign(&key, "msg");
        let bytes = from_hex(&signature).unwrap();

        assert_eq!(
            recover_address("msg", "0xnothex"),
            Err(SignatureError::Malformed("not hex"))
        );
        assert_eq!(
            recover_address("msg", &to_hex(&bytes[..64])),
            Err(SignatureError::Malformed("expected 65 bytes"))
        );

        let mut bad_v = bytes.clone();
        bad_v[64] = 29;
        assert_eq!(
            recover_address("msg", &to_hex(&bad_v)),
            Err(SignatureError::Malformed("invalid recovery id"))
        );

        let mut zero_r = bytes;
        zero_r[..32].fill(0);
        assert_eq!(
            recover_address("msg", &to_hex(&zero_r)),
            Err(SignatureError::Malformed("r or s out of range"))
        );
    }
}
