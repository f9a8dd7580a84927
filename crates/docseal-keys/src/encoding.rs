//! PEM encoding of Ed25519 key material.
//!
//! Private keys are PKCS#8 v1 (`PRIVATE KEY`), public keys are
//! SubjectPublicKeyInfo (`PUBLIC KEY`), both per RFC 8410.

use docseal_core::{KeyPair, PublicKey};

use crate::error::{KeyError, Result};

/// PEM tag for private keys.
pub const PRIVATE_KEY_TAG: &str = "PRIVATE KEY";

/// PEM tag for public keys.
pub const PUBLIC_KEY_TAG: &str = "PUBLIC KEY";

/// DER prefix of an Ed25519 PKCS#8 v1 private key, followed by the 32-byte seed.
const PRIVATE_DER_PREFIX: [u8; 16] = [
    0x30, 0x2e, // SEQUENCE, 46 bytes
    0x02, 0x01, 0x00, // INTEGER 0 (version)
    0x30, 0x05, // SEQUENCE, 5 bytes (algorithm identifier)
    0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112 (Ed25519)
    0x04, 0x22, // OCTET STRING, 34 bytes
    0x04, 0x20, // OCTET STRING, 32 bytes (the seed)
];

/// DER prefix of an Ed25519 SubjectPublicKeyInfo, followed by the 32-byte key.
const PUBLIC_DER_PREFIX: [u8; 12] = [
    0x30, 0x2a, // SEQUENCE, 42 bytes
    0x30, 0x05, // SEQUENCE, 5 bytes (algorithm identifier)
    0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112 (Ed25519)
    0x03, 0x21, // BIT STRING, 33 bytes
    0x00, // unused bits
];

/// Encode the private half of a key pair.
pub fn encode_private_key(keypair: &KeyPair) -> String {
    let mut der = Vec::with_capacity(PRIVATE_DER_PREFIX.len() + 32);
    der.extend_from_slice(&PRIVATE_DER_PREFIX);
    der.extend_from_slice(&keypair.seed());
    pem::encode(&pem::Pem::new(PRIVATE_KEY_TAG, der))
}

/// Encode a public key.
pub fn encode_public_key(public_key: &PublicKey) -> String {
    let mut der = Vec::with_capacity(PUBLIC_DER_PREFIX.len() + 32);
    der.extend_from_slice(&PUBLIC_DER_PREFIX);
    der.extend_from_slice(&public_key.to_bytes());
    pem::encode(&pem::Pem::new(PUBLIC_KEY_TAG, der))
}

/// Decode a PEM private key into a key pair.
pub fn decode_private_key(pem_str: &str) -> Result<KeyPair> {
    let seed = decode_body(pem_str, PRIVATE_KEY_TAG, &PRIVATE_DER_PREFIX)?;
    Ok(KeyPair::from_seed(&seed))
}

/// Decode a PEM public key.
pub fn decode_public_key(pem_str: &str) -> Result<PublicKey> {
    let bytes = decode_body(pem_str, PUBLIC_KEY_TAG, &PUBLIC_DER_PREFIX)?;
    PublicKey::from_bytes(&bytes).map_err(|e| KeyError::InvalidKeyMaterial(e.to_string()))
}

/// Decode a private key and, if given, a public key, and check they belong
/// together.
pub fn decode_key_pair(private_pem: &str, public_pem: Option<&str>) -> Result<KeyPair> {
    let keypair = decode_private_key(private_pem)?;
    if let Some(public_pem) = public_pem {
        let public_key = decode_public_key(public_pem)?;
        if public_key != keypair.public_key() {
            return Err(KeyError::InvalidKeyMaterial(
                "public key does not match private key".into(),
            ));
        }
    }
    Ok(keypair)
}

fn decode_body(pem_str: &str, tag: &str, prefix: &[u8]) -> Result<[u8; 32]> {
    let parsed =
        pem::parse(pem_str).map_err(|e| KeyError::InvalidKeyMaterial(format!("PEM: {}", e)))?;

    if parsed.tag() != tag {
        return Err(KeyError::InvalidKeyMaterial(format!(
            "expected PEM tag '{}', got '{}'",
            tag,
            parsed.tag()
        )));
    }

    let der = parsed.contents();
    if der.len() != prefix.len() + 32 {
        return Err(KeyError::InvalidKeyMaterial(format!(
            "invalid DER length: expected {}, got {}",
            prefix.len() + 32,
            der.len()
        )));
    }
    if &der[..prefix.len()] != prefix {
        return Err(KeyError::InvalidKeyMaterial(
            "DER structure is not an Ed25519 key".into(),
        ));
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&der[prefix.len()..]);
    Ok(out)
}
