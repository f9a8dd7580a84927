//! Proptest generators for property-based testing.

use proptest::prelude::*;

use docseal_core::{
    ContentHasher, Digest, Ed25519Signer, KeyPair, PublicKey, Sha256Hasher, SignatureRecord,
    SignatureService, SIGNATURE_LEN,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = KeyPair> {
    any::<[u8; 32]>().prop_map(|seed| KeyPair::from_seed(&seed))
}

/// Generate a random public key.
pub fn public_key() -> impl Strategy<Value = PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a random digest.
pub fn digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>().prop_map(Digest::from_bytes)
}

/// Generate document content of at most `max_len` bytes.
pub fn content(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len)
}

/// Generate content carrying a PDF header, so it passes the default policy.
pub fn pdf_content(max_body: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_body).prop_map(|body| {
        let mut content = b"%PDF-1.7\n".to_vec();
        content.extend_from_slice(&body);
        content
    })
}

/// Generate a bit index into a signature.
pub fn signature_bit() -> impl Strategy<Value = usize> {
    0..SIGNATURE_LEN * 8
}

/// Parameters for producing a signature record.
#[derive(Debug, Clone)]
pub struct SignedParams {
    pub keypair: KeyPair,
    pub content: Vec<u8>,
}

impl SignedParams {
    pub fn digest(&self) -> Digest {
        Sha256Hasher.digest(&self.content)
    }

    /// Sign the content's digest with the production signer.
    pub fn sign(&self) -> SignatureRecord {
        Ed25519Signer
            .sign(&self.digest(), &self.keypair)
            .expect("ed25519 signing is infallible")
    }
}

impl Arbitrary for SignedParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<[u8; 32]>(), content(1000))
            .prop_map(|(seed, content)| SignedParams {
                keypair: KeyPair::from_seed(&seed),
                content,
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    proptest! {
        #[test]
        fn test_signature_deterministic(params: SignedParams) {
            let r1 = params.sign();
            let r2 = params.sign();

            prop_assert_eq!(r1.signature, r2.signature);
            prop_assert!(r1.digest.ct_eq(&r2.digest));
        }

        #[test]
        fn test_signature_verifies(params: SignedParams) {
            let record = params.sign();
            let valid = Ed25519Signer
                .verify(&params.digest(), &record, &params.keypair.public_key())
                .unwrap();
            prop_assert!(valid);
        }

        #[test]
        fn test_flipped_bit_rejected(params: SignedParams, bit in signature_bit()) {
            let mut record = params.sign();
            record.signature[bit / 8] ^= 1 << (bit % 8);

            let valid = Ed25519Signer
                .verify(&params.digest(), &record, &params.keypair.public_key())
                .unwrap();
            prop_assert!(!valid);
        }

        #[test]
        fn test_other_key_rejected(params: SignedParams, other in public_key()) {
            prop_assume!(other != params.keypair.public_key());

            let record = params.sign();
            let valid = Ed25519Signer
                .verify(&params.digest(), &record, &other)
                .unwrap();
            prop_assert!(!valid);
        }

        #[test]
        fn test_other_digest_rejected(params: SignedParams, other in digest()) {
            prop_assume!(!other.ct_eq(&params.digest()));

            let record = params.sign();
            let valid = Ed25519Signer
                .verify(&other, &record, &params.keypair.public_key())
                .unwrap();
            prop_assert!(!valid);
        }

        #[test]
        fn test_streamed_digest_matches(content in content(100_000)) {
            let streamed = Sha256Hasher
                .digest_reader(&mut Cursor::new(content.clone()))
                .unwrap();
            prop_assert!(streamed.ct_eq(&Sha256Hasher.digest(&content)));
        }

        #[test]
        fn test_record_encoding_preserves_signature(params: SignedParams) {
            let record = params.sign();
            let decoded = SignatureRecord::decode(&record.encode().unwrap()).unwrap();

            prop_assert_eq!(&decoded.signature, &record.signature);
            prop_assert!(decoded.matches_tagged(&record.tagged_signature()));
        }
    }
}
