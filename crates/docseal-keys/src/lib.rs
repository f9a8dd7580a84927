//! # Docseal Keys
//!
//! Loads, generates and rotates the single Ed25519 key pair the engine signs
//! and verifies with.
//!
//! ## Overview
//!
//! - [`KeySource`] abstracts where PEM material lives: a directory
//!   ([`FileKeySource`]), environment variables ([`EnvKeySource`]) or memory
//!   ([`StaticKeySource`]).
//! - [`KeyMaterialProvider`] owns the current key pair as an `Arc` snapshot.
//!   Rotation swaps the whole `Arc`, so a caller holding a snapshot keeps a
//!   complete key pair for the duration of its operation.
//!
//! ## Key strength
//!
//! Strength is requested in RSA-equivalent bits. Ed25519 is roughly
//! RSA-3072 equivalent, so requests in `2048..=3072` are served and anything
//! outside that range is rejected rather than silently adjusted.

pub mod encoding;
pub mod error;
pub mod provider;
pub mod source;

pub use encoding::{decode_key_pair, encode_private_key, encode_public_key};
pub use error::{KeyError, Result};
pub use provider::{
    check_key_strength, generate, KeyMaterialProvider, MAX_KEY_SIZE_BITS, MIN_KEY_SIZE_BITS,
};
pub use source::{EnvKeySource, FileKeySource, KeySource, StaticKeySource};
