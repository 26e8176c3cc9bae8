//! Generates the ES256-signed client secret that Sign in with Apple expects
//! from a backend at its token endpoint.
//!
//! The pipeline is three steps: [`key::load_key`] decodes the `.p8` private
//! key, [`claims::assemble_claims`] builds the header and payload values, and
//! [`signer::sign`] produces the compact token. [`generate_client_secret`]
//! runs all three for one [`ClientSecretRequest`].

pub mod claims;
pub mod cli;
pub mod client_secret;
pub mod config;
pub mod error;
pub mod key;
pub mod signer;

pub use claims::{assemble_claims, TokenClaims, TokenIdSource, UuidV4, Validity, APPLE_AUDIENCE};
pub use client_secret::{generate_client_secret, ClientSecret, ClientSecretRequest};
pub use error::{Result, TokenError};
pub use key::{load_key, KeyMaterial};
pub use signer::{sign, SignedToken};
