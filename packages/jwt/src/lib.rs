//! ES256 compact tokens with lossless DER <-> raw signature conversion
//!
//! This crate provides:
//! - [`der`]: conversion between ASN.1 DER ECDSA signatures and the
//!   fixed-width `R ‖ S` form used by JWS
//! - [`token::sign`]: assembly of `header.payload.signature` tokens over any
//!   [`DerSigner`]
//! - [`Es256Signer`]: a P-256 signer loading PKCS#8 `.p8` keys
//! - [`Token::es256`]: a fluent builder with `kid`/`typ` handling and async signing
//! - [`verify`]: decoding and ES256 verification of compact tokens

pub mod builder;
pub mod claims;
pub mod der;
pub mod encoding;
mod error;
pub mod keys;
pub mod signer;
pub mod token;
mod types;
pub mod verify;

pub use error::*;
pub use signer::{DerSigner, Es256Signer};
pub use token::sign;
pub use types::*;
