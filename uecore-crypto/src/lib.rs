//! Cryptographic algorithms for uecore
//!
//! Implements the UE-side 5G authentication primitives:
//! - Milenage (3GPP TS 35.206) including the resynchronisation functions
//! - Key derivation for the 5G key hierarchy (TS 33.501 Annex A)
//! - EAP-AKA' key expansion and packet MAC (TS 33.402, RFC 5448)

pub mod aes;
pub mod kdf;
pub mod milenage;
