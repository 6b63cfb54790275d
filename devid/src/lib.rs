/*++
Licensed under the Apache-2.0 license.

Abstract:
    Device identity certificate library. Generates DevIK and DevAK X.509
    certificates for a DICE attestation chain through hand-assembled DER.
--*/
#![cfg_attr(not(test), no_std)]

pub use engine::{AppCfg, CertEngine, DevIdEnv, DevIdTypes};
pub use error::CertError;
pub use store::{CertStore, SignStore, UserCfg, UserCfgField};
pub use support::Support;

pub mod engine;
pub mod error;
pub mod store;
pub mod support;

mod der;
mod extensions;
mod oid;
mod tbs;

/// Scratch size for one in-progress certificate.
pub const MAX_CERT_SIZE: usize = 1024;

/// Number of supported certificates: 1 DevIK and 3 DevAK.
pub const MAX_CERT_SUPPORT: usize = 4;

/// Maximum size of the DER-encoded Issuer Name supplied by the user.
pub const MAX_ISSUER_SIZE: usize = 128;

/// Maximum size of the DER-encoded Subject Name supplied by the user.
pub const MAX_SUBJECT_SIZE: usize = 128;

/// Maximum size of the DER-encoded Validity supplied by the user. Large
/// enough for a GeneralizedTime notBefore/notAfter pair.
pub const MAX_VALIDITY_SIZE: usize = 40;

/// Size in bytes of the Subject and Authority key identifiers.
pub const KEY_ID_LEN: usize = 20;

/// Total size of the Serial field: tag, one length byte and 20 value bytes.
pub const SERIAL_FIELD_LEN: usize = 22;

/// The one `SignStore::sign_available` value that marks a stored signature
/// as valid.
pub const SIGN_AVAILABLE: u8 = 0x3;

pub(crate) const SERIAL_VALUE_LEN: usize = 20;
