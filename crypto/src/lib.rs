/*++
Licensed under the Apache-2.0 license.
Abstract:
    Generic trait definition of cryptographic functions.
--*/
#![cfg_attr(not(any(feature = "rustcrypto", test)), no_std)]

#[cfg(feature = "rustcrypto")]
pub use crate::rustcrypto::*;
pub use signer::*;

#[cfg(feature = "rustcrypto")]
pub mod rustcrypto;

mod signer;

/// Size in bytes of a SHA-384 digest.
pub const SHA384_DIGEST_SIZE: usize = 48;

/// Size in bytes of a NIST P-384 scalar (private key, signature word).
pub const P384_SCALAR_SIZE: usize = 48;

/// Size in bytes of an uncompressed NIST P-384 public key, the X and Y
/// coordinates concatenated without a point-format prefix.
pub const P384_PUBKEY_SIZE: usize = 2 * P384_SCALAR_SIZE;

pub type Sha384Digest = [u8; SHA384_DIGEST_SIZE];

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum CryptoError {
    AbstractionLayer = 0x1,
    CryptoLibError(u32) = 0x2,
    Size = 0x3,
    SelfTestFailed = 0x4,
}

impl CryptoError {
    pub fn discriminant(&self) -> u16 {
        // SAFETY: Because `Self` is marked `repr(u16)`, its layout is a `repr(C)` `union`
        // between `repr(C)` structs, each of which has the `u16` discriminant as its first
        // field, so we can read the discriminant without offsetting the pointer.
        unsafe { *<*const _>::from(self).cast::<u16>() }
    }

    pub fn get_error_detail(&self) -> Option<u32> {
        match self {
            CryptoError::AbstractionLayer => None,
            CryptoError::CryptoLibError(code) => Some(*code),
            CryptoError::Size => None,
            CryptoError::SelfTestFailed => None,
        }
    }
}

pub trait Hasher: Sized {
    /// Adds a chunk to the running hash.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Value to add to hash.
    fn update(&mut self, bytes: &[u8]) -> Result<(), CryptoError>;

    /// Finish a running hash operation and return the result.
    ///
    /// Once this function has been called, the object can no longer be used and
    /// a new one must be created to hash more data.
    fn finish(self) -> Result<Sha384Digest, CryptoError>;
}

pub trait Crypto {
    type Hasher<'c>: Hasher
    where
        Self: 'c;

    /// Runs the SHA-384 known-answer test against the backing hash engine.
    ///
    /// Returns `CryptoError::SelfTestFailed` if the computed digest does not
    /// match the expected answer. Certificate generation must not proceed
    /// until this has passed once.
    fn sha384_self_test(&mut self) -> Result<(), CryptoError>;

    /// Initialize a running hash. Returns an object that will be able to complete the rest.
    ///
    /// Used for hashing multiple buffers that may not be in consecutive memory.
    fn hash_initialize(&mut self) -> Result<Self::Hasher<'_>, CryptoError>;

    /// Cryptographically hashes the given buffer with SHA-384.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Value to be hashed.
    fn sha384(&mut self, bytes: &[u8]) -> Result<Sha384Digest, CryptoError> {
        let mut hasher = self.hash_initialize()?;
        hasher.update(bytes)?;
        hasher.finish()
    }

    /// Signs `digest` with the P-384 private key `priv_key`.
    ///
    /// Both scalars are in the word order of the signing engine, least
    /// significant byte first, and the returned `r` and `s` words are in the
    /// same order. Callers that need network order must swap with
    /// [`swap_endianness`].
    ///
    /// # Arguments
    ///
    /// * `digest` - Digest to sign.
    /// * `priv_key` - Private key to sign with.
    fn ecdsa_sign(
        &mut self,
        digest: &P384Scalar,
        priv_key: &P384Scalar,
    ) -> Result<EcdsaSig, CryptoError>;
}
