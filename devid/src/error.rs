// Licensed under the Apache-2.0 license

use crypto::CryptoError;
use platform::PlatformError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum CertError {
    /// The certificate scratch buffer is exhausted.
    BufferFull = 0x1,
    /// A length back-patch exceeded the representable range.
    LengthTooLong = 0x2,
    /// A store input is oversized or otherwise invalid.
    InvalidArgument = 0x3,
    /// No store entry exists for the requested subsystem.
    NotFound = 0x4,
    /// A user-configured field is unset or all-zero.
    InvalidUserCfg = 0x5,
    /// The store already holds entries for the maximum number of subsystems.
    StoreLimitExceeded = 0x6,
    /// The engine was built without ECDSA support.
    EcdsaNotEnabled = 0x7,
    Crypto(CryptoError) = 0x8,
    Platform(PlatformError) = 0x9,
}

impl CertError {
    pub fn discriminant(&self) -> u16 {
        // SAFETY: Because `Self` is marked `repr(u16)`, its layout is a `repr(C)` `union`
        // between `repr(C)` structs, each of which has the `u16` discriminant as its first
        // field, so we can read the discriminant without offsetting the pointer.
        unsafe { *<*const _>::from(self).cast::<u16>() }
    }

    pub fn get_error_detail(&self) -> Option<u16> {
        match self {
            CertError::BufferFull
            | CertError::LengthTooLong
            | CertError::InvalidArgument
            | CertError::NotFound
            | CertError::InvalidUserCfg
            | CertError::StoreLimitExceeded
            | CertError::EcdsaNotEnabled => None,
            CertError::Crypto(e) => Some(e.discriminant()),
            CertError::Platform(e) => Some(e.discriminant()),
        }
    }
}

impl From<CryptoError> for CertError {
    fn from(e: CryptoError) -> Self {
        CertError::Crypto(e)
    }
}

impl From<PlatformError> for CertError {
    fn from(e: PlatformError) -> Self {
        CertError::Platform(e)
    }
}
