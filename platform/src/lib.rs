/*++
Licensed under the Apache-2.0 license.
Abstract:
    Generic trait definition of platform.
--*/
#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(any(feature = "std", test))]
pub mod default;
pub mod printer;

/// Size in bytes of the device DNA, the per-part unique identifier burned
/// into eFUSEs.
pub const DNA_SIZE: usize = 16;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[repr(u16)]
pub enum PlatformError {
    NotImplemented = 0x1,
    DeviceDnaError(u32) = 0x2,
    CertWriteError(u32) = 0x3,
    PrintError(u32) = 0x4,
}

impl PlatformError {
    pub fn discriminant(&self) -> u16 {
        // SAFETY: Because `Self` is marked `repr(u16)`, its layout is a `repr(C)` `union`
        // between `repr(C)` structs, each of which has the `u16` discriminant as its first
        // field, so we can read the discriminant without offsetting the pointer.
        unsafe { *<*const _>::from(self).cast::<u16>() }
    }

    pub fn get_error_detail(&self) -> Option<u32> {
        match self {
            PlatformError::NotImplemented => None,
            PlatformError::DeviceDnaError(code) => Some(*code),
            PlatformError::CertWriteError(code) => Some(*code),
            PlatformError::PrintError(code) => Some(*code),
        }
    }
}

pub trait Platform {
    /// Retrieves the device DNA.
    ///
    /// The DNA is placed in the UEID extension of self-signed device
    /// identity certificates.
    fn read_device_dna(&mut self) -> Result<[u8; DNA_SIZE], PlatformError>;

    /// Hands a finished certificate to the platform.
    ///
    /// # Arguments
    ///
    /// * `addr` - Destination address requested by the caller of the
    ///   certificate engine.
    /// * `cert` - The complete DER encoded certificate.
    fn write_certificate(&mut self, addr: u64, cert: &[u8]) -> Result<(), PlatformError>;

    fn write_str(&mut self, str: &str) -> Result<(), PlatformError>;
}
