// Licensed under the Apache-2.0 license

use crate::{Platform, PlatformError, DNA_SIZE};
use arrayvec::ArrayVec;

pub const NOT_BEFORE: &str = "20230227000000Z";
pub const NOT_AFTER: &str = "99991231235959Z";

/// Device DNA reported when no hardware is attached.
pub const DEFAULT_DEVICE_DNA: [u8; DNA_SIZE] = [
    0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xED, 0xFA,
    0xCE,
];

const MAX_CERT_CAPTURE_SIZE: usize = 1024;

/// Host-side platform used by tests and tools. There is no certificate
/// destination memory, so finished certificates are captured in place of
/// being written out.
#[derive(Default)]
pub struct DefaultPlatform {
    pub cert: ArrayVec<u8, MAX_CERT_CAPTURE_SIZE>,
    pub cert_addr: Option<u64>,
}

impl Platform for DefaultPlatform {
    fn read_device_dna(&mut self) -> Result<[u8; DNA_SIZE], PlatformError> {
        Ok(DEFAULT_DEVICE_DNA)
    }

    fn write_certificate(&mut self, addr: u64, cert: &[u8]) -> Result<(), PlatformError> {
        self.cert.clear();
        self.cert
            .try_extend_from_slice(cert)
            .map_err(|_| PlatformError::CertWriteError(0))?;
        self.cert_addr = Some(addr);
        Ok(())
    }

    fn write_str(&mut self, str: &str) -> Result<(), PlatformError> {
        print!("{str}");
        Ok(())
    }
}
