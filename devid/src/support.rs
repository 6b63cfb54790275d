// Licensed under the Apache-2.0 license.
use bitflags::bitflags;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
use zeroize::Zeroize;

/// Capabilities the certificate engine was built with. Resolved once at
/// construction; a missing capability produces a fixed error instead of a
/// divergent code path.
#[derive(Default, IntoBytes, FromBytes, KnownLayout, Immutable, Zeroize)]
#[repr(C)]
pub struct Support(u32);

bitflags! {
    impl Support: u32 {
        const ECDSA = 1u32 << 31;
    }
}

impl Support {
    pub fn ecdsa(&self) -> bool {
        self.contains(Support::ECDSA)
    }
}
