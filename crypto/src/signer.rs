// Licensed under the Apache-2.0 license

use crate::{P384_PUBKEY_SIZE, P384_SCALAR_SIZE};

/// A P-384 scalar in the word order of the signing engine, least significant
/// byte first.
pub type P384Scalar = [u8; P384_SCALAR_SIZE];

/// An uncompressed P-384 public key, the X coordinate followed by the Y
/// coordinate, both in network order.
pub type P384PubKey = [u8; P384_PUBKEY_SIZE];

/// An ECDSA signature. `r` and `s` are in the word order of the signing
/// engine, least significant byte first.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct EcdsaSig {
    pub r: P384Scalar,
    pub s: P384Scalar,
}

impl EcdsaSig {
    pub fn new(r: &P384Scalar, s: &P384Scalar) -> EcdsaSig {
        EcdsaSig { r: *r, s: *s }
    }
}

/// Reverses the byte order of a P-384 scalar.
///
/// The signing engine consumes and produces scalars least significant byte
/// first while DER uses network order. Applying the swap twice returns the
/// original word.
pub fn swap_endianness(word: &P384Scalar) -> P384Scalar {
    let mut swapped = *word;
    swapped.reverse();
    swapped
}
