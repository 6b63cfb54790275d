// Licensed under the Apache-2.0 license

//! Pre-encoded OID constants.
//!
//! Every OID is stored as its complete DER encoding, tag and length byte
//! included, and copied verbatim at encode time. OIDs are never computed.

/// ecdsa-with-SHA384, 1.2.840.10045.4.3.3
pub const ECDSA_WITH_SHA384: &[u8] = &[0x06, 0x08, 0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x03];

/// id-ecPublicKey, 1.2.840.10045.2.1
pub const EC_PUBLIC_KEY: &[u8] = &[0x06, 0x07, 0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];

/// secp384r1, 1.3.132.0.34
pub const SECP384R1: &[u8] = &[0x06, 0x05, 0x2B, 0x81, 0x04, 0x00, 0x22];

/// id-ce-subjectKeyIdentifier, 2.5.29.14
pub const SUBJECT_KEY_IDENTIFIER: &[u8] = &[0x06, 0x03, 0x55, 0x1D, 0x0E];

/// id-ce-authorityKeyIdentifier, 2.5.29.35
pub const AUTHORITY_KEY_IDENTIFIER: &[u8] = &[0x06, 0x03, 0x55, 0x1D, 0x23];

/// tcg-dice-TcbInfo, 2.23.133.5.4.1
pub const TCB_INFO: &[u8] = &[0x06, 0x06, 0x67, 0x81, 0x05, 0x05, 0x04, 0x01];

/// tcg-dice-Ueid, 2.23.133.5.4.4
pub const UEID: &[u8] = &[0x06, 0x06, 0x67, 0x81, 0x05, 0x05, 0x04, 0x04];

/// id-ce-keyUsage, 2.5.29.15
pub const KEY_USAGE: &[u8] = &[0x06, 0x03, 0x55, 0x1D, 0x0F];

/// id-ce-extKeyUsage, 2.5.29.37
pub const EXTENDED_KEY_USAGE: &[u8] = &[0x06, 0x03, 0x55, 0x1D, 0x25];

/// id-kp-clientAuth, 1.3.6.1.5.5.7.3.2
pub const CLIENT_AUTH: &[u8] = &[0x06, 0x08, 0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x02];

/// id-sha3-384, 2.16.840.1.101.3.4.2.9. Hash algorithm of the firmware
/// measurement carried in the TCB Info FWID.
pub const SHA3_384: &[u8] = &[
    0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x09,
];
