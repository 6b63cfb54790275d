// Licensed under the Apache-2.0 license

//! TBS certificate assembly.
//!
//! The fields are written in final order with one exception: the Serial
//! value is the truncated SHA-384 digest of every field after it, so its
//! slot is recorded up front and the finished field is spliced in after
//! the digest is known. The field width is fixed by construction, which
//! keeps the splice byte-exact.

use crate::{
    der::DerWriter,
    engine::{AppCfg, DevIdEnv, DevIdTypes},
    error::CertError,
    extensions, oid,
    store::UserCfg,
    SERIAL_FIELD_LEN, SERIAL_VALUE_LEN,
};
use crypto::{Crypto, P384PubKey};

const X509_V3: u8 = 2;

/// AlgorithmIdentifier for ecdsa-with-SHA384 with NULL parameters. Written
/// both inside the TBS certificate and in the outer envelope.
pub(crate) fn encode_signature_algorithm(w: &mut DerWriter) -> Result<usize, CertError> {
    let start = w.offset();

    let seq = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::ECDSA_WITH_SHA384)?;
    w.write_null()?;
    w.end_container(seq)?;

    Ok(w.offset() - start)
}

/// SubjectPublicKeyInfo: AlgorithmIdentifier{ecPublicKey, secp384r1} and
/// the raw 96-byte X||Y point as a BIT STRING.
fn encode_public_key_info(
    w: &mut DerWriter,
    subject_public_key: &P384PubKey,
) -> Result<usize, CertError> {
    let start = w.offset();

    let info = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    let alg_id = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::EC_PUBLIC_KEY)?;
    w.write_raw_oid(oid::SECP384R1)?;
    w.end_container(alg_id)?;
    w.write_bit_string(subject_public_key)?;
    w.end_container(info)?;

    Ok(w.offset() - start)
}

/// Assembles the TBSCertificate SEQUENCE and returns its total size.
///
/// Field order is fixed and none may be skipped: Version, Serial
/// (retrofitted), Signature Algorithm, Issuer, Validity, Subject,
/// SubjectPublicKeyInfo, Extensions. The Version is written as a bare
/// `INTEGER 2`, matching the established wire layout of this chain rather
/// than RFC 5280's `[0] EXPLICIT` wrapper.
pub(crate) fn encode_tbs_certificate(
    w: &mut DerWriter,
    env: &mut DevIdEnv<impl DevIdTypes>,
    user_cfg: &UserCfg,
    app_cfg: &AppCfg,
) -> Result<usize, CertError> {
    let start = w.offset();
    let seq = w.begin_container(DerWriter::SEQUENCE_TAG)?;

    w.write_integer(&[X509_V3])?;

    // Everything from here to the end of the extensions feeds the serial
    // digest, and the Serial field itself is spliced in at this offset.
    let serial_slot = w.offset();

    encode_signature_algorithm(w)?;
    w.write_raw_der(user_cfg.issuer())?;
    w.write_raw_der(user_cfg.validity())?;
    w.write_raw_der(user_cfg.subject())?;
    encode_public_key_info(w, app_cfg.subject_public_key)?;
    extensions::encode_extensions(w, env, app_cfg)?;

    let digest = env.crypto.sha384(&w.bytes()[serial_slot..])?;

    // The serial INTEGER always carries exactly 20 value bytes: the first
    // 20 digest bytes, or a 0x00 pad plus the first 19 when the leading
    // digest bit would make the INTEGER read as negative.
    let retained = if (digest[0] & 0x80) != 0 {
        SERIAL_VALUE_LEN - 1
    } else {
        SERIAL_VALUE_LEN
    };
    let mut serial = [0u8; SERIAL_FIELD_LEN];
    let mut serial_writer = DerWriter::new(&mut serial);
    let serial_len = serial_writer.write_integer(&digest[..retained])?;
    w.insert_bytes(serial_slot, &serial[..serial_len])?;

    w.end_container(seq)?;

    Ok(w.offset() - start)
}
