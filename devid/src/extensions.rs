// Licensed under the Apache-2.0 license

//! X.509 v3 extension builders.
//!
//! One builder per extension, each a pure function of its inputs writing
//! one `Extension ::= SEQUENCE { extnID, critical OPTIONAL, extnValue }`
//! into the certificate buffer. The key-identifier builders digest the
//! public keys through the injected crypto; the UEID builder reads the
//! device DNA through the injected platform.

use crate::{
    der::DerWriter,
    engine::{AppCfg, DevIdEnv, DevIdTypes},
    error::CertError,
    oid, KEY_ID_LEN,
};
use crypto::{Crypto, P384PubKey, Sha384Digest};
use platform::Platform;

/// KeyUsage bit assignments per X.509: bit 0 is digitalSignature through
/// bit 8, decipherOnly.
#[derive(Clone, Copy)]
enum KeyUsageOption {
    DigitalSignature = 0,
    KeyAgreement = 4,
    KeyCertSign = 5,
}

const KEY_USAGE_VAL_SIZE: usize = 2;

/// Sets `option`'s bit in the packed KeyUsage value: bit *n* lands in byte
/// `n / 8`, most significant bit first.
fn set_key_usage_bit(value: &mut [u8; KEY_USAGE_VAL_SIZE], option: KeyUsageOption) {
    let bit = option as usize;
    value[bit / 8] |= 1 << (7 - (bit % 8));
}

/// Subject Key Identifier: the first 20 bytes of SHA-384 over the raw
/// subject public key.
fn encode_subject_key_identifier(
    w: &mut DerWriter,
    crypto: &mut impl Crypto,
    subject_public_key: &P384PubKey,
) -> Result<usize, CertError> {
    let start = w.offset();
    let digest = crypto.sha384(subject_public_key)?;

    let extension = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::SUBJECT_KEY_IDENTIFIER)?;
    let value = w.begin_container(DerWriter::OCTET_STRING_TAG)?;
    w.write_octet_string(&digest[..KEY_ID_LEN])?;
    w.end_container(value)?;
    w.end_container(extension)?;

    Ok(w.offset() - start)
}

/// Authority Key Identifier: the first 20 bytes of SHA-384 over the raw
/// issuer public key, carried as the `[0]` keyIdentifier choice.
fn encode_authority_key_identifier(
    w: &mut DerWriter,
    crypto: &mut impl Crypto,
    issuer_public_key: &P384PubKey,
) -> Result<usize, CertError> {
    let start = w.offset();
    let digest = crypto.sha384(issuer_public_key)?;

    let extension = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::AUTHORITY_KEY_IDENTIFIER)?;
    let value = w.begin_container(DerWriter::OCTET_STRING_TAG)?;
    let key_id_seq = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_tlv(DerWriter::CONTEXT_0_TAG, &digest[..KEY_ID_LEN])?;
    w.end_container(key_id_seq)?;
    w.end_container(value)?;
    w.end_container(extension)?;

    Ok(w.offset() - start)
}

/// tcg-dice-TcbInfo carrying a one-element FWID list with the SHA3-384
/// firmware measurement. The other DiceTcbInfo members are intentionally
/// omitted.
fn encode_tcb_info(w: &mut DerWriter, fw_hash: &Sha384Digest) -> Result<usize, CertError> {
    let start = w.offset();

    let extension = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::TCB_INFO)?;
    let value = w.begin_container(DerWriter::OCTET_STRING_TAG)?;
    let tcb_info = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    let fwid_list = w.begin_container(DerWriter::CONTEXT_6_CONSTRUCTED_TAG)?;
    let fwid = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::SHA3_384)?;
    w.write_octet_string(fw_hash)?;
    w.end_container(fwid)?;
    w.end_container(fwid_list)?;
    w.end_container(tcb_info)?;
    w.end_container(value)?;
    w.end_container(extension)?;

    Ok(w.offset() - start)
}

/// tcg-dice-Ueid carrying the device DNA. Self-signed DevIK certificates
/// only; the DNA contributed to the CDI that produced the subject key.
fn encode_ueid(w: &mut DerWriter, platform: &mut impl Platform) -> Result<usize, CertError> {
    let start = w.offset();
    let dna = platform.read_device_dna()?;

    let extension = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::UEID)?;
    let value = w.begin_container(DerWriter::OCTET_STRING_TAG)?;
    let ueid_seq = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_octet_string(&dna)?;
    w.end_container(ueid_seq)?;
    w.end_container(value)?;
    w.end_container(extension)?;

    Ok(w.offset() - start)
}

/// Key Usage, critical. keyCertSign for self-signed certificates,
/// digitalSignature and keyAgreement otherwise. The packed value is
/// trimmed to one byte when the second byte carries no bits.
fn encode_key_usage(w: &mut DerWriter, is_self_signed: bool) -> Result<usize, CertError> {
    let start = w.offset();

    let extension = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::KEY_USAGE)?;
    w.write_boolean(true)?;
    let value = w.begin_container(DerWriter::OCTET_STRING_TAG)?;

    let mut key_usage = [0u8; KEY_USAGE_VAL_SIZE];
    if is_self_signed {
        set_key_usage_bit(&mut key_usage, KeyUsageOption::KeyCertSign);
    } else {
        set_key_usage_bit(&mut key_usage, KeyUsageOption::DigitalSignature);
        set_key_usage_bit(&mut key_usage, KeyUsageOption::KeyAgreement);
    }
    let value_len = if key_usage[1] == 0 {
        KEY_USAGE_VAL_SIZE - 1
    } else {
        KEY_USAGE_VAL_SIZE
    };
    w.write_bit_string(&key_usage[..value_len])?;

    w.end_container(value)?;
    w.end_container(extension)?;

    Ok(w.offset() - start)
}

/// Extended Key Usage, critical, a single clientAuth purpose. Self-signed
/// certificates only.
fn encode_extended_key_usage(w: &mut DerWriter) -> Result<usize, CertError> {
    let start = w.offset();

    let extension = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::EXTENDED_KEY_USAGE)?;
    w.write_boolean(true)?;
    let value = w.begin_container(DerWriter::OCTET_STRING_TAG)?;
    let purposes = w.begin_container(DerWriter::SEQUENCE_TAG)?;
    w.write_raw_oid(oid::CLIENT_AUTH)?;
    w.end_container(purposes)?;
    w.end_container(value)?;
    w.end_container(extension)?;

    Ok(w.offset() - start)
}

/// The `[3] EXPLICIT SEQUENCE OF Extension` TBS field, in fixed order:
/// subject key id, authority key id, TCB info, UEID (self-signed only),
/// key usage, extended key usage (self-signed only).
pub(crate) fn encode_extensions(
    w: &mut DerWriter,
    env: &mut DevIdEnv<impl DevIdTypes>,
    app_cfg: &AppCfg,
) -> Result<usize, CertError> {
    let start = w.offset();

    let wrapper = w.begin_container(DerWriter::CONTEXT_3_CONSTRUCTED_TAG)?;
    let list = w.begin_container(DerWriter::SEQUENCE_TAG)?;

    encode_subject_key_identifier(w, &mut env.crypto, app_cfg.subject_public_key)?;
    encode_authority_key_identifier(w, &mut env.crypto, app_cfg.issuer_public_key)?;
    encode_tcb_info(w, app_cfg.fw_hash)?;
    if app_cfg.is_self_signed {
        encode_ueid(w, &mut env.platform)?;
    }
    encode_key_usage(w, app_cfg.is_self_signed)?;
    if app_cfg.is_self_signed {
        encode_extended_key_usage(w)?;
    }

    w.end_container(list)?;
    w.end_container(wrapper)?;

    Ok(w.offset() - start)
}
