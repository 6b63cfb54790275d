// Licensed under the Apache-2.0 license

//! Top-level certificate generation engine.
//!
//! The engine owns the per-subsystem store and drives one certificate at a
//! time through a stack scratch buffer: TBS assembly, digest, cached or
//! fresh ECDSA signature, then hand-off to the platform. Crypto and
//! platform backends are injected per call through [`DevIdEnv`].

use crate::{
    der::DerWriter,
    error::CertError,
    store::CertStore,
    support::Support,
    tbs, UserCfgField, MAX_CERT_SIZE, SIGN_AVAILABLE,
};
use constant_time_eq::constant_time_eq;
use crypto::{swap_endianness, Crypto, P384PubKey, P384Scalar, Sha384Digest, P384_SCALAR_SIZE};
use platform::Platform;

pub trait DevIdTypes {
    type Crypto<'a>: Crypto
    where
        Self: 'a;
    type Platform<'a>: Platform
    where
        Self: 'a;
}

/// Crypto and platform backends for one engine call.
pub struct DevIdEnv<'a, T: DevIdTypes + 'a> {
    pub crypto: T::Crypto<'a>,
    pub platform: T::Platform<'a>,
}

/// Per-call certificate inputs supplied by the application: the key
/// material, the firmware measurement and the chain position. The private
/// key is in the word order of the signing engine and is never copied or
/// reordered here.
pub struct AppCfg<'a> {
    pub subject_public_key: &'a P384PubKey,
    pub issuer_public_key: &'a P384PubKey,
    pub issuer_private_key: &'a P384Scalar,
    pub fw_hash: &'a Sha384Digest,
    pub is_self_signed: bool,
}

pub struct CertEngine {
    store: CertStore,
    support: Support,
    sha384_kat_done: bool,
}

impl CertEngine {
    pub const fn new(support: Support) -> CertEngine {
        CertEngine {
            store: CertStore::new(),
            support,
            sha384_kat_done: false,
        }
    }

    /// Stores one user-supplied certificate field for `subsystem_id`.
    pub fn store_user_input(
        &mut self,
        subsystem_id: u32,
        field: UserCfgField,
        value: &[u8],
    ) -> Result<(), CertError> {
        self.store.store_user_input(subsystem_id, field, value)
    }

    /// Generates the X.509 certificate for `subsystem_id` and hands it to
    /// the platform at `cert_addr`. Returns the certificate size in bytes.
    ///
    /// The SHA-384 known-answer test runs before the first certificate of
    /// this engine's lifetime; a failure leaves the engine unable to
    /// generate until it is rebuilt. The TBS signature is reused from the
    /// store when the signing record is valid and the stored digest matches
    /// the freshly computed one, so a repeated call with unchanged inputs
    /// never re-signs.
    pub fn generate_cert(
        &mut self,
        env: &mut DevIdEnv<impl DevIdTypes>,
        subsystem_id: u32,
        app_cfg: &AppCfg,
        cert_addr: u64,
    ) -> Result<usize, CertError> {
        if !self.support.ecdsa() {
            return Err(CertError::EcdsaNotEnabled);
        }
        if !self.sha384_kat_done {
            env.crypto.sha384_self_test()?;
            self.sha384_kat_done = true;
        }

        let mut buf = [0u8; MAX_CERT_SIZE];
        let mut w = DerWriter::new(&mut buf);

        let cert = w.begin_container(DerWriter::SEQUENCE_TAG)?;
        let tbs_start = w.offset();
        let user_cfg = self.store.user_cfg(subsystem_id)?;
        let tbs_len = tbs::encode_tbs_certificate(&mut w, env, user_cfg, app_cfg)?;
        tbs::encode_signature_algorithm(&mut w)?;

        let digest = env
            .crypto
            .sha384(&w.bytes()[tbs_start..tbs_start + tbs_len])?;

        let sign_store = self.store.sign_store_mut(subsystem_id)?;
        let reuse = sign_store.sign_available == SIGN_AVAILABLE
            && constant_time_eq(&sign_store.hash, &digest);
        if !reuse {
            let digest_word = swap_endianness(&digest);
            let sig = env.crypto.ecdsa_sign(&digest_word, app_cfg.issuer_private_key)?;
            sign_store.hash = digest;
            sign_store.sig[..P384_SCALAR_SIZE].copy_from_slice(&swap_endianness(&sig.r));
            sign_store.sig[P384_SCALAR_SIZE..].copy_from_slice(&swap_endianness(&sig.s));
            sign_store.sign_available = SIGN_AVAILABLE;
        }

        let bit_string = w.begin_container(DerWriter::BIT_STRING_TAG)?;
        w.write_raw_der(&[0x00])?;
        let sig_seq = w.begin_container(DerWriter::SEQUENCE_TAG)?;
        w.write_integer(&sign_store.sig[..P384_SCALAR_SIZE])?;
        w.write_integer(&sign_store.sig[P384_SCALAR_SIZE..])?;
        w.end_container(sig_seq)?;
        w.end_container(bit_string)?;
        w.end_container(cert)?;

        let size = w.offset();
        env.platform.write_certificate(cert_addr, &buf[..size])?;

        Ok(size)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::UserCfg;
    use crypto::{CryptoError, EcdsaSig, RustCryptoHasher, RustCryptoImpl};
    use ecdsa::signature::hazmat::PrehashVerifier;
    use platform::default::DefaultPlatform;
    use sha2::{Digest, Sha384};
    use zerocopy::FromZeros;

    pub(crate) struct TestTypes;
    impl DevIdTypes for TestTypes {
        type Crypto<'a> = RustCryptoImpl;
        type Platform<'a> = DefaultPlatform;
    }

    /// Counts backend calls while delegating to the real implementation.
    struct SpyCrypto {
        inner: RustCryptoImpl,
        sign_count: usize,
        self_test_count: usize,
    }

    impl SpyCrypto {
        fn new() -> SpyCrypto {
            SpyCrypto {
                inner: RustCryptoImpl::new(),
                sign_count: 0,
                self_test_count: 0,
            }
        }
    }

    impl Crypto for SpyCrypto {
        type Hasher<'c>
            = RustCryptoHasher
        where
            Self: 'c;

        fn sha384_self_test(&mut self) -> Result<(), CryptoError> {
            self.self_test_count += 1;
            self.inner.sha384_self_test()
        }

        fn hash_initialize(&mut self) -> Result<Self::Hasher<'_>, CryptoError> {
            self.inner.hash_initialize()
        }

        fn ecdsa_sign(
            &mut self,
            digest: &P384Scalar,
            priv_key: &P384Scalar,
        ) -> Result<EcdsaSig, CryptoError> {
            self.sign_count += 1;
            self.inner.ecdsa_sign(digest, priv_key)
        }
    }

    struct SpyTypes;
    impl DevIdTypes for SpyTypes {
        type Crypto<'a> = SpyCrypto;
        type Platform<'a> = DefaultPlatform;
    }

    pub(crate) fn test_app_cfg<'a>(
        subject_public_key: &'a P384PubKey,
        issuer_public_key: &'a P384PubKey,
        fw_hash: &'a Sha384Digest,
        is_self_signed: bool,
    ) -> AppCfg<'a> {
        static TEST_PRIV_KEY: P384Scalar = [0x42; crypto::P384_SCALAR_SIZE];
        AppCfg {
            subject_public_key,
            issuer_public_key,
            issuer_private_key: &TEST_PRIV_KEY,
            fw_hash,
            is_self_signed,
        }
    }

    fn tlv(tag: u8, value: &[u8]) -> Vec<u8> {
        assert!(value.len() < 128);
        let mut out = vec![tag, value.len() as u8];
        out.extend_from_slice(value);
        out
    }

    /// RDNSequence with a single commonName attribute.
    fn test_name(cn: &str) -> Vec<u8> {
        let attr = [
            tlv(0x06, &[0x55, 0x04, 0x03]),
            tlv(0x0C, cn.as_bytes()),
        ]
        .concat();
        tlv(0x30, &tlv(0x31, &tlv(0x30, &attr)))
    }

    fn test_validity() -> Vec<u8> {
        let times = [
            tlv(0x18, b"20230227000000Z"),
            tlv(0x18, b"99991231235959Z"),
        ]
        .concat();
        tlv(0x30, &times)
    }

    pub(crate) fn test_user_cfg() -> UserCfg {
        let mut cfg = UserCfg::new_zeroed();
        let issuer = test_name("test issuer");
        let subject = test_name("test subject");
        let validity = test_validity();
        cfg.issuer[..issuer.len()].copy_from_slice(&issuer);
        cfg.issuer_len = issuer.len() as u32;
        cfg.subject[..subject.len()].copy_from_slice(&subject);
        cfg.subject_len = subject.len() as u32;
        cfg.validity[..validity.len()].copy_from_slice(&validity);
        cfg.validity_len = validity.len() as u32;
        cfg
    }

    fn store_test_cfg(engine: &mut CertEngine, subsystem_id: u32) {
        engine
            .store_user_input(subsystem_id, UserCfgField::Issuer, &test_name("test issuer"))
            .unwrap();
        engine
            .store_user_input(
                subsystem_id,
                UserCfgField::Subject,
                &test_name("test subject"),
            )
            .unwrap();
        engine
            .store_user_input(subsystem_id, UserCfgField::Validity, &test_validity())
            .unwrap();
    }

    /// Total extent of the TLV starting at the head of `bytes`.
    fn tlv_len(bytes: &[u8]) -> usize {
        match bytes[1] {
            0x81 => 3 + bytes[2] as usize,
            0x82 => 4 + ((bytes[2] as usize) << 8 | bytes[3] as usize),
            len => 2 + len as usize,
        }
    }

    fn header_len(bytes: &[u8]) -> usize {
        match bytes[1] {
            0x81 => 3,
            0x82 => 4,
            _ => 2,
        }
    }

    /// The TBSCertificate span of a complete certificate, header included.
    fn tbs_span(cert: &[u8]) -> &[u8] {
        assert_eq!(cert[0], 0x30);
        let tbs = &cert[header_len(cert)..];
        assert_eq!(tbs[0], 0x30);
        &tbs[..tlv_len(tbs)]
    }

    /// The `[3]` extensions field at the tail of a TBSCertificate.
    fn extensions_field(tbs: &[u8]) -> &[u8] {
        let content = &tbs[header_len(tbs)..];
        // Version, serial and signature algorithm are fixed width.
        let mut rest = &content[3 + 22 + 14..];
        // Issuer, validity, subject, subject public key info.
        for _ in 0..4 {
            rest = &rest[tlv_len(rest)..];
        }
        assert_eq!(rest[0], 0xA3);
        rest
    }

    /// The DER `SEQUENCE { r, s }` inside the signatureValue BIT STRING.
    fn signature_der(cert: &[u8]) -> &[u8] {
        let content_start = header_len(cert);
        let tbs = tbs_span(cert);
        // Signature algorithm between the TBS and the BIT STRING.
        let bits = &cert[content_start + tbs.len() + 14..];
        assert_eq!(bits[0], 0x03);
        let value = &bits[header_len(bits)..tlv_len(bits)];
        assert_eq!(value[0], 0x00);
        &value[1..]
    }

    fn generate(
        engine: &mut CertEngine,
        env: &mut DevIdEnv<TestTypes>,
        subsystem_id: u32,
        is_self_signed: bool,
    ) -> (usize, Vec<u8>) {
        let subject_key = [0x11; crypto::P384_PUBKEY_SIZE];
        let issuer_key = [0x22; crypto::P384_PUBKEY_SIZE];
        let fw_hash = [0x33; crypto::SHA384_DIGEST_SIZE];
        let app_cfg = test_app_cfg(&subject_key, &issuer_key, &fw_hash, is_self_signed);
        let size = engine
            .generate_cert(env, subsystem_id, &app_cfg, 0x8000_0000)
            .unwrap();
        (size, env.platform.cert.to_vec())
    }

    fn test_env() -> DevIdEnv<'static, TestTypes> {
        DevIdEnv {
            crypto: RustCryptoImpl::new(),
            platform: DefaultPlatform::default(),
        }
    }

    #[test]
    fn test_generate_requires_ecdsa_support() {
        let mut engine = CertEngine::new(Support::empty());
        let mut env = test_env();
        store_test_cfg(&mut engine, 1);

        let subject_key = [0x11; crypto::P384_PUBKEY_SIZE];
        let issuer_key = [0x22; crypto::P384_PUBKEY_SIZE];
        let fw_hash = [0x33; crypto::SHA384_DIGEST_SIZE];
        let app_cfg = test_app_cfg(&subject_key, &issuer_key, &fw_hash, true);

        assert_eq!(
            engine.generate_cert(&mut env, 1, &app_cfg, 0),
            Err(CertError::EcdsaNotEnabled)
        );
    }

    #[test]
    fn test_unknown_subsystem_is_not_found() {
        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = test_env();

        let subject_key = [0x11; crypto::P384_PUBKEY_SIZE];
        let issuer_key = [0x22; crypto::P384_PUBKEY_SIZE];
        let fw_hash = [0x33; crypto::SHA384_DIGEST_SIZE];
        let app_cfg = test_app_cfg(&subject_key, &issuer_key, &fw_hash, true);

        assert_eq!(
            engine.generate_cert(&mut env, 9, &app_cfg, 0),
            Err(CertError::NotFound)
        );
    }

    #[test]
    fn test_partial_cfg_is_rejected() {
        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = test_env();
        engine
            .store_user_input(1, UserCfgField::Issuer, &test_name("test issuer"))
            .unwrap();

        let subject_key = [0x11; crypto::P384_PUBKEY_SIZE];
        let issuer_key = [0x22; crypto::P384_PUBKEY_SIZE];
        let fw_hash = [0x33; crypto::SHA384_DIGEST_SIZE];
        let app_cfg = test_app_cfg(&subject_key, &issuer_key, &fw_hash, true);

        assert_eq!(
            engine.generate_cert(&mut env, 1, &app_cfg, 0),
            Err(CertError::InvalidUserCfg)
        );
    }

    #[test]
    fn test_certificate_envelope() {
        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = test_env();
        store_test_cfg(&mut engine, 1);

        let (size, cert) = generate(&mut engine, &mut env, 1, true);
        assert_eq!(size, cert.len());
        assert_eq!(env.platform.cert_addr, Some(0x8000_0000));

        // Outer SEQUENCE spans the whole certificate; TBS, signature
        // algorithm and BIT STRING account for all of its content.
        assert_eq!(tlv_len(&cert), size);
        let tbs = tbs_span(&cert);
        let after_tbs = &cert[header_len(&cert) + tbs.len()..];
        assert_eq!(after_tbs[0], 0x30);
        assert_eq!(tlv_len(after_tbs), 14);
        let bits = &after_tbs[14..];
        assert_eq!(bits[0], 0x03);
        assert_eq!(tlv_len(bits), bits.len());
    }

    #[test]
    fn test_signature_verifies_over_tbs() {
        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = test_env();
        store_test_cfg(&mut engine, 1);

        // The certificate must verify against the public half of the
        // signing key, so derive it from the test private key.
        let priv_be = swap_endianness(&[0x42; crypto::P384_SCALAR_SIZE]);
        let signing = p384::ecdsa::SigningKey::from_slice(&priv_be).unwrap();
        let verifying = *signing.verifying_key();

        let (_, cert) = generate(&mut engine, &mut env, 1, true);
        let tbs = tbs_span(&cert);
        let digest = Sha384::digest(tbs);

        let signature = p384::ecdsa::Signature::from_der(signature_der(&cert)).unwrap();
        verifying.verify_prehash(&digest, &signature).unwrap();
    }

    #[test]
    fn test_self_signed_and_chained_extension_sets() {
        use x509_parser::oid_registry::asn1_rs::oid;

        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = test_env();
        store_test_cfg(&mut engine, 1);
        store_test_cfg(&mut engine, 2);

        let (_, devik) = generate(&mut engine, &mut env, 1, true);
        let oids = crate::extensions::tests::extension_oids(extensions_field(tbs_span(&devik)));
        assert!(oids.contains(&oid!(2.23.133 .5 .4 .4)));
        assert!(oids.contains(&oid!(2.5.29 .37)));

        let (_, devak) = generate(&mut engine, &mut env, 2, false);
        let oids = crate::extensions::tests::extension_oids(extensions_field(tbs_span(&devak)));
        assert!(!oids.contains(&oid!(2.23.133 .5 .4 .4)));
        assert!(!oids.contains(&oid!(2.5.29 .37)));
    }

    #[test]
    fn test_signature_cache_reused_for_unchanged_inputs() {
        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = DevIdEnv::<SpyTypes> {
            crypto: SpyCrypto::new(),
            platform: DefaultPlatform::default(),
        };
        store_test_cfg(&mut engine, 1);

        let subject_key = [0x11; crypto::P384_PUBKEY_SIZE];
        let issuer_key = [0x22; crypto::P384_PUBKEY_SIZE];
        let fw_hash = [0x33; crypto::SHA384_DIGEST_SIZE];
        let app_cfg = test_app_cfg(&subject_key, &issuer_key, &fw_hash, true);

        engine.generate_cert(&mut env, 1, &app_cfg, 0).unwrap();
        let first = env.platform.cert.to_vec();
        engine.generate_cert(&mut env, 1, &app_cfg, 0).unwrap();

        assert_eq!(env.crypto.sign_count, 1);
        assert_eq!(env.platform.cert.as_slice(), first.as_slice());
    }

    #[test]
    fn test_cache_invalidated_when_subject_changes() {
        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = DevIdEnv::<SpyTypes> {
            crypto: SpyCrypto::new(),
            platform: DefaultPlatform::default(),
        };
        store_test_cfg(&mut engine, 1);

        let subject_key = [0x11; crypto::P384_PUBKEY_SIZE];
        let issuer_key = [0x22; crypto::P384_PUBKEY_SIZE];
        let fw_hash = [0x33; crypto::SHA384_DIGEST_SIZE];
        let app_cfg = test_app_cfg(&subject_key, &issuer_key, &fw_hash, true);

        engine.generate_cert(&mut env, 1, &app_cfg, 0).unwrap();
        engine
            .store_user_input(1, UserCfgField::Subject, &test_name("renamed subject"))
            .unwrap();
        engine.generate_cert(&mut env, 1, &app_cfg, 0).unwrap();

        assert_eq!(env.crypto.sign_count, 2);
    }

    #[test]
    fn test_cleared_flag_forces_resign_despite_matching_hash() {
        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = DevIdEnv::<SpyTypes> {
            crypto: SpyCrypto::new(),
            platform: DefaultPlatform::default(),
        };
        store_test_cfg(&mut engine, 1);

        let subject_key = [0x11; crypto::P384_PUBKEY_SIZE];
        let issuer_key = [0x22; crypto::P384_PUBKEY_SIZE];
        let fw_hash = [0x33; crypto::SHA384_DIGEST_SIZE];
        let app_cfg = test_app_cfg(&subject_key, &issuer_key, &fw_hash, true);

        engine.generate_cert(&mut env, 1, &app_cfg, 0).unwrap();
        engine.store.sign_store_mut(1).unwrap().sign_available = 0;
        engine.generate_cert(&mut env, 1, &app_cfg, 0).unwrap();

        assert_eq!(env.crypto.sign_count, 2);
    }

    #[test]
    fn test_sha384_kat_runs_once_per_engine() {
        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = DevIdEnv::<SpyTypes> {
            crypto: SpyCrypto::new(),
            platform: DefaultPlatform::default(),
        };
        store_test_cfg(&mut engine, 1);

        let subject_key = [0x11; crypto::P384_PUBKEY_SIZE];
        let issuer_key = [0x22; crypto::P384_PUBKEY_SIZE];
        let fw_hash = [0x33; crypto::SHA384_DIGEST_SIZE];
        let app_cfg = test_app_cfg(&subject_key, &issuer_key, &fw_hash, true);

        engine.generate_cert(&mut env, 1, &app_cfg, 0).unwrap();
        engine.generate_cert(&mut env, 1, &app_cfg, 0).unwrap();

        assert_eq!(env.crypto.self_test_count, 1);
    }

    #[test]
    fn test_fresh_engines_reproduce_identical_certificates() {
        let mut first_engine = CertEngine::new(Support::ECDSA);
        let mut first_env = test_env();
        store_test_cfg(&mut first_engine, 1);
        let (_, first) = generate(&mut first_engine, &mut first_env, 1, true);

        let mut second_engine = CertEngine::new(Support::ECDSA);
        let mut second_env = test_env();
        store_test_cfg(&mut second_engine, 1);
        let (_, second) = generate(&mut second_engine, &mut second_env, 1, true);

        assert_eq!(first, second);
    }

    #[test]
    fn test_chained_cert_verifies_against_issuer_key() {
        let mut engine = CertEngine::new(Support::ECDSA);
        let mut env = test_env();
        store_test_cfg(&mut engine, 2);

        // DevAK chain: the DevIK key pair signs the DevAK certificate.
        let (devik_priv, devik_pub) = env.crypto.generate_key_pair().unwrap();
        let (_, devak_pub) = env.crypto.generate_key_pair().unwrap();
        let fw_hash = env.crypto.sha384(b"application firmware").unwrap();

        let app_cfg = AppCfg {
            subject_public_key: &devak_pub,
            issuer_public_key: &devik_pub,
            issuer_private_key: &devik_priv,
            fw_hash: &fw_hash,
            is_self_signed: false,
        };
        engine.generate_cert(&mut env, 2, &app_cfg, 0).unwrap();
        let cert = env.platform.cert.to_vec();

        let point = p384::EncodedPoint::from_affine_coordinates(
            p384::FieldBytes::from_slice(&devik_pub[..P384_SCALAR_SIZE]),
            p384::FieldBytes::from_slice(&devik_pub[P384_SCALAR_SIZE..]),
            false,
        );
        let verifying = p384::ecdsa::VerifyingKey::from_encoded_point(&point).unwrap();

        let digest = Sha384::digest(tbs_span(&cert));
        let signature = p384::ecdsa::Signature::from_der(signature_der(&cert)).unwrap();
        verifying.verify_prehash(&digest, &signature).unwrap();
    }
}
