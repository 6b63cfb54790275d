// Licensed under the Apache-2.0 license

use crate::{
    swap_endianness, Crypto, CryptoError, EcdsaSig, Hasher, P384PubKey, P384Scalar, Sha384Digest,
    P384_PUBKEY_SIZE, P384_SCALAR_SIZE,
};

use core::ops::Deref;
use ecdsa::{signature::hazmat::PrehashSigner, Signature};
use p384::NistP384;
use rand::{rngs::StdRng, SeedableRng};
use sha2::{Digest, Sha384};
use zeroize::Zeroize;

const RUSTCRYPTO_ECDSA_ERROR: CryptoError = CryptoError::CryptoLibError(1);

impl From<ecdsa::Error> for CryptoError {
    fn from(_value: ecdsa::Error) -> Self {
        RUSTCRYPTO_ECDSA_ERROR
    }
}

impl From<Signature<NistP384>> for EcdsaSig {
    fn from(value: Signature<NistP384>) -> Self {
        let mut r = [0; P384_SCALAR_SIZE];
        let mut s = [0; P384_SCALAR_SIZE];
        r.clone_from_slice(value.r().deref().to_bytes().as_slice());
        s.clone_from_slice(value.s().deref().to_bytes().as_slice());
        // DER scalars are network order, the signer contract is engine word
        // order.
        r.reverse();
        s.reverse();

        EcdsaSig { r, s }
    }
}

// SHA-384 known answer from FIPS 180-2, message "abc".
const SHA384_KAT_INPUT: &[u8] = b"abc";
const SHA384_KAT_DIGEST: Sha384Digest = [
    0xcb, 0x00, 0x75, 0x3f, 0x45, 0xa3, 0x5e, 0x8b, 0xb5, 0xa0, 0x3d, 0x69, 0x9a, 0xc6, 0x50,
    0x07, 0x27, 0x2c, 0x32, 0xab, 0x0e, 0xde, 0xd1, 0x63, 0x1a, 0x8b, 0x60, 0x5a, 0x43, 0xff,
    0x5b, 0xed, 0x80, 0x86, 0x07, 0x2b, 0xa1, 0xe7, 0xcc, 0x23, 0x58, 0xba, 0xec, 0xa1, 0x34,
    0xc8, 0x25, 0xa7,
];

pub struct RustCryptoHasher(Sha384);

impl Hasher for RustCryptoHasher {
    fn update(&mut self, bytes: &[u8]) -> Result<(), CryptoError> {
        self.0.update(bytes);
        Ok(())
    }

    fn finish(self) -> Result<Sha384Digest, CryptoError> {
        let mut digest = [0; crate::SHA384_DIGEST_SIZE];
        digest.clone_from_slice(self.0.finalize().as_slice());
        Ok(digest)
    }
}

pub struct RustCryptoImpl {
    rng: StdRng,
}

impl RustCryptoImpl {
    #[cfg(not(feature = "deterministic_rand"))]
    pub fn new() -> RustCryptoImpl {
        RustCryptoImpl {
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(feature = "deterministic_rand")]
    pub fn new() -> RustCryptoImpl {
        const SEED: [u8; 32] = [1; 32];
        let seeded_rng = StdRng::from_seed(SEED);
        RustCryptoImpl { rng: seeded_rng }
    }

    /// Generates a fresh P-384 key pair.
    ///
    /// The private key is returned in the word order of the signing engine,
    /// least significant byte first. The public key is the X and Y
    /// coordinates in network order.
    pub fn generate_key_pair(&mut self) -> Result<(P384Scalar, P384PubKey), CryptoError> {
        let signing = p384::ecdsa::SigningKey::random(&mut self.rng);
        let verifying = signing.verifying_key();
        let point = verifying.to_encoded_point(false);

        let mut pub_key = [0; P384_PUBKEY_SIZE];
        pub_key[..P384_SCALAR_SIZE]
            .copy_from_slice(point.x().ok_or(RUSTCRYPTO_ECDSA_ERROR)?.as_slice());
        pub_key[P384_SCALAR_SIZE..]
            .copy_from_slice(point.y().ok_or(RUSTCRYPTO_ECDSA_ERROR)?.as_slice());

        let mut priv_be = [0; P384_SCALAR_SIZE];
        priv_be.clone_from_slice(signing.to_bytes().as_slice());
        let priv_key = swap_endianness(&priv_be);
        priv_be.zeroize();

        Ok((priv_key, pub_key))
    }
}

impl Default for RustCryptoImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl Crypto for RustCryptoImpl {
    type Hasher<'c>
        = RustCryptoHasher
    where
        Self: 'c;

    fn sha384_self_test(&mut self) -> Result<(), CryptoError> {
        let digest = self.sha384(SHA384_KAT_INPUT)?;
        if digest != SHA384_KAT_DIGEST {
            return Err(CryptoError::SelfTestFailed);
        }
        Ok(())
    }

    fn hash_initialize(&mut self) -> Result<Self::Hasher<'_>, CryptoError> {
        Ok(RustCryptoHasher(Sha384::new()))
    }

    fn ecdsa_sign(
        &mut self,
        digest: &P384Scalar,
        priv_key: &P384Scalar,
    ) -> Result<EcdsaSig, CryptoError> {
        let digest_be = swap_endianness(digest);
        let mut key_be = swap_endianness(priv_key);
        let result = p384::ecdsa::SigningKey::from_slice(&key_be)
            .and_then(|signing| signing.sign_prehash(&digest_be));
        key_be.zeroize();
        let sig: p384::ecdsa::Signature = result?;
        Ok(sig.into())
    }
}
