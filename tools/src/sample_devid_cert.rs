// Licensed under the Apache-2.0 license

//! Generates a sample DevIK/DevAK certificate chain and prints it as PEM.
//!
//! Keys come from the deterministic test RNG, so repeated runs produce the
//! same chain. Useful for eyeballing the certificate layout with openssl.

use clap::Parser;
use crypto::{Crypto, RustCryptoImpl};
use devid::{AppCfg, CertEngine, DevIdEnv, DevIdTypes, Support, UserCfgField};
use pem::{encode_config, EncodeConfig, LineEnding, Pem};
use platform::default::{DefaultPlatform, NOT_AFTER, NOT_BEFORE};

const DEVIK_SUBSYSTEM_ID: u32 = 1;
const DEVAK_SUBSYSTEM_ID_BASE: u32 = 2;

#[derive(Parser)]
#[command(about = "Print a sample DevIK/DevAK certificate chain as PEM")]
struct Args {
    /// Common name of the self-signed device identity certificate.
    #[arg(long, default_value = "Sample DevIK")]
    devik_cn: String,

    /// Number of attestation certificates to chain under the DevIK.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=3))]
    devak_count: u32,
}

struct ToolTypes;
impl DevIdTypes for ToolTypes {
    type Crypto<'a> = RustCryptoImpl;
    type Platform<'a> = DefaultPlatform;
}

fn tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    assert!(value.len() < 128);
    let mut out = vec![tag, value.len() as u8];
    out.extend_from_slice(value);
    out
}

/// DER RDNSequence holding a single commonName attribute.
fn encode_name(cn: &str) -> Vec<u8> {
    let attr = [tlv(0x06, &[0x55, 0x04, 0x03]), tlv(0x0C, cn.as_bytes())].concat();
    tlv(0x30, &tlv(0x31, &tlv(0x30, &attr)))
}

/// DER Validity with GeneralizedTime bounds.
fn encode_validity() -> Vec<u8> {
    let times = [
        tlv(0x18, NOT_BEFORE.as_bytes()),
        tlv(0x18, NOT_AFTER.as_bytes()),
    ]
    .concat();
    tlv(0x30, &times)
}

fn store_cfg(engine: &mut CertEngine, subsystem_id: u32, issuer_cn: &str, subject_cn: &str) {
    engine
        .store_user_input(subsystem_id, UserCfgField::Issuer, &encode_name(issuer_cn))
        .unwrap();
    engine
        .store_user_input(subsystem_id, UserCfgField::Subject, &encode_name(subject_cn))
        .unwrap();
    engine
        .store_user_input(subsystem_id, UserCfgField::Validity, &encode_validity())
        .unwrap();
}

fn print_pem(cert: &[u8]) {
    let pem = Pem::new("CERTIFICATE", cert);
    println!(
        "{}",
        encode_config(
            &pem,
            EncodeConfig {
                line_ending: LineEnding::LF
            }
        )
    );
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut env = DevIdEnv::<ToolTypes> {
        crypto: RustCryptoImpl::new(),
        platform: DefaultPlatform::default(),
    };
    let mut engine = CertEngine::new(Support::ECDSA);

    let (devik_priv, devik_pub) = env.crypto.generate_key_pair().unwrap();
    let fw_hash = env.crypto.sha384(b"sample platform firmware").unwrap();

    store_cfg(
        &mut engine,
        DEVIK_SUBSYSTEM_ID,
        &args.devik_cn,
        &args.devik_cn,
    );
    let devik_cfg = AppCfg {
        subject_public_key: &devik_pub,
        issuer_public_key: &devik_pub,
        issuer_private_key: &devik_priv,
        fw_hash: &fw_hash,
        is_self_signed: true,
    };
    let size = engine
        .generate_cert(&mut env, DEVIK_SUBSYSTEM_ID, &devik_cfg, 0)
        .unwrap();
    log::info!("generated {} byte DevIK certificate", size);
    print_pem(&env.platform.cert.to_vec());

    for index in 0..args.devak_count {
        let subsystem_id = DEVAK_SUBSYSTEM_ID_BASE + index;
        let subject_cn = format!("Sample DevAK {index}");
        let (_, devak_pub) = env.crypto.generate_key_pair().unwrap();
        let fw_hash = env
            .crypto
            .sha384(format!("sample application firmware {index}").as_bytes())
            .unwrap();

        store_cfg(&mut engine, subsystem_id, &args.devik_cn, &subject_cn);
        let devak_cfg = AppCfg {
            subject_public_key: &devak_pub,
            issuer_public_key: &devik_pub,
            issuer_private_key: &devik_priv,
            fw_hash: &fw_hash,
            is_self_signed: false,
        };
        let size = engine
            .generate_cert(&mut env, subsystem_id, &devak_cfg, 0)
            .unwrap();
        log::info!("generated {} byte DevAK certificate", size);
        print_pem(&env.platform.cert.to_vec());
    }
}
