// Licensed under the Apache-2.0 license

//! Per-subsystem certificate store.
//!
//! A bounded, append-only table holding the user-configured certificate
//! fields and the last-computed TBS signature for each subsystem. Entries
//! are looked up by a linear scan; the table is small and bounded by
//! design. The store lives for the whole boot session.

use crate::{
    error::CertError, MAX_CERT_SUPPORT, MAX_ISSUER_SIZE, MAX_SUBJECT_SIZE, MAX_VALIDITY_SIZE,
};
use crypto::{P384_PUBKEY_SIZE, SHA384_DIGEST_SIZE};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
use zeroize::Zeroize;

/// The user-configurable certificate fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCfgField {
    Issuer,
    Subject,
    Validity,
}

/// User-supplied certificate fields for one subsystem. Each field is a
/// DER-encoded blob copied verbatim into the TBS certificate.
#[repr(C)]
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Zeroize)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct UserCfg {
    pub issuer: [u8; MAX_ISSUER_SIZE],
    pub issuer_len: u32,
    pub subject: [u8; MAX_SUBJECT_SIZE],
    pub subject_len: u32,
    pub validity: [u8; MAX_VALIDITY_SIZE],
    pub validity_len: u32,
}

impl UserCfg {
    const fn new() -> UserCfg {
        UserCfg {
            issuer: [0; MAX_ISSUER_SIZE],
            issuer_len: 0,
            subject: [0; MAX_SUBJECT_SIZE],
            subject_len: 0,
            validity: [0; MAX_VALIDITY_SIZE],
            validity_len: 0,
        }
    }

    pub fn issuer(&self) -> &[u8] {
        &self.issuer[..self.issuer_len as usize]
    }

    pub fn subject(&self) -> &[u8] {
        &self.subject[..self.subject_len as usize]
    }

    pub fn validity(&self) -> &[u8] {
        &self.validity[..self.validity_len as usize]
    }
}

/// Cached signing record for one subsystem.
///
/// `sig` holds `r` and `s` concatenated, each 48 bytes in network order,
/// ready for DER. The record is valid only while `sign_available` is
/// exactly [`crate::SIGN_AVAILABLE`]; `hash` and `sig` are always
/// overwritten together with the flag, never independently.
#[repr(C)]
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Zeroize)]
pub struct SignStore {
    pub hash: [u8; SHA384_DIGEST_SIZE],
    pub sig: [u8; P384_PUBKEY_SIZE],
    pub sign_available: u8,
}

impl SignStore {
    const fn new() -> SignStore {
        SignStore {
            hash: [0; SHA384_DIGEST_SIZE],
            sig: [0; P384_PUBKEY_SIZE],
            sign_available: 0,
        }
    }
}

#[repr(C)]
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Zeroize)]
struct InfoStoreEntry {
    subsystem_id: u32,
    user_cfg: UserCfg,
    sign_store: SignStore,

    // unused buffer added to keep the entry word aligned and remove padding
    reserved: [u8; 3],
}

impl InfoStoreEntry {
    const fn new() -> InfoStoreEntry {
        InfoStoreEntry {
            subsystem_id: 0,
            user_cfg: UserCfg::new(),
            sign_store: SignStore::new(),
            reserved: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Zeroize)]
pub struct CertStore {
    entries: [InfoStoreEntry; MAX_CERT_SUPPORT],
    num_entries: u32,
}

impl CertStore {
    pub const fn new() -> CertStore {
        const ENTRY_INITIALIZER: InfoStoreEntry = InfoStoreEntry::new();
        CertStore {
            entries: [ENTRY_INITIALIZER; MAX_CERT_SUPPORT],
            num_entries: 0,
        }
    }

    fn find(&self, subsystem_id: u32) -> Option<usize> {
        self.entries[..self.num_entries as usize]
            .iter()
            .position(|entry| entry.subsystem_id == subsystem_id)
    }

    /// Stores one user-supplied field for `subsystem_id`.
    ///
    /// Creates a new entry on the first call for an unseen id; fails with
    /// `StoreLimitExceeded` once the table is full, leaving existing
    /// entries untouched. Entries are never removed.
    pub fn store_user_input(
        &mut self,
        subsystem_id: u32,
        field: UserCfgField,
        value: &[u8],
    ) -> Result<(), CertError> {
        let max_size = match field {
            UserCfgField::Issuer => MAX_ISSUER_SIZE,
            UserCfgField::Subject => MAX_SUBJECT_SIZE,
            UserCfgField::Validity => MAX_VALIDITY_SIZE,
        };
        if value.len() > max_size {
            return Err(CertError::InvalidArgument);
        }

        let idx = match self.find(subsystem_id) {
            Some(idx) => idx,
            None => {
                let idx = self.num_entries as usize;
                if idx >= MAX_CERT_SUPPORT {
                    return Err(CertError::StoreLimitExceeded);
                }
                self.entries[idx].subsystem_id = subsystem_id;
                self.num_entries += 1;
                idx
            }
        };

        let user_cfg = &mut self.entries[idx].user_cfg;
        match field {
            UserCfgField::Issuer => {
                user_cfg.issuer[..value.len()].copy_from_slice(value);
                user_cfg.issuer_len = value.len() as u32;
            }
            UserCfgField::Subject => {
                user_cfg.subject[..value.len()].copy_from_slice(value);
                user_cfg.subject_len = value.len() as u32;
            }
            UserCfgField::Validity => {
                user_cfg.validity[..value.len()].copy_from_slice(value);
                user_cfg.validity_len = value.len() as u32;
            }
        }

        Ok(())
    }

    /// Looks up the user configuration for `subsystem_id` and validates
    /// that all three fields have been configured. A field that was never
    /// written, or holds only zero bytes, signals "not configured".
    pub fn user_cfg(&self, subsystem_id: u32) -> Result<&UserCfg, CertError> {
        let idx = self.find(subsystem_id).ok_or(CertError::NotFound)?;
        let user_cfg = &self.entries[idx].user_cfg;

        if !is_configured(user_cfg.issuer())
            || !is_configured(user_cfg.subject())
            || !is_configured(user_cfg.validity())
        {
            return Err(CertError::InvalidUserCfg);
        }

        Ok(user_cfg)
    }

    /// Looks up the signing record for `subsystem_id`. Content is not
    /// validated here; the generator performs the flag and hash checks.
    pub fn sign_store_mut(&mut self, subsystem_id: u32) -> Result<&mut SignStore, CertError> {
        let idx = self.find(subsystem_id).ok_or(CertError::NotFound)?;
        Ok(&mut self.entries[idx].sign_store)
    }
}

impl Default for CertStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_configured(span: &[u8]) -> bool {
    let mut sum = 0u8;
    for &byte in span {
        sum |= byte;
    }
    sum != 0
}
