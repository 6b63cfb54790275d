// Licensed under the Apache-2.0 license

//! Minimal DER/TLV encoding over a caller-owned buffer.
//!
//! Container lengths are not known until their content has been written, so
//! containers reserve a single length byte up front and back-patch it on
//! close, shifting the content right when the long form is needed. The
//! writer also supports splicing bytes into already-written content, which
//! the TBS assembler uses to retrofit the Serial field.

use crate::error::CertError;

pub struct DerWriter<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

/// An open container. Records where the reserved length byte and the
/// content live so the length can be patched on close. Containers nest and
/// must be closed innermost-first.
#[must_use]
pub struct Container {
    length_offset: usize,
    content_offset: usize,
}

impl<'a> DerWriter<'a> {
    pub const BOOL_TAG: u8 = 0x01;
    pub const INTEGER_TAG: u8 = 0x02;
    pub const BIT_STRING_TAG: u8 = 0x03;
    pub const OCTET_STRING_TAG: u8 = 0x04;
    pub const NULL_TAG: u8 = 0x05;
    pub const SEQUENCE_TAG: u8 = 0x30;

    // Context-specific tags used in an X.509 v3 certificate: the implicit
    // [0] keyIdentifier, the explicit [3] extensions wrapper and the
    // implicit constructed [6] FWID list.
    pub const CONTEXT_0_TAG: u8 = 0x80;
    pub const CONTEXT_3_CONSTRUCTED_TAG: u8 = 0xA3;
    pub const CONTEXT_6_CONSTRUCTED_TAG: u8 = 0xA6;

    pub fn new(buf: &'a mut [u8]) -> DerWriter<'a> {
        DerWriter { buf, offset: 0 }
    }

    /// Current cursor, relative to the start of the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// All bytes written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.offset]
    }

    fn write_byte(&mut self, byte: u8) -> Result<usize, CertError> {
        if self.offset >= self.buf.len() {
            return Err(CertError::BufferFull);
        }

        self.buf[self.offset] = byte;
        self.offset += 1;
        Ok(1)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize, CertError> {
        let size = bytes.len();
        self.buf
            .get_mut(self.offset..self.offset + size)
            .ok_or(CertError::BufferFull)?
            .copy_from_slice(bytes);
        self.offset += size;

        Ok(size)
    }

    /// DER-encodes a length whose value is already known. Lengths up to 127
    /// use the short form, larger ones the long form with a big-endian
    /// byte count.
    fn write_length(&mut self, length: usize) -> Result<usize, CertError> {
        match length {
            0..=127 => self.write_byte(length as u8),
            128..=255 => {
                self.write_byte(0x81)?;
                self.write_byte(length as u8)?;
                Ok(2)
            }
            256..=65535 => {
                self.write_byte(0x82)?;
                self.write_byte((length >> 8) as u8)?;
                self.write_byte(length as u8)?;
                Ok(3)
            }
            _ => Err(CertError::LengthTooLong),
        }
    }

    /// Writes one complete primitive TLV with the given tag.
    pub fn write_tlv(&mut self, tag: u8, value: &[u8]) -> Result<usize, CertError> {
        let mut bytes_written = self.write_byte(tag)?;
        bytes_written += self.write_length(value.len())?;
        bytes_written += self.write_bytes(value)?;

        Ok(bytes_written)
    }

    /// DER-encodes `value` as an ASN.1 INTEGER.
    ///
    /// A `0x00` pad byte is prepended when bit 7 of the first value byte is
    /// set, so a non-negative value never reads as negative. Leading zero
    /// bytes are kept; signature words retain their full width.
    pub fn write_integer(&mut self, value: &[u8]) -> Result<usize, CertError> {
        let pad = !value.is_empty() && (value[0] & 0x80) != 0;

        let mut bytes_written = self.write_byte(Self::INTEGER_TAG)?;
        bytes_written += self.write_length(value.len() + usize::from(pad))?;
        if pad {
            bytes_written += self.write_byte(0x00)?;
        }
        bytes_written += self.write_bytes(value)?;

        Ok(bytes_written)
    }

    /// DER-encodes `value` as an ASN.1 OCTET STRING.
    pub fn write_octet_string(&mut self, value: &[u8]) -> Result<usize, CertError> {
        self.write_tlv(Self::OCTET_STRING_TAG, value)
    }

    /// DER-encodes `value` as an ASN.1 BIT STRING with zero unused bits.
    pub fn write_bit_string(&mut self, value: &[u8]) -> Result<usize, CertError> {
        let mut bytes_written = self.write_byte(Self::BIT_STRING_TAG)?;
        bytes_written += self.write_length(value.len() + 1)?;
        bytes_written += self.write_byte(0x00)?;
        bytes_written += self.write_bytes(value)?;

        Ok(bytes_written)
    }

    /// DER-encodes an ASN.1 BOOLEAN.
    pub fn write_boolean(&mut self, value: bool) -> Result<usize, CertError> {
        self.write_tlv(Self::BOOL_TAG, &[if value { 0xFF } else { 0x00 }])
    }

    /// DER-encodes an ASN.1 NULL.
    pub fn write_null(&mut self) -> Result<usize, CertError> {
        self.write_tlv(Self::NULL_TAG, &[])
    }

    /// Copies a pre-encoded OID constant, tag and length included, verbatim.
    pub fn write_raw_oid(&mut self, oid: &[u8]) -> Result<usize, CertError> {
        self.write_bytes(oid)
    }

    /// Copies caller-supplied, already DER-encoded content verbatim.
    pub fn write_raw_der(&mut self, der: &[u8]) -> Result<usize, CertError> {
        self.write_bytes(der)
    }

    /// Opens a container: writes `tag`, reserves one length byte and leaves
    /// the cursor at the start of the content.
    pub fn begin_container(&mut self, tag: u8) -> Result<Container, CertError> {
        self.write_byte(tag)?;
        let length_offset = self.offset;
        self.write_byte(0x00)?;

        Ok(Container {
            length_offset,
            content_offset: self.offset,
        })
    }

    /// Closes a container by back-patching its length field.
    ///
    /// Content of 128 bytes or more needs a long-form length, so the content
    /// is shifted right to make room. Returns the number of bytes inserted
    /// (0, 1 or 2); the cursor has already been advanced by that amount.
    pub fn end_container(&mut self, container: Container) -> Result<usize, CertError> {
        let content_length = self.offset - container.content_offset;

        let inserted = match content_length {
            0..=127 => 0,
            128..=255 => 1,
            256..=65535 => 2,
            _ => return Err(CertError::LengthTooLong),
        };

        if inserted > 0 {
            self.shift_right(container.content_offset, inserted)?;
        }

        match inserted {
            0 => self.buf[container.length_offset] = content_length as u8,
            1 => {
                self.buf[container.length_offset] = 0x81;
                self.buf[container.length_offset + 1] = content_length as u8;
            }
            _ => {
                self.buf[container.length_offset] = 0x82;
                self.buf[container.length_offset + 1] = (content_length >> 8) as u8;
                self.buf[container.length_offset + 2] = content_length as u8;
            }
        }

        Ok(inserted)
    }

    /// Splices `bytes` into the already-written content at `at`, shifting
    /// everything from `at` to the cursor right to make room.
    pub fn insert_bytes(&mut self, at: usize, bytes: &[u8]) -> Result<(), CertError> {
        if at > self.offset {
            return Err(CertError::InvalidArgument);
        }
        self.shift_right(at, bytes.len())?;
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);

        Ok(())
    }

    fn shift_right(&mut self, at: usize, by: usize) -> Result<(), CertError> {
        if self.offset + by > self.buf.len() {
            return Err(CertError::BufferFull);
        }

        self.buf.copy_within(at..self.offset, at + by);
        self.offset += by;
        Ok(())
    }
}
