//! ASN.1 DER <-> raw ECDSA signature conversion
//!
//! JWS carries an ECDSA signature as two fixed-width big-endian integers
//! concatenated (`R ‖ S`), while signing libraries produce and consume
//! `SEQUENCE { INTEGER r, INTEGER s }`. DER integers are signed and minimal:
//! a component whose top bit is set gains a `0x00` prefix and redundant
//! leading zero bytes are dropped. Both directions normalise that padding, so
//! for a fixed field width the conversion is lossless.
//!
//! ```text
//! 30 <len> 02 <len(r)> r.. 02 <len(s)> s..
//! ```

use crate::error::{TokenError, TokenResult};
use std::borrow::Cow;

/// Byte width of one signature component for P-256 (ES256)
pub const ES256_PART_LENGTH: usize = 32;

const SEQUENCE_TAG: u8 = 0x30;
const INTEGER_TAG: u8 = 0x02;
/// Lengths below this use the single-byte short form
const SHORT_FORM_LIMIT: usize = 0x80;
/// Bytes with this value or above read as negative in a DER INTEGER
const SIGN_BIT: u8 = 0x80;
/// Minimal encoding of an empty component
const ZERO: &[u8] = &[0x00];

/// Encode a raw `R ‖ S` signature as DER
///
/// `raw` must be exactly `2 × part_length` bytes.
///
/// # Errors
/// Returns [`TokenError::InvalidLength`] when `raw` has any other length.
pub fn raw_to_der(raw: &[u8], part_length: usize) -> TokenResult<Vec<u8>> {
    let expected = part_length.saturating_mul(2);
    if raw.len() != expected {
        return Err(TokenError::InvalidLength {
            expected,
            actual: raw.len(),
        });
    }

    let (r, s) = raw.split_at(part_length);
    let r = prepare_integer(r);
    let s = prepare_integer(s);

    let content_len = integer_tlv_len(r.len()) + integer_tlv_len(s.len());
    let mut der = Vec::with_capacity(1 + length_octets(content_len) + content_len);
    der.push(SEQUENCE_TAG);
    push_length(&mut der, content_len);
    push_integer(&mut der, &r);
    push_integer(&mut der, &s);

    tracing::trace!(part_length, der_len = der.len(), "encoded raw signature as DER");
    Ok(der)
}

/// Decode a DER signature into raw `R ‖ S` form of `2 × part_length` bytes
///
/// The declared SEQUENCE length must match the bytes that follow it, and
/// nothing may trail the second INTEGER.
///
/// # Errors
/// Returns [`TokenError::MalformedDer`] on a missing or unexpected tag,
/// truncated input, a non-minimal length, an empty INTEGER, or an INTEGER
/// wider than `part_length`. A component whose top bit is set but lacks the
/// `0x00` pad is read as an unsigned magnitude.
pub fn der_to_raw(der: &[u8], part_length: usize) -> TokenResult<Vec<u8>> {
    let mut reader = DerReader::new(der);

    reader.expect_tag(SEQUENCE_TAG, "SEQUENCE")?;
    let declared = reader.read_length()?;
    if declared != reader.remaining() {
        return Err(TokenError::malformed_der(format!(
            "SEQUENCE declares {declared} content bytes but {} follow",
            reader.remaining()
        )));
    }

    let mut raw = Vec::with_capacity(part_length.saturating_mul(2));
    for component in ["r", "s"] {
        reader.expect_tag(INTEGER_TAG, "INTEGER")?;
        let len = reader.read_length()?;
        let value = reader.read_bytes(len)?;
        retrieve_integer(value, part_length, &mut raw)
            .map_err(|e| TokenError::malformed_der(format!("component {component}: {e}")))?;
    }

    if reader.remaining() != 0 {
        return Err(TokenError::malformed_der(format!(
            "{} trailing bytes after second INTEGER",
            reader.remaining()
        )));
    }

    tracing::trace!(part_length, der_len = der.len(), "decoded DER signature to raw");
    Ok(raw)
}

/// Turn an unsigned big-endian magnitude into minimal DER INTEGER content
fn prepare_integer(magnitude: &[u8]) -> Cow<'_, [u8]> {
    match magnitude.first() {
        None => Cow::Borrowed(ZERO),
        Some(&first) if first >= SIGN_BIT => {
            let mut padded = Vec::with_capacity(magnitude.len() + 1);
            padded.push(0x00);
            padded.extend_from_slice(magnitude);
            Cow::Owned(padded)
        }
        Some(_) => {
            // Keep at least one byte, and keep a zero that shields a set sign bit.
            let mut start = 0;
            while start + 1 < magnitude.len()
                && magnitude[start] == 0x00
                && magnitude[start + 1] < SIGN_BIT
            {
                start += 1;
            }
            Cow::Borrowed(&magnitude[start..])
        }
    }
}

/// Append DER INTEGER content to `out` as exactly `part_length` bytes
fn retrieve_integer(encoded: &[u8], part_length: usize, out: &mut Vec<u8>) -> Result<(), String> {
    if encoded.is_empty() {
        return Err("empty INTEGER".to_string());
    }

    let start = encoded
        .iter()
        .position(|&b| b != 0x00)
        .unwrap_or(encoded.len());
    let magnitude = &encoded[start..];
    if magnitude.len() > part_length {
        return Err(format!(
            "{} significant bytes exceed field width {part_length}",
            magnitude.len()
        ));
    }

    out.resize(out.len() + part_length - magnitude.len(), 0x00);
    out.extend_from_slice(magnitude);
    Ok(())
}

fn integer_tlv_len(content_len: usize) -> usize {
    1 + length_octets(content_len) + content_len
}

/// Number of octets needed to encode `len` as a DER length
fn length_octets(len: usize) -> usize {
    if len < SHORT_FORM_LIMIT {
        1
    } else {
        1 + significant_bytes(len).len()
    }
}

fn significant_bytes(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

fn push_length(der: &mut Vec<u8>, len: usize) {
    if len < SHORT_FORM_LIMIT {
        der.push(len as u8);
    } else {
        let octets = significant_bytes(len);
        // At most size_of::<usize>() octets, so this always fits in the low seven bits.
        der.push(0x80 | octets.len() as u8);
        der.extend_from_slice(&octets);
    }
}

fn push_integer(der: &mut Vec<u8>, content: &[u8]) {
    der.push(INTEGER_TAG);
    push_length(der, content.len());
    der.extend_from_slice(content);
}

/// Cursor over DER input with bounds-checked reads
struct DerReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn read_byte(&mut self, what: &str) -> TokenResult<u8> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or_else(|| TokenError::malformed_der(format!("truncated before {what}")))?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect_tag(&mut self, tag: u8, name: &str) -> TokenResult<()> {
        let found = self.read_byte(name)?;
        if found == tag {
            Ok(())
        } else {
            Err(TokenError::malformed_der(format!(
                "expected {name} tag 0x{tag:02x}, found 0x{found:02x}"
            )))
        }
    }

    fn read_length(&mut self) -> TokenResult<usize> {
        let first = self.read_byte("length")?;
        if usize::from(first) < SHORT_FORM_LIMIT {
            return Ok(usize::from(first));
        }

        let count = usize::from(first & 0x7f);
        if count == 0 || count > std::mem::size_of::<usize>() {
            return Err(TokenError::malformed_der(format!(
                "unsupported length form 0x{first:02x}"
            )));
        }
        let octets = self.read_bytes(count)?;
        if octets[0] == 0x00 {
            return Err(TokenError::malformed_der("length has a leading zero octet"));
        }
        let len = octets
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        if len < SHORT_FORM_LIMIT {
            return Err(TokenError::malformed_der(format!(
                "long-form length {len} fits the short form"
            )));
        }
        Ok(len)
    }

    fn read_bytes(&mut self, len: usize) -> TokenResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| {
                TokenError::malformed_der(format!(
                    "needs {len} bytes, {} available",
                    self.remaining()
                ))
            })?;
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}
