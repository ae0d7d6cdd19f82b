// Additional x509/asn1 functions to those provided in ring.

use pki_types::CertificateDer;

use crate::error::CertificateError;

/// Prepend stuff to `bytes` to put it in a DER SEQUENCE.
pub(crate) fn wrap_in_sequence(bytes: &[u8]) -> Vec<u8> {
    asn1_wrap(DER_SEQUENCE_TAG, bytes, &[])
}

/// Prepend stuff to `bytes_a` + `bytes_b` to put it in a DER SEQUENCE.
pub(crate) fn wrap_concat_in_sequence(bytes_a: &[u8], bytes_b: &[u8]) -> Vec<u8> {
    asn1_wrap(DER_SEQUENCE_TAG, bytes_a, bytes_b)
}

/// Prepend stuff to `bytes` to put it in a DER OCTET STRING.
pub(crate) fn wrap_in_octet_string(bytes: &[u8]) -> Vec<u8> {
    asn1_wrap(DER_OCTET_STRING_TAG, bytes, &[])
}

fn asn1_wrap(tag: u8, bytes_a: &[u8], bytes_b: &[u8]) -> Vec<u8> {
    let len = bytes_a.len() + bytes_b.len();

    if len <= 0x7f {
        // Short form
        let mut ret = Vec::with_capacity(2 + len);
        ret.push(tag);
        ret.push(len as u8);
        ret.extend_from_slice(bytes_a);
        ret.extend_from_slice(bytes_b);
        ret
    } else {
        // Long form
        let size = len.to_be_bytes();
        let leading_zero_bytes = size
            .iter()
            .position(|&x| x != 0)
            .unwrap_or(size.len());
        let encoded_bytes = size.len() - leading_zero_bytes;

        let mut ret = Vec::with_capacity(2 + encoded_bytes + len);
        ret.push(tag);

        ret.push(0x80 + encoded_bytes as u8);
        ret.extend_from_slice(&size[leading_zero_bytes..]);

        ret.extend_from_slice(bytes_a);
        ret.extend_from_slice(bytes_b);
        ret
    }
}

/// Read the header of a DER element, returning its tag and the total
/// length of the element including the header.
fn der_element_len(bytes: &[u8]) -> Option<(u8, usize)> {
    let tag = *bytes.first()?;
    let first = *bytes.get(1)?;

    if first & 0x80 == 0 {
        return Some((tag, 2 + usize::from(first)));
    }

    let count = usize::from(first & 0x7f);
    if count == 0 || count > 4 {
        // Indefinite lengths are not DER; longer ones are absurd.
        return None;
    }

    let len_bytes = bytes.get(2..2 + count)?;
    if len_bytes[0] == 0 {
        return None;
    }

    let len = len_bytes
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
    if len <= 0x7f {
        return None;
    }
    Some((tag, 2 + count + len))
}

const DER_SEQUENCE_TAG: u8 = 0x30;
const DER_OCTET_STRING_TAG: u8 = 0x04;

/// Converts certificates between their wire form and the form the
/// application wants to see.
///
/// The handshake applies this to every certificate it sends and receives.
/// It checks structure only; validating a chain is for the application.
pub trait CertificateCodec: Send + Sync {
    /// Check `cert` before it is sent to the peer.
    fn encode(&self, cert: &CertificateDer<'_>) -> Result<(), CertificateError>;

    /// Check `cert` after it is received from the peer.
    fn decode(&self, cert: &CertificateDer<'_>) -> Result<(), CertificateError>;
}

/// A `CertificateCodec` that requires each certificate to be exactly one DER
/// `SEQUENCE` with no trailing data.
#[derive(Debug, Default)]
pub struct DerCertificateCodec;

impl DerCertificateCodec {
    fn check(cert: &[u8]) -> Result<(), CertificateError> {
        match der_element_len(cert) {
            Some((DER_SEQUENCE_TAG, len)) if len == cert.len() => Ok(()),
            _ => Err(CertificateError::BadEncoding),
        }
    }
}

impl CertificateCodec for DerCertificateCodec {
    fn encode(&self, cert: &CertificateDer<'_>) -> Result<(), CertificateError> {
        Self::check(cert.as_ref())
    }

    fn decode(&self, cert: &CertificateDer<'_>) -> Result<(), CertificateError> {
        Self::check(cert.as_ref())
    }
}
