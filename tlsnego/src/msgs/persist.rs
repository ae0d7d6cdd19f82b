use std::fmt;

use pki_types::CertificateDer;

use crate::enums::{CipherSuite, ProtocolVersion};
use crate::error::{Error, InvalidMessage};
use crate::msgs::base::{PayloadU16, PayloadU8};
use crate::msgs::codec::{Codec, Reader};
use crate::msgs::enums::{Compression, NamedGroup};
use crate::ticketer::KeyWrap;

/// What the key exchange produced.
#[derive(Clone, PartialEq)]
pub enum KeyExchangeOutcome {
    /// ECDHE completed and produced this premaster secret.
    Ecdhe {
        group: NamedGroup,
        premaster: PayloadU8,
    },
    /// A key exchange this server does not run itself; the client's
    /// ClientKeyExchange body is kept as-is.
    Opaque(PayloadU16),
}

impl KeyExchangeOutcome {
    pub fn premaster_secret(&self) -> Option<&[u8]> {
        match self {
            Self::Ecdhe { premaster, .. } => Some(&premaster.0),
            Self::Opaque(_) => None,
        }
    }
}

impl Codec for KeyExchangeOutcome {
    fn encode(&self, bytes: &mut Vec<u8>) {
        match self {
            Self::Ecdhe { group, premaster } => {
                1u8.encode(bytes);
                group.encode(bytes);
                premaster.encode(bytes);
            }
            Self::Opaque(body) => {
                2u8.encode(bytes);
                body.encode(bytes);
            }
        }
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        match u8::read(r)? {
            1 => Ok(Self::Ecdhe {
                group: NamedGroup::read(r)?,
                premaster: PayloadU8::read(r)?,
            }),
            2 => Ok(Self::Opaque(PayloadU16::read(r)?)),
            _ => Err(InvalidMessage::MissingData("KeyExchangeOutcome")),
        }
    }
}

impl fmt::Debug for KeyExchangeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ecdhe { group, .. } => f
                .debug_struct("Ecdhe")
                .field("group", group)
                .finish_non_exhaustive(),
            Self::Opaque(_) => f.write_str("Opaque"),
        }
    }
}

/// The outcome of a completed handshake.
///
/// This is what remains of the negotiation once the handshake is complete.
/// It can be sealed under a [`KeyWrap`] and opened again later.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionRecord {
    pub version: ProtocolVersion,
    pub cipher_suite: CipherSuite,
    pub compression: Compression,
    pub named_group: Option<NamedGroup>,
    pub key_exchange: Option<KeyExchangeOutcome>,
    pub client_certificates: Vec<CertificateDer<'static>>,
}

impl SessionRecord {
    /// Encode and wrap this record under `wrap`.
    pub fn seal(&self, wrap: &dyn KeyWrap) -> Result<Vec<u8>, Error> {
        wrap.wrap_key(&self.get_encoding())
    }

    /// Unwrap and decode a record previously produced by [`SessionRecord::seal`].
    pub fn open(wrap: &dyn KeyWrap, sealed: &[u8]) -> Result<Self, Error> {
        let plain = wrap.unwrap_key(sealed)?;
        Ok(Self::read_bytes(&plain)?)
    }
}

impl Codec for SessionRecord {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.version.encode(bytes);
        self.cipher_suite.encode(bytes);
        self.compression.encode(bytes);
        match self.named_group {
            Some(group) => {
                1u8.encode(bytes);
                group.encode(bytes);
            }
            None => 0u8.encode(bytes),
        }
        match &self.key_exchange {
            Some(kx) => {
                1u8.encode(bytes);
                kx.encode(bytes);
            }
            None => 0u8.encode(bytes),
        }
        self.client_certificates.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let version = ProtocolVersion::read(r)?;
        let cipher_suite = CipherSuite::read(r)?;
        let compression = Compression::read(r)?;
        let named_group = match u8::read(r)? {
            1 => Some(NamedGroup::read(r)?),
            _ => None,
        };
        let key_exchange = match u8::read(r)? {
            1 => Some(KeyExchangeOutcome::read(r)?),
            _ => None,
        };
        let client_certificates = Vec::read(r)?;

        r.expect_empty("SessionRecord")?;
        Ok(Self {
            version,
            cipher_suite,
            compression,
            named_group,
            key_exchange,
            client_certificates,
        })
    }
}
