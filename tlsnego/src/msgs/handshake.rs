#![allow(non_camel_case_types)]
use std::collections;
use std::fmt;

use pki_types::CertificateDer;

use crate::common_state::Side;
use crate::enums::{CipherSuite, HandshakeType, ProtocolVersion, SignatureScheme};
use crate::error::InvalidMessage;
use crate::msgs::base::{Payload, PayloadU16, PayloadU8};
use crate::msgs::codec::{self, Codec, ListLength, Reader, TlsListElement};
use crate::msgs::enums::{
    ClientCertificateType, Compression, ECCurveType, ECPointFormat, ExtensionType, NamedGroup,
};
use crate::rand;
use crate::x509;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Random(pub [u8; 32]);

impl fmt::Debug for Random {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::base::hex(f, &self.0)
    }
}

impl Codec for Random {
    fn encode(&self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.0);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let bytes = match r.take(32) {
            Some(bytes) => bytes,
            None => return Err(InvalidMessage::MissingData("Random")),
        };

        let mut opaque = [0; 32];
        opaque.clone_from_slice(bytes);
        Ok(Self(opaque))
    }
}

impl Random {
    pub fn new() -> Result<Self, rand::GetRandomFailed> {
        let mut data = [0u8; 32];
        rand::fill_random(&mut data)?;
        Ok(Self(data))
    }
}

impl From<[u8; 32]> for Random {
    #[inline]
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A legacy session identifier, at most 32 bytes.
///
/// Sessions are never resumed, so the client's is read and ignored and ours
/// is always empty.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionId(PayloadU8);

impl Codec for SessionId {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.0.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let id = PayloadU8::read(r)?;
        match id.0.len() {
            0..=32 => Ok(Self(id)),
            _ => Err(InvalidMessage::TrailingData("SessionID")),
        }
    }
}

impl SessionId {
    pub fn empty() -> Self {
        Self(PayloadU8::empty())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnknownExtension {
    pub typ: ExtensionType,
    pub payload: Payload,
}

impl UnknownExtension {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.payload.encode(bytes);
    }

    fn read(typ: ExtensionType, r: &mut Reader) -> Self {
        let payload = Payload::read(r);
        Self { typ, payload }
    }
}

/// One entry of a ClientHello extension block.
///
/// Only the extensions this server acts on are parsed; everything else is
/// carried as `Unknown` so that duplicates can still be detected.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientExtension {
    NamedGroups(Vec<NamedGroup>),
    EcPointFormats(Vec<ECPointFormat>),
    SignatureAlgorithms(Vec<SignatureScheme>),
    RenegotiationInfo(PayloadU8),
    Unknown(UnknownExtension),
}

impl ClientExtension {
    pub fn get_type(&self) -> ExtensionType {
        match *self {
            Self::NamedGroups(_) => ExtensionType::EllipticCurves,
            Self::EcPointFormats(_) => ExtensionType::ECPointFormats,
            Self::SignatureAlgorithms(_) => ExtensionType::SignatureAlgorithms,
            Self::RenegotiationInfo(_) => ExtensionType::RenegotiationInfo,
            Self::Unknown(ref r) => r.typ,
        }
    }
}

impl Codec for ClientExtension {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.get_type().encode(bytes);

        let mut sub: Vec<u8> = Vec::new();
        match *self {
            Self::NamedGroups(ref r) => r.encode(&mut sub),
            Self::EcPointFormats(ref r) => r.encode(&mut sub),
            Self::SignatureAlgorithms(ref r) => r.encode(&mut sub),
            Self::RenegotiationInfo(ref r) => r.encode(&mut sub),
            Self::Unknown(ref r) => r.encode(&mut sub),
        }

        (sub.len() as u16).encode(bytes);
        bytes.append(&mut sub);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let typ = ExtensionType::read(r)?;
        let len = u16::read(r)? as usize;
        let mut sub = r.sub(len)?;

        let ext = match typ {
            ExtensionType::EllipticCurves => {
                Self::NamedGroups(non_empty(Vec::read(&mut sub)?, "NamedGroups")?)
            }
            ExtensionType::ECPointFormats => {
                Self::EcPointFormats(non_empty(Vec::read(&mut sub)?, "ECPointFormats")?)
            }
            ExtensionType::SignatureAlgorithms => Self::SignatureAlgorithms(non_empty(
                Vec::read(&mut sub)?,
                "SignatureAlgorithms",
            )?),
            ExtensionType::RenegotiationInfo => Self::RenegotiationInfo(PayloadU8::read(&mut sub)?),
            _ => Self::Unknown(UnknownExtension::read(typ, &mut sub)),
        };

        sub.expect_empty("ClientExtension")
            .map(|_| ext)
    }
}

impl TlsListElement for ClientExtension {
    const SIZE_LEN: ListLength = ListLength::U16;
}

fn non_empty<T>(items: Vec<T>, name: &'static str) -> Result<Vec<T>, InvalidMessage> {
    match items.is_empty() {
        true => Err(InvalidMessage::IllegalEmptyList(name)),
        false => Ok(items),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ServerExtension {
    EcPointFormats(Vec<ECPointFormat>),
    RenegotiationInfo(PayloadU8),
    Unknown(UnknownExtension),
}

impl ServerExtension {
    pub fn get_type(&self) -> ExtensionType {
        match *self {
            Self::EcPointFormats(_) => ExtensionType::ECPointFormats,
            Self::RenegotiationInfo(_) => ExtensionType::RenegotiationInfo,
            Self::Unknown(ref r) => r.typ,
        }
    }

    pub fn make_empty_renegotiation_info() -> Self {
        Self::RenegotiationInfo(PayloadU8::empty())
    }
}

impl Codec for ServerExtension {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.get_type().encode(bytes);

        let mut sub: Vec<u8> = Vec::new();
        match *self {
            Self::EcPointFormats(ref r) => r.encode(&mut sub),
            Self::RenegotiationInfo(ref r) => r.encode(&mut sub),
            Self::Unknown(ref r) => r.encode(&mut sub),
        }

        (sub.len() as u16).encode(bytes);
        bytes.append(&mut sub);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let typ = ExtensionType::read(r)?;
        let len = u16::read(r)? as usize;
        let mut sub = r.sub(len)?;

        let ext = match typ {
            ExtensionType::ECPointFormats => Self::EcPointFormats(Vec::read(&mut sub)?),
            ExtensionType::RenegotiationInfo => Self::RenegotiationInfo(PayloadU8::read(&mut sub)?),
            _ => Self::Unknown(UnknownExtension::read(typ, &mut sub)),
        };

        sub.expect_empty("ServerExtension")
            .map(|_| ext)
    }
}

impl TlsListElement for ServerExtension {
    const SIZE_LEN: ListLength = ListLength::U16;
}

#[derive(Clone, Debug)]
pub struct ClientHelloPayload {
    pub client_version: ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suites: Vec<CipherSuite>,
    pub compression_methods: Vec<Compression>,
    pub extensions: Vec<ClientExtension>,
}

impl Codec for ClientHelloPayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.client_version.encode(bytes);
        self.random.encode(bytes);
        self.session_id.encode(bytes);
        self.cipher_suites.encode(bytes);
        self.compression_methods.encode(bytes);

        if !self.extensions.is_empty() {
            self.extensions.encode(bytes);
        }
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let mut ret = Self {
            client_version: ProtocolVersion::read(r)?,
            random: Random::read(r)?,
            session_id: SessionId::read(r)?,
            cipher_suites: Vec::read(r)?,
            compression_methods: Vec::read(r)?,
            extensions: Vec::new(),
        };

        // an absent extension block is legal before TLS1.2
        if r.any_left() {
            ret.extensions = Vec::read(r)?;
        }

        r.expect_empty("ClientHelloPayload")
            .map(|_| ret)
    }
}

// Lookups over a ClientHello extension block.  The first entry of a type
// wins; duplicates are refused before these are consulted.

/// Returns true if `extensions` carries any extension type more than once.
pub fn has_duplicate_extension(extensions: &[ClientExtension]) -> bool {
    let mut seen = collections::HashSet::new();
    extensions
        .iter()
        .any(|ext| !seen.insert(u16::from(ext.get_type())))
}

pub fn named_groups_extension(extensions: &[ClientExtension]) -> Option<&[NamedGroup]> {
    extensions
        .iter()
        .find_map(|ext| match ext {
            ClientExtension::NamedGroups(groups) => Some(groups.as_slice()),
            _ => None,
        })
}

pub fn ecpoints_extension(extensions: &[ClientExtension]) -> Option<&[ECPointFormat]> {
    extensions
        .iter()
        .find_map(|ext| match ext {
            ClientExtension::EcPointFormats(formats) => Some(formats.as_slice()),
            _ => None,
        })
}

pub fn sigalgs_extension(extensions: &[ClientExtension]) -> Option<&[SignatureScheme]> {
    extensions
        .iter()
        .find_map(|ext| match ext {
            ClientExtension::SignatureAlgorithms(schemes) => Some(schemes.as_slice()),
            _ => None,
        })
}

pub fn renegotiation_info_extension(extensions: &[ClientExtension]) -> Option<&PayloadU8> {
    extensions
        .iter()
        .find_map(|ext| match ext {
            ClientExtension::RenegotiationInfo(info) => Some(info),
            _ => None,
        })
}

#[derive(Clone, Debug)]
pub struct ServerHelloPayload {
    pub legacy_version: ProtocolVersion,
    pub random: Random,
    pub session_id: SessionId,
    pub cipher_suite: CipherSuite,
    pub compression_method: Compression,
    pub extensions: Vec<ServerExtension>,
}

impl Codec for ServerHelloPayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.legacy_version.encode(bytes);
        self.random.encode(bytes);

        self.session_id.encode(bytes);
        self.cipher_suite.encode(bytes);
        self.compression_method.encode(bytes);

        if !self.extensions.is_empty() {
            self.extensions.encode(bytes);
        }
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let legacy_version = ProtocolVersion::read(r)?;
        let random = Random::read(r)?;
        let session_id = SessionId::read(r)?;
        let suite = CipherSuite::read(r)?;
        let compression = Compression::read(r)?;

        // RFC5246:
        // "The presence of extensions can be detected by determining whether
        //  there are bytes following the compression_method field at the end of
        //  the ServerHello."
        let extensions = if r.any_left() { Vec::read(r)? } else { vec![] };

        let ret = Self {
            legacy_version,
            random,
            session_id,
            cipher_suite: suite,
            compression_method: compression,
            extensions,
        };

        r.expect_empty("ServerHelloPayload")
            .map(|_| ret)
    }
}

impl ServerHelloPayload {
    pub fn find_extension(&self, ext: ExtensionType) -> Option<&ServerExtension> {
        self.extensions
            .iter()
            .find(|x| x.get_type() == ext)
    }
}

pub type CertificatePayload = Vec<CertificateDer<'static>>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EcParameters {
    pub curve_type: ECCurveType,
    pub named_group: NamedGroup,
}

impl Codec for EcParameters {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.curve_type.encode(bytes);
        self.named_group.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let ct = ECCurveType::read(r)?;
        if ct != ECCurveType::NamedCurve {
            return Err(InvalidMessage::UnsupportedCurveType);
        }

        let grp = NamedGroup::read(r)?;

        Ok(Self {
            curve_type: ct,
            named_group: grp,
        })
    }
}

#[derive(Clone, Debug)]
pub struct ClientEcdhParams {
    pub public: PayloadU8,
}

impl Codec for ClientEcdhParams {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.public.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let pb = PayloadU8::read(r)?;
        Ok(Self { public: pb })
    }
}

#[derive(Clone, Debug)]
pub struct ServerEcdhParams {
    pub curve_params: EcParameters,
    pub public: PayloadU8,
}

impl ServerEcdhParams {
    pub fn new(named_group: NamedGroup, pubkey: &[u8]) -> Self {
        Self {
            curve_params: EcParameters {
                curve_type: ECCurveType::NamedCurve,
                named_group,
            },
            public: PayloadU8::new(pubkey.to_vec()),
        }
    }
}

impl Codec for ServerEcdhParams {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.curve_params.encode(bytes);
        self.public.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        let cp = EcParameters::read(r)?;
        let pb = PayloadU8::read(r)?;

        Ok(Self {
            curve_params: cp,
            public: pb,
        })
    }
}

/// A signature, as it appears on the wire.
///
/// TLS1.2 prefixes the signature with the scheme that produced it; earlier
/// versions fix the algorithm by the cipher suite and carry no scheme.
#[derive(Clone, Debug)]
pub struct DigitallySignedStruct {
    pub scheme: Option<SignatureScheme>,
    pub sig: PayloadU16,
}

impl DigitallySignedStruct {
    pub fn new(scheme: Option<SignatureScheme>, sig: Vec<u8>) -> Self {
        Self {
            scheme,
            sig: PayloadU16::new(sig),
        }
    }

    pub fn read_version(r: &mut Reader, vers: ProtocolVersion) -> Result<Self, InvalidMessage> {
        let scheme = match vers {
            ProtocolVersion::TLSv1_2 => Some(SignatureScheme::read(r)?),
            _ => None,
        };
        let sig = PayloadU16::read(r)?;
        Ok(Self { scheme, sig })
    }

    pub fn signature(&self) -> &[u8] {
        &self.sig.0
    }
}

impl Codec for DigitallySignedStruct {
    fn encode(&self, bytes: &mut Vec<u8>) {
        if let Some(scheme) = self.scheme {
            scheme.encode(bytes);
        }
        self.sig.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        Self::read_version(r, ProtocolVersion::TLSv1_2)
    }
}

#[derive(Clone, Debug)]
pub struct EcdheServerKeyExchange {
    pub params: ServerEcdhParams,
    pub dss: DigitallySignedStruct,
}

impl EcdheServerKeyExchange {
    fn read_version(r: &mut Reader, vers: ProtocolVersion) -> Result<Self, InvalidMessage> {
        let params = ServerEcdhParams::read(r)?;
        let dss = DigitallySignedStruct::read_version(r, vers)?;
        Ok(Self { params, dss })
    }
}

impl Codec for EcdheServerKeyExchange {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.params.encode(bytes);
        self.dss.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        Self::read_version(r, ProtocolVersion::TLSv1_2)
    }
}

#[derive(Clone, Debug)]
pub enum ServerKeyExchangePayload {
    Ecdhe(EcdheServerKeyExchange),
    Unknown(Payload),
}

impl Codec for ServerKeyExchangePayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        match *self {
            Self::Ecdhe(ref x) => x.encode(bytes),
            Self::Unknown(ref x) => x.encode(bytes),
        }
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        // read as Unknown, fully parse when we know the
        // protocol version
        Ok(Self::Unknown(Payload::read(r)))
    }
}

impl ServerKeyExchangePayload {
    pub fn unwrap_given_version(&self, vers: ProtocolVersion) -> Option<EcdheServerKeyExchange> {
        match *self {
            Self::Ecdhe(ref ecdhe) => Some(ecdhe.clone()),
            Self::Unknown(ref unk) => {
                let mut rd = Reader::init(&unk.0);
                let result = EcdheServerKeyExchange::read_version(&mut rd, vers);
                match rd.any_left() {
                    true => None,
                    false => result.ok(),
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DistinguishedName(PayloadU16);

impl DistinguishedName {
    /// Create a [`DistinguishedName`] after wrapping it in a DER SEQUENCE.
    ///
    /// `bytes` should be the contents of the `RDNSequence`, without the
    /// outer SEQUENCE header.
    pub fn in_sequence(bytes: &[u8]) -> Self {
        Self(PayloadU16::new(x509::wrap_in_sequence(bytes)))
    }
}

impl AsRef<[u8]> for DistinguishedName {
    fn as_ref(&self) -> &[u8] {
        &self.0 .0
    }
}

impl Codec for DistinguishedName {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.0.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        Ok(Self(PayloadU16::read(r)?))
    }
}

impl TlsListElement for DistinguishedName {
    const SIZE_LEN: ListLength = ListLength::U16;
}

/// A CertificateRequest message.
///
/// `sigschemes` is only present on the wire from TLS1.2 onwards.
#[derive(Clone, Debug, PartialEq)]
pub struct CertificateRequestPayload {
    pub certtypes: Vec<ClientCertificateType>,
    pub sigschemes: Option<Vec<SignatureScheme>>,
    pub canames: Vec<DistinguishedName>,
}

impl CertificateRequestPayload {
    pub fn read_version(r: &mut Reader, vers: ProtocolVersion) -> Result<Self, InvalidMessage> {
        let certtypes = non_empty(Vec::read(r)?, "CertificateTypes")?;
        let sigschemes = match vers {
            ProtocolVersion::TLSv1_2 => Some(non_empty(Vec::read(r)?, "SignatureAlgorithms")?),
            _ => None,
        };
        let canames = Vec::read(r)?;

        Ok(Self {
            certtypes,
            sigschemes,
            canames,
        })
    }
}

impl Codec for CertificateRequestPayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.certtypes.encode(bytes);
        if let Some(sigschemes) = &self.sigschemes {
            sigschemes.encode(bytes);
        }
        self.canames.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        Self::read_version(r, ProtocolVersion::TLSv1_2)
    }
}

/// One entry of a SupplementalData message (RFC 4680).
#[derive(Clone, Debug, PartialEq)]
pub struct SupplementalDataEntry {
    pub data_type: u16,
    pub data: PayloadU16,
}

impl Codec for SupplementalDataEntry {
    fn encode(&self, bytes: &mut Vec<u8>) {
        self.data_type.encode(bytes);
        self.data.encode(bytes);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        Ok(Self {
            data_type: u16::read(r)?,
            data: PayloadU16::read(r)?,
        })
    }
}

impl TlsListElement for SupplementalDataEntry {
    const SIZE_LEN: ListLength = ListLength::U24 { max: 0xff_ffff };
}

#[derive(Clone, Debug)]
pub enum HandshakePayload {
    HelloRequest,
    ClientHello(ClientHelloPayload),
    ServerHello(ServerHelloPayload),
    Certificate(CertificatePayload),
    ServerKeyExchange(ServerKeyExchangePayload),
    CertificateRequest(CertificateRequestPayload),
    ServerHelloDone,
    ClientKeyExchange(Payload),
    SupplementalData(Vec<SupplementalDataEntry>),
    Finished(Payload),
    Unknown(Payload),
}

impl HandshakePayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        use self::HandshakePayload::*;
        match *self {
            HelloRequest | ServerHelloDone => {}
            ClientHello(ref x) => x.encode(bytes),
            ServerHello(ref x) => x.encode(bytes),
            Certificate(ref x) => x.encode(bytes),
            ServerKeyExchange(ref x) => x.encode(bytes),
            CertificateRequest(ref x) => x.encode(bytes),
            ClientKeyExchange(ref x) => x.encode(bytes),
            SupplementalData(ref x) => x.encode(bytes),
            Finished(ref x) => x.encode(bytes),
            Unknown(ref x) => x.encode(bytes),
        }
    }

    /// Which role may legitimately send this message.
    ///
    /// `None` means either side may.
    pub fn sender(&self) -> Option<Side> {
        use self::HandshakePayload::*;
        match *self {
            ClientHello(_) | ClientKeyExchange(_) => Some(Side::Client),
            HelloRequest
            | ServerHello(_)
            | ServerKeyExchange(_)
            | CertificateRequest(_)
            | ServerHelloDone => Some(Side::Server),
            Certificate(_) | SupplementalData(_) | Finished(_) | Unknown(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HandshakeMessagePayload {
    pub typ: HandshakeType,
    pub payload: HandshakePayload,
}

impl Codec for HandshakeMessagePayload {
    fn encode(&self, bytes: &mut Vec<u8>) {
        // encode payload to learn length
        let mut sub: Vec<u8> = Vec::new();
        self.payload.encode(&mut sub);

        // output type, length, and encoded payload
        self.typ.encode(bytes);
        codec::u24(sub.len() as u32).encode(bytes);
        bytes.append(&mut sub);
    }

    fn read(r: &mut Reader) -> Result<Self, InvalidMessage> {
        Self::read_version(r, ProtocolVersion::TLSv1_2)
    }
}

impl HandshakeMessagePayload {
    pub fn read_version(r: &mut Reader, vers: ProtocolVersion) -> Result<Self, InvalidMessage> {
        let typ = HandshakeType::read(r)?;
        let len = usize::from(codec::u24::read(r)?);
        let mut sub = r.sub(len)?;

        let payload = match typ {
            HandshakeType::HelloRequest if sub.left() == 0 => HandshakePayload::HelloRequest,
            HandshakeType::ClientHello => {
                HandshakePayload::ClientHello(ClientHelloPayload::read(&mut sub)?)
            }
            HandshakeType::ServerHello => {
                HandshakePayload::ServerHello(ServerHelloPayload::read(&mut sub)?)
            }
            HandshakeType::Certificate => {
                HandshakePayload::Certificate(CertificatePayload::read(&mut sub)?)
            }
            HandshakeType::ServerKeyExchange => {
                let p = ServerKeyExchangePayload::read(&mut sub)?;
                HandshakePayload::ServerKeyExchange(p)
            }
            HandshakeType::CertificateRequest => {
                let p = CertificateRequestPayload::read_version(&mut sub, vers)?;
                HandshakePayload::CertificateRequest(p)
            }
            HandshakeType::ServerHelloDone => {
                sub.expect_empty("ServerHelloDone")?;
                HandshakePayload::ServerHelloDone
            }
            HandshakeType::ClientKeyExchange => {
                HandshakePayload::ClientKeyExchange(Payload::read(&mut sub))
            }
            HandshakeType::SupplementalData => {
                HandshakePayload::SupplementalData(Vec::read(&mut sub)?)
            }
            HandshakeType::Finished => HandshakePayload::Finished(Payload::read(&mut sub)),
            _ => HandshakePayload::Unknown(Payload::read(&mut sub)),
        };

        sub.expect_empty("HandshakeMessagePayload")
            .map(|_| Self { typ, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_client_hello(extensions: Vec<ClientExtension>) -> ClientHelloPayload {
        ClientHelloPayload {
            client_version: ProtocolVersion::TLSv1_2,
            random: Random::from([0x11; 32]),
            session_id: SessionId::empty(),
            cipher_suites: vec![
                CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            ],
            compression_methods: vec![Compression::Null],
            extensions,
        }
    }

    #[test]
    fn client_hello_without_extensions_is_accepted() {
        let chp = sample_client_hello(vec![]);
        let enc = chp.get_encoding();
        let back = ClientHelloPayload::read_bytes(&enc).unwrap();
        assert!(back.extensions.is_empty());
        assert_eq!(back.cipher_suites, chp.cipher_suites);
        assert!(named_groups_extension(&back.extensions).is_none());
    }

    #[test]
    fn client_hello_typed_accessors() {
        let chp = sample_client_hello(vec![
            ClientExtension::NamedGroups(vec![NamedGroup::secp256r1, NamedGroup::X25519]),
            ClientExtension::EcPointFormats(vec![ECPointFormat::Uncompressed]),
            ClientExtension::RenegotiationInfo(PayloadU8::empty()),
            ClientExtension::Unknown(UnknownExtension {
                typ: ExtensionType::Heartbeat,
                payload: Payload::new(vec![1]),
            }),
        ]);
        let back = ClientHelloPayload::read_bytes(&chp.get_encoding()).unwrap();

        let exts = &back.extensions;

        assert_eq!(
            named_groups_extension(exts),
            Some(&[NamedGroup::secp256r1, NamedGroup::X25519][..])
        );
        assert_eq!(
            ecpoints_extension(exts),
            Some(&[ECPointFormat::Uncompressed][..])
        );
        assert!(renegotiation_info_extension(exts)
            .unwrap()
            .is_empty());
        assert!(sigalgs_extension(exts).is_none());
        assert!(!has_duplicate_extension(exts));
        assert_eq!(exts[3].get_type(), ExtensionType::Heartbeat);
    }

    #[test]
    fn duplicate_extensions_detected() {
        let chp = sample_client_hello(vec![
            ClientExtension::EcPointFormats(vec![ECPointFormat::Uncompressed]),
            ClientExtension::EcPointFormats(vec![ECPointFormat::ANSIX962CompressedPrime]),
        ]);
        assert!(has_duplicate_extension(&chp.extensions));
    }

    #[test]
    fn empty_curve_list_is_rejected() {
        // type 0x000a, length 2, list length 0
        let bytes = [0x00, 0x0a, 0x00, 0x02, 0x00, 0x00];
        assert_eq!(
            ClientExtension::read_bytes(&bytes),
            Err(InvalidMessage::IllegalEmptyList("NamedGroups"))
        );
    }

    #[test]
    fn extension_with_trailing_bytes_is_rejected() {
        // renegotiation_info: length 2, but inner payload only uses 1 byte
        let bytes = [0xff, 0x01, 0x00, 0x02, 0x00, 0x00];
        assert_eq!(
            ClientExtension::read_bytes(&bytes),
            Err(InvalidMessage::TrailingData("ClientExtension"))
        );
    }

    #[test]
    fn session_id_too_long() {
        let mut bytes = vec![33];
        bytes.extend_from_slice(&[0u8; 33]);
        assert_eq!(
            SessionId::read_bytes(&bytes),
            Err(InvalidMessage::TrailingData("SessionID"))
        );
    }

    #[test]
    fn server_hello_omits_empty_extension_block() {
        let shp = ServerHelloPayload {
            legacy_version: ProtocolVersion::TLSv1_1,
            random: Random::from([0x22; 32]),
            session_id: SessionId::empty(),
            cipher_suite: CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            compression_method: Compression::Null,
            extensions: vec![],
        };
        let enc = shp.get_encoding();
        // version + random + session id + suite + compression
        assert_eq!(enc.len(), 2 + 32 + 1 + 2 + 1);
        assert_eq!(&enc[..2], &[0x03, 0x02]);
        assert_eq!(&enc[35..38], &[0x00, 0x2f, 0x00]);
    }

    #[test]
    fn server_hello_extension_block_encoding() {
        let shp = ServerHelloPayload {
            legacy_version: ProtocolVersion::TLSv1_2,
            random: Random::from([0x22; 32]),
            session_id: SessionId::empty(),
            cipher_suite: CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            compression_method: Compression::Null,
            extensions: vec![ServerExtension::EcPointFormats(
                ECPointFormat::SUPPORTED.to_vec(),
            )],
        };
        let enc = shp.get_encoding();
        assert_eq!(
            &enc[38..],
            &[0x00, 0x08, 0x00, 0x0b, 0x00, 0x04, 0x03, 0x02, 0x01, 0x00]
        );
        let back = ServerHelloPayload::read_bytes(&enc).unwrap();
        assert_eq!(back.extensions, shp.extensions);
    }

    #[test]
    fn ec_parameters_must_be_named() {
        assert_eq!(
            EcParameters::read_bytes(&[0x01, 0x00, 0x17]),
            Err(InvalidMessage::UnsupportedCurveType)
        );
        let p = EcParameters::read_bytes(&[0x03, 0x00, 0x17]).unwrap();
        assert_eq!(p.named_group, NamedGroup::secp256r1);
    }

    #[test]
    fn signature_scheme_depends_on_version() {
        let with = DigitallySignedStruct::new(Some(SignatureScheme::ED25519), vec![9, 9]);
        assert_eq!(with.get_encoding(), vec![0x08, 0x07, 0x00, 0x02, 9, 9]);

        let without = DigitallySignedStruct::new(None, vec![9, 9]);
        let enc = without.get_encoding();
        assert_eq!(enc, vec![0x00, 0x02, 9, 9]);

        let mut rd = Reader::init(&enc);
        let back = DigitallySignedStruct::read_version(&mut rd, ProtocolVersion::TLSv1_1).unwrap();
        assert_eq!(back.scheme, None);
        assert_eq!(back.signature(), &[9, 9]);
    }

    #[test]
    fn certificate_request_versions() {
        let req = CertificateRequestPayload {
            certtypes: vec![ClientCertificateType::ECDSASign],
            sigschemes: None,
            canames: vec![DistinguishedName::in_sequence(&[0x31, 0x00])],
        };
        let enc = req.get_encoding();
        let mut rd = Reader::init(&enc);
        let back = CertificateRequestPayload::read_version(&mut rd, ProtocolVersion::TLSv1_0);
        assert_eq!(back, Ok(req));
    }

    #[test]
    fn handshake_message_framing() {
        let hmp = HandshakeMessagePayload {
            typ: HandshakeType::ServerHelloDone,
            payload: HandshakePayload::ServerHelloDone,
        };
        assert_eq!(hmp.get_encoding(), vec![0x0e, 0x00, 0x00, 0x00]);

        let hello = HandshakeMessagePayload {
            typ: HandshakeType::ClientHello,
            payload: HandshakePayload::ClientHello(sample_client_hello(vec![])),
        };
        let enc = hello.get_encoding();
        let back = HandshakeMessagePayload::read_bytes(&enc).unwrap();
        assert_eq!(back.typ, HandshakeType::ClientHello);
        assert_eq!(back.payload.sender(), Some(Side::Client));
    }

    #[test]
    fn supplemental_data_entries() {
        let hmp = HandshakeMessagePayload {
            typ: HandshakeType::SupplementalData,
            payload: HandshakePayload::SupplementalData(vec![SupplementalDataEntry {
                data_type: 0x4002,
                data: PayloadU16::new(vec![1, 2, 3]),
            }]),
        };
        let enc = hmp.get_encoding();
        assert_eq!(
            enc,
            vec![0x17, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x07, 0x40, 0x02, 0x00, 0x03, 1, 2, 3]
        );
        let back = HandshakeMessagePayload::read_bytes(&enc).unwrap();
        assert!(back.payload.sender().is_none());
    }

    #[test]
    fn server_key_exchange_parsed_late() {
        let skx = EcdheServerKeyExchange {
            params: ServerEcdhParams::new(NamedGroup::X25519, &[7; 32]),
            dss: DigitallySignedStruct::new(None, vec![1, 2]),
        };
        let enc = skx.get_encoding();
        let payload = ServerKeyExchangePayload::read_bytes(&enc).unwrap();
        assert!(payload
            .unwrap_given_version(ProtocolVersion::TLSv1_2)
            .is_none());
        let back = payload
            .unwrap_given_version(ProtocolVersion::TLSv1_1)
            .unwrap();
        assert_eq!(back.params.curve_params.named_group, NamedGroup::X25519);
        assert_eq!(back.params.public.0, vec![7; 32]);
    }
}
