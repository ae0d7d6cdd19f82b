#![allow(dead_code)]

pub use std::sync::Arc;
use std::sync::Mutex;

use pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};

use tlsnego::internal::msgs::base::PayloadU8;
use tlsnego::internal::msgs::deframer::MessageDeframer;
use tlsnego::internal::msgs::handshake::{
    ClientExtension, ClientHelloPayload, HandshakeMessagePayload, HandshakePayload, Random,
    SessionId,
};
use tlsnego::internal::msgs::message::{Message, MessagePayload, PlainMessage};
use tlsnego::sign::{Signer, SigningKey};
use tlsnego::{
    AlertDescription, CipherSuite, Compression, ECPointFormat, Error, HandshakeType, NamedGroup,
    ProtocolVersion, ServerConnection, SignatureAlgorithm, SignatureScheme,
};

pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .try_init();
}

pub const CLIENT_RANDOM: [u8; 32] = [0x11; 32];

/// A ClientHello under construction.
pub struct Hello {
    pub version: ProtocolVersion,
    pub suites: Vec<CipherSuite>,
    pub compression: Vec<Compression>,
    pub extensions: Vec<ClientExtension>,
}

impl Hello {
    /// A TLS1.2 hello offering `suites` and the renegotiation SCSV.
    pub fn new(suites: &[CipherSuite]) -> Self {
        let mut suites = suites.to_vec();
        suites.push(CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV);
        Self {
            version: ProtocolVersion::TLSv1_2,
            suites,
            compression: vec![Compression::Null],
            extensions: vec![],
        }
    }

    pub fn version(mut self, version: ProtocolVersion) -> Self {
        self.version = version;
        self
    }

    pub fn without_scsv(mut self) -> Self {
        self.suites
            .retain(|cs| *cs != CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV);
        self
    }

    pub fn extension(mut self, ext: ClientExtension) -> Self {
        self.extensions.push(ext);
        self
    }

    pub fn ecc(self, groups: &[NamedGroup]) -> Self {
        self.extension(ClientExtension::NamedGroups(groups.to_vec()))
            .extension(ClientExtension::EcPointFormats(vec![
                ECPointFormat::Uncompressed,
            ]))
    }

    pub fn sigalgs(self, schemes: &[SignatureScheme]) -> Self {
        self.extension(ClientExtension::SignatureAlgorithms(schemes.to_vec()))
    }

    pub fn encode(self) -> Vec<u8> {
        let hello = ClientHelloPayload {
            client_version: self.version,
            random: Random::from(CLIENT_RANDOM),
            session_id: SessionId::empty(),
            cipher_suites: self.suites,
            compression_methods: self.compression,
            extensions: self.extensions,
        };
        handshake_record(
            ProtocolVersion::TLSv1_0,
            HandshakeType::ClientHello,
            HandshakePayload::ClientHello(hello),
        )
    }
}

pub fn handshake_record(
    version: ProtocolVersion,
    typ: HandshakeType,
    payload: HandshakePayload,
) -> Vec<u8> {
    encode_message(Message::build_handshake(
        version,
        HandshakeMessagePayload { typ, payload },
    ))
}

pub fn encode_message(m: Message) -> Vec<u8> {
    PlainMessage::from(m)
        .into_unencrypted_opaque()
        .encode()
}

/// Give `bytes` to `conn` and process them.
pub fn feed(conn: &mut ServerConnection, bytes: &[u8]) -> Result<(), Error> {
    let mut rd = bytes;
    while !rd.is_empty() {
        conn.read_tls(&mut rd).unwrap();
    }
    conn.process_new_packets().map(|_| ())
}

/// Drain and decode everything `conn` wants to send.
pub fn take_messages(conn: &mut ServerConnection) -> Vec<Message> {
    let mut bytes = Vec::new();
    while conn.wants_write() {
        conn.write_tls(&mut bytes).unwrap();
    }

    let mut deframer = MessageDeframer::new();
    let mut rd = &bytes[..];
    while !rd.is_empty() {
        deframer.read(&mut rd).unwrap();
    }
    assert!(deframer.desynced.is_none());

    deframer
        .frames
        .into_iter()
        .map(|m| Message::try_from(m.into_plain_message()).unwrap())
        .collect()
}

pub fn handshake_types(msgs: &[Message]) -> Vec<HandshakeType> {
    msgs.iter()
        .filter_map(|m| match &m.payload {
            MessagePayload::Handshake(hsp) => Some(hsp.typ),
            _ => None,
        })
        .collect()
}

pub fn find_handshake(msgs: &[Message], typ: HandshakeType) -> &HandshakePayload {
    msgs.iter()
        .find_map(|m| match &m.payload {
            MessagePayload::Handshake(hsp) if hsp.typ == typ => Some(&hsp.payload),
            _ => None,
        })
        .unwrap()
}

/// The single fatal alert in `msgs`.
pub fn fatal_alert(msgs: &[Message]) -> AlertDescription {
    let alerts = msgs
        .iter()
        .filter_map(|m| match &m.payload {
            MessagePayload::Alert(alert) => Some(alert.description),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(alerts.len(), 1, "expected exactly one alert");
    alerts[0]
}

/// Not a real certificate, but the outer SEQUENCE is well-formed.
pub fn fake_cert() -> CertificateDer<'static> {
    CertificateDer::from(vec![0x30, 0x03, 0x02, 0x01, 0x00])
}

/// A fresh P-256 key, and its public key.
pub fn ecdsa_p256_key() -> (PrivateKeyDer<'static>, Vec<u8>) {
    let rng = SystemRandom::new();
    let doc = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
    let pair =
        EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, doc.as_ref(), &rng).unwrap();
    let public = pair.public_key().as_ref().to_vec();
    (
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(doc.as_ref().to_vec())),
        public,
    )
}

pub const FAKE_SIGNATURE: &[u8] = b"fake signature";

/// A signing key which accepts whatever scheme is offered first, and
/// remembers what it was offered.
pub struct FakeKey {
    pub algorithm: SignatureAlgorithm,
    pub offered: Mutex<Vec<SignatureScheme>>,
}

impl FakeKey {
    pub fn new(algorithm: SignatureAlgorithm) -> Arc<Self> {
        Arc::new(Self {
            algorithm,
            offered: Mutex::new(vec![]),
        })
    }
}

impl SigningKey for FakeKey {
    fn choose_scheme(&self, offered: &[SignatureScheme]) -> Option<Box<dyn Signer>> {
        *self.offered.lock().unwrap() = offered.to_vec();
        offered
            .first()
            .map(|scheme| Box::new(FakeSigner(*scheme)) as Box<dyn Signer>)
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }
}

struct FakeSigner(SignatureScheme);

impl Signer for FakeSigner {
    fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(FAKE_SIGNATURE.to_vec())
    }

    fn scheme(&self) -> SignatureScheme {
        self.0
    }
}

/// The client's half of an ECDHE exchange on `group`.
pub struct ClientKx {
    private: ring::agreement::EphemeralPrivateKey,
    pub public: Vec<u8>,
}

impl ClientKx {
    pub fn new(alg: &'static ring::agreement::Algorithm) -> Self {
        let private =
            ring::agreement::EphemeralPrivateKey::generate(alg, &SystemRandom::new()).unwrap();
        let public = private
            .compute_public_key()
            .unwrap()
            .as_ref()
            .to_vec();
        Self { private, public }
    }

    pub fn client_key_exchange(&self) -> Vec<u8> {
        let mut body = Vec::new();
        tlsnego::internal::msgs::codec::Codec::encode(
            &PayloadU8::new(self.public.clone()),
            &mut body,
        );
        body
    }

    pub fn complete(self, alg: &'static ring::agreement::Algorithm, server: &[u8]) -> Vec<u8> {
        let peer = ring::agreement::UnparsedPublicKey::new(alg, server);
        ring::agreement::agree_ephemeral(self.private, &peer, |secret| secret.to_vec()).unwrap()
    }
}
