use std::fmt;
use std::io;
use std::sync::Arc;

use crate::check::{check_message, inappropriate_handshake_message, inappropriate_message};
use crate::common_state::{CommonState, Side};
use crate::enums::{
    ContentType, HandshakeType, ProtocolVersion, SignatureAlgorithm, SignatureScheme,
};
use crate::error::{Error, InternalError, PeerIncompatible, PeerMisbehaved};
use crate::kx::{KeyExchange, KeyExchangeError};
#[cfg(feature = "logging")]
use crate::log::{debug, trace};
use crate::msgs::base::{Payload, PayloadU16, PayloadU8};
use crate::msgs::codec::Codec;
use crate::msgs::deframer::MessageDeframer;
use crate::msgs::fragmenter::MAX_FRAGMENT_LEN;
use crate::msgs::handshake::{
    sigalgs_extension, ClientEcdhParams, ClientHelloPayload, DigitallySignedStruct,
    EcdheServerKeyExchange, HandshakeMessagePayload, HandshakePayload, Random, ServerEcdhParams,
    ServerExtension, ServerHelloPayload, ServerKeyExchangePayload, SessionId,
    SupplementalDataEntry,
};
use crate::msgs::hsjoiner::HandshakeJoiner;
use crate::msgs::message::{Message, MessagePayload, OpaqueMessage};
use crate::msgs::persist::{KeyExchangeOutcome, SessionRecord};
use crate::server::config::ServerConfig;
use crate::server::ext;
use crate::server::hs::{HandshakeState, NegotiatedParameters, ServerHandshake};
use crate::sign::SigningKey;

/// Values of this structure are returned from [`ServerConnection::process_new_packets`]
/// and tell the caller the current I/O state of the TLS connection.
#[derive(Debug, Eq, PartialEq)]
pub struct IoState {
    tls_bytes_to_write: usize,
    peer_has_closed: bool,
}

impl IoState {
    /// How many bytes could be written by [`ServerConnection::write_tls`] if
    /// called right now.  A non-zero value implies
    /// [`ServerConnection::wants_write`].
    pub fn tls_bytes_to_write(&self) -> usize {
        self.tls_bytes_to_write
    }

    /// True if the peer has sent us a close_notify alert.
    pub fn peer_has_closed(&self) -> bool {
        self.peer_has_closed
    }
}

/// What the next message from the client may be.
enum Expect {
    ClientHello,
    ClientFlight(ClientFlight),
    Done,
}

/// Progress through the client's second flight.
#[derive(Clone, Copy, Default)]
struct ClientFlight {
    certificate_requested: bool,
    supplemental_done: bool,
    certificate_seen: bool,
}

impl ClientFlight {
    fn expected_types(&self) -> Vec<HandshakeType> {
        let mut types = Vec::with_capacity(3);
        if !self.supplemental_done {
            types.push(HandshakeType::SupplementalData);
        }
        match self.certificate_requested && !self.certificate_seen {
            true => types.push(HandshakeType::Certificate),
            false => types.push(HandshakeType::ClientKeyExchange),
        }
        types
    }
}

/// The server end of a TLS connection, up to the end of the key exchange.
///
/// Bytes from the client go in through [`ServerConnection::read_tls`] and
/// are acted upon by [`ServerConnection::process_new_packets`].  Our
/// handshake messages and alerts come out of [`ServerConnection::write_tls`].
///
/// The first error is sticky: it queues at most one fatal alert, aborts the
/// handshake, and is returned again from every later call to
/// `process_new_packets`.
pub struct ServerConnection {
    common: CommonState,
    hs: ServerHandshake,
    deframer: MessageDeframer,
    joiner: HandshakeJoiner,
    expect: Expect,
    error: Option<Error>,
    client_random: Random,
    server_random: Random,
    kx: Option<KeyExchange>,
    session: Option<SessionRecord>,
}

impl ServerConnection {
    /// Make a new ServerConnection.  `config` controls how
    /// we behave in the TLS protocol.
    pub fn new(config: Arc<ServerConfig>) -> Result<Self, Error> {
        Ok(Self {
            common: CommonState::new(Side::Server),
            hs: ServerHandshake::new(config),
            deframer: MessageDeframer::new(),
            joiner: HandshakeJoiner::new(),
            expect: Expect::ClientHello,
            error: None,
            client_random: Random::from([0u8; 32]),
            server_random: Random::new()?,
            kx: None,
            session: None,
        })
    }

    /// Read TLS content from `rd`.  This method does internal
    /// buffering, so `rd` can supply TLS messages in arbitrary-
    /// sized chunks (like a socket or pipe might).
    ///
    /// You should call [`ServerConnection::process_new_packets`] each time
    /// a call to this function succeeds.
    pub fn read_tls(&mut self, rd: &mut dyn io::Read) -> io::Result<usize> {
        self.deframer.read(rd)
    }

    /// Writes TLS messages to `wr`.
    pub fn write_tls(&mut self, wr: &mut dyn io::Write) -> io::Result<usize> {
        self.common.write_tls(wr)
    }

    /// Processes any new packets read by a previous call to
    /// [`ServerConnection::read_tls`].
    ///
    /// Errors from this function are fatal to the connection.  Future calls
    /// after an error do no new work and return the same error.  Call
    /// [`ServerConnection::write_tls`] afterwards to send any alert the
    /// error queued.
    pub fn process_new_packets(&mut self) -> Result<IoState, Error> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        if let Some(err) = self.deframer.desynced {
            return Err(self.fail(err.into()));
        }

        while let Some(msg) = self.deframer.frames.pop_front() {
            if let Err(err) = self.process_msg(msg) {
                return Err(self.fail(err));
            }
        }

        Ok(IoState {
            tls_bytes_to_write: self.common.tls_bytes_to_write(),
            peer_has_closed: self.common.has_received_close_notify,
        })
    }

    /// Returns true if the caller should call [`ServerConnection::read_tls`]
    /// as soon as possible.
    pub fn wants_read(&self) -> bool {
        self.error.is_none() && !self.common.has_received_close_notify && self.is_handshaking()
    }

    /// Returns true if the caller should call [`ServerConnection::write_tls`]
    /// as soon as possible.
    pub fn wants_write(&self) -> bool {
        self.common.wants_write()
    }

    /// Returns true while the handshake is neither complete nor failed.
    pub fn is_handshaking(&self) -> bool {
        !matches!(
            self.hs.state(),
            HandshakeState::Complete | HandshakeState::Aborted
        )
    }

    /// Where the handshake has got to.
    pub fn handshake_state(&self) -> HandshakeState {
        self.hs.state()
    }

    /// The parameters chosen for this connection, once the ClientHello has
    /// been processed.
    pub fn negotiated_parameters(&self) -> Option<&NegotiatedParameters> {
        self.hs.negotiated()
    }

    /// The outcome of the handshake, once it is complete.
    pub fn session_record(&self) -> Option<&SessionRecord> {
        self.session.as_ref()
    }

    /// The outcome of the handshake, sealed with the configured key wrap.
    pub fn sealed_session(&self) -> Result<Vec<u8>, Error> {
        let record = self
            .session
            .as_ref()
            .ok_or(Error::HandshakeNotComplete)?;
        let wrap = self
            .hs
            .config()
            .session_key_wrap
            .as_ref()
            .ok_or_else(|| Error::General("no session key wrap configured".into()))?;
        record.seal(wrap.as_ref())
    }

    /// Queues a close_notify warning alert to be sent in the next
    /// [`ServerConnection::write_tls`] call.
    pub fn send_close_notify(&mut self) {
        self.common.send_close_notify();
    }

    fn fail(&mut self, err: Error) -> Error {
        self.common.maybe_send_fatal_alert(&err);
        let err = self.hs.abort(err);
        self.expect = Expect::Done;
        self.kx = None;
        self.error = Some(err.clone());
        err
    }

    fn process_msg(&mut self, msg: OpaqueMessage) -> Result<(), Error> {
        if msg.payload.0.len() > MAX_FRAGMENT_LEN {
            return Err(Error::PeerSentOversizedRecord);
        }

        let msg = msg.into_plain_message();

        // Handshake messages may be split across, or packed into, records.
        if msg.typ == ContentType::Handshake {
            self.joiner.push(msg)?;
            while let Some(msg) = self.joiner.pop()? {
                self.process_main_protocol(msg)?;
            }
            return Ok(());
        }

        if self.joiner.is_joining() {
            return Err(PeerMisbehaved::MessageInterleavedWithHandshakeMessage.into());
        }

        self.process_main_protocol(Message::try_from(msg)?)
    }

    fn process_main_protocol(&mut self, msg: Message) -> Result<(), Error> {
        match &msg.payload {
            MessagePayload::Alert(alert) => return self.common.process_alert(alert),
            MessagePayload::Handshake(hsp) => {
                trace!("received {:?}", hsp.typ);
                if hsp.payload.sender() == Some(self.common.side) {
                    return Err(inappropriate_handshake_message(hsp, &self.expected_types()));
                }
            }
            _ => {}
        }

        let expect = std::mem::replace(&mut self.expect, Expect::Done);
        self.expect = match expect {
            Expect::ClientHello => self.handle_client_hello(&msg)?,
            Expect::ClientFlight(flight) => self.handle_client_flight(flight, &msg)?,
            Expect::Done => return Err(inappropriate_message(&msg, &[ContentType::Alert])),
        };
        Ok(())
    }

    fn expected_types(&self) -> Vec<HandshakeType> {
        match &self.expect {
            Expect::ClientHello => vec![HandshakeType::ClientHello],
            Expect::ClientFlight(flight) => flight.expected_types(),
            Expect::Done => vec![],
        }
    }

    fn handle_client_hello(&mut self, m: &Message) -> Result<Expect, Error> {
        check_message(m, &[ContentType::Handshake], &[HandshakeType::ClientHello])?;
        let client_hello =
            require_handshake_msg!(m, HandshakeType::ClientHello, HandshakePayload::ClientHello)?;
        trace!("we got a clienthello {:?}", client_hello);

        let hs = &mut self.hs;
        hs.notify_client_version(client_hello.client_version)?;
        hs.notify_offered_cipher_suites(&client_hello.cipher_suites)?;
        hs.notify_offered_compression_methods(&client_hello.compression_methods)?;
        let secure_renegotiation = ext::secure_renegotiation_indicated(
            &client_hello.cipher_suites,
            &client_hello.extensions,
        )?;
        hs.notify_secure_renegotiation(secure_renegotiation)?;
        hs.process_client_extensions(&client_hello.extensions)?;
        let params = hs.negotiate()?;
        hs.compression()?;

        self.client_random = client_hello.random;
        self.common.record_version = params.version;

        let (flight, certificate_requested) = self.server_flight(&params, client_hello)?;
        for hmp in flight {
            trace!("sending {:?}", hmp.typ);
            self.common
                .send_msg(Message::build_handshake(params.version, hmp));
        }

        Ok(Expect::ClientFlight(ClientFlight {
            certificate_requested,
            ..ClientFlight::default()
        }))
    }

    /// Build our whole first flight before sending any of it, so that a
    /// failure part way through sends only an alert.
    fn server_flight(
        &mut self,
        params: &NegotiatedParameters,
        client_hello: &ClientHelloPayload,
    ) -> Result<(Vec<HandshakeMessagePayload>, bool), Error> {
        let suite = params.cipher_suite;
        if suite.ecdhe_sign_algorithm().is_none() && !suite.is_rsa_key_transport() {
            return Err(InternalError::UnimplementedCipherSuite(suite).into());
        }

        let config = Arc::clone(self.hs.config());
        let mut flight = Vec::new();

        let mut extensions = self
            .hs
            .server_extensions()?
            .unwrap_or_default();
        extensions.push(ServerExtension::make_empty_renegotiation_info());
        flight.push(server_hello(params, self.server_random, extensions));

        if let Some(data) = self.hs.server_supplemental_data() {
            flight.push(supplemental_data(data));
        }

        if let Some(ck) = &config.certified_key {
            for cert in &ck.cert {
                config.cert_codec.encode(cert)?;
            }
            flight.push(HandshakeMessagePayload {
                typ: HandshakeType::Certificate,
                payload: HandshakePayload::Certificate(ck.cert.clone()),
            });
        }

        if let Some(sign_alg) = params.cipher_suite.ecdhe_sign_algorithm() {
            let ck = config
                .certified_key
                .as_ref()
                .ok_or(Error::NoSuitableCertificate)?;
            let group = params
                .named_group
                .ok_or(PeerIncompatible::NoKxGroupsInCommon)?;
            let kx = match KeyExchange::choose(group, config.kx_groups()) {
                Ok(kx) => kx,
                Err(KeyExchangeError::UnsupportedGroup) => {
                    return Err(InternalError::UnimplementedKeyExchange(group).into())
                }
                Err(KeyExchangeError::KeyExchangeFailed(err)) => return Err(err.into()),
            };

            let sigschemes = offered_sigschemes(
                params.version,
                sign_alg,
                sigalgs_extension(&client_hello.extensions),
            );
            flight.push(server_kx(
                &kx,
                ck.key.as_ref(),
                &sigschemes,
                params.version,
                &self.client_random,
                &self.server_random,
            )?);
            self.kx = Some(kx);
        }

        let certificate_request = self.hs.certificate_request()?;
        let certificate_requested = certificate_request.is_some();
        if let Some(cr) = certificate_request {
            flight.push(HandshakeMessagePayload {
                typ: HandshakeType::CertificateRequest,
                payload: HandshakePayload::CertificateRequest(cr),
            });
        }

        flight.push(HandshakeMessagePayload {
            typ: HandshakeType::ServerHelloDone,
            payload: HandshakePayload::ServerHelloDone,
        });
        Ok((flight, certificate_requested))
    }

    fn handle_client_flight(
        &mut self,
        mut flight: ClientFlight,
        m: &Message,
    ) -> Result<Expect, Error> {
        check_message(m, &[ContentType::Handshake], &flight.expected_types())?;
        let hsp = match &m.payload {
            MessagePayload::Handshake(hsp) => hsp,
            _ => return Err(inappropriate_message(m, &[ContentType::Handshake])),
        };

        if let HandshakePayload::SupplementalData(entries) = &hsp.payload {
            self.hs
                .process_client_supplemental_data(Some(entries.as_slice()))?;
            flight.supplemental_done = true;
            return Ok(Expect::ClientFlight(flight));
        }

        if !flight.supplemental_done {
            self.hs
                .process_client_supplemental_data(None)?;
            flight.supplemental_done = true;
        }

        match &hsp.payload {
            HandshakePayload::Certificate(chain) => {
                trace!("certs {:?}", chain);
                self.hs
                    .notify_client_certificate(chain.clone())?;
                flight.certificate_seen = true;
                Ok(Expect::ClientFlight(flight))
            }
            HandshakePayload::ClientKeyExchange(payload) => {
                let outcome = self.complete_key_exchange(payload)?;
                self.hs.notify_key_exchange(outcome)?;
                let record = self.hs.notify_handshake_complete()?;
                debug!(
                    "handshake complete: {:?} {:?}",
                    record.version, record.cipher_suite
                );
                self.session = Some(record);
                Ok(Expect::Done)
            }
            _ => Err(inappropriate_handshake_message(
                hsp,
                &flight.expected_types(),
            )),
        }
    }

    fn complete_key_exchange(&mut self, payload: &Payload) -> Result<KeyExchangeOutcome, Error> {
        let kx = match self.kx.take() {
            Some(kx) => kx,
            None => return Ok(KeyExchangeOutcome::Opaque(PayloadU16::new(payload.0.clone()))),
        };

        let group = kx.group();
        let peer = ClientEcdhParams::read_bytes(&payload.0)?;
        let premaster = kx.complete(&peer.public.0)?;
        Ok(KeyExchangeOutcome::Ecdhe {
            group,
            premaster: PayloadU8::new(premaster),
        })
    }
}

impl fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConnection")
            .field("hs", &self.hs)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

fn server_hello(
    params: &NegotiatedParameters,
    random: Random,
    extensions: Vec<ServerExtension>,
) -> HandshakeMessagePayload {
    HandshakeMessagePayload {
        typ: HandshakeType::ServerHello,
        payload: HandshakePayload::ServerHello(ServerHelloPayload {
            legacy_version: params.version,
            random,
            session_id: SessionId::empty(),
            cipher_suite: params.cipher_suite,
            compression_method: params.compression,
            extensions,
        }),
    }
}

fn supplemental_data(entries: Vec<SupplementalDataEntry>) -> HandshakeMessagePayload {
    HandshakeMessagePayload {
        typ: HandshakeType::SupplementalData,
        payload: HandshakePayload::SupplementalData(entries),
    }
}

fn server_kx(
    kx: &KeyExchange,
    signing_key: &dyn SigningKey,
    sigschemes: &[SignatureScheme],
    version: ProtocolVersion,
    client_random: &Random,
    server_random: &Random,
) -> Result<HandshakeMessagePayload, Error> {
    let params = ServerEcdhParams::new(kx.group(), kx.pub_key());

    let mut msg = Vec::new();
    client_random.encode(&mut msg);
    server_random.encode(&mut msg);
    params.encode(&mut msg);

    let signer = signing_key
        .choose_scheme(sigschemes)
        .ok_or(PeerIncompatible::NoSignatureSchemesInCommon)?;
    let sig = signer.sign(&msg)?;
    let scheme = match version {
        ProtocolVersion::TLSv1_2 => Some(signer.scheme()),
        _ => None,
    };

    Ok(HandshakeMessagePayload {
        typ: HandshakeType::ServerKeyExchange,
        payload: HandshakePayload::ServerKeyExchange(ServerKeyExchangePayload::Ecdhe(
            EcdheServerKeyExchange {
                params,
                dss: DigitallySignedStruct::new(scheme, sig),
            },
        )),
    })
}

/// The signature schemes we may use to sign ECDHE parameters.
///
/// TLS1.2 clients that sent "signature_algorithms" get their list, narrowed
/// to what the suite's authentication allows.  Everyone else gets the
/// SHA-1 based default for the suite.
fn offered_sigschemes(
    version: ProtocolVersion,
    alg: SignatureAlgorithm,
    client: Option<&[SignatureScheme]>,
) -> Vec<SignatureScheme> {
    let allowed = |scheme: &SignatureScheme| match alg {
        SignatureAlgorithm::ECDSA => matches!(
            scheme.sign(),
            SignatureAlgorithm::ECDSA | SignatureAlgorithm::ED25519 | SignatureAlgorithm::ED448
        ),
        _ => scheme.sign() == alg,
    };

    match (version, client) {
        (ProtocolVersion::TLSv1_2, Some(schemes)) => schemes
            .iter()
            .filter(|scheme| allowed(scheme))
            .copied()
            .collect(),
        _ => match alg {
            SignatureAlgorithm::ECDSA => vec![SignatureScheme::ECDSA_SHA1_Legacy],
            _ => vec![SignatureScheme::RSA_PKCS1_SHA1],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{AlertDescription, CipherSuite};
    use crate::msgs::alert::AlertMessagePayload;
    use crate::msgs::enums::{AlertLevel, Compression};
    use crate::msgs::message::PlainMessage;

    const RSA: CipherSuite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;

    fn client_hello(suites: &[CipherSuite]) -> Vec<u8> {
        let hello = ClientHelloPayload {
            client_version: ProtocolVersion::TLSv1_2,
            random: Random::from([1u8; 32]),
            session_id: SessionId::empty(),
            cipher_suites: suites.to_vec(),
            compression_methods: vec![Compression::Null],
            extensions: vec![],
        };
        record(Message::build_handshake(
            ProtocolVersion::TLSv1_0,
            HandshakeMessagePayload {
                typ: HandshakeType::ClientHello,
                payload: HandshakePayload::ClientHello(hello),
            },
        ))
    }

    fn record(m: Message) -> Vec<u8> {
        PlainMessage::from(m)
            .into_unencrypted_opaque()
            .encode()
    }

    fn connection() -> ServerConnection {
        ServerConnection::new(Arc::new(ServerConfig::builder().build().unwrap())).unwrap()
    }

    fn feed(conn: &mut ServerConnection, bytes: &[u8]) -> Result<IoState, Error> {
        let mut rd = bytes;
        while !rd.is_empty() {
            conn.read_tls(&mut rd).unwrap();
        }
        conn.process_new_packets()
    }

    fn output(conn: &mut ServerConnection) -> Vec<Message> {
        let mut bytes = Vec::new();
        conn.write_tls(&mut bytes).unwrap();

        let mut deframer = MessageDeframer::new();
        let mut rd = &bytes[..];
        while !rd.is_empty() {
            deframer.read(&mut rd).unwrap();
        }
        deframer
            .frames
            .into_iter()
            .map(|m| Message::try_from(m.into_plain_message()).unwrap())
            .collect()
    }

    fn handshake_types(msgs: &[Message]) -> Vec<HandshakeType> {
        msgs.iter()
            .filter_map(|m| match &m.payload {
                MessagePayload::Handshake(hsp) => Some(hsp.typ),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn rsa_flight_then_opaque_key_exchange() {
        let mut conn = connection();
        assert!(conn.wants_read());
        assert!(!conn.wants_write());

        let state = feed(
            &mut conn,
            &client_hello(&[RSA, CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV]),
        )
        .unwrap();
        assert!(state.tls_bytes_to_write() > 0);
        assert!(!state.peer_has_closed());
        assert_eq!(conn.handshake_state(), HandshakeState::Negotiated);

        let msgs = output(&mut conn);
        assert_eq!(
            handshake_types(&msgs),
            vec![HandshakeType::ServerHello, HandshakeType::ServerHelloDone]
        );
        assert!(msgs
            .iter()
            .all(|m| m.version == ProtocolVersion::TLSv1_2));

        let cke = record(Message::build_handshake(
            ProtocolVersion::TLSv1_2,
            HandshakeMessagePayload {
                typ: HandshakeType::ClientKeyExchange,
                payload: HandshakePayload::ClientKeyExchange(Payload::new(vec![0, 2, 9, 9])),
            },
        ));
        feed(&mut conn, &cke).unwrap();
        assert!(!conn.is_handshaking());
        assert!(!conn.wants_read());
        assert_eq!(conn.handshake_state(), HandshakeState::Complete);

        let record = conn.session_record().unwrap();
        assert_eq!(record.cipher_suite, RSA);
        assert_eq!(
            record.key_exchange,
            Some(KeyExchangeOutcome::Opaque(PayloadU16::new(vec![0, 2, 9, 9])))
        );
        assert_eq!(
            conn.sealed_session(),
            Err(Error::General("no session key wrap configured".into()))
        );
    }

    #[test]
    fn missing_renegotiation_indicator_sends_handshake_failure() {
        let mut conn = connection();
        let err = feed(&mut conn, &client_hello(&[RSA])).unwrap_err();
        assert_eq!(
            err,
            PeerIncompatible::SecureRenegotiationUnsupported.into()
        );
        assert_eq!(conn.handshake_state(), HandshakeState::Aborted);

        let mut bytes = Vec::new();
        conn.write_tls(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0x15, 0x03, 0x01, 0x00, 0x02, 0x02, 40]);

        // errors are sticky and send nothing more
        assert_eq!(conn.process_new_packets().unwrap_err(), err);
        assert!(!conn.wants_write());
        assert!(!conn.wants_read());
    }

    #[test]
    fn suites_without_a_key_exchange_we_perform_are_internal_errors() {
        for suite in [
            CipherSuite::TLS_DHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
            CipherSuite::TLS_ECDH_anon_WITH_AES_128_CBC_SHA,
            CipherSuite::TLS_ECDHE_PSK_WITH_AES_128_GCM_SHA256,
            CipherSuite::TLS_ECDH_ECDSA_WITH_AES_128_CBC_SHA,
        ] {
            let config = ServerConfig::builder()
                .with_cipher_suites(&[suite])
                .build()
                .unwrap();
            let mut conn = ServerConnection::new(Arc::new(config)).unwrap();

            let err = feed(
                &mut conn,
                &client_hello(&[suite, CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV]),
            )
            .unwrap_err();
            assert_eq!(err, InternalError::UnimplementedCipherSuite(suite).into());
            assert_eq!(conn.handshake_state(), HandshakeState::Aborted);

            // only the alert goes out
            let msgs = output(&mut conn);
            assert_eq!(msgs.len(), 1);
            assert!(matches!(
                &msgs[0].payload,
                MessagePayload::Alert(AlertMessagePayload {
                    level: AlertLevel::Fatal,
                    description: AlertDescription::InternalError,
                })
            ));
        }
    }

    #[test]
    fn server_messages_from_client_are_refused() {
        let mut conn = connection();
        let done = record(Message::build_handshake(
            ProtocolVersion::TLSv1_2,
            HandshakeMessagePayload {
                typ: HandshakeType::ServerHelloDone,
                payload: HandshakePayload::ServerHelloDone,
            },
        ));
        assert!(matches!(
            feed(&mut conn, &done),
            Err(Error::InappropriateHandshakeMessage { .. })
        ));
        let msgs = output(&mut conn);
        assert!(matches!(
            &msgs[0].payload,
            MessagePayload::Alert(AlertMessagePayload {
                level: AlertLevel::Fatal,
                description: AlertDescription::UnexpectedMessage,
            })
        ));
    }

    #[test]
    fn received_alerts() {
        let mut conn = connection();
        let close = record(Message::build_alert(
            AlertLevel::Warning,
            AlertDescription::CloseNotify,
        ));
        let state = feed(&mut conn, &close).unwrap();
        assert!(state.peer_has_closed());
        assert!(!conn.wants_read());

        let mut conn = connection();
        let fatal = record(Message::build_alert(
            AlertLevel::Fatal,
            AlertDescription::HandshakeFailure,
        ));
        assert_eq!(
            feed(&mut conn, &fatal),
            Err(Error::AlertReceived(AlertDescription::HandshakeFailure))
        );
        assert!(!conn.wants_write());
    }

    #[test]
    fn garbage_desyncs() {
        let mut conn = connection();
        assert!(feed(&mut conn, &[0x99, 0x03, 0x01, 0x00, 0x01, 0x00]).is_err());
        assert!(conn.wants_write());
    }

    #[test]
    fn handshake_split_across_records() {
        let mut conn = connection();
        let whole = client_hello(&[RSA, CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV]);
        let body = &whole[5..];
        let (a, b) = body.split_at(10);

        let mut bytes = Vec::new();
        for part in [a, b] {
            bytes.extend(
                OpaqueMessage {
                    typ: ContentType::Handshake,
                    version: ProtocolVersion::TLSv1_0,
                    payload: Payload::new(part.to_vec()),
                }
                .encode(),
            );
        }
        feed(&mut conn, &bytes).unwrap();
        assert_eq!(conn.handshake_state(), HandshakeState::Negotiated);
    }

    #[test]
    fn sigschemes_for_suite() {
        let client = [
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PKCS1_SHA256,
        ];
        assert_eq!(
            offered_sigschemes(
                ProtocolVersion::TLSv1_2,
                SignatureAlgorithm::ECDSA,
                Some(&client)
            ),
            vec![
                SignatureScheme::ECDSA_NISTP256_SHA256,
                SignatureScheme::ED25519
            ]
        );
        assert_eq!(
            offered_sigschemes(
                ProtocolVersion::TLSv1_2,
                SignatureAlgorithm::RSA,
                Some(&client)
            ),
            vec![
                SignatureScheme::RSA_PSS_SHA256,
                SignatureScheme::RSA_PKCS1_SHA256
            ]
        );
        assert_eq!(
            offered_sigschemes(
                ProtocolVersion::TLSv1_1,
                SignatureAlgorithm::ECDSA,
                Some(&client)
            ),
            vec![SignatureScheme::ECDSA_SHA1_Legacy]
        );
        assert_eq!(
            offered_sigschemes(ProtocolVersion::TLSv1_2, SignatureAlgorithm::RSA, None),
            vec![SignatureScheme::RSA_PKCS1_SHA1]
        );
    }
}
