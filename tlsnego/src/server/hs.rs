use std::fmt;
use std::sync::Arc;

use pki_types::CertificateDer;

use crate::enums::{AlertDescription, CipherSuite, HandshakeType, ProtocolVersion};
use crate::error::{ApiMisuse, CertificateError, Error, InternalError, PeerIncompatible};
#[cfg(feature = "logging")]
use crate::log::{debug, trace};
use crate::msgs::enums::{Compression, NamedGroup};
use crate::msgs::handshake::{
    CertificateRequestPayload, ClientExtension, ServerExtension, SupplementalDataEntry,
};
use crate::msgs::persist::{KeyExchangeOutcome, SessionRecord};
use crate::server::config::ServerConfig;
use crate::server::ext::{self, ClientEccCapabilities};
use crate::server::negotiate;
use crate::suites;

/// Where a [`ServerHandshake`] has got to.
///
/// The states are passed through strictly in declaration order.  `Aborted`
/// can be entered from any state before `Complete`, and nothing leaves it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing has been seen yet.
    Start,
    /// The client's version is known.
    VersionNotified,
    /// The client's cipher suites are known.
    CipherSuitesOffered,
    /// The client's compression methods are known.
    CompressionOffered,
    /// The client's extensions have been checked.
    ExtensionsProcessed,
    /// All parameters have been chosen.
    Negotiated,
    /// The handshake finished successfully.
    Complete,
    /// The handshake failed.
    Aborted,
}

impl HandshakeState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::VersionNotified => "VersionNotified",
            Self::CipherSuitesOffered => "CipherSuitesOffered",
            Self::CompressionOffered => "CompressionOffered",
            Self::ExtensionsProcessed => "ExtensionsProcessed",
            Self::Negotiated => "Negotiated",
            Self::Complete => "Complete",
            Self::Aborted => "Aborted",
        }
    }
}

/// The parameters chosen for a connection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NegotiatedParameters {
    /// The protocol version.
    pub version: ProtocolVersion,
    /// The cipher suite.
    pub cipher_suite: CipherSuite,
    /// The compression method.
    pub compression: Compression,
    /// The curve for ephemeral ECDH, chosen only for ECC suites.
    pub named_group: Option<NamedGroup>,
}

/// The compression object for [`Compression::Null`].
///
/// Records are not protected here, so there is nothing for it to do.
/// Getting one back from [`ServerHandshake::compression`] means the selected
/// method is one we can carry out.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NullCompression;

/// The server side of a TLS handshake negotiation.
///
/// The connection feeds it what the client offered, one call per step and
/// in order, and it answers with the parameters to use.  A call made in
/// the wrong state fails with [`Error::ApiMisuse`] and changes nothing.
/// Any other failure is fatal: the handshake moves to
/// [`HandshakeState::Aborted`], records the alert to send and refuses all
/// further calls.
pub struct ServerHandshake {
    config: Arc<ServerConfig>,
    state: HandshakeState,
    fatal_alert: Option<AlertDescription>,

    client_version: ProtocolVersion,
    offered_cipher_suites: Vec<CipherSuite>,
    ecc_cipher_suites_offered: bool,
    offered_compression_methods: Vec<Compression>,
    secure_renegotiation: Option<bool>,
    client_ecc: ClientEccCapabilities,

    negotiated: Option<NegotiatedParameters>,
    client_certificates: Vec<CertificateDer<'static>>,
    key_exchange: Option<KeyExchangeOutcome>,
}

impl ServerHandshake {
    /// Start a negotiation using `config`.
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            config,
            state: HandshakeState::Start,
            fatal_alert: None,
            client_version: ProtocolVersion::Unknown(0),
            offered_cipher_suites: Vec::new(),
            ecc_cipher_suites_offered: false,
            offered_compression_methods: Vec::new(),
            secure_renegotiation: None,
            client_ecc: ClientEccCapabilities::default(),
            negotiated: None,
            client_certificates: Vec::new(),
            key_exchange: None,
        }
    }

    /// The current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// The alert that ended the handshake, if it was aborted with one.
    pub fn fatal_alert(&self) -> Option<AlertDescription> {
        self.fatal_alert
    }

    /// The chosen parameters, once [`ServerHandshake::negotiate`] succeeded.
    pub fn negotiated(&self) -> Option<&NegotiatedParameters> {
        self.negotiated.as_ref()
    }

    /// Whether the client offered any ECC cipher suite.
    pub fn ecc_cipher_suites_offered(&self) -> bool {
        self.ecc_cipher_suites_offered
    }

    /// The client's ECC extensions, once processed.
    pub fn client_ecc_capabilities(&self) -> &ClientEccCapabilities {
        &self.client_ecc
    }

    /// The configuration in use.
    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    /// Record the version from the ClientHello.
    pub fn notify_client_version(&mut self, version: ProtocolVersion) -> Result<(), Error> {
        self.require(HandshakeState::Start, "notify_client_version")?;
        self.client_version = version;
        self.advance(HandshakeState::VersionNotified);
        Ok(())
    }

    /// Record the cipher suites from the ClientHello.
    pub fn notify_offered_cipher_suites(&mut self, suites: &[CipherSuite]) -> Result<(), Error> {
        self.require(HandshakeState::VersionNotified, "notify_offered_cipher_suites")?;
        self.offered_cipher_suites = suites.to_vec();
        self.ecc_cipher_suites_offered = suites::contains_ecc_suites(suites);
        self.advance(HandshakeState::CipherSuitesOffered);
        Ok(())
    }

    /// Record the compression methods from the ClientHello.
    pub fn notify_offered_compression_methods(
        &mut self,
        methods: &[Compression],
    ) -> Result<(), Error> {
        self.require(
            HandshakeState::CipherSuitesOffered,
            "notify_offered_compression_methods",
        )?;
        self.offered_compression_methods = methods.to_vec();
        self.advance(HandshakeState::CompressionOffered);
        Ok(())
    }

    /// Record whether the client signalled secure renegotiation support.
    ///
    /// This must be called exactly once, after the compression methods and
    /// before the extensions.  A client without support is refused.
    pub fn notify_secure_renegotiation(&mut self, present: bool) -> Result<(), Error> {
        self.require(HandshakeState::CompressionOffered, "notify_secure_renegotiation")?;
        if self.secure_renegotiation.is_some() {
            return Err(self.out_of_order("notify_secure_renegotiation"));
        }
        self.secure_renegotiation = Some(present);
        ext::process_secure_renegotiation_indicator(present).map_err(|err| self.abort(err))
    }

    /// Check the client's extensions and keep its ECC capabilities.
    pub fn process_client_extensions(
        &mut self,
        extensions: &[ClientExtension],
    ) -> Result<(), Error> {
        self.require(HandshakeState::CompressionOffered, "process_client_extensions")?;
        if self.secure_renegotiation.is_none() {
            return Err(self.out_of_order("process_client_extensions"));
        }

        self.client_ecc = ext::process_client_extensions(extensions, self.ecc_cipher_suites_offered)
            .map_err(|err| self.abort(err))?;
        self.advance(HandshakeState::ExtensionsProcessed);
        Ok(())
    }

    /// Choose the version, cipher suite, compression method and curve.
    pub fn negotiate(&mut self) -> Result<NegotiatedParameters, Error> {
        self.require(HandshakeState::ExtensionsProcessed, "negotiate")?;
        let params = self
            .choose_parameters()
            .map_err(|err| self.abort(err))?;
        self.negotiated = Some(params);
        self.advance(HandshakeState::Negotiated);
        Ok(params)
    }

    fn choose_parameters(&self) -> Result<NegotiatedParameters, Error> {
        let config = &self.config;
        let version =
            negotiate::select_version(self.client_version, config.min_version, config.max_version)?;

        let named_groups = self.client_ecc.named_groups.as_deref();
        let ecc_enabled = self.ecc_cipher_suites_offered
            && negotiate::supports_client_ecc_capabilities(
                named_groups,
                self.client_ecc.point_formats.as_deref(),
                &config.kx_groups,
            );

        let cipher_suite = negotiate::select_cipher_suite(
            &config.cipher_suites,
            &self.offered_cipher_suites,
            ecc_enabled,
        )?;

        let compression = negotiate::select_compression_method(
            &config.compression_methods,
            &self.offered_compression_methods,
        )?;

        let named_group = match cipher_suite.is_ecc() {
            true => Some(
                negotiate::select_named_group(named_groups, &config.kx_groups)
                    .ok_or(PeerIncompatible::NoKxGroupsInCommon)?
                    .name,
            ),
            false => None,
        };

        Ok(NegotiatedParameters {
            version,
            cipher_suite,
            compression,
            named_group,
        })
    }

    /// The extensions for our ServerHello, or `None` if there are none.
    pub fn server_extensions(&self) -> Result<Option<Vec<ServerExtension>>, Error> {
        let params = self.negotiated_params("server_extensions")?;
        Ok(ext::build_server_extensions(
            params.cipher_suite,
            self.client_ecc.point_formats.as_deref(),
        ))
    }

    /// Supplemental data to send after the ServerHello.  We have none.
    pub fn server_supplemental_data(&self) -> Option<Vec<SupplementalDataEntry>> {
        None
    }

    /// The CertificateRequest to send, if the configuration asks for one.
    pub fn certificate_request(&self) -> Result<Option<CertificateRequestPayload>, Error> {
        let params = self.negotiated_params("certificate_request")?;
        let req = match &self.config.client_cert_request {
            Some(req) => req,
            None => return Ok(None),
        };

        let sigschemes = match params.version {
            ProtocolVersion::TLSv1_2 => Some(req.signature_schemes.clone()),
            _ => None,
        };

        Ok(Some(CertificateRequestPayload {
            certtypes: req.certificate_types.clone(),
            sigschemes,
            canames: req.authorities.clone(),
        }))
    }

    /// The compression object for the chosen method.
    ///
    /// Only [`Compression::Null`] is implemented; choosing anything else is
    /// an internal error.
    pub fn compression(&mut self) -> Result<NullCompression, Error> {
        let compression = self.negotiated_params("compression")?.compression;
        match compression {
            Compression::Null => Ok(NullCompression),
            other => Err(self.abort(InternalError::UnimplementedCompression(other).into())),
        }
    }

    /// Handle the client's SupplementalData, or its absence.
    pub fn process_client_supplemental_data(
        &mut self,
        data: Option<&[SupplementalDataEntry]>,
    ) -> Result<(), Error> {
        self.require(HandshakeState::Negotiated, "process_client_supplemental_data")?;
        ext::process_supplemental_data(data).map_err(|err| self.abort(err))
    }

    /// Check and keep the client's certificate chain.
    ///
    /// An empty chain is accepted unless the request was mandatory.
    pub fn notify_client_certificate(
        &mut self,
        chain: Vec<CertificateDer<'static>>,
    ) -> Result<(), Error> {
        self.require(HandshakeState::Negotiated, "notify_client_certificate")?;
        self.check_client_certificate(&chain)
            .map_err(|err| self.abort(err))?;
        trace!("client sent {} certificate(s)", chain.len());
        self.client_certificates = chain;
        Ok(())
    }

    fn check_client_certificate(&self, chain: &[CertificateDer<'static>]) -> Result<(), Error> {
        let req = match &self.config.client_cert_request {
            Some(req) => req,
            None => {
                return Err(Error::InappropriateHandshakeMessage {
                    expect_types: vec![HandshakeType::ClientKeyExchange],
                    got_type: HandshakeType::Certificate,
                })
            }
        };

        if chain.is_empty() && req.mandatory {
            return Err(CertificateError::NotPresented.into());
        }

        for cert in chain {
            self.config.cert_codec.decode(cert)?;
        }
        Ok(())
    }

    /// Record what the key exchange produced.
    pub fn notify_key_exchange(&mut self, outcome: KeyExchangeOutcome) -> Result<(), Error> {
        self.require(HandshakeState::Negotiated, "notify_key_exchange")?;
        self.key_exchange = Some(outcome);
        Ok(())
    }

    /// Finish the handshake, turning what was negotiated into a
    /// [`SessionRecord`].
    ///
    /// This succeeds only once.
    pub fn notify_handshake_complete(&mut self) -> Result<SessionRecord, Error> {
        if self.state == HandshakeState::Complete {
            return Err(ApiMisuse::HandshakeAlreadyComplete.into());
        }
        let params = *self.negotiated_params("notify_handshake_complete")?;

        self.advance(HandshakeState::Complete);
        Ok(SessionRecord {
            version: params.version,
            cipher_suite: params.cipher_suite,
            compression: params.compression,
            named_group: params.named_group,
            key_exchange: self.key_exchange.take(),
            client_certificates: std::mem::take(&mut self.client_certificates),
        })
    }

    /// Abandon the handshake because of `err`.
    ///
    /// Returns `err` for convenience.  Calling this more than once keeps
    /// the first alert, and a completed handshake stays complete.
    pub(crate) fn abort(&mut self, err: Error) -> Error {
        if !matches!(
            self.state,
            HandshakeState::Aborted | HandshakeState::Complete
        ) {
            debug!("handshake aborted in {:?}: {}", self.state, err);
            self.state = HandshakeState::Aborted;
            self.fatal_alert = AlertDescription::try_from(&err).ok();
        }
        err
    }

    fn negotiated_params(&self, operation: &'static str) -> Result<&NegotiatedParameters, Error> {
        self.require(HandshakeState::Negotiated, operation)?;
        self.negotiated
            .as_ref()
            .ok_or_else(|| self.out_of_order(operation))
    }

    fn require(&self, expected: HandshakeState, operation: &'static str) -> Result<(), Error> {
        match self.state {
            state if state == expected => Ok(()),
            HandshakeState::Aborted => Err(ApiMisuse::HandshakeAborted.into()),
            _ => Err(self.out_of_order(operation)),
        }
    }

    fn out_of_order(&self, operation: &'static str) -> Error {
        ApiMisuse::OutOfOrder {
            operation,
            state: self.state.as_str(),
        }
        .into()
    }

    fn advance(&mut self, next: HandshakeState) {
        trace!("handshake {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl fmt::Debug for ServerHandshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandshake")
            .field("state", &self.state)
            .field("fatal_alert", &self.fatal_alert)
            .field("negotiated", &self.negotiated)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PeerMisbehaved;
    use crate::msgs::base::{PayloadU16, PayloadU8};
    use crate::msgs::enums::ECPointFormat;
    use crate::server::config::ClientCertRequest;
    use crate::versions::{TLS10, TLS11};

    const ECDHE: CipherSuite = CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256;
    const RSA: CipherSuite = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA;

    fn config() -> Arc<ServerConfig> {
        Arc::new(ServerConfig::builder().build().unwrap())
    }

    fn offered(hs: &mut ServerHandshake, suites: &[CipherSuite]) {
        hs.notify_client_version(ProtocolVersion::TLSv1_2)
            .unwrap();
        hs.notify_offered_cipher_suites(suites)
            .unwrap();
        hs.notify_offered_compression_methods(&[Compression::Null])
            .unwrap();
        hs.notify_secure_renegotiation(true)
            .unwrap();
    }

    fn negotiated(config: Arc<ServerConfig>) -> ServerHandshake {
        let mut hs = ServerHandshake::new(config);
        offered(&mut hs, &[ECDHE, RSA]);
        hs.process_client_extensions(&[]).unwrap();
        hs.negotiate().unwrap();
        hs
    }

    #[test]
    fn happy_path() {
        let mut hs = ServerHandshake::new(config());
        assert_eq!(hs.state(), HandshakeState::Start);
        offered(&mut hs, &[RSA, ECDHE]);
        assert!(hs.ecc_cipher_suites_offered());
        assert_eq!(hs.state(), HandshakeState::CompressionOffered);

        hs.process_client_extensions(&[
            ClientExtension::NamedGroups(vec![NamedGroup::secp256r1]),
            ClientExtension::EcPointFormats(vec![ECPointFormat::Uncompressed]),
        ])
        .unwrap();
        assert_eq!(hs.state(), HandshakeState::ExtensionsProcessed);

        let params = hs.negotiate().unwrap();
        assert_eq!(
            params,
            NegotiatedParameters {
                version: ProtocolVersion::TLSv1_2,
                cipher_suite: ECDHE,
                compression: Compression::Null,
                named_group: Some(NamedGroup::secp256r1),
            }
        );
        assert_eq!(hs.negotiated(), Some(&params));
        assert_eq!(hs.state(), HandshakeState::Negotiated);

        assert_eq!(
            hs.server_extensions().unwrap(),
            Some(vec![ServerExtension::EcPointFormats(
                ECPointFormat::SUPPORTED.to_vec()
            )])
        );
        assert_eq!(hs.server_supplemental_data(), None);
        assert_eq!(hs.certificate_request(), Ok(None));
        assert_eq!(hs.compression(), Ok(NullCompression));
        hs.process_client_supplemental_data(None)
            .unwrap();

        let record = hs.notify_handshake_complete().unwrap();
        assert_eq!(record.cipher_suite, ECDHE);
        assert_eq!(record.named_group, Some(NamedGroup::secp256r1));
        assert_eq!(hs.state(), HandshakeState::Complete);
        assert_eq!(hs.fatal_alert(), None);
    }

    #[test]
    fn completion_fires_once() {
        let mut hs = negotiated(config());
        hs.notify_handshake_complete().unwrap();
        assert_eq!(
            hs.notify_handshake_complete(),
            Err(ApiMisuse::HandshakeAlreadyComplete.into())
        );
        assert_eq!(hs.state(), HandshakeState::Complete);
    }

    #[test]
    fn out_of_order_calls_change_nothing() {
        let mut hs = ServerHandshake::new(config());
        assert_eq!(
            hs.negotiate(),
            Err(ApiMisuse::OutOfOrder {
                operation: "negotiate",
                state: "Start"
            }
            .into())
        );
        assert_eq!(
            hs.notify_offered_cipher_suites(&[RSA]),
            Err(ApiMisuse::OutOfOrder {
                operation: "notify_offered_cipher_suites",
                state: "Start"
            }
            .into())
        );
        assert_eq!(hs.state(), HandshakeState::Start);
        assert_eq!(hs.fatal_alert(), None);

        hs.notify_client_version(ProtocolVersion::TLSv1_2)
            .unwrap();
        assert!(matches!(
            hs.notify_client_version(ProtocolVersion::TLSv1_2),
            Err(Error::ApiMisuse(ApiMisuse::OutOfOrder { .. }))
        ));
        assert_eq!(hs.state(), HandshakeState::VersionNotified);
    }

    #[test]
    fn extensions_need_renegotiation_indicator_first() {
        let mut hs = ServerHandshake::new(config());
        hs.notify_client_version(ProtocolVersion::TLSv1_2)
            .unwrap();
        hs.notify_offered_cipher_suites(&[RSA])
            .unwrap();
        hs.notify_offered_compression_methods(&[Compression::Null])
            .unwrap();
        assert!(matches!(
            hs.process_client_extensions(&[]),
            Err(Error::ApiMisuse(ApiMisuse::OutOfOrder { .. }))
        ));

        hs.notify_secure_renegotiation(true)
            .unwrap();
        assert!(matches!(
            hs.notify_secure_renegotiation(true),
            Err(Error::ApiMisuse(ApiMisuse::OutOfOrder { .. }))
        ));
        hs.process_client_extensions(&[]).unwrap();
    }

    #[test]
    fn missing_renegotiation_indicator_aborts() {
        let mut hs = ServerHandshake::new(config());
        hs.notify_client_version(ProtocolVersion::TLSv1_2)
            .unwrap();
        hs.notify_offered_cipher_suites(&[RSA])
            .unwrap();
        hs.notify_offered_compression_methods(&[Compression::Null])
            .unwrap();
        assert_eq!(
            hs.notify_secure_renegotiation(false),
            Err(PeerIncompatible::SecureRenegotiationUnsupported.into())
        );
        assert_eq!(hs.state(), HandshakeState::Aborted);
        assert_eq!(hs.fatal_alert(), Some(AlertDescription::HandshakeFailure));

        assert_eq!(
            hs.process_client_extensions(&[]),
            Err(ApiMisuse::HandshakeAborted.into())
        );
        assert_eq!(hs.negotiate(), Err(ApiMisuse::HandshakeAborted.into()));
        assert_eq!(
            hs.notify_handshake_complete(),
            Err(ApiMisuse::HandshakeAborted.into())
        );
        assert_eq!(hs.fatal_alert(), Some(AlertDescription::HandshakeFailure));
    }

    #[test]
    fn ecc_extensions_without_ecc_suites_abort() {
        let mut hs = ServerHandshake::new(config());
        offered(&mut hs, &[RSA]);
        assert!(!hs.ecc_cipher_suites_offered());
        assert_eq!(
            hs.process_client_extensions(&[ClientExtension::EcPointFormats(vec![
                ECPointFormat::Uncompressed
            ])]),
            Err(PeerMisbehaved::EllipticCurveExtensionsWithoutEccSuites.into())
        );
        assert_eq!(hs.fatal_alert(), Some(AlertDescription::IllegalParameter));
    }

    #[test]
    fn version_negotiation() {
        let config = Arc::new(
            ServerConfig::builder()
                .with_protocol_versions(&TLS10, &TLS11)
                .build()
                .unwrap(),
        );
        let params = negotiated(Arc::clone(&config))
            .negotiated()
            .copied()
            .unwrap();
        assert_eq!(params.version, ProtocolVersion::TLSv1_1);

        let mut hs = ServerHandshake::new(config);
        hs.notify_client_version(ProtocolVersion::SSLv3)
            .unwrap();
        hs.notify_offered_cipher_suites(&[RSA])
            .unwrap();
        hs.notify_offered_compression_methods(&[Compression::Null])
            .unwrap();
        hs.notify_secure_renegotiation(true)
            .unwrap();
        hs.process_client_extensions(&[]).unwrap();
        assert_eq!(
            hs.negotiate(),
            Err(PeerIncompatible::ClientVersionTooLow.into())
        );
        assert_eq!(hs.fatal_alert(), Some(AlertDescription::ProtocolVersion));
    }

    #[test]
    fn ecc_disabled_without_common_curve() {
        let mut hs = ServerHandshake::new(config());
        offered(&mut hs, &[ECDHE, RSA]);
        hs.process_client_extensions(&[ClientExtension::NamedGroups(vec![
            NamedGroup::brainpoolP256r1,
        ])])
        .unwrap();
        let params = hs.negotiate().unwrap();
        assert_eq!(params.cipher_suite, RSA);
        assert_eq!(params.named_group, None);
        assert_eq!(hs.server_extensions(), Ok(None));
    }

    #[test]
    fn unimplemented_compression_is_internal_error() {
        let config = Arc::new(
            ServerConfig::builder()
                .with_compression_methods(&[Compression::Deflate, Compression::Null])
                .build()
                .unwrap(),
        );
        let mut hs = ServerHandshake::new(config);
        hs.notify_client_version(ProtocolVersion::TLSv1_2)
            .unwrap();
        hs.notify_offered_cipher_suites(&[RSA])
            .unwrap();
        hs.notify_offered_compression_methods(&[Compression::Null, Compression::Deflate])
            .unwrap();
        hs.notify_secure_renegotiation(true)
            .unwrap();
        hs.process_client_extensions(&[]).unwrap();
        assert_eq!(hs.negotiate().unwrap().compression, Compression::Deflate);

        assert_eq!(
            hs.compression(),
            Err(InternalError::UnimplementedCompression(Compression::Deflate).into())
        );
        assert_eq!(hs.fatal_alert(), Some(AlertDescription::InternalError));
    }

    #[test]
    fn unsolicited_supplemental_data() {
        let mut hs = negotiated(config());
        let entry = SupplementalDataEntry {
            data_type: 0x4002,
            data: PayloadU16::new(vec![0]),
        };
        assert_eq!(
            hs.process_client_supplemental_data(Some(&[entry])),
            Err(PeerMisbehaved::UnsolicitedSupplementalData.into())
        );
        assert_eq!(hs.fatal_alert(), Some(AlertDescription::UnexpectedMessage));
    }

    #[test]
    fn certificate_request_follows_version() {
        let config = Arc::new(
            ServerConfig::builder()
                .with_client_cert_request(ClientCertRequest::new(false))
                .build()
                .unwrap(),
        );
        let hs = negotiated(Arc::clone(&config));
        let req = hs.certificate_request().unwrap().unwrap();
        assert!(req.sigschemes.is_some());

        let config = Arc::new(
            ServerConfig::builder()
                .with_protocol_versions(&TLS10, &TLS11)
                .with_client_cert_request(ClientCertRequest::new(false))
                .build()
                .unwrap(),
        );
        let hs = negotiated(config);
        let req = hs.certificate_request().unwrap().unwrap();
        assert_eq!(req.sigschemes, None);
    }

    #[test]
    fn client_certificates() {
        let optional = Arc::new(
            ServerConfig::builder()
                .with_client_cert_request(ClientCertRequest::new(false))
                .build()
                .unwrap(),
        );
        let mut hs = negotiated(Arc::clone(&optional));
        hs.notify_client_certificate(vec![]).unwrap();

        let mut hs = negotiated(optional);
        let cert = CertificateDer::from(vec![0x30, 0x00]);
        hs.notify_client_certificate(vec![cert.clone()])
            .unwrap();
        hs.notify_key_exchange(KeyExchangeOutcome::Opaque(PayloadU16::new(vec![1])))
            .unwrap();
        let record = hs.notify_handshake_complete().unwrap();
        assert_eq!(record.client_certificates, vec![cert]);
        assert_eq!(
            record.key_exchange,
            Some(KeyExchangeOutcome::Opaque(PayloadU16::new(vec![1])))
        );

        let mandatory = Arc::new(
            ServerConfig::builder()
                .with_client_cert_request(ClientCertRequest::new(true))
                .build()
                .unwrap(),
        );
        let mut hs = negotiated(config());
        assert!(matches!(
            hs.notify_client_certificate(vec![]),
            Err(Error::InappropriateHandshakeMessage { .. })
        ));
        assert_eq!(hs.fatal_alert(), Some(AlertDescription::UnexpectedMessage));

        let mut hs = negotiated(Arc::clone(&mandatory));
        assert_eq!(
            hs.notify_client_certificate(vec![]),
            Err(CertificateError::NotPresented.into())
        );
        assert_eq!(hs.fatal_alert(), Some(AlertDescription::HandshakeFailure));

        let mut hs = negotiated(mandatory);
        assert_eq!(
            hs.notify_client_certificate(vec![CertificateDer::from(vec![0x30, 0x05])]),
            Err(CertificateError::BadEncoding.into())
        );
        assert_eq!(hs.fatal_alert(), Some(AlertDescription::BadCertificate));
    }

    #[test]
    fn ecdhe_outcome_reaches_record() {
        let mut hs = negotiated(config());
        hs.notify_key_exchange(KeyExchangeOutcome::Ecdhe {
            group: NamedGroup::X25519,
            premaster: PayloadU8::new(vec![7; 32]),
        })
        .unwrap();
        let record = hs.notify_handshake_complete().unwrap();
        assert_eq!(
            record
                .key_exchange
                .as_ref()
                .and_then(|kx| kx.premaster_secret()),
            Some(&[7u8; 32][..])
        );
    }
}
