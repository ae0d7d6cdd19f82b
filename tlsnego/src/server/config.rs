use std::fmt;
use std::sync::Arc;

use pki_types::{CertificateDer, PrivateKeyDer};

use crate::enums::{CipherSuite, ProtocolVersion, SignatureScheme};
use crate::error::Error;
use crate::kx::{SupportedKxGroup, ALL_KX_GROUPS};
use crate::msgs::enums::{ClientCertificateType, Compression};
use crate::msgs::handshake::DistinguishedName;
use crate::sign::{self, CertifiedKey};
use crate::suites::DEFAULT_CIPHER_SUITES;
use crate::ticketer::KeyWrap;
use crate::versions::{self, SupportedProtocolVersion};
use crate::x509::{CertificateCodec, DerCertificateCodec};

/// Common configuration for a set of server sessions.
///
/// Making one of these is cheap, though one of the inputs may be expensive:
/// gathering trust roots or loading the certificate and key.  Share one
/// `Arc<ServerConfig>` between all connections; it is never modified once
/// built.
///
/// Make one with [`ServerConfig::builder()`].
#[derive(Clone)]
pub struct ServerConfig {
    /// Our cipher suites, most preferred first.
    pub(crate) cipher_suites: Vec<CipherSuite>,

    /// Our compression methods, most preferred first.
    pub(crate) compression_methods: Vec<Compression>,

    /// The lowest protocol version we accept.
    pub(crate) min_version: ProtocolVersion,

    /// The highest protocol version we negotiate.
    pub(crate) max_version: ProtocolVersion,

    /// Curves for ephemeral ECDH, most preferred first.
    pub(crate) kx_groups: Vec<&'static SupportedKxGroup>,

    /// Our certificate chain and signing key, if any.
    pub(crate) certified_key: Option<Arc<CertifiedKey>>,

    /// Whether and how to ask the client for a certificate.
    pub(crate) client_cert_request: Option<ClientCertRequest>,

    /// Protects sealed session records.
    pub(crate) session_key_wrap: Option<Arc<dyn KeyWrap>>,

    /// Checks certificates on their way in and out.
    pub(crate) cert_codec: Arc<dyn CertificateCodec>,
}

impl ServerConfig {
    /// Create a builder for a server configuration with safe defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Our cipher suites, most preferred first.
    pub fn cipher_suites(&self) -> &[CipherSuite] {
        &self.cipher_suites
    }

    /// Our compression methods, most preferred first.
    pub fn compression_methods(&self) -> &[Compression] {
        &self.compression_methods
    }

    /// The lowest and highest protocol versions we negotiate.
    pub fn protocol_versions(&self) -> (ProtocolVersion, ProtocolVersion) {
        (self.min_version, self.max_version)
    }

    /// Curves for ephemeral ECDH, most preferred first.
    pub fn kx_groups(&self) -> &[&'static SupportedKxGroup] {
        &self.kx_groups
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("cipher_suites", &self.cipher_suites)
            .field("compression_methods", &self.compression_methods)
            .field("min_version", &self.min_version)
            .field("max_version", &self.max_version)
            .field("kx_groups", &self.kx_groups)
            .field("certified_key", &self.certified_key)
            .field("client_cert_request", &self.client_cert_request)
            .field("session_key_wrap", &self.session_key_wrap.is_some())
            .finish_non_exhaustive()
    }
}

/// What to put in a CertificateRequest, and whether an empty answer is
/// acceptable.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientCertRequest {
    /// Kinds of certificate the client may send.
    pub certificate_types: Vec<ClientCertificateType>,

    /// Signature schemes the client may use (only sent from TLS1.2).
    pub signature_schemes: Vec<SignatureScheme>,

    /// Acceptable certificate authorities.  Empty means any.
    pub authorities: Vec<DistinguishedName>,

    /// Fail the handshake if the client sends no certificate.
    pub mandatory: bool,
}

impl ClientCertRequest {
    /// Ask for an ECDSA, Ed25519 or RSA certificate from any authority.
    pub fn new(mandatory: bool) -> Self {
        Self {
            certificate_types: vec![ClientCertificateType::ECDSASign, ClientCertificateType::RSASign],
            signature_schemes: vec![
                SignatureScheme::ECDSA_NISTP384_SHA384,
                SignatureScheme::ECDSA_NISTP256_SHA256,
                SignatureScheme::ED25519,
                SignatureScheme::RSA_PSS_SHA256,
                SignatureScheme::RSA_PKCS1_SHA256,
            ],
            authorities: Vec::new(),
            mandatory,
        }
    }
}

enum CertChoice {
    None,
    Der(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>),
    Key(Arc<CertifiedKey>),
}

/// Builds a [`ServerConfig`].
///
/// Every setting starts at its safe default; [`ConfigBuilder::build`]
/// checks the combination.
pub struct ConfigBuilder {
    cipher_suites: Vec<CipherSuite>,
    compression_methods: Vec<Compression>,
    min_version: &'static SupportedProtocolVersion,
    max_version: &'static SupportedProtocolVersion,
    kx_groups: Vec<&'static SupportedKxGroup>,
    cert: CertChoice,
    client_cert_request: Option<ClientCertRequest>,
    session_key_wrap: Option<Arc<dyn KeyWrap>>,
    cert_codec: Arc<dyn CertificateCodec>,
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            cipher_suites: DEFAULT_CIPHER_SUITES.to_vec(),
            compression_methods: vec![Compression::Null],
            min_version: versions::DEFAULT_MIN_VERSION,
            max_version: versions::DEFAULT_MAX_VERSION,
            kx_groups: ALL_KX_GROUPS.to_vec(),
            cert: CertChoice::None,
            client_cert_request: None,
            session_key_wrap: None,
            cert_codec: Arc::new(DerCertificateCodec),
        }
    }

    /// Reset suites, compression, versions and curves to safe defaults.
    pub fn with_safe_defaults(mut self) -> Self {
        self.cipher_suites = DEFAULT_CIPHER_SUITES.to_vec();
        self.compression_methods = vec![Compression::Null];
        self.min_version = versions::DEFAULT_MIN_VERSION;
        self.max_version = versions::DEFAULT_MAX_VERSION;
        self.kx_groups = ALL_KX_GROUPS.to_vec();
        self
    }

    /// Choose the cipher suites, most preferred first.
    pub fn with_cipher_suites(mut self, suites: &[CipherSuite]) -> Self {
        self.cipher_suites = suites.to_vec();
        self
    }

    /// Choose the inclusive range of protocol versions.
    pub fn with_protocol_versions(
        mut self,
        min: &'static SupportedProtocolVersion,
        max: &'static SupportedProtocolVersion,
    ) -> Self {
        self.min_version = min;
        self.max_version = max;
        self
    }

    /// Choose the compression methods, most preferred first.
    pub fn with_compression_methods(mut self, methods: &[Compression]) -> Self {
        self.compression_methods = methods.to_vec();
        self
    }

    /// Choose the curves for ephemeral ECDH, most preferred first.
    ///
    /// An empty list disables ECC suites.
    pub fn with_named_groups(mut self, groups: &[&'static SupportedKxGroup]) -> Self {
        self.kx_groups = groups.to_vec();
        self
    }

    /// Use a single certificate chain and matching private key.
    ///
    /// `cert_chain` is a vector of DER-encoded certificates, end-entity
    /// first.  `key_der` is a DER-encoded RSA, ECDSA, or Ed25519 private
    /// key.  Both are checked by [`ConfigBuilder::build`].
    pub fn with_single_cert(
        mut self,
        cert_chain: Vec<CertificateDer<'static>>,
        key_der: PrivateKeyDer<'static>,
    ) -> Self {
        self.cert = CertChoice::Der(cert_chain, key_der);
        self
    }

    /// Use a certificate chain with an already-loaded signing key.
    pub fn with_certified_key(mut self, key: Arc<CertifiedKey>) -> Self {
        self.cert = CertChoice::Key(key);
        self
    }

    /// Do not send a certificate.
    ///
    /// Suites that sign their key exchange will then fail to negotiate.
    pub fn with_no_cert(mut self) -> Self {
        self.cert = CertChoice::None;
        self
    }

    /// Ask clients for a certificate.
    pub fn with_client_cert_request(mut self, request: ClientCertRequest) -> Self {
        self.client_cert_request = Some(request);
        self
    }

    /// Allow completed sessions to be sealed with `wrap`.
    pub fn with_session_key_wrap(mut self, wrap: Arc<dyn KeyWrap>) -> Self {
        self.session_key_wrap = Some(wrap);
        self
    }

    /// Check certificates with `codec` instead of the DER default.
    pub fn with_certificate_codec(mut self, codec: Arc<dyn CertificateCodec>) -> Self {
        self.cert_codec = codec;
        self
    }

    /// Check the settings and make the configuration.
    pub fn build(self) -> Result<ServerConfig, Error> {
        if self.cipher_suites.is_empty() {
            return Err(Error::General("no cipher suites configured".into()));
        }

        if let Some(cs) = self
            .cipher_suites
            .iter()
            .find(|cs| cs.is_signalling())
        {
            return Err(Error::General(format!(
                "{:?} is a signalling value, not a cipher suite",
                cs
            )));
        }

        if self.compression_methods.is_empty() {
            return Err(Error::General("no compression methods configured".into()));
        }

        let (min, max) = (self.min_version.version, self.max_version.version);
        if !versions::is_supported(min) || !versions::is_supported(max) {
            return Err(Error::General("unsupported protocol version".into()));
        }
        if !min.is_equal_or_earlier_version_of(max) {
            return Err(Error::General(format!(
                "minimum version {:?} is later than maximum version {:?}",
                min, max
            )));
        }

        if let Some(req) = &self.client_cert_request {
            if req.certificate_types.is_empty() || req.signature_schemes.is_empty() {
                return Err(Error::General(
                    "client certificate request needs certificate types and signature schemes"
                        .into(),
                ));
            }
        }

        let certified_key = match self.cert {
            CertChoice::None => None,
            CertChoice::Der(chain, key_der) => {
                let key = sign::any_supported_type(&key_der)?;
                Some(Arc::new(CertifiedKey::new(chain, key)))
            }
            CertChoice::Key(key) => Some(key),
        };

        if let Some(ck) = &certified_key {
            ck.end_entity_cert()?;
            for cert in &ck.cert {
                self.cert_codec.encode(cert)?;
            }
        }

        Ok(ServerConfig {
            cipher_suites: self.cipher_suites,
            compression_methods: self.compression_methods,
            min_version: min,
            max_version: max,
            kx_groups: self.kx_groups,
            certified_key,
            client_cert_request: self.client_cert_request,
            session_key_wrap: self.session_key_wrap,
            cert_codec: self.cert_codec,
        })
    }
}
