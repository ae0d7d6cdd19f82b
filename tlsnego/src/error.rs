use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::enums::{AlertDescription, CipherSuite, ContentType, HandshakeType};
use crate::msgs::enums::{Compression, NamedGroup};
use crate::rand;

/// tlsnego reports protocol errors using this type.
///
/// Errors raised while negotiating are fatal: the connection that produced
/// one sends at most a single alert (see the [`TryFrom<&Error>`] impl on
/// [`AlertDescription`]) and then refuses further processing.
#[non_exhaustive]
#[derive(Debug, PartialEq, Clone)]
pub enum Error {
    /// We received a TLS message that isn't valid right now.
    /// `expect_types` lists the message types we can expect right now.
    /// `got_type` is the type we found.  This error is typically
    /// caused by a buggy TLS stack (the peer or this one), a broken
    /// network, or an attack.
    InappropriateMessage {
        /// Which types we expected
        expect_types: Vec<ContentType>,
        /// What type we received
        got_type: ContentType,
    },

    /// We received a TLS handshake message that isn't valid right now.
    /// `expect_types` lists the handshake message types we can expect
    /// right now.  `got_type` is the type we found.
    InappropriateHandshakeMessage {
        /// Which handshake type we expected
        expect_types: Vec<HandshakeType>,
        /// What handshake type we received
        got_type: HandshakeType,
    },

    /// The peer sent us a TLS message with invalid contents.
    InvalidMessage(InvalidMessage),

    /// The peer presented a certificate we could not accept.
    InvalidCertificate(CertificateError),

    /// The peer doesn't support a protocol version/feature we require.
    /// The parameter gives a hint as to what version/feature it is.
    PeerIncompatible(PeerIncompatible),

    /// The peer deviated from the standard TLS protocol.
    /// The parameter gives a hint where.
    PeerMisbehaved(PeerMisbehaved),

    /// We received a fatal alert.  This means the peer is unhappy.
    AlertReceived(AlertDescription),

    /// The peer sent an oversized record/fragment.
    PeerSentOversizedRecord,

    /// A sealed session record could not be opened.
    DecryptError,

    /// The negotiated parameters need a certificate and none is configured.
    NoSuitableCertificate,

    /// A catch-all error for unlikely errors.
    General(String),

    /// We failed to acquire random bytes from the system.
    FailedToGetRandomBytes,

    /// This function doesn't work until the TLS handshake
    /// is complete.
    HandshakeNotComplete,

    /// A selection was made that this implementation cannot act on.
    ///
    /// This indicates a bug or a misconfiguration, not peer misbehaviour.
    Internal(InternalError),

    /// The caller misused the API.
    ///
    /// This only results from the ordering of calls, so these can be
    /// determined and fixed by reading the code.  They are never caused by
    /// untrusted data and never produce an alert.
    ApiMisuse(ApiMisuse),

    /// Any other error.
    ///
    /// This variant should only be used when the error is not better described by a more
    /// specific variant. For example, if a custom signing key exposes a
    /// provider specific error.
    ///
    /// Enums holding this variant will never compare equal to each other.
    Other(OtherError),
}

/// Determine which alert should be sent for a given error.
///
/// If this mapping fails, no alert is sent.
impl TryFrom<&Error> for AlertDescription {
    type Error = ();

    fn try_from(error: &Error) -> Result<Self, Self::Error> {
        Ok(match error {
            Error::InappropriateMessage { .. } | Error::InappropriateHandshakeMessage { .. } => {
                Self::UnexpectedMessage
            }
            Error::InvalidMessage(e) => Self::from(*e),
            Error::InvalidCertificate(e) => Self::from(*e),
            Error::PeerMisbehaved(e) => Self::from(*e),
            Error::PeerIncompatible(e) => Self::from(*e),
            Error::PeerSentOversizedRecord => Self::RecordOverflow,
            Error::NoSuitableCertificate => Self::HandshakeFailure,
            Error::Internal(_) | Error::FailedToGetRandomBytes | Error::General(_) => {
                Self::InternalError
            }

            _ => return Err(()),
        })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InappropriateMessage {
                expect_types,
                got_type,
            } => write!(
                f,
                "received unexpected message: got {:?} when expecting {}",
                got_type,
                join::<ContentType>(expect_types)
            ),
            Self::InappropriateHandshakeMessage {
                expect_types,
                got_type,
            } => write!(
                f,
                "received unexpected handshake message: got {:?} when expecting {}",
                got_type,
                join::<HandshakeType>(expect_types)
            ),
            Self::InvalidMessage(typ) => {
                write!(f, "received corrupt message of type {:?}", typ)
            }
            Self::InvalidCertificate(err) => {
                write!(f, "invalid peer certificate: {:?}", err)
            }
            Self::PeerIncompatible(why) => write!(f, "peer is incompatible: {:?}", why),
            Self::PeerMisbehaved(why) => write!(f, "peer misbehaved: {:?}", why),
            Self::AlertReceived(alert) => write!(f, "received fatal alert: the peer {}", alert),
            Self::PeerSentOversizedRecord => write!(f, "peer sent excess record size"),
            Self::DecryptError => write!(f, "cannot open sealed session record"),
            Self::NoSuitableCertificate => write!(f, "no suitable certificate found"),
            Self::General(err) => write!(f, "unexpected error: {}", err),
            Self::FailedToGetRandomBytes => write!(f, "failed to get random bytes"),
            Self::HandshakeNotComplete => write!(f, "handshake not complete"),
            Self::Internal(why) => write!(f, "internal error: {:?}", why),
            Self::ApiMisuse(why) => write!(f, "API misuse: {:?}", why),
            Self::Other(err) => write!(f, "other error: {}", err),
        }
    }
}

impl StdError for Error {}

impl From<InvalidMessage> for Error {
    #[inline]
    fn from(e: InvalidMessage) -> Self {
        Self::InvalidMessage(e)
    }
}

impl From<CertificateError> for Error {
    #[inline]
    fn from(e: CertificateError) -> Self {
        Self::InvalidCertificate(e)
    }
}

impl From<PeerMisbehaved> for Error {
    #[inline]
    fn from(e: PeerMisbehaved) -> Self {
        Self::PeerMisbehaved(e)
    }
}

impl From<PeerIncompatible> for Error {
    #[inline]
    fn from(e: PeerIncompatible) -> Self {
        Self::PeerIncompatible(e)
    }
}

impl From<InternalError> for Error {
    #[inline]
    fn from(e: InternalError) -> Self {
        Self::Internal(e)
    }
}

impl From<ApiMisuse> for Error {
    fn from(e: ApiMisuse) -> Self {
        Self::ApiMisuse(e)
    }
}

impl From<OtherError> for Error {
    fn from(value: OtherError) -> Self {
        Self::Other(value)
    }
}

impl From<rand::GetRandomFailed> for Error {
    fn from(_: rand::GetRandomFailed) -> Self {
        Self::FailedToGetRandomBytes
    }
}

/// A corrupt TLS message payload that resulted in an error.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidMessage {
    /// An advertised message was larger then expected.
    HandshakePayloadTooLarge,
    /// An unknown content type was encountered during message decoding.
    InvalidContentType,
    /// A message was zero-length when its record kind forbids it.
    InvalidEmptyPayload,
    /// A TLS message payload was larger than the protocol allows.
    MessageTooLarge,
    /// Message is shorter than the expected length
    MessageTooShort,
    /// Missing data for the named handshake payload value
    MissingData(&'static str),
    /// Trailing data found for the named handshake payload value
    TrailingData(&'static str),
    /// An unknown TLS protocol was encountered during message decoding.
    UnknownProtocolVersion,
    /// A peer sent an unknown elliptic curve type.
    UnsupportedCurveType,
    /// A peer sent an empty list of items, but a non-empty list is required.
    ///
    /// The argument names the context.
    IllegalEmptyList(&'static str),
}

impl From<InvalidMessage> for AlertDescription {
    fn from(e: InvalidMessage) -> Self {
        match e {
            InvalidMessage::MessageTooLarge => Self::RecordOverflow,
            InvalidMessage::UnsupportedCurveType => Self::IllegalParameter,
            _ => Self::DecodeError,
        }
    }
}

/// The ways in which a certificate received from, or destined for, the peer
/// can be unacceptable.
///
/// This covers structure only: path validation is not performed here.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CertificateError {
    /// The certificate is not correctly encoded.
    BadEncoding,

    /// A certificate was required and the peer sent an empty chain.
    NotPresented,
}

impl From<CertificateError> for AlertDescription {
    fn from(e: CertificateError) -> Self {
        match e {
            CertificateError::BadEncoding => Self::BadCertificate,
            CertificateError::NotPresented => Self::HandshakeFailure,
        }
    }
}

/// The set of cases where we failed to make a connection because we thought
/// the peer was misbehaving.
///
/// This is `non_exhaustive`: we might add or stop using items here in minor
/// versions.
#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PeerMisbehaved {
    DuplicateClientHelloExtensions,
    EllipticCurveExtensionsWithoutEccSuites,
    IllegalAlertLevel(u8, AlertDescription),
    IllegalRenegotiationInfo,
    InvalidKeyShare,
    MessageInterleavedWithHandshakeMessage,
    UnsolicitedSupplementalData,
}

impl From<PeerMisbehaved> for AlertDescription {
    fn from(e: PeerMisbehaved) -> Self {
        match e {
            PeerMisbehaved::UnsolicitedSupplementalData
            | PeerMisbehaved::MessageInterleavedWithHandshakeMessage => Self::UnexpectedMessage,

            PeerMisbehaved::IllegalRenegotiationInfo => Self::HandshakeFailure,

            PeerMisbehaved::IllegalAlertLevel(_, _) => Self::DecodeError,

            _ => Self::IllegalParameter,
        }
    }
}

/// The set of cases where we failed to make a connection because a peer
/// doesn't support a TLS version/feature we require.
///
/// This is `non_exhaustive`: we might add or stop using items here in minor
/// versions.
#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PeerIncompatible {
    ClientVersionTooLow,
    NoCipherSuitesInCommon,
    NoCompressionInCommon,
    NoKxGroupsInCommon,
    NoSignatureSchemesInCommon,
    SecureRenegotiationUnsupported,
}

impl From<PeerIncompatible> for AlertDescription {
    fn from(e: PeerIncompatible) -> Self {
        match e {
            PeerIncompatible::ClientVersionTooLow => Self::ProtocolVersion,
            _ => Self::HandshakeFailure,
        }
    }
}

/// Selections which were negotiated but which this implementation
/// cannot carry out.
#[allow(missing_docs)]
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InternalError {
    UnimplementedCompression(Compression),
    UnimplementedKeyExchange(NamedGroup),
    UnimplementedCipherSuite(CipherSuite),
}

/// Describes cases of API misuse
///
/// Variants here should be sufficiently detailed that the action needed is clear.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiMisuse {
    /// A handshake operation was called in a state that does not allow it.
    ///
    /// `operation` names the call, `state` names the state the handshake was in.
    OutOfOrder {
        /// The operation that was invoked.
        operation: &'static str,
        /// The state the handshake was in at the time.
        state: &'static str,
    },

    /// A negotiation call was made after the handshake failed.
    HandshakeAborted,

    /// The handshake-complete notification was requested more than once.
    HandshakeAlreadyComplete,
}

impl fmt::Display for AlertDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Each reads as a sentence after "the peer".
        let text = match self {
            Self::CloseNotify => "closed the connection",
            Self::UnexpectedMessage => "received an unexpected message",
            Self::RecordOverflow => "rejected an over-length record",
            Self::DecodeError => "failed to decode a message",
            Self::IllegalParameter => "found a field out of range or inconsistent",
            Self::HandshakeFailure => "could not agree on a set of security parameters",
            Self::ProtocolVersion => "did not support a suitable TLS version",
            Self::InsufficientSecurity => "required a higher security level than was offered",
            Self::BadCertificate => "rejected the certificate as corrupt or incorrectly signed",
            Self::NoRenegotiation => "refused to renegotiate",
            Self::UnsupportedExtension => "rejected an unsolicited extension",
            Self::InternalError => "encountered an internal error",
            Self::UserCanceled => "canceled the handshake",
            Self::Unknown(n) => return write!(f, "sent an unknown alert (0x{:02x})", n),
            other => return write!(f, "sent a {:?} alert", other),
        };
        f.write_str(text)
    }
}

fn join<T: fmt::Debug>(items: &[T]) -> String {
    items
        .iter()
        .map(|x| format!("{:?}", x))
        .collect::<Vec<String>>()
        .join(" or ")
}

mod other_error {
    use super::*;

    /// Any other error that cannot be expressed by a more specific [`Error`]
    /// variant.
    ///
    /// For example, an `OtherError` could be produced by a custom signing
    /// key exposing a provider specific error.
    ///
    /// Enums holding this type will never compare equal to each other.
    #[derive(Debug, Clone)]
    pub struct OtherError(Arc<dyn StdError + Send + Sync>);

    impl OtherError {
        /// Create a new `OtherError` from any error type.
        pub fn new(err: impl StdError + Send + Sync + 'static) -> Self {
            Self(Arc::new(err))
        }
    }

    impl PartialEq<Self> for OtherError {
        fn eq(&self, _other: &Self) -> bool {
            false
        }
    }

    impl fmt::Display for OtherError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl StdError for OtherError {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(self.0.as_ref())
        }
    }
}

pub use other_error::OtherError;
