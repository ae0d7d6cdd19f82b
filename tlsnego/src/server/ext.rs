//! Reading the client's extensions and writing ours.

use crate::enums::CipherSuite;
use crate::error::{Error, PeerIncompatible, PeerMisbehaved};
#[cfg(feature = "logging")]
use crate::log::{debug, trace};
use crate::msgs::enums::{ECPointFormat, NamedGroup};
use crate::msgs::handshake::{
    ecpoints_extension, has_duplicate_extension, named_groups_extension,
    renegotiation_info_extension, ClientExtension, ServerExtension, SupplementalDataEntry,
};

/// The elliptic curve extensions a client sent, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientEccCapabilities {
    /// The "elliptic_curves" extension, in the client's order.
    pub named_groups: Option<Vec<NamedGroup>>,
    /// The "ec_point_formats" extension, in the client's order.
    pub point_formats: Option<Vec<ECPointFormat>>,
}

/// Validate the client's extension block and pull out its ECC extensions.
///
/// An absent extension is not an error.  It is an error for an extension
/// type to appear twice, or for ECC extensions to appear when
/// `ecc_suites_offered` is false.
pub fn process_client_extensions(
    extensions: &[ClientExtension],
    ecc_suites_offered: bool,
) -> Result<ClientEccCapabilities, Error> {
    if has_duplicate_extension(extensions) {
        return Err(PeerMisbehaved::DuplicateClientHelloExtensions.into());
    }

    let caps = ClientEccCapabilities {
        named_groups: named_groups_extension(extensions).map(<[_]>::to_vec),
        point_formats: ecpoints_extension(extensions).map(<[_]>::to_vec),
    };
    trace!("client ECC extensions: {:?}", caps);

    if !ecc_suites_offered && (caps.named_groups.is_some() || caps.point_formats.is_some()) {
        return Err(PeerMisbehaved::EllipticCurveExtensionsWithoutEccSuites.into());
    }

    Ok(caps)
}

/// Work out which extensions to put in the ServerHello for `suite`.
///
/// The point formats extension is sent only for an ECC suite, and only if
/// the client sent one.  `None` means there is nothing to send, so the
/// extension block can be left out.
pub fn build_server_extensions(
    suite: CipherSuite,
    client_point_formats: Option<&[ECPointFormat]>,
) -> Option<Vec<ServerExtension>> {
    match suite.is_ecc() && client_point_formats.is_some() {
        true => Some(vec![ServerExtension::EcPointFormats(
            ECPointFormat::SUPPORTED.to_vec(),
        )]),
        false => None,
    }
}

/// Did the client signal support for secure renegotiation (RFC 5746)?
///
/// Either the signalling suite or an empty "renegotiation_info" extension
/// counts.  A non-empty "renegotiation_info" in an initial handshake is
/// refused.
pub fn secure_renegotiation_indicated(
    offered_suites: &[CipherSuite],
    extensions: &[ClientExtension],
) -> Result<bool, Error> {
    let scsv = offered_suites.contains(&CipherSuite::TLS_EMPTY_RENEGOTIATION_INFO_SCSV);

    match renegotiation_info_extension(extensions) {
        Some(info) if !info.is_empty() => Err(PeerMisbehaved::IllegalRenegotiationInfo.into()),
        Some(_) => Ok(true),
        None => Ok(scsv),
    }
}

/// Refuse a client that did not signal secure renegotiation support.
pub fn process_secure_renegotiation_indicator(present: bool) -> Result<(), Error> {
    debug!("secure renegotiation indicated: {}", present);
    match present {
        true => Ok(()),
        false => Err(PeerIncompatible::SecureRenegotiationUnsupported.into()),
    }
}

/// Handle SupplementalData from the client.
///
/// We never ask for any, so receiving some is an error.
pub fn process_supplemental_data(data: Option<&[SupplementalDataEntry]>) -> Result<(), Error> {
    match data {
        Some(_) => Err(PeerMisbehaved::UnsolicitedSupplementalData.into()),
        None => Ok(()),
    }
}
