//! Choosing one value from what the client offered and what we support.
//!
//! Everything here is a pure function of its arguments.  The server's own
//! list always decides the order of preference; the client's order is
//! ignored.

use crate::enums::{CipherSuite, ProtocolVersion};
use crate::error::{Error, PeerIncompatible};
use crate::kx::SupportedKxGroup;
#[cfg(feature = "logging")]
use crate::log::debug;
use crate::msgs::enums::{Compression, ECPointFormat, NamedGroup};

/// Choose the protocol version for this connection.
///
/// A client version inside `[min, max]` is used unchanged.  A client
/// version newer than `max` gets `max`.  A client version older than `min`
/// (or from another protocol family) is refused with
/// [`PeerIncompatible::ClientVersionTooLow`].
pub fn select_version(
    client: ProtocolVersion,
    min: ProtocolVersion,
    max: ProtocolVersion,
) -> Result<ProtocolVersion, Error> {
    if !min.is_equal_or_earlier_version_of(client) {
        return Err(PeerIncompatible::ClientVersionTooLow.into());
    }

    let version = match client.is_equal_or_earlier_version_of(max) {
        true => client,
        false => max,
    };
    debug!("Client offered {:?}; negotiated {:?}", client, version);
    Ok(version)
}

/// Choose the first suite of `server` that the client offered.
///
/// ECC suites are skipped unless `ecc_enabled`.
pub fn select_cipher_suite(
    server: &[CipherSuite],
    offered: &[CipherSuite],
    ecc_enabled: bool,
) -> Result<CipherSuite, Error> {
    let suite = server
        .iter()
        .find(|cs| offered.contains(cs) && (ecc_enabled || !cs.is_ecc()))
        .copied()
        .ok_or(PeerIncompatible::NoCipherSuitesInCommon)?;

    debug!("decided upon suite {:?}", suite);
    Ok(suite)
}

/// Choose the first compression method of `server` that the client offered.
pub fn select_compression_method(
    server: &[Compression],
    offered: &[Compression],
) -> Result<Compression, Error> {
    let method = server
        .iter()
        .find(|m| offered.contains(m))
        .copied()
        .ok_or(PeerIncompatible::NoCompressionInCommon)?;

    debug!("decided upon compression {:?}", method);
    Ok(method)
}

/// Decide whether ECC suites may be chosen for this client.
///
/// A client that omitted the named curves extension leaves the curve to us,
/// so any supported curve will do.  Otherwise at least one of its curves
/// must be one of ours.  Point formats are checked by
/// [`supports_client_point_formats`].
pub fn supports_client_ecc_capabilities(
    named_groups: Option<&[NamedGroup]>,
    point_formats: Option<&[ECPointFormat]>,
    supported: &[&'static SupportedKxGroup],
) -> bool {
    let curves = match named_groups {
        None => !supported.is_empty(),
        Some(groups) => supported
            .iter()
            .any(|skxg| groups.contains(&skxg.name)),
    };

    let ecc = curves && supports_client_point_formats(point_formats);
    debug!("ECC cipher suites enabled: {}", ecc);
    ecc
}

/// Whether we can talk to a client that sent `point_formats`.
///
/// Every format in [`ECPointFormat::SUPPORTED`] can be parsed and the
/// uncompressed format is mandatory for all clients, so this always
/// accepts.
pub fn supports_client_point_formats(_point_formats: Option<&[ECPointFormat]>) -> bool {
    true
}

/// Choose the curve for ephemeral ECDH: our first curve the client offered,
/// or simply our first curve if it offered none.
pub fn select_named_group(
    named_groups: Option<&[NamedGroup]>,
    supported: &[&'static SupportedKxGroup],
) -> Option<&'static SupportedKxGroup> {
    let group = match named_groups {
        None => supported.first(),
        Some(groups) => supported
            .iter()
            .find(|skxg| groups.contains(&skxg.name)),
    };
    group.copied()
}
