use crate::enums::ProtocolVersion;

/// A TLS protocol version this crate can negotiate.
///
/// All possible instances of this class are provided by the library in
/// the [`ALL_VERSIONS`] array, as well as individually as [`TLS10`],
/// [`TLS11`] and [`TLS12`].
#[derive(Debug, PartialEq)]
pub struct SupportedProtocolVersion {
    /// The TLS enumeration naming this version.
    pub version: ProtocolVersion,
    is_private: (),
}

/// TLS1.0
pub static TLS10: SupportedProtocolVersion = SupportedProtocolVersion {
    version: ProtocolVersion::TLSv1_0,
    is_private: (),
};

/// TLS1.1
pub static TLS11: SupportedProtocolVersion = SupportedProtocolVersion {
    version: ProtocolVersion::TLSv1_1,
    is_private: (),
};

/// TLS1.2
pub static TLS12: SupportedProtocolVersion = SupportedProtocolVersion {
    version: ProtocolVersion::TLSv1_2,
    is_private: (),
};

/// A list of all the protocol versions supported by tlsnego, oldest first.
pub static ALL_VERSIONS: &[&SupportedProtocolVersion] = &[&TLS10, &TLS11, &TLS12];

/// The lowest version a server accepts by default.
pub static DEFAULT_MIN_VERSION: &SupportedProtocolVersion = &TLS10;

/// The highest version a server negotiates by default.
pub static DEFAULT_MAX_VERSION: &SupportedProtocolVersion = &TLS12;

/// Whether this crate has a wire encoding for `version`.
pub(crate) fn is_supported(version: ProtocolVersion) -> bool {
    ALL_VERSIONS
        .iter()
        .any(|v| v.version == version)
}
