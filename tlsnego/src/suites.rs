use crate::enums::{CipherSuite, SignatureAlgorithm};

impl CipherSuite {
    /// Whether this suite needs elliptic-curve parameters to be negotiated.
    ///
    /// That is true for every ECDH and ECDHE key exchange, and for ECDSA
    /// authentication, across the RFC 4492, RFC 5289, RFC 5489, RFC 6209,
    /// RFC 6367, RFC 7251 and RFC 7905 code points.  The RFC 5054 SRP
    /// suites sit inside the 0xc0xx block but are not ECC.
    pub fn is_ecc(self) -> bool {
        matches!(
            u16::from(self),
            0xc001..=0xc019
                | 0xc023..=0xc03b
                | 0xc048..=0xc04f
                | 0xc05c..=0xc063
                | 0xc070..=0xc079
                | 0xc086..=0xc08d
                | 0xc09a..=0xc09b
                | 0xc0ac..=0xc0af
                | 0xcca8
                | 0xcca9
                | 0xccac
                | 0xd001..=0xd005
        )
    }

    /// For suites whose ServerKeyExchange carries signed ephemeral ECDH
    /// parameters, the kind of key that must sign them.
    ///
    /// Static ECDH, anonymous and PSK suites return `None`.
    pub fn ecdhe_sign_algorithm(self) -> Option<SignatureAlgorithm> {
        match u16::from(self) {
            0xc006..=0xc00a
            | 0xc023
            | 0xc024
            | 0xc02b
            | 0xc02c
            | 0xc048
            | 0xc049
            | 0xc05c
            | 0xc05d
            | 0xc072
            | 0xc073
            | 0xc086
            | 0xc087
            | 0xc0ac..=0xc0af
            | 0xcca9 => Some(SignatureAlgorithm::ECDSA),
            0xc010..=0xc014
            | 0xc027
            | 0xc028
            | 0xc02f
            | 0xc030
            | 0xc04c
            | 0xc04d
            | 0xc060
            | 0xc061
            | 0xc076
            | 0xc077
            | 0xc08a
            | 0xc08b
            | 0xcca8 => Some(SignatureAlgorithm::RSA),
            _ => None,
        }
    }

    /// Whether the client sends the premaster secret encrypted to the
    /// server's RSA key, with no ServerKeyExchange.
    ///
    /// RSA_PSK and export-grade ServerKeyExchange variants are not included.
    pub fn is_rsa_key_transport(self) -> bool {
        matches!(
            u16::from(self),
            0x0001..=0x0002
                | 0x0004..=0x0005
                | 0x0007
                | 0x0009..=0x000a
                | 0x002f
                | 0x0035
                | 0x003b..=0x003d
                | 0x0041
                | 0x0084
                | 0x0096
                | 0x009c..=0x009d
                | 0x00ba
                | 0x00c0
                | 0xc03c..=0xc03d
                | 0xc050..=0xc051
                | 0xc07a..=0xc07b
                | 0xc09c..=0xc0a3
        )
    }

    /// Whether this is a signalling value rather than a real suite.
    pub(crate) fn is_signalling(self) -> bool {
        matches!(
            self,
            Self::TLS_EMPTY_RENEGOTIATION_INFO_SCSV | Self::TLS_FALLBACK_SCSV
        )
    }
}

/// Returns true if any suite in `suites` is ECC-classified.
pub fn contains_ecc_suites(suites: &[CipherSuite]) -> bool {
    suites
        .iter()
        .any(|cs| cs.is_ecc())
}

/// The cipher suites a server offers when not told otherwise, in
/// preference order.
///
/// Forward-secret ECDHE suites come first; the static-RSA suites at the end
/// keep clients that offer no ECC suites negotiable.
pub static DEFAULT_CIPHER_SUITES: &[CipherSuite] = &[
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
    CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_CBC_SHA,
    CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA,
    CipherSuite::TLS_RSA_WITH_AES_256_GCM_SHA384,
    CipherSuite::TLS_RSA_WITH_AES_128_GCM_SHA256,
    CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA,
    CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
];
