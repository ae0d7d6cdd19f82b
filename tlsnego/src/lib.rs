//! # tlsnego - the server side of TLS handshake negotiation
//!
//! tlsnego decides, for a TLS server, what a connection will use: which
//! protocol version, which cipher suite, which compression method and which
//! elliptic curve.  It reads the client's hello, checks its extensions,
//! answers with the server's first flight, and reports failures to the
//! client as a single fatal alert.
//!
//! ## Current features
//!
//! * TLS1.0, TLS1.1 and TLS1.2 version negotiation within a configured range,
//!   answering newer clients with the highest version we support.
//! * Cipher suite and compression selection in server preference order.
//! * ECC suite gating on the client's "elliptic_curves" and
//!   "ec_point_formats" extensions (RFC 4492, RFC 8422).
//! * Secure renegotiation indication (RFC 5746) is required.
//! * Ephemeral ECDH with curve25519, nistp256 or nistp384, with the
//!   parameters signed by an ECDSA, Ed25519 or RSA key.
//! * Client certificate requests.
//! * Sealing the outcome of a handshake with an AEAD key wrap.
//!
//! ## Non-features
//!
//! tlsnego stops once the client's key exchange has been received.  It does
//! not derive keys, protect records, or carry application data.  Nor does it
//! resume sessions, renegotiate, or speak TLS1.3.
//!
//! ## Design overview
//!
//! The negotiation itself is a sequence of pure functions in
//! [`server::negotiate`](crate::server) and
//! [`server::ext`](crate::server), driven in a fixed order by a
//! [`server::ServerHandshake`].  [`ServerConnection`] puts that state
//! machine behind a byte-oriented interface: it reads records, joins
//! handshake messages, dispatches them and queues our replies.
//!
//! Signing, key wrapping and certificate checks are behind the
//! [`sign::SigningKey`], [`KeyWrap`] and [`CertificateCodec`] traits, with
//! implementations over *ring*.
//!
//! ## Getting started
//!
//! ```no_run
//! use std::net::TcpListener;
//! use std::sync::Arc;
//!
//! let config = Arc::new(tlsnego::ServerConfig::builder().build().unwrap());
//! let listener = TcpListener::bind("127.0.0.1:4443").unwrap();
//! let (mut sock, _) = listener.accept().unwrap();
//!
//! let mut conn = tlsnego::ServerConnection::new(config).unwrap();
//! while conn.wants_read() {
//!     if conn.read_tls(&mut sock).unwrap() == 0 {
//!         break;
//!     }
//!     let result = conn.process_new_packets();
//!     while conn.wants_write() {
//!         conn.write_tls(&mut sock).unwrap();
//!     }
//!     if let Err(err) = result {
//!         println!("handshake failed: {}", err);
//!         break;
//!     }
//! }
//! println!("negotiated: {:?}", conn.negotiated_parameters());
//! ```
//!
//! ## Crate features
//!
//! - `logging`: this, the default, makes the crate output interesting
//!   events using the `log` crate.

// Require docs for public APIs, deny unsafe code, etc.
#![forbid(unsafe_code, unused_must_use)]
#![deny(
    clippy::clone_on_ref_ptr,
    clippy::use_self,
    trivial_casts,
    trivial_numeric_casts,
    missing_docs,
    unreachable_pub,
    unused_import_braces,
    unused_extern_crates,
    unused_qualifications
)]
// Relax these clippy lints:
// - ptr_arg: this triggers on references to type aliases that are Vec
//   underneath.
// - too_many_arguments: some things just need a lot of state, wrapping it
//   doesn't necessarily make it easier to follow what's going on
// - new_ret_no_self: we sometimes return `Arc<Self>`, which seems fine
// - single_component_path_imports: our top-level `use log` import causes
//   a false positive, https://github.com/rust-lang/rust-clippy/issues/5210
// - new_without_default: for internal constructors, the indirection is not
//   helpful
#![allow(
    clippy::too_many_arguments,
    clippy::new_ret_no_self,
    clippy::ptr_arg,
    clippy::single_component_path_imports,
    clippy::new_without_default
)]

// log for logging (optional).
#[cfg(feature = "logging")]
use log;

#[cfg(not(feature = "logging"))]
#[macro_use]
mod log {
    macro_rules! trace    ( ($($tt:tt)*) => {{}} );
    macro_rules! debug    ( ($($tt:tt)*) => {{}} );
    macro_rules! warn     ( ($($tt:tt)*) => {{}} );
    macro_rules! error    ( ($($tt:tt)*) => {{}} );
}

#[macro_use]
mod msgs;
mod common_state;
mod enums;
mod error;
mod kx;
mod rand;
mod suites;
mod ticketer;
mod vecbuf;
mod versions;
mod x509;
#[macro_use]
mod check;

/// Internal classes which may be useful outside the library.
/// The contents of this section DO NOT form part of the stable interface.
pub mod internal {
    /// Low-level TLS message parsing and encoding functions.
    pub mod msgs {
        pub use crate::msgs::*;
    }
}

pub use crate::common_state::Side;
pub use crate::enums::{
    AlertDescription, CipherSuite, ContentType, HandshakeType, ProtocolVersion,
    SignatureAlgorithm, SignatureScheme,
};
pub use crate::error::{
    ApiMisuse, CertificateError, Error, InternalError, InvalidMessage, OtherError,
    PeerIncompatible, PeerMisbehaved,
};
pub use crate::kx::{SupportedKxGroup, ALL_KX_GROUPS};
pub use crate::msgs::enums::{
    AlertLevel, ClientCertificateType, Compression, ECPointFormat, NamedGroup,
};
pub use crate::msgs::persist::{KeyExchangeOutcome, SessionRecord};
pub use crate::rand::GetRandomFailed;
pub use crate::suites::{contains_ecc_suites, DEFAULT_CIPHER_SUITES};
pub use crate::ticketer::{AeadKeyWrap, KeyWrap};
pub use crate::versions::{
    SupportedProtocolVersion, ALL_VERSIONS, DEFAULT_MAX_VERSION, DEFAULT_MIN_VERSION,
};
pub use crate::x509::{CertificateCodec, DerCertificateCodec};

/// Items for use in a server.
pub mod server {
    mod config;
    mod connection;
    mod ext;
    mod hs;
    mod negotiate;

    pub use config::{ClientCertRequest, ConfigBuilder, ServerConfig};
    pub use connection::{IoState, ServerConnection};
    pub use ext::{
        build_server_extensions, process_client_extensions, process_secure_renegotiation_indicator,
        process_supplemental_data, secure_renegotiation_indicated, ClientEccCapabilities,
    };
    pub use hs::{HandshakeState, NegotiatedParameters, NullCompression, ServerHandshake};
    pub use negotiate::{
        select_cipher_suite, select_compression_method, select_named_group, select_version,
        supports_client_ecc_capabilities, supports_client_point_formats,
    };
}

pub use server::{ServerConfig, ServerConnection};

/// All defined named curves appear in this module.
pub mod kx_group {
    pub use crate::kx::{SECP256R1, SECP384R1, X25519};
}

/// All defined protocol versions appear in this module.
pub mod version {
    pub use crate::versions::{TLS10, TLS11, TLS12};
}

/// Message signing interfaces and implementations.
pub mod sign;
