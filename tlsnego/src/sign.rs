use std::fmt;
use std::sync::Arc;

use pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use ring::error::KeyRejected;
use ring::rand::SystemRandom;
use ring::signature::{self, EcdsaKeyPair, Ed25519KeyPair, RsaKeyPair};

use crate::enums::{SignatureAlgorithm, SignatureScheme};
use crate::error::Error;
use crate::x509::{wrap_concat_in_sequence, wrap_in_octet_string};

/// A private key that can sign ServerKeyExchange parameters.
///
/// The handshake never sees key material.  It offers the schemes the
/// client and the cipher suite allow, and signs with whatever comes back.
pub trait SigningKey: Send + Sync {
    /// Pick one of `offered`, or `None` if this key can use none of them.
    ///
    /// `offered` is in the client's order of preference.
    fn choose_scheme(&self, offered: &[SignatureScheme]) -> Option<Box<dyn Signer>>;

    /// The signature algorithm of the key.
    fn algorithm(&self) -> SignatureAlgorithm;
}

/// A key bound to one signature scheme.
pub trait Signer: Send + Sync {
    /// Sign `message`.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error>;

    /// The scheme `sign` uses.
    fn scheme(&self) -> SignatureScheme;
}

/// Our certificate chain, and the key for its end-entity certificate.
#[derive(Clone)]
pub struct CertifiedKey {
    /// The certificate chain.
    pub cert: Vec<CertificateDer<'static>>,

    /// The certified key.
    pub key: Arc<dyn SigningKey>,
}

impl CertifiedKey {
    /// `cert` starts with the end-entity certificate.
    pub fn new(cert: Vec<CertificateDer<'static>>, key: Arc<dyn SigningKey>) -> Self {
        Self { cert, key }
    }

    /// The end-entity certificate.
    pub fn end_entity_cert(&self) -> Result<&CertificateDer<'static>, Error> {
        self.cert
            .first()
            .ok_or(Error::NoSuitableCertificate)
    }
}

impl fmt::Debug for CertifiedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertifiedKey")
            .field("cert", &self.cert.len())
            .field("algorithm", &self.key.algorithm())
            .finish_non_exhaustive()
    }
}

/// Load `der` as an RSA, ECDSA or Ed25519 key.
///
/// PKCS#1 encodings are taken as RSA and SEC1 encodings as ECDSA.  A PKCS#8
/// encoding is tried as each type in turn.
pub fn any_supported_type(der: &PrivateKeyDer<'_>) -> Result<Arc<dyn SigningKey>, Error> {
    let kind = match der {
        PrivateKeyDer::Pkcs1(pkcs1) => rsa_key(RsaKeyPair::from_der(pkcs1.secret_pkcs1_der())),
        PrivateKeyDer::Sec1(_) => ecdsa_key(der),
        PrivateKeyDer::Pkcs8(pkcs8) => rsa_key(RsaKeyPair::from_pkcs8(pkcs8.secret_pkcs8_der()))
            .or_else(|| ecdsa_key(der))
            .or_else(|| ed25519_key(pkcs8)),
        _ => None,
    };

    kind.map(RingSigningKey::boxed)
        .ok_or_else(|| Error::General("failed to parse private key as RSA, ECDSA, or EdDSA".into()))
}

/// Load `der`, in PKCS#8 or SEC1 encoding, as a P-256 or P-384 ECDSA key.
pub fn any_ecdsa_type(der: &PrivateKeyDer<'_>) -> Result<Arc<dyn SigningKey>, Error> {
    ecdsa_key(der)
        .map(RingSigningKey::boxed)
        .ok_or_else(|| Error::General("failed to parse ECDSA private key as PKCS#8 or SEC1".into()))
}

/// Load `der` as an Ed25519 key.
pub fn any_eddsa_type(der: &PrivatePkcs8KeyDer<'_>) -> Result<Arc<dyn SigningKey>, Error> {
    ed25519_key(der)
        .map(RingSigningKey::boxed)
        .ok_or_else(|| Error::General("failed to parse Ed25519 private key".into()))
}

fn rsa_key(parsed: Result<RsaKeyPair, KeyRejected>) -> Option<KeyKind> {
    parsed
        .ok()
        .map(|pair| KeyKind::Rsa(Arc::new(pair)))
}

fn ecdsa_key(der: &PrivateKeyDer<'_>) -> Option<KeyKind> {
    let rng = SystemRandom::new();
    ECDSA_CURVES
        .iter()
        .find_map(|&(scheme, alg, prefix)| {
            let pair = match der {
                PrivateKeyDer::Pkcs8(pkcs8) => {
                    EcdsaKeyPair::from_pkcs8(alg, pkcs8.secret_pkcs8_der(), &rng)
                }
                PrivateKeyDer::Sec1(sec1) => {
                    // ring only reads PKCS#8, so wrap the SEC1 key in one.
                    let pkcs8 = wrap_concat_in_sequence(
                        prefix,
                        &wrap_in_octet_string(sec1.secret_sec1_der()),
                    );
                    EcdsaKeyPair::from_pkcs8(alg, &pkcs8, &rng)
                }
                _ => return None,
            };
            pair.ok()
                .map(|pair| KeyKind::Ecdsa(Arc::new(pair), scheme))
        })
}

fn ed25519_key(der: &PrivatePkcs8KeyDer<'_>) -> Option<KeyKind> {
    Ed25519KeyPair::from_pkcs8_maybe_unchecked(der.secret_pkcs8_der())
        .ok()
        .map(|pair| KeyKind::Ed25519(Arc::new(pair)))
}

/// Each ECDSA curve we sign with: its scheme, ring algorithm, and the
/// PKCS#8 fields preceding the SEC1 key.
///
/// The prefix is an INTEGER version of 0, then a privateKeyAlgorithm
/// SEQUENCE of id-ecPublicKey and the curve OID.
static ECDSA_CURVES: &[(
    SignatureScheme,
    &signature::EcdsaSigningAlgorithm,
    &[u8],
)] = &[
    (
        SignatureScheme::ECDSA_NISTP256_SHA256,
        &signature::ECDSA_P256_SHA256_ASN1_SIGNING,
        b"\x02\x01\x00\x30\x13\x06\x07\x2a\x86\x48\xce\x3d\x02\x01\x06\x08\x2a\x86\x48\xce\x3d\x03\x01\x07",
    ),
    (
        SignatureScheme::ECDSA_NISTP384_SHA384,
        &signature::ECDSA_P384_SHA384_ASN1_SIGNING,
        b"\x02\x01\x00\x30\x10\x06\x07\x2a\x86\x48\xce\x3d\x02\x01\x06\x05\x2b\x81\x04\x00\x22",
    ),
];

/// RSA schemes usable for a ServerKeyExchange signature.  PSS is left out:
/// TLS1.2 clients may not expect it with an rsaEncryption certificate.
static RSA_SCHEMES: &[SignatureScheme] = &[
    SignatureScheme::RSA_PKCS1_SHA256,
    SignatureScheme::RSA_PKCS1_SHA384,
    SignatureScheme::RSA_PKCS1_SHA512,
];

#[derive(Clone)]
enum KeyKind {
    Rsa(Arc<RsaKeyPair>),
    Ecdsa(Arc<EcdsaKeyPair>, SignatureScheme),
    Ed25519(Arc<Ed25519KeyPair>),
}

/// A *ring* private key.
///
/// An RSA key signs with whichever PKCS#1 scheme the client listed first.
/// ECDSA and Ed25519 keys have exactly one scheme, which must be offered.
struct RingSigningKey {
    kind: KeyKind,
}

impl RingSigningKey {
    fn boxed(kind: KeyKind) -> Arc<dyn SigningKey> {
        Arc::new(Self { kind })
    }
}

impl SigningKey for RingSigningKey {
    fn choose_scheme(&self, offered: &[SignatureScheme]) -> Option<Box<dyn Signer>> {
        let scheme = match &self.kind {
            KeyKind::Rsa(_) => offered
                .iter()
                .find(|scheme| RSA_SCHEMES.contains(scheme))
                .copied()?,
            KeyKind::Ecdsa(_, scheme) => Some(*scheme).filter(|s| offered.contains(s))?,
            KeyKind::Ed25519(_) => Some(SignatureScheme::ED25519).filter(|s| offered.contains(s))?,
        };

        Some(Box::new(RingSigner {
            kind: self.kind.clone(),
            scheme,
        }))
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        match self.kind {
            KeyKind::Rsa(_) => SignatureAlgorithm::RSA,
            KeyKind::Ecdsa(..) => SignatureAlgorithm::ECDSA,
            KeyKind::Ed25519(_) => SignatureAlgorithm::ED25519,
        }
    }
}

struct RingSigner {
    kind: KeyKind,
    scheme: SignatureScheme,
}

impl Signer for RingSigner {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let rng = SystemRandom::new();
        let failed = |_| Error::General("signing failed".into());

        match &self.kind {
            KeyKind::Rsa(key) => {
                let encoding: &'static dyn signature::RsaEncoding = match self.scheme {
                    SignatureScheme::RSA_PKCS1_SHA384 => &signature::RSA_PKCS1_SHA384,
                    SignatureScheme::RSA_PKCS1_SHA512 => &signature::RSA_PKCS1_SHA512,
                    _ => &signature::RSA_PKCS1_SHA256,
                };
                let mut sig = vec![0; key.public().modulus_len()];
                key.sign(encoding, &rng, message, &mut sig)
                    .map_err(failed)?;
                Ok(sig)
            }
            KeyKind::Ecdsa(key, _) => key
                .sign(&rng, message)
                .map(|sig| sig.as_ref().to_vec())
                .map_err(failed),
            KeyKind::Ed25519(key) => Ok(key.sign(message).as_ref().to_vec()),
        }
    }

    fn scheme(&self) -> SignatureScheme {
        self.scheme
    }
}
