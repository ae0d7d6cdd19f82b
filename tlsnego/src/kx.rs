use std::fmt;

use ring::agreement::{agree_ephemeral, EphemeralPrivateKey, PublicKey, UnparsedPublicKey};
use ring::rand::SystemRandom;

use crate::error::{Error, PeerMisbehaved};
use crate::msgs::enums::NamedGroup;
use crate::rand::GetRandomFailed;

/// Our half of an ephemeral ECDH exchange, kept from the ServerKeyExchange
/// until the client's public key arrives.
pub(crate) struct KeyExchange {
    group: &'static SupportedKxGroup,
    private_key: EphemeralPrivateKey,
    public_key: PublicKey,
}

impl KeyExchange {
    /// Start an exchange on `name`, which must be one of `supported`.
    pub(crate) fn choose(
        name: NamedGroup,
        supported: &[&'static SupportedKxGroup],
    ) -> Result<Self, KeyExchangeError> {
        let group = supported
            .iter()
            .copied()
            .find(|group| group.name == name)
            .ok_or(KeyExchangeError::UnsupportedGroup)?;
        Self::start(group).map_err(KeyExchangeError::KeyExchangeFailed)
    }

    pub(crate) fn start(group: &'static SupportedKxGroup) -> Result<Self, GetRandomFailed> {
        let private_key =
            EphemeralPrivateKey::generate(group.agreement_algorithm, &SystemRandom::new())
                .map_err(|_| GetRandomFailed)?;
        let public_key = private_key
            .compute_public_key()
            .map_err(|_| GetRandomFailed)?;

        Ok(Self {
            group,
            private_key,
            public_key,
        })
    }

    pub(crate) fn group(&self) -> NamedGroup {
        self.group.name
    }

    /// Our public key, as it goes in ServerECDHParams.
    pub(crate) fn pub_key(&self) -> &[u8] {
        self.public_key.as_ref()
    }

    /// Finish with the client's public key, giving the premaster secret.
    ///
    /// A key that is not a valid point on the curve is the client's fault.
    pub(crate) fn complete(self, peer: &[u8]) -> Result<Vec<u8>, Error> {
        let peer = UnparsedPublicKey::new(self.group.agreement_algorithm, peer);
        agree_ephemeral(self.private_key, &peer, |secret| secret.to_vec())
            .map_err(|_| PeerMisbehaved::InvalidKeyShare.into())
    }
}

#[derive(Debug)]
pub(crate) enum KeyExchangeError {
    UnsupportedGroup,
    KeyExchangeFailed(GetRandomFailed),
}

/// A curve we can run ephemeral ECDH on.
///
/// Every instance is one of the statics in this module, and all of them
/// are listed in [`ALL_KX_GROUPS`].
pub struct SupportedKxGroup {
    /// How the curve is named in "elliptic_curves" and ServerECDHParams.
    pub name: NamedGroup,

    agreement_algorithm: &'static ring::agreement::Algorithm,
}

impl fmt::Debug for SupportedKxGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

/// Ephemeral ECDH on curve25519 (see RFC7748)
pub static X25519: SupportedKxGroup = SupportedKxGroup {
    name: NamedGroup::X25519,
    agreement_algorithm: &ring::agreement::X25519,
};

/// Ephemeral ECDH on secp256r1 (aka NIST-P256)
pub static SECP256R1: SupportedKxGroup = SupportedKxGroup {
    name: NamedGroup::secp256r1,
    agreement_algorithm: &ring::agreement::ECDH_P256,
};

/// Ephemeral ECDH on secp384r1 (aka NIST-P384)
pub static SECP384R1: SupportedKxGroup = SupportedKxGroup {
    name: NamedGroup::secp384r1,
    agreement_algorithm: &ring::agreement::ECDH_P384,
};

/// Every supported curve, in our default order of preference.
pub static ALL_KX_GROUPS: [&SupportedKxGroup; 3] = [&X25519, &SECP256R1, &SECP384R1];
