use std::fmt;

use ring::aead;

use crate::error::Error;
use crate::rand;

/// Protects a byte string at rest.
///
/// The handshake hands completed [`SessionRecord`]s to an implementation of
/// this trait when they are sealed, and expects to get the same bytes back
/// when they are opened.
///
/// [`SessionRecord`]: crate::internal::msgs::persist::SessionRecord
pub trait KeyWrap: Send + Sync {
    /// Wrap `plain` and return the protected form.
    fn wrap_key(&self, plain: &[u8]) -> Result<Vec<u8>, Error>;

    /// Recover what [`KeyWrap::wrap_key`] was given.
    ///
    /// Fails with [`Error::DecryptError`] if `wrapped` was not produced by
    /// this key or has been modified.
    fn unwrap_key(&self, wrapped: &[u8]) -> Result<Vec<u8>, Error>;
}

/// A `KeyWrap` implementation which uses any *ring* `aead::Algorithm`
/// with a random key.
///
/// Each wrap uses a fresh random nonce, which is carried in front of
/// the ciphertext.
pub struct AeadKeyWrap {
    alg: &'static aead::Algorithm,
    key: aead::LessSafeKey,
}

impl AeadKeyWrap {
    /// Make a key wrapper with recommended configuration and a random key.
    pub fn new() -> Result<Self, Error> {
        Self::with_algorithm(&aead::CHACHA20_POLY1305)
    }

    /// Make a key wrapper using `alg` and a random key.
    pub fn with_algorithm(alg: &'static aead::Algorithm) -> Result<Self, Error> {
        let mut key = [0u8; 32];
        rand::fill_random(&mut key[..alg.key_len()])?;

        let key = aead::UnboundKey::new(alg, &key[..alg.key_len()])
            .map_err(|_| Error::General("unusable key wrapping key".into()))?;

        Ok(Self {
            alg,
            key: aead::LessSafeKey::new(key),
        })
    }
}

impl KeyWrap for AeadKeyWrap {
    fn wrap_key(&self, plain: &[u8]) -> Result<Vec<u8>, Error> {
        // Random nonce, because a counter is a privacy leak.
        let mut nonce_buf = [0u8; aead::NONCE_LEN];
        rand::fill_random(&mut nonce_buf)?;
        let nonce = aead::Nonce::assume_unique_for_key(nonce_buf);

        let mut wrapped =
            Vec::with_capacity(nonce_buf.len() + plain.len() + self.alg.tag_len());
        wrapped.extend(&nonce_buf);
        wrapped.extend(plain);
        let tag = self
            .key
            .seal_in_place_separate_tag(nonce, aead::Aad::empty(), &mut wrapped[nonce_buf.len()..])
            .map_err(|_| Error::General("key wrapping failed".into()))?;
        wrapped.extend(tag.as_ref());
        Ok(wrapped)
    }

    fn unwrap_key(&self, wrapped: &[u8]) -> Result<Vec<u8>, Error> {
        // Non-panicking `let (nonce, wrapped) = wrapped.split_at(...)`.
        let nonce = wrapped
            .get(..self.alg.nonce_len())
            .ok_or(Error::DecryptError)?;
        let body = wrapped
            .get(nonce.len()..)
            .ok_or(Error::DecryptError)?;

        let nonce =
            aead::Nonce::try_assume_unique_for_key(nonce).map_err(|_| Error::DecryptError)?;

        let mut out = Vec::from(body);
        let plain_len = self
            .key
            .open_in_place(nonce, aead::Aad::empty(), &mut out)
            .map_err(|_| Error::DecryptError)?
            .len();
        out.truncate(plain_len);

        Ok(out)
    }
}

impl fmt::Debug for AeadKeyWrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Note: we deliberately omit the key from the debug output.
        f.debug_struct("AeadKeyWrap")
            .field("alg", self.alg)
            .finish_non_exhaustive()
    }
}
