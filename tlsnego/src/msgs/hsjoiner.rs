//! Reassembly of handshake messages from handshake records.
//!
//! A record may carry several handshake messages, and one message may span
//! several records.  Messages are decoded one at a time, when the connection
//! asks for the next one, so a bad message is only reported after everything
//! in front of it has been acted upon.

use crate::enums::{ContentType, ProtocolVersion};
use crate::error::InvalidMessage;
use crate::msgs::codec::{self, Codec, Reader};
use crate::msgs::handshake::HandshakeMessagePayload;
use crate::msgs::message::{Message, MessagePayload, PlainMessage};

/// Handshake type and u24 body length.
const HEADER_SIZE: usize = 1 + 3;

/// The largest handshake body we will buffer.
///
/// The messages a client sends us before its key exchange only have
/// u16-bounded variable parts, apart from a certificate chain, which is held
/// to the same bound.
pub const MAX_HANDSHAKE_SIZE: usize = 0xffff;

/// Turns a stream of handshake records into whole handshake messages.
pub struct HandshakeJoiner {
    buf: Vec<u8>,
    /// How much of the front of `buf` has already been returned.
    used: usize,
    /// Version of the latest record; messages are stamped with it.
    version: ProtocolVersion,
}

impl Default for HandshakeJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl HandshakeJoiner {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            used: 0,
            version: ProtocolVersion::TLSv1_0,
        }
    }

    /// Add the body of a handshake record.
    ///
    /// Fails as soon as the next message's header announces a body larger
    /// than [`MAX_HANDSHAKE_SIZE`].
    pub fn push(&mut self, msg: PlainMessage) -> Result<(), InvalidMessage> {
        debug_assert_eq!(msg.typ, ContentType::Handshake);

        if self.is_joining() {
            self.buf.drain(..self.used);
            self.buf
                .extend_from_slice(&msg.payload.0);
        } else {
            // usual case: nothing left over, so take the record as is
            self.buf = msg.payload.0;
        }
        self.used = 0;
        self.version = msg.version;

        self.next_body_len().map(|_| ())
    }

    /// The next whole message, or `None` until more records arrive.
    pub fn pop(&mut self) -> Result<Option<Message>, InvalidMessage> {
        let pending = &self.buf[self.used..];
        let len = match self.next_body_len()? {
            Some(body) if pending.len() >= HEADER_SIZE + body => HEADER_SIZE + body,
            _ => return Ok(None),
        };

        let mut rd = Reader::init(&pending[..len]);
        let parsed = HandshakeMessagePayload::read_version(&mut rd, self.version)?;
        self.used += len;

        Ok(Some(Message {
            version: self.version,
            payload: MessagePayload::Handshake(parsed),
        }))
    }

    /// True while part of a message is waiting for the rest of it.
    pub fn is_joining(&self) -> bool {
        self.used < self.buf.len()
    }

    fn next_body_len(&self) -> Result<Option<usize>, InvalidMessage> {
        let header = match self.buf[self.used..].get(..HEADER_SIZE) {
            Some(header) => header,
            None => return Ok(None),
        };

        let len = usize::from(codec::u24::read_bytes(&header[1..])?);
        match len > MAX_HANDSHAKE_SIZE {
            true => Err(InvalidMessage::HandshakePayloadTooLarge),
            false => Ok(Some(len)),
        }
    }
}
