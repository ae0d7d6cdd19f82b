use crate::enums::{ContentType, HandshakeType};
use crate::error::Error;
#[cfg(feature = "logging")]
use crate::log::warn;
use crate::msgs::handshake::HandshakeMessagePayload;
use crate::msgs::message::{Message, MessagePayload};

/// For a Message $m, and a HandshakePayload enum member $payload_type,
/// return Ok(payload) if $m is both a handshake message and one that
/// has the given $payload_type.  If not, return Err(tlsnego::Error) quoting
/// $handshake_type as the expected handshake type.
macro_rules! require_handshake_msg(
  ( $m:expr, $handshake_type:path, $payload_type:path ) => (
    match &$m.payload {
        MessagePayload::Handshake(hsp) => match &hsp.payload {
            $payload_type(hm) => Ok(hm),
            _ => Err(Error::InappropriateHandshakeMessage {
                     expect_types: vec![ $handshake_type ],
                     got_type: hsp.typ})
        }
        payload => Err(Error::InappropriateMessage {
                 expect_types: vec![ ContentType::Handshake ],
                 got_type: payload.content_type()})
    }
  )
);

/// Validate the message `m`: return an error if:
///
/// - the type of m does not appear in `content_types`.
/// - if m is a handshake message, the handshake message type does
///   not appear in `handshake_types`.
pub(crate) fn check_message(
    m: &Message,
    content_types: &[ContentType],
    handshake_types: &[HandshakeType],
) -> Result<(), Error> {
    if !content_types.contains(&m.payload.content_type()) {
        return Err(inappropriate_message(m, content_types));
    }

    if let MessagePayload::Handshake(ref hsp) = m.payload {
        if !handshake_types.is_empty() && !handshake_types.contains(&hsp.typ) {
            return Err(inappropriate_handshake_message(hsp, handshake_types));
        }
    }

    Ok(())
}

pub(crate) fn inappropriate_message(m: &Message, content_types: &[ContentType]) -> Error {
    warn!(
        "Received a {:?} message while expecting {:?}",
        m.payload.content_type(),
        content_types
    );
    Error::InappropriateMessage {
        expect_types: content_types.to_vec(),
        got_type: m.payload.content_type(),
    }
}

pub(crate) fn inappropriate_handshake_message(
    hsp: &HandshakeMessagePayload,
    handshake_types: &[HandshakeType],
) -> Error {
    warn!(
        "Received a {:?} handshake message while expecting {:?}",
        hsp.typ, handshake_types
    );
    Error::InappropriateHandshakeMessage {
        expect_types: handshake_types.to_vec(),
        got_type: hsp.typ,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::ProtocolVersion;
    use crate::msgs::base::Payload;
    use crate::msgs::handshake::HandshakePayload;

    fn hello_done() -> Message {
        Message::build_handshake(
            ProtocolVersion::TLSv1_2,
            HandshakeMessagePayload {
                typ: HandshakeType::ServerHelloDone,
                payload: HandshakePayload::ServerHelloDone,
            },
        )
    }

    #[test]
    fn check_passes_expected_types() {
        assert_eq!(
            check_message(
                &hello_done(),
                &[ContentType::Handshake],
                &[HandshakeType::ServerHelloDone]
            ),
            Ok(())
        );
        assert_eq!(
            check_message(&hello_done(), &[ContentType::Handshake], &[]),
            Ok(())
        );
    }

    #[test]
    fn check_rejects_wrong_content_type() {
        let m = Message {
            version: ProtocolVersion::TLSv1_2,
            payload: MessagePayload::ApplicationData(Payload::new(vec![1])),
        };
        assert_eq!(
            check_message(&m, &[ContentType::Handshake], &[]),
            Err(Error::InappropriateMessage {
                expect_types: vec![ContentType::Handshake],
                got_type: ContentType::ApplicationData,
            })
        );
    }

    #[test]
    fn check_rejects_wrong_handshake_type() {
        assert_eq!(
            check_message(
                &hello_done(),
                &[ContentType::Handshake],
                &[HandshakeType::ClientHello]
            ),
            Err(Error::InappropriateHandshakeMessage {
                expect_types: vec![HandshakeType::ClientHello],
                got_type: HandshakeType::ServerHelloDone,
            })
        );
    }

    #[test]
    fn require_extracts_payload() {
        let m = Message::build_handshake(
            ProtocolVersion::TLSv1_2,
            HandshakeMessagePayload {
                typ: HandshakeType::Finished,
                payload: HandshakePayload::Finished(Payload::new(vec![7])),
            },
        );
        let fin = require_handshake_msg!(m, HandshakeType::Finished, HandshakePayload::Finished);
        assert_eq!(fin.unwrap().0, vec![7]);

        let wrong =
            require_handshake_msg!(m, HandshakeType::ClientHello, HandshakePayload::ClientHello);
        assert!(matches!(
            wrong,
            Err(Error::InappropriateHandshakeMessage { .. })
        ));
    }
}
