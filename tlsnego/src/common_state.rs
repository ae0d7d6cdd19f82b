use std::io;

use crate::enums::{AlertDescription, ProtocolVersion};
use crate::error::{Error, PeerMisbehaved};
#[cfg(feature = "logging")]
use crate::log::{debug, warn};
use crate::msgs::alert::AlertMessagePayload;
use crate::msgs::enums::AlertLevel;
use crate::msgs::fragmenter::MessageFragmenter;
use crate::msgs::message::{Message, PlainMessage};
use crate::vecbuf::ChunkVecBuffer;

/// Which end of a TLS connection is sending a message.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Side {
    /// A client initiates the connection.
    Client,
    /// A server waits for a client to connect.
    Server,
}

/// Connection state shared by every stage of the handshake: the outgoing
/// record queue and the alert channel.
pub(crate) struct CommonState {
    pub(crate) side: Side,
    pub(crate) record_version: ProtocolVersion,
    pub(crate) has_sent_fatal_alert: bool,
    pub(crate) has_received_close_notify: bool,
    message_fragmenter: MessageFragmenter,
    sendable_tls: ChunkVecBuffer,
}

impl CommonState {
    pub(crate) fn new(side: Side) -> Self {
        Self {
            side,
            record_version: ProtocolVersion::TLSv1_0,
            has_sent_fatal_alert: false,
            has_received_close_notify: false,
            message_fragmenter: MessageFragmenter::default(),
            sendable_tls: ChunkVecBuffer::new(),
        }
    }

    /// Returns true if the caller should call [`ServerConnection::write_tls`] as soon as possible.
    ///
    /// [`ServerConnection::write_tls`]: crate::server::ServerConnection::write_tls
    pub(crate) fn wants_write(&self) -> bool {
        !self.sendable_tls.is_empty()
    }

    pub(crate) fn tls_bytes_to_write(&self) -> usize {
        self.sendable_tls.len()
    }

    /// Fragment `m`, stamp it with the record version and queue it.
    pub(crate) fn send_msg(&mut self, m: Message) {
        let mut plain = PlainMessage::from(m);
        plain.version = self.record_version;

        for frag in self
            .message_fragmenter
            .fragment_message(&plain)
        {
            self.sendable_tls
                .append(frag.into_unencrypted_opaque().encode());
        }
    }

    fn send_alert(&mut self, level: AlertLevel, desc: AlertDescription) {
        match level {
            AlertLevel::Fatal if self.has_sent_fatal_alert => return,
            AlertLevel::Fatal => self.has_sent_fatal_alert = true,
            _ => {}
        };
        self.send_msg(Message::build_alert(level, desc));
    }

    pub(crate) fn send_fatal_alert(&mut self, desc: AlertDescription) {
        warn!("Sending fatal alert {:?}", desc);
        self.send_alert(AlertLevel::Fatal, desc);
    }

    /// Queue the alert `error` maps to, if any.
    ///
    /// At most one fatal alert is ever sent on a connection.
    pub(crate) fn maybe_send_fatal_alert(&mut self, error: &Error) {
        if let Ok(alert) = AlertDescription::try_from(error) {
            self.send_fatal_alert(alert);
        }
    }

    pub(crate) fn send_close_notify(&mut self) {
        debug!("Sending warning alert {:?}", AlertDescription::CloseNotify);
        self.send_alert(AlertLevel::Warning, AlertDescription::CloseNotify);
    }

    pub(crate) fn process_alert(&mut self, alert: &AlertMessagePayload) -> Result<(), Error> {
        // Reject unknown AlertLevels.
        if let AlertLevel::Unknown(level) = alert.level {
            return Err(PeerMisbehaved::IllegalAlertLevel(level, alert.description).into());
        }

        if alert.description == AlertDescription::CloseNotify {
            self.has_received_close_notify = true;
            return Ok(());
        }

        // Warnings are nonfatal for TLS1.2 and earlier.
        if alert.level == AlertLevel::Warning {
            warn!("TLS alert warning received: {:#?}", alert);
            return Ok(());
        }

        warn!("TLS alert received: {:#?}", alert);
        Err(Error::AlertReceived(alert.description))
    }

    pub(crate) fn write_tls(&mut self, wr: &mut dyn io::Write) -> io::Result<usize> {
        self.sendable_tls.write_to(wr)
    }

    #[cfg(test)]
    pub(crate) fn take_sendable(&mut self) -> Vec<u8> {
        let mut out = vec![0u8; self.sendable_tls.len()];
        let used = self.sendable_tls.read(&mut out).unwrap();
        out.truncate(used);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PeerIncompatible;

    #[test]
    fn fatal_alert_is_sent_once() {
        let mut cs = CommonState::new(Side::Server);
        cs.record_version = ProtocolVersion::TLSv1_1;
        assert!(!cs.wants_write());

        cs.maybe_send_fatal_alert(&PeerIncompatible::ClientVersionTooLow.into());
        cs.maybe_send_fatal_alert(&PeerIncompatible::NoCipherSuitesInCommon.into());
        assert!(cs.has_sent_fatal_alert);
        assert_eq!(
            cs.take_sendable(),
            vec![0x15, 0x03, 0x02, 0x00, 0x02, 0x02, 70]
        );
        assert!(!cs.wants_write());
    }

    #[test]
    fn errors_without_alerts_send_nothing() {
        let mut cs = CommonState::new(Side::Server);
        cs.maybe_send_fatal_alert(&Error::HandshakeNotComplete);
        assert!(!cs.has_sent_fatal_alert);
        assert!(!cs.wants_write());
    }

    #[test]
    fn close_notify_is_a_warning() {
        let mut cs = CommonState::new(Side::Server);
        cs.send_close_notify();
        assert_eq!(
            cs.take_sendable(),
            vec![0x15, 0x03, 0x01, 0x00, 0x02, 0x01, 0x00]
        );
        assert!(!cs.has_sent_fatal_alert);
    }

    #[test]
    fn received_alerts() {
        let mut cs = CommonState::new(Side::Server);

        let warning = AlertMessagePayload {
            level: AlertLevel::Warning,
            description: AlertDescription::NoRenegotiation,
        };
        assert_eq!(cs.process_alert(&warning), Ok(()));

        let close = AlertMessagePayload {
            level: AlertLevel::Warning,
            description: AlertDescription::CloseNotify,
        };
        assert_eq!(cs.process_alert(&close), Ok(()));
        assert!(cs.has_received_close_notify);

        let fatal = AlertMessagePayload {
            level: AlertLevel::Fatal,
            description: AlertDescription::HandshakeFailure,
        };
        assert_eq!(
            cs.process_alert(&fatal),
            Err(Error::AlertReceived(AlertDescription::HandshakeFailure))
        );

        let bogus = AlertMessagePayload {
            level: AlertLevel::Unknown(3),
            description: AlertDescription::HandshakeFailure,
        };
        assert_eq!(
            cs.process_alert(&bogus),
            Err(PeerMisbehaved::IllegalAlertLevel(3, AlertDescription::HandshakeFailure).into())
        );
    }
}
