use crate::enums::{ContentType, ProtocolVersion};
use crate::msgs::base::Payload;
use crate::msgs::message::PlainMessage;

pub(crate) const MAX_FRAGMENT_LEN: usize = 16384;

pub struct MessageFragmenter {
    max_frag: usize,
}

impl Default for MessageFragmenter {
    fn default() -> Self {
        Self {
            max_frag: MAX_FRAGMENT_LEN,
        }
    }
}

impl MessageFragmenter {
    /// Take the Message `msg` and re-fragment it into new
    /// messages whose fragment is no more than max_frag.
    /// Return an iterator across those messages.
    pub fn fragment_message<'a>(
        &self,
        msg: &'a PlainMessage,
    ) -> impl Iterator<Item = PlainMessage> + 'a {
        self.fragment_slice(msg.typ, msg.version, &msg.payload.0)
    }

    fn fragment_slice<'a>(
        &self,
        typ: ContentType,
        version: ProtocolVersion,
        payload: &'a [u8],
    ) -> impl Iterator<Item = PlainMessage> + 'a {
        payload
            .chunks(self.max_frag)
            .map(move |c| PlainMessage {
                typ,
                version,
                payload: Payload::new(c),
            })
    }
}
