use mimic_shared::ChannelKind;

use crate::user::UserKey;

/// Outgoing half of the transport collaborator on the server side.
///
/// The transport owns framing, channel semantics, and any I/O threading; by
/// the time a payload reaches `send` it is a complete replication message.
/// Sends to a connection the transport no longer knows must be dropped
/// silently, the engine may race a disconnect by one tick.
pub trait UserPacketSender {
    fn send(&mut self, user_key: &UserKey, channel: ChannelKind, payload: &[u8]);
}
