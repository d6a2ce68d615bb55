use mimic_shared::ChannelKind;

/// Outgoing half of the transport collaborator on the client side. The one
/// remote endpoint is implied; the transport owns framing and delivery.
pub trait PacketSender {
    fn send(&mut self, channel: ChannelKind, payload: &[u8]);
}
