/// Delivery class a payload is handed to the transport with.
///
/// Deltas, lifecycle packets, and remote calls require the reliable ordered
/// channel: out-of-order delta application is undefined, and the transport
/// is responsible for preventing it. Interpolation snapshots tolerate loss
/// and may use the unreliable channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Reliable,
    Unreliable,
}
