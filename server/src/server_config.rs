use std::default::Default;

/// Contains Config properties which will be used by the Server
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether a protocol violation (malformed payload, unknown call id,
    /// unexpected packet type) from a client disconnects it. Servers talking
    /// to untrusted peers should leave this on.
    pub disconnect_on_protocol_error: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            disconnect_on_protocol_error: true,
        }
    }
}
