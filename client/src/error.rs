use thiserror::Error;

use mimic_shared::{
    ComponentError, DiffHandlerError, ObjectId, PacketType, RemoteCallError, SerdeErr,
};

/// Errors surfaced by the client's receive and send paths.
///
/// A malformed payload or unknown identifier coming from the server is
/// dropped and logged; the client never disconnects the server, it only
/// reports the error to the host loop.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("object {0:?} is not known to this client")]
    UnknownObject(ObjectId),

    #[error("object {object_id:?} has no component at index {index}")]
    UnknownComponent { object_id: ObjectId, index: u8 },

    #[error("packet type {0:?} was not expected from the server")]
    UnexpectedPacket(PacketType),

    #[error(transparent)]
    Malformed(#[from] SerdeErr),

    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    DiffHandler(#[from] DiffHandlerError),
}
