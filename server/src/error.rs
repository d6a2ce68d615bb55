use thiserror::Error;

use mimic_shared::{
    ComponentError, DiffHandlerError, ObjectId, PacketType, RemoteCallError, SerdeErr,
};

/// Errors surfaced by the server's replication and dispatch paths.
///
/// Variants carrying [`SerdeErr`], [`RemoteCallError::UnknownFuncId`], or
/// [`ServerError::UnexpectedPacket`] represent protocol violations by the
/// remote peer: the offending message is dropped and the sender is
/// disconnected before the error is returned.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("object {0:?} does not exist")]
    UnknownObject(ObjectId),

    #[error("user does not exist")]
    UnknownUser,

    #[error("object {object_id:?} has no component at index {index}")]
    UnknownComponent { object_id: ObjectId, index: u8 },

    #[error("packet type {0:?} is not valid coming from a client")]
    UnexpectedPacket(PacketType),

    #[error("call {0} is not registered as server-bound and cannot come from a client")]
    NotServerBound(&'static str),

    #[error(transparent)]
    Malformed(#[from] SerdeErr),

    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),

    #[error(transparent)]
    DiffHandler(#[from] DiffHandlerError),

    #[error(transparent)]
    Component(#[from] ComponentError),
}
