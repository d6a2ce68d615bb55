use thiserror::Error;

/// Errors raised by host-side dirty-mask tracking
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffHandlerError {
    /// A component was registered twice for the same object slot. Fatal at
    /// registration: the second registration would orphan the first mask.
    #[error("component index {component_index} already registered for object {object_id}")]
    AlreadyRegistered {
        object_id: u64,
        component_index: u8,
    },

    /// A mask lock was re-entered on the same thread
    #[error("dirty mask lock is held on the current thread")]
    MaskLockReentrant,

    /// A mask was requested for an unregistered component slot
    #[error("no dirty mask registered for object {object_id} component index {component_index}")]
    ReceiverNotFound {
        object_id: u64,
        component_index: u8,
    },
}
