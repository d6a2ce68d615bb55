use thiserror::Error;

/// Errors related to component registration and lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// A component's flattened inheritance chain declares more replicated
    /// fields than fit in the fixed-width dirty mask. Fatal at registration.
    #[error("component {type_name} declares {count} replicated fields, the limit across an inheritance chain is 64")]
    TooManyFields {
        type_name: &'static str,
        count: usize,
    },

    /// The same component type was registered twice. Fatal at registration.
    #[error("component {type_name} cannot be registered more than once")]
    DuplicateComponent { type_name: &'static str },

    /// An incoming payload referenced a wire id no component was registered
    /// under. Protocol error: the message must be dropped.
    #[error("no component registered for wire id {net_id}")]
    UnknownNetId { net_id: u16 },

    /// A lookup used a ComponentKind that was never registered
    #[error("component kind has not been registered")]
    UnknownKind,
}
