use thiserror::Error;

use crate::serde::SerdeErr;

use super::func_id::FuncId;

/// Errors raised while registering or dispatching remote calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteCallError {
    /// Two methods of the same type hierarchy hashed to the same stable
    /// identifier. Fatal at registration: peers could not agree on which
    /// method a payload targets.
    #[error("remote call id {func_id:?} registered twice for component {type_name}")]
    DuplicateFuncId {
        type_name: &'static str,
        func_id: FuncId,
    },

    /// An incoming payload named an identifier nothing registered. Protocol
    /// error: drop the message; a server receiving this from an untrusted
    /// peer should disconnect it.
    #[error("no remote call registered for id {func_id:?}")]
    UnknownFuncId { func_id: FuncId },

    /// A role-guarded method was invoked on a host that fails its guard,
    /// under `GuardPolicy::Fatal`. This is a local programming-contract
    /// violation, not a wire failure.
    #[error("remote call {name} rejected by its {guard} guard")]
    GuardViolation {
        name: &'static str,
        guard: &'static str,
    },

    /// Argument bytes did not deserialize. Protocol error: drop the message.
    #[error("remote call arguments malformed: {0}")]
    Malformed(#[from] SerdeErr),
}
