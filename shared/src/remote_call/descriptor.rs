use crate::{
    component::replicate::Replicate,
    serde::ByteReader,
    types::{ComponentIndex, HostType, ObjectId},
};

use super::error::RemoteCallError;

/// Which of the three call shapes a method was registered as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Client → server, issued by a connection's owned object. On arrival
    /// the dispatcher drops the call unless the invoking connection owns the
    /// target object, or the call opted out with `ignore_authority`.
    ServerBound { ignore_authority: bool },

    /// Server → every connection currently observing the target object
    Broadcast,

    /// Server → exactly one connection: the object's owner by default, or an
    /// explicit connection passed as the call's first parameter. That
    /// parameter never crosses the wire; the receiving side resolves it as
    /// the connection that delivered the message.
    Targeted,
}

/// Role restriction checked in the receiver prologue before the user method
/// runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGuard {
    None,
    ServerOnly,
    ClientOnly,
    OwnerOnly,
}

impl RoleGuard {
    pub fn name(&self) -> &'static str {
        match self {
            RoleGuard::None => "None",
            RoleGuard::ServerOnly => "ServerOnly",
            RoleGuard::ClientOnly => "ClientOnly",
            RoleGuard::OwnerOnly => "OwnerOnly",
        }
    }
}

/// What happens when a role guard rejects an invocation: skip the method and
/// carry on (mirroring default-valued returns), or treat it as a fatal local
/// error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPolicy {
    ReturnDefault,
    Fatal,
}

/// Everything a receiver trampoline may need about the invocation site
#[derive(Debug, Clone, Copy)]
pub struct CallContext {
    pub host: HostType,
    pub object: ObjectId,
    pub component_index: ComponentIndex,
    /// Whether the local connection owns the target object (always true on
    /// the server itself)
    pub is_owner: bool,
}

/// Receiver-side trampoline: deserializes arguments and invokes the user
/// method polymorphically through the component's vtable, so overrides in
/// derived component types run correctly.
pub type CallTrampoline =
    Box<dyn Fn(&mut dyn Replicate, &mut ByteReader, &CallContext) -> Result<(), RemoteCallError>>;

/// Registration record for one remote-callable method
pub struct RemoteCallDescriptor {
    pub name: &'static str,
    pub kind: CallKind,
    pub guard: RoleGuard,
    trampoline: CallTrampoline,
}

impl RemoteCallDescriptor {
    pub fn new(
        name: &'static str,
        kind: CallKind,
        guard: RoleGuard,
        trampoline: CallTrampoline,
    ) -> Self {
        Self {
            name,
            kind,
            guard,
            trampoline,
        }
    }

    pub fn guard_allows(&self, context: &CallContext) -> bool {
        match self.guard {
            RoleGuard::None => true,
            RoleGuard::ServerOnly => context.host == HostType::Server,
            RoleGuard::ClientOnly => context.host == HostType::Client,
            RoleGuard::OwnerOnly => context.is_owner,
        }
    }

    pub fn invoke(
        &self,
        component: &mut dyn Replicate,
        reader: &mut ByteReader,
        context: &CallContext,
    ) -> Result<(), RemoteCallError> {
        (self.trampoline)(component, reader, context)
    }
}
