use std::collections::HashMap;

use log::warn;

use crate::{component::component_kinds::ComponentKind, component::replicate::Replicate, serde::ByteReader};

use super::{
    descriptor::{CallContext, GuardPolicy, RemoteCallDescriptor},
    error::RemoteCallError,
    func_id::FuncId,
};

/// What a dispatch attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The user method ran
    Invoked,
    /// A role guard rejected the invocation under `GuardPolicy::ReturnDefault`;
    /// the method was skipped and callers observe default values
    GuardRejected,
}

/// Registry mapping `(declaring component kind, stable function id)` to its
/// receiver trampoline.
///
/// Owned by the `Protocol` rather than living in process-wide statics, so
/// lifetime and test isolation stay explicit. Populated at startup by the
/// code-generation collaborator; duplicate identifiers within a type are a
/// fatal registration error.
pub struct RemoteCallRegistry {
    descriptors: HashMap<(ComponentKind, FuncId), RemoteCallDescriptor>,
}

impl RemoteCallRegistry {
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        component_kind: ComponentKind,
        type_name: &'static str,
        func_id: FuncId,
        descriptor: RemoteCallDescriptor,
    ) -> Result<(), RemoteCallError> {
        if self.descriptors.contains_key(&(component_kind, func_id)) {
            return Err(RemoteCallError::DuplicateFuncId { type_name, func_id });
        }
        self.descriptors.insert((component_kind, func_id), descriptor);
        Ok(())
    }

    pub fn descriptor(
        &self,
        component_kind: &ComponentKind,
        func_id: &FuncId,
    ) -> Option<&RemoteCallDescriptor> {
        self.descriptors.get(&(*component_kind, *func_id))
    }

    /// Runs the receive path for one call payload: look up the descriptor,
    /// check its role guard, then let the trampoline deserialize the
    /// arguments and invoke the user method.
    ///
    /// Unknown identifiers are returned as [`RemoteCallError::UnknownFuncId`]
    /// so the caller can apply its trust rules (drop, or disconnect an
    /// untrusted sender). A guard rejection under [`GuardPolicy::Fatal`]
    /// is returned as [`RemoteCallError::GuardViolation`].
    pub fn dispatch(
        &self,
        policy: GuardPolicy,
        component: &mut dyn Replicate,
        func_id: FuncId,
        reader: &mut ByteReader,
        context: &CallContext,
    ) -> Result<DispatchOutcome, RemoteCallError> {
        let kind = component.kind();
        let Some(descriptor) = self.descriptor(&kind, &func_id) else {
            return Err(RemoteCallError::UnknownFuncId { func_id });
        };

        if !descriptor.guard_allows(context) {
            match policy {
                GuardPolicy::ReturnDefault => {
                    warn!(
                        "remote call {} rejected by its {} guard, skipping",
                        descriptor.name,
                        descriptor.guard.name()
                    );
                    return Ok(DispatchOutcome::GuardRejected);
                }
                GuardPolicy::Fatal => {
                    return Err(RemoteCallError::GuardViolation {
                        name: descriptor.name,
                        guard: descriptor.guard.name(),
                    });
                }
            }
        }

        descriptor.invoke(component, reader, context)?;
        Ok(DispatchOutcome::Invoked)
    }
}

impl Default for RemoteCallRegistry {
    fn default() -> Self {
        Self::new()
    }
}
