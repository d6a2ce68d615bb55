use thiserror::Error;

use crate::{
    component::{
        component_kinds::{ComponentKind, ComponentKinds, ComponentSchema, FieldSchema},
        error::ComponentError,
        replicate::Replicate,
    },
    remote_call::{
        descriptor::{GuardPolicy, RemoteCallDescriptor},
        error::RemoteCallError,
        func_id::FuncId,
        registry::RemoteCallRegistry,
    },
};

/// Fatal registration errors. A protocol that fails to build must prevent
/// the host from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),
}

/// Everything both peers must agree on before exchanging payloads: the
/// component registry (kinds, wire ids, flattened schemas), the remote-call
/// registry, and the guard policy.
///
/// Built once at startup and handed to the server or client; identical
/// registration order on every peer yields identical wire ids.
pub struct Protocol {
    component_kinds: ComponentKinds,
    remote_calls: RemoteCallRegistry,
    guard_policy: GuardPolicy,
}

impl Protocol {
    pub fn builder() -> ProtocolBuilder {
        ProtocolBuilder::new()
    }

    pub fn component_kinds(&self) -> &ComponentKinds {
        &self.component_kinds
    }

    pub fn remote_calls(&self) -> &RemoteCallRegistry {
        &self.remote_calls
    }

    pub fn guard_policy(&self) -> GuardPolicy {
        self.guard_policy
    }
}

/// Collects registrations and surfaces the first fatal error at `build()`
pub struct ProtocolBuilder {
    component_kinds: ComponentKinds,
    remote_calls: RemoteCallRegistry,
    guard_policy: GuardPolicy,
    error: Option<ProtocolError>,
}

impl ProtocolBuilder {
    fn new() -> Self {
        Self {
            component_kinds: ComponentKinds::new(),
            remote_calls: RemoteCallRegistry::new(),
            guard_policy: GuardPolicy::ReturnDefault,
            error: None,
        }
    }

    /// Registers a replicated component type. `segments` is the field
    /// declaration of its inheritance chain ordered base-to-derived; the
    /// flattened list assigns dirty-mask bits.
    pub fn add_component<C: Replicate + Default + 'static>(
        mut self,
        name: &'static str,
        segments: &[&[FieldSchema]],
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let result = ComponentSchema::flatten(name, segments)
            .and_then(|schema| self.component_kinds.add_component::<C>(name, schema));
        if let Err(error) = result {
            self.error = Some(error.into());
        }
        self
    }

    /// Registers a remote-callable method of component `C`
    pub fn add_remote_call<C: Replicate + 'static>(
        mut self,
        type_name: &'static str,
        func_id: FuncId,
        descriptor: RemoteCallDescriptor,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        let kind = ComponentKind::of::<C>();
        if let Err(error) = self
            .remote_calls
            .register(kind, type_name, func_id, descriptor)
        {
            self.error = Some(error.into());
        }
        self
    }

    pub fn guard_policy(mut self, policy: GuardPolicy) -> Self {
        self.guard_policy = policy;
        self
    }

    pub fn build(self) -> Result<Protocol, ProtocolError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Protocol {
            component_kinds: self.component_kinds,
            remote_calls: self.remote_calls,
            guard_policy: self.guard_policy,
        })
    }
}
