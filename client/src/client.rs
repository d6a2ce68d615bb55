use std::collections::HashMap;

use log::{error, warn};

use mimic_shared::{
    ByteReader, ByteWriter, CallContext, CallKind, ChannelKind, ComponentIndex, DiffMask, FuncId,
    GlobalDiffHandler, HostType, ObjectId, PacketType, PropertyMutator, Protocol, Replicate, Serde,
};

use crate::{client_config::ClientConfig, error::ClientError, transport::PacketSender};

/// What the receive path did, surfaced to the host loop each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    Spawned(ObjectId),
    Despawned(ObjectId),
    InsertedComponent(ObjectId, ComponentIndex),
    /// A component's fields changed; the mask says which. Full-state
    /// arrivals report every declared field set.
    Updated(ObjectId, ComponentIndex, DiffMask),
}

/// Client-side mirror of one replicated object
pub struct ClientObject {
    owned: bool,
    components: Vec<Box<dyn Replicate>>,
}

impl ClientObject {
    /// Whether this connection has authority over the object
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }
}

/// Client half of the replication engine.
///
/// Routes incoming payloads into the local object table (spawn/despawn,
/// full-state and delta reads, remote-call dispatch) and pushes
/// owner-authoritative local changes back to the server once per tick via
/// [`Client::send_all_updates`]. Everything runs on the simulation thread;
/// the transport hands received payloads in through
/// [`Client::receive_packet`] on that same thread.
pub struct Client {
    protocol: Protocol,
    config: ClientConfig,
    objects: HashMap<ObjectId, ClientObject>,
    diff_handler: GlobalDiffHandler,
    sender: Option<Box<dyn PacketSender>>,
    events: Vec<ClientEvent>,
}

impl Client {
    pub fn new(protocol: Protocol, config: ClientConfig) -> Self {
        Self {
            protocol,
            config,
            objects: HashMap::new(),
            diff_handler: GlobalDiffHandler::new(),
            sender: None,
            events: Vec::new(),
        }
    }

    /// Attaches the transport's outgoing half; owner pushes and calls flow
    /// through it from here on
    pub fn connect(&mut self, sender: Box<dyn PacketSender>) {
        self.sender = Some(sender);
    }

    pub fn is_connected(&self) -> bool {
        self.sender.is_some()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Events accumulated since the last call, oldest first
    pub fn take_events(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.events)
    }

    // Objects

    pub fn object_exists(&self, object_id: &ObjectId) -> bool {
        self.objects.contains_key(object_id)
    }

    pub fn is_owned(&self, object_id: &ObjectId) -> bool {
        self.objects
            .get(object_id)
            .is_some_and(|object| object.owned)
    }

    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    pub fn component<C: Replicate + 'static>(
        &self,
        object_id: &ObjectId,
        index: ComponentIndex,
    ) -> Option<&C> {
        self.objects
            .get(object_id)?
            .components
            .get(index as usize)?
            .to_any()
            .downcast_ref::<C>()
    }

    /// Typed mutable view of a component. Only meaningful on owned objects,
    /// where property writes mark dirty bits that
    /// [`Client::send_all_updates`] pushes to the server.
    pub fn component_mut<C: Replicate + 'static>(
        &mut self,
        object_id: &ObjectId,
        index: ComponentIndex,
    ) -> Option<&mut C> {
        self.objects
            .get_mut(object_id)?
            .components
            .get_mut(index as usize)?
            .to_any_mut()
            .downcast_mut::<C>()
    }

    // Incoming

    /// Entry point for payloads the transport received from the server.
    ///
    /// Malformed payloads and unknown identifiers are dropped and logged;
    /// the error comes back to the host loop but the client never tears the
    /// connection down itself.
    pub fn receive_packet(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        let mut reader = ByteReader::new(payload);
        let result = match PacketType::de(&mut reader) {
            Ok(PacketType::Spawn) => self.receive_spawn(&mut reader),
            Ok(PacketType::Despawn) => self.receive_despawn(&mut reader),
            Ok(PacketType::FullState) => self.receive_full_state(&mut reader),
            Ok(PacketType::Delta) => self.receive_delta(&mut reader),
            Ok(PacketType::Call) => self.receive_call(&mut reader),
            Err(serde_err) => Err(serde_err.into()),
        };

        if let Err(client_error) = &result {
            error!("dropping payload from server: {}", client_error);
        }

        result
    }

    fn receive_spawn(&mut self, reader: &mut ByteReader) -> Result<(), ClientError> {
        let object_id = ObjectId::de(reader)?;
        let owned = bool::de(reader)?;
        let count = reader.read_u8()?;

        if self.objects.remove(&object_id).is_some() {
            warn!("spawn for already-known object {:?}, replacing", object_id);
            self.diff_handler.deregister_object(&object_id);
        }

        let kinds = self.protocol.component_kinds();
        let mut components: Vec<Box<dyn Replicate>> = Vec::with_capacity(count as usize);
        for index in 0..count {
            let net_id = reader.read_u16()?;
            let kind = kinds.net_id_to_kind(net_id)?;
            let mut component = kinds.make(&kind)?;
            if owned {
                let name = kinds.kind_to_name(&kind)?;
                let mut_sender = self
                    .diff_handler
                    .register_component(&object_id, index, name)?;
                component.set_mutator(&PropertyMutator::new(mut_sender));
            }
            components.push(component);
        }

        self.objects.insert(object_id, ClientObject { owned, components });
        self.events.push(ClientEvent::Spawned(object_id));
        Ok(())
    }

    fn receive_despawn(&mut self, reader: &mut ByteReader) -> Result<(), ClientError> {
        let object_id = ObjectId::de(reader)?;
        if self.objects.remove(&object_id).is_none() {
            warn!("despawn for unknown object {:?}, ignoring", object_id);
            return Ok(());
        }
        self.diff_handler.deregister_object(&object_id);
        self.events.push(ClientEvent::Despawned(object_id));
        Ok(())
    }

    fn receive_full_state(&mut self, reader: &mut ByteReader) -> Result<(), ClientError> {
        let object_id = ObjectId::de(reader)?;
        let index = reader.read_u8()?;
        let net_id = reader.read_u16()?;

        let kinds = self.protocol.component_kinds();
        let kind = kinds.net_id_to_kind(net_id)?;

        let Some(object) = self.objects.get_mut(&object_id) else {
            warn!("full state for unknown object {:?}, ignoring", object_id);
            return Ok(());
        };

        if index as usize == object.components.len() {
            // component attached after the object entered scope
            let mut component = kinds.make(&kind)?;
            if object.owned {
                let name = kinds.kind_to_name(&kind)?;
                let mut_sender = self
                    .diff_handler
                    .register_component(&object_id, index, name)?;
                component.set_mutator(&PropertyMutator::new(mut_sender));
            }
            component.read_full(reader)?;
            object.components.push(component);
            self.events
                .push(ClientEvent::InsertedComponent(object_id, index));
            return Ok(());
        }

        let Some(component) = object.components.get_mut(index as usize) else {
            return Err(ClientError::UnknownComponent { object_id, index });
        };
        component.read_full(reader)?;
        let mask = DiffMask::all_set(component.field_count());
        self.events.push(ClientEvent::Updated(object_id, index, mask));
        Ok(())
    }

    fn receive_delta(&mut self, reader: &mut ByteReader) -> Result<(), ClientError> {
        let object_id = ObjectId::de(reader)?;
        let index = reader.read_u8()?;

        let Some(object) = self.objects.get_mut(&object_id) else {
            warn!("delta for unknown object {:?}, ignoring", object_id);
            return Ok(());
        };
        let Some(component) = object.components.get_mut(index as usize) else {
            return Err(ClientError::UnknownComponent { object_id, index });
        };

        let mask = component.read_delta(reader)?;
        // an all-zero mask is a valid "no change" payload
        if !mask.is_clear() {
            self.events.push(ClientEvent::Updated(object_id, index, mask));
        }
        Ok(())
    }

    fn receive_call(&mut self, reader: &mut ByteReader) -> Result<(), ClientError> {
        let object_id = ObjectId::de(reader)?;
        let index = reader.read_u8()?;
        let func_id = FuncId::de(reader)?;

        let Some(object) = self.objects.get_mut(&object_id) else {
            warn!("call for unknown object {:?}, ignoring", object_id);
            return Ok(());
        };
        let owned = object.owned;
        let Some(component) = object.components.get_mut(index as usize) else {
            return Err(ClientError::UnknownComponent { object_id, index });
        };

        let context = CallContext {
            host: HostType::Client,
            object: object_id,
            component_index: index,
            is_owner: owned,
        };
        self.protocol.remote_calls().dispatch(
            self.protocol.guard_policy(),
            component.as_mut(),
            func_id,
            reader,
            &context,
        )?;
        Ok(())
    }

    // Outgoing

    /// Caller-stub entry for a server-bound call: arguments were already
    /// serialized by the generated stub, this wraps and sends them.
    /// Authority over the object is enforced on arrival at the server.
    pub fn send_call(
        &mut self,
        object_id: &ObjectId,
        component_index: ComponentIndex,
        func_id: FuncId,
        args: &[u8],
    ) {
        let Some(object) = self.objects.get(object_id) else {
            warn!("call on unknown object {:?}, ignoring", object_id);
            return;
        };
        let Some(component) = object.components.get(component_index as usize) else {
            warn!(
                "call on missing component {} of {:?}, ignoring",
                component_index, object_id
            );
            return;
        };

        let kind = component.kind();
        match self.protocol.remote_calls().descriptor(&kind, &func_id) {
            Some(descriptor) => {
                if !matches!(descriptor.kind, CallKind::ServerBound { .. }) {
                    warn!(
                        "call {} is not server-bound and cannot be sent from a client, ignoring",
                        descriptor.name
                    );
                    return;
                }
            }
            None => {
                warn!("call id {:?} is not registered, ignoring", func_id);
                return;
            }
        }

        let mut writer = ByteWriter::new();
        PacketType::Call.ser(&mut writer);
        object_id.ser(&mut writer);
        writer.write_u8(component_index);
        func_id.ser(&mut writer);
        writer.write_bytes(args);

        if let Some(sender) = self.sender.as_mut() {
            sender.send(ChannelKind::Reliable, &writer.to_bytes());
        }
    }

    /// Pushes local changes to owned objects back to the server: one delta
    /// per component whose dirty mask is non-empty, clearing each mask for
    /// the next interval
    pub fn send_all_updates(&mut self) {
        let Some(sender) = self.sender.as_mut() else {
            return;
        };

        for (object_id, object) in self.objects.iter() {
            if !object.owned {
                continue;
            }
            for (index, component) in object.components.iter().enumerate() {
                let index = index as ComponentIndex;
                let Some(receiver) = self.diff_handler.receiver(object_id, index) else {
                    continue;
                };
                if receiver.is_clear() {
                    continue;
                }
                let mask = receiver.take_mask();

                let mut writer = ByteWriter::new();
                PacketType::Delta.ser(&mut writer);
                object_id.ser(&mut writer);
                writer.write_u8(index);
                component.write_delta(&mask, &mut writer);
                sender.send(ChannelKind::Reliable, &writer.to_bytes());
            }
        }
    }
}
