use std::{
    collections::{hash_set::Iter, HashMap},
    net::SocketAddr,
};

use log::{error, info, warn};

use mimic_shared::{
    BigMap, ByteReader, ByteWriter, CallContext, CallKind, ChannelKind, ComponentIndex, DiffMask,
    FuncId, GlobalDiffHandler, HostType, ObjectId, PacketType, PartitionId, PropertyMutator,
    Protocol, RemoteCallError, Replicate, Serde, Tick, Vec3,
};

use crate::{
    error::ServerError,
    object::ObjectRecord,
    observer::ObserverManager,
    room::{Room, RoomKey, RoomMut, RoomRef},
    server_config::ServerConfig,
    transport::UserPacketSender,
    user::{User, UserKey, UserMut, UserRef},
    user_scope::UserScopeRef,
    visibility::{Visibility, VisibilityCtx},
};

/// The replication coordinator.
///
/// Owns the object table, connection and room registries, dirty-mask
/// tracking, and interest management, and drives one flush per simulation
/// tick via [`Server::send_all_updates`]. All of it runs on the single
/// simulation thread; the transport hands received payloads in through
/// [`Server::receive_packet`] on that same thread.
pub struct Server {
    protocol: Protocol,
    config: ServerConfig,
    listening: bool,
    tick: Tick,
    users: BigMap<UserKey, User>,
    rooms: BigMap<RoomKey, Room>,
    objects: BigMap<ObjectId, ObjectRecord>,
    diff_handler: GlobalDiffHandler,
    observers: ObserverManager,
    visibility: Box<dyn Visibility>,
    sender: Option<Box<dyn UserPacketSender>>,
}

impl Server {
    pub fn new(protocol: Protocol, config: ServerConfig, visibility: Box<dyn Visibility>) -> Self {
        Self {
            protocol,
            config,
            listening: false,
            tick: 0,
            users: BigMap::new(),
            rooms: BigMap::new(),
            objects: BigMap::new(),
            diff_handler: GlobalDiffHandler::new(),
            observers: ObserverManager::new(),
            visibility,
            sender: None,
        }
    }

    /// Starts serving: outgoing payloads go through the given sender from
    /// here on
    pub fn listen(&mut self, sender: Box<dyn UserPacketSender>) {
        self.sender = Some(sender);
        self.listening = true;
        info!("server is listening");
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    // Connections

    /// Registers a newly connected peer, scheduling observer rebuilds so
    /// existing objects can come into its scope
    pub fn connect_user(&mut self, address: Option<SocketAddr>) -> UserKey {
        let user_key = self.users.insert(User::new(address));
        self.observers.request_rebuild_all();
        info!("user {:?} connected", user_key);
        user_key
    }

    /// Removes a peer and, in the same tick, every trace of it: room
    /// membership, authority over objects, and presence in observer sets
    pub fn disconnect_user(&mut self, user_key: &UserKey) {
        let Some(user) = self.users.remove(user_key) else {
            return;
        };

        for room_key in &user.rooms {
            if let Some(room) = self.rooms.get_mut(room_key) {
                room.remove_user(user_key);
                let object_ids: Vec<ObjectId> = room.object_ids().copied().collect();
                for object_id in object_ids {
                    self.observers.request_rebuild(&object_id);
                }
            }
        }

        for object_id in &user.owned {
            if let Some(record) = self.objects.get_mut(object_id) {
                record.set_owner(None);
            }
            self.observers.request_rebuild(object_id);
        }

        self.observers.remove_user(user_key);
        info!("user {:?} disconnected", user_key);
    }

    pub fn user_exists(&self, user_key: &UserKey) -> bool {
        self.users.contains_key(user_key)
    }

    /// Retrieves a UserRef for the given UserKey.
    /// Panics if the user does not exist.
    pub fn user(&self, user_key: &UserKey) -> UserRef<'_> {
        if self.users.contains_key(user_key) {
            return UserRef::new(self, user_key);
        }
        panic!("No User exists for given Key!");
    }

    /// Retrieves a UserMut for the given UserKey.
    /// Panics if the user does not exist.
    pub fn user_mut(&mut self, user_key: &UserKey) -> UserMut<'_> {
        if self.users.contains_key(user_key) {
            return UserMut::new(self, user_key);
        }
        panic!("No User exists for given Key!");
    }

    pub fn user_keys(&self) -> Vec<UserKey> {
        self.users.keys().collect()
    }

    pub fn users_count(&self) -> usize {
        self.users.len()
    }

    pub fn user_scope(&self, user_key: &UserKey) -> UserScopeRef<'_> {
        UserScopeRef::new(self, user_key)
    }

    // Rooms

    /// Creates a new Room on the Server and returns a corresponding RoomMut,
    /// which can be used to add users/objects to the room
    pub fn make_room(&mut self) -> RoomMut<'_> {
        let new_room = Room::new();
        let room_key = self.rooms.insert(new_room);
        RoomMut::new(self, &room_key)
    }

    pub fn room_exists(&self, room_key: &RoomKey) -> bool {
        self.rooms.contains_key(room_key)
    }

    /// Retrieves a RoomRef for the given RoomKey.
    /// Panics if the room does not exist.
    pub fn room(&self, room_key: &RoomKey) -> RoomRef<'_> {
        if self.rooms.contains_key(room_key) {
            return RoomRef::new(self, room_key);
        }
        panic!("No Room exists for given Key!");
    }

    /// Retrieves a RoomMut for the given RoomKey.
    /// Panics if the room does not exist.
    pub fn room_mut(&mut self, room_key: &RoomKey) -> RoomMut<'_> {
        if self.rooms.contains_key(room_key) {
            return RoomMut::new(self, room_key);
        }
        panic!("No Room exists for given Key!");
    }

    pub fn room_keys(&self) -> Vec<RoomKey> {
        self.rooms.keys().collect()
    }

    pub fn rooms_count(&self) -> usize {
        self.rooms.len()
    }

    // Objects

    /// Creates a replicated object, assigning its network identity. The
    /// object starts unowned, with no components, and its observer set is
    /// initialized on the next flush.
    pub fn spawn_object(&mut self) -> ObjectId {
        let object_id = self.objects.insert(ObjectRecord::new());
        self.observers.track_object(&object_id);
        object_id
    }

    /// Despawns the object: clients that knew it are told, rooms and
    /// authority relations drop it, and its dirty tracking is torn down
    pub fn despawn_object(&mut self, object_id: &ObjectId) {
        if self.objects.remove(object_id).is_none() {
            warn!("attempted to despawn nonexistent object {:?}", object_id);
            return;
        }

        for (_, room) in self.rooms.iter_mut() {
            room.remove_object(object_id);
        }

        let payload = build_despawn_packet(object_id);
        if let Some(sender) = self.sender.as_mut() {
            for (user_key, user) in self.users.iter_mut() {
                user.owned.remove(object_id);
                if user.representative == Some(*object_id) {
                    user.representative = None;
                }
                if user.in_scope.remove(object_id) {
                    sender.send(&user_key, ChannelKind::Reliable, &payload);
                }
            }
        } else {
            for (_, user) in self.users.iter_mut() {
                user.owned.remove(object_id);
                if user.representative == Some(*object_id) {
                    user.representative = None;
                }
                user.in_scope.remove(object_id);
            }
        }

        self.observers.untrack_object(object_id);
        self.diff_handler.deregister_object(object_id);
    }

    pub fn object_exists(&self, object_id: &ObjectId) -> bool {
        self.objects.contains_key(object_id)
    }

    pub fn objects_count(&self) -> usize {
        self.objects.len()
    }

    /// Attaches a component, wiring its properties into dirty-mask tracking.
    /// Returns the component's index within the object.
    pub fn insert_component(
        &mut self,
        object_id: &ObjectId,
        mut component: Box<dyn Replicate>,
    ) -> Result<ComponentIndex, ServerError> {
        let kind = component.kind();
        let name = self.protocol.component_kinds().kind_to_name(&kind)?;

        let Some(record) = self.objects.get_mut(object_id) else {
            return Err(ServerError::UnknownObject(*object_id));
        };
        let index = record.component_count() as ComponentIndex;

        let mut_sender = self
            .diff_handler
            .register_component(object_id, index, name)?;
        component.set_mutator(&PropertyMutator::new(mut_sender));
        record.push_component(component);

        // connections already scoped to this object need the new component
        let Some(record) = self.objects.get(object_id) else {
            return Ok(index);
        };
        let Some(component) = record.component(index) else {
            return Ok(index);
        };
        if let Some(sender) = self.sender.as_mut() {
            match build_full_state_packet(&self.protocol, object_id, index, component) {
                Ok(payload) => {
                    for (user_key, user) in self.users.iter() {
                        if user.in_scope.contains(object_id) {
                            sender.send(&user_key, ChannelKind::Reliable, &payload);
                        }
                    }
                }
                Err(error) => error!("failed to serialize component {}: {}", name, error),
            }
        }

        Ok(index)
    }

    /// Typed view of a component, for host code reading replicated state
    pub fn component<C: Replicate + 'static>(
        &self,
        object_id: &ObjectId,
        index: ComponentIndex,
    ) -> Option<&C> {
        self.objects
            .get(object_id)?
            .component(index)?
            .to_any()
            .downcast_ref::<C>()
    }

    /// Typed mutable view of a component; property writes through it mark
    /// dirty bits as usual
    pub fn component_mut<C: Replicate + 'static>(
        &mut self,
        object_id: &ObjectId,
        index: ComponentIndex,
    ) -> Option<&mut C> {
        self.objects
            .get_mut(object_id)?
            .component_mut(index)?
            .to_any_mut()
            .downcast_mut::<C>()
    }

    // Authority

    pub fn set_owner(
        &mut self,
        object_id: &ObjectId,
        owner: Option<UserKey>,
    ) -> Result<(), ServerError> {
        let Some(record) = self.objects.get_mut(object_id) else {
            return Err(ServerError::UnknownObject(*object_id));
        };
        let previous = record.owner();
        record.set_owner(owner);

        if let Some(previous_key) = previous {
            if let Some(user) = self.users.get_mut(&previous_key) {
                user.owned.remove(object_id);
            }
        }
        if let Some(new_key) = owner {
            let Some(user) = self.users.get_mut(&new_key) else {
                return Err(ServerError::UnknownUser);
            };
            user.owned.insert(*object_id);
        }

        // ownership is a visibility-relevant event
        self.observers.request_rebuild(object_id);
        Ok(())
    }

    pub fn is_owned_by(&self, object_id: &ObjectId, user_key: &UserKey) -> bool {
        self.objects
            .get(object_id)
            .is_some_and(|record| record.owner() == Some(*user_key))
    }

    // Visibility inputs

    pub fn set_position(&mut self, object_id: &ObjectId, position: Vec3) {
        if let Some(record) = self.objects.get_mut(object_id) {
            record.set_position(position);
        }
    }

    pub fn set_partition(&mut self, object_id: &ObjectId, partition: Option<PartitionId>) {
        if let Some(record) = self.objects.get_mut(object_id) {
            record.set_partition(partition);
            self.observers.request_rebuild(object_id);
        }
    }

    /// Explicit rebuild request, for visibility-relevant state the engine
    /// cannot see change
    pub fn request_observer_rebuild(&mut self, object_id: &ObjectId) {
        self.observers.request_rebuild(object_id);
    }

    pub fn observers(&self, object_id: &ObjectId) -> Option<Vec<UserKey>> {
        self.observers
            .observers(object_id)
            .map(|set| set.iter().copied().collect())
    }

    // Outgoing calls

    /// Sends a call to every connection currently observing the object.
    /// Ignored, with a warning, while the server is not listening.
    pub fn broadcast_call(
        &mut self,
        object_id: &ObjectId,
        component_index: ComponentIndex,
        func_id: FuncId,
        args: &[u8],
    ) {
        if !self.listening {
            warn!("broadcast call issued while server is not listening, ignoring");
            return;
        }
        let Some(observers) = self.observers.observers(object_id) else {
            warn!("broadcast call on untracked object {:?}, ignoring", object_id);
            return;
        };
        let payload = build_call_packet(object_id, component_index, func_id, args);
        let Some(sender) = self.sender.as_mut() else {
            return;
        };
        for user_key in observers {
            // a connection may vanish between set computation and send
            let Some(user) = self.users.get(user_key) else {
                continue;
            };
            if !user.in_scope.contains(object_id) {
                continue;
            }
            sender.send(user_key, ChannelKind::Reliable, &payload);
        }
    }

    /// Connection-override form of [`Server::broadcast_call`]: delivers to
    /// the one given connection only. Used by hosts that are both server and
    /// client to hand a broadcast straight back to the local caller.
    pub fn broadcast_call_to(
        &mut self,
        user_key: &UserKey,
        object_id: &ObjectId,
        component_index: ComponentIndex,
        func_id: FuncId,
        args: &[u8],
    ) {
        if !self.listening {
            warn!("broadcast call issued while server is not listening, ignoring");
            return;
        }
        self.send_call_to(user_key, object_id, component_index, func_id, args);
    }

    /// Sends a call to the object's owning connection
    pub fn targeted_call(
        &mut self,
        object_id: &ObjectId,
        component_index: ComponentIndex,
        func_id: FuncId,
        args: &[u8],
    ) {
        let Some(record) = self.objects.get(object_id) else {
            warn!("targeted call on nonexistent object {:?}, ignoring", object_id);
            return;
        };
        let Some(owner) = record.owner() else {
            warn!("targeted call on unowned object {:?}, ignoring", object_id);
            return;
        };
        self.send_call_to(&owner, object_id, component_index, func_id, args);
    }

    /// Sends a call to an explicitly chosen connection. The connection is
    /// resolved locally on the receiving side; it never crosses the wire.
    pub fn targeted_call_to(
        &mut self,
        user_key: &UserKey,
        object_id: &ObjectId,
        component_index: ComponentIndex,
        func_id: FuncId,
        args: &[u8],
    ) {
        self.send_call_to(user_key, object_id, component_index, func_id, args);
    }

    fn send_call_to(
        &mut self,
        user_key: &UserKey,
        object_id: &ObjectId,
        component_index: ComponentIndex,
        func_id: FuncId,
        args: &[u8],
    ) {
        let Some(user) = self.users.get(user_key) else {
            return;
        };
        if !user.in_scope.contains(object_id) {
            warn!(
                "call to user {:?} dropped, object {:?} not in its scope",
                user_key, object_id
            );
            return;
        }
        let payload = build_call_packet(object_id, component_index, func_id, args);
        if let Some(sender) = self.sender.as_mut() {
            sender.send(user_key, ChannelKind::Reliable, &payload);
        }
    }

    // Incoming

    /// Entry point for payloads the transport received from a client.
    ///
    /// Authority violations are recovered here (warn, drop, connection
    /// stays). Protocol violations (malformed bytes, unknown identifiers,
    /// packet types a client may not send) disconnect the sender when the
    /// config says so, and are returned so the host can drop the transport
    /// connection too.
    pub fn receive_packet(
        &mut self,
        user_key: &UserKey,
        payload: &[u8],
    ) -> Result<(), ServerError> {
        if !self.users.contains_key(user_key) {
            return Err(ServerError::UnknownUser);
        }

        let mut reader = ByteReader::new(payload);
        let result = match PacketType::de(&mut reader) {
            Ok(PacketType::Call) => self.receive_call(user_key, &mut reader),
            Ok(PacketType::Delta) => self.receive_owner_delta(user_key, &mut reader),
            Ok(other) => Err(ServerError::UnexpectedPacket(other)),
            Err(serde_err) => Err(serde_err.into()),
        };

        if let Err(server_error) = &result {
            if is_protocol_violation(server_error) {
                error!(
                    "protocol violation from user {:?}: {}",
                    user_key, server_error
                );
                if self.config.disconnect_on_protocol_error {
                    self.disconnect_user(user_key);
                }
            }
        }

        result
    }

    fn receive_call(
        &mut self,
        user_key: &UserKey,
        reader: &mut ByteReader,
    ) -> Result<(), ServerError> {
        let object_id = ObjectId::de(reader)?;
        let component_index = reader.read_u8()?;
        let func_id = FuncId::de(reader)?;

        let Some(record) = self.objects.get_mut(&object_id) else {
            // call raced a despawn; nothing hostile about that
            warn!("call for nonexistent object {:?}, dropping", object_id);
            return Ok(());
        };
        let owner = record.owner();
        let Some(component) = record.component_mut(component_index) else {
            return Err(ServerError::UnknownComponent {
                object_id,
                index: component_index,
            });
        };

        let kind = component.kind();
        let Some(descriptor) = self.protocol.remote_calls().descriptor(&kind, &func_id) else {
            return Err(RemoteCallError::UnknownFuncId { func_id }.into());
        };

        match descriptor.kind {
            CallKind::ServerBound { ignore_authority } => {
                if !ignore_authority && owner != Some(*user_key) {
                    warn!(
                        "dropping server-bound call {} from non-owner {:?}",
                        descriptor.name, user_key
                    );
                    return Ok(());
                }
            }
            CallKind::Broadcast | CallKind::Targeted => {
                return Err(ServerError::NotServerBound(descriptor.name));
            }
        }

        let context = CallContext {
            host: HostType::Server,
            object: object_id,
            component_index,
            is_owner: true,
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

    /// An owner pushing local state for an object it has authority over.
    /// The applied mask is merged back into dirty tracking so the change
    /// relays to the other observers on the next flush.
    fn receive_owner_delta(
        &mut self,
        user_key: &UserKey,
        reader: &mut ByteReader,
    ) -> Result<(), ServerError> {
        let object_id = ObjectId::de(reader)?;
        let component_index = reader.read_u8()?;

        let Some(record) = self.objects.get_mut(&object_id) else {
            warn!("state push for nonexistent object {:?}, dropping", object_id);
            return Ok(());
        };
        if record.owner() != Some(*user_key) {
            warn!(
                "dropping state push for object {:?} from non-owner {:?}",
                object_id, user_key
            );
            return Ok(());
        }
        let Some(component) = record.component_mut(component_index) else {
            return Err(ServerError::UnknownComponent {
                object_id,
                index: component_index,
            });
        };

        let mask = component.read_delta(reader)?;
        if let Some(receiver) = self.diff_handler.receiver(&object_id, component_index) {
            receiver.or_mask(&mask);
        }
        Ok(())
    }

    // Updates

    /// Sends all update messages to all clients: the once-per-tick flush.
    ///
    /// Recomputes invalidated observer sets, serializes one delta per
    /// changed component (clearing its mask for the next interval), then
    /// walks connections in shuffled order so no user gets systematic
    /// priority: new observers get the object's full state, standing
    /// observers get the deltas, lapsed observers get a despawn.
    pub fn send_all_updates(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        // interval-driven strategies recompute everything on their period
        if let Some(interval) = self.visibility.tick_interval() {
            if interval > 0 && self.tick % interval == 0 {
                self.observers.request_rebuild_all();
            }
        }

        let ctx = VisibilityCtx {
            users: &self.users,
            rooms: &self.rooms,
            objects: &self.objects,
        };
        self.observers.rebuild_pending(&ctx, self.visibility.as_ref());

        // serialize each changed component once, clearing its dirty mask
        let mut deltas: HashMap<(ObjectId, ComponentIndex), Vec<u8>> = HashMap::new();
        for (object_id, record) in self.objects.iter() {
            for (index, component) in record.components().iter().enumerate() {
                let index = index as ComponentIndex;
                let Some(receiver) = self.diff_handler.receiver(&object_id, index) else {
                    continue;
                };
                if receiver.is_clear() {
                    continue;
                }
                let mask = receiver.take_mask();
                let payload = build_delta_packet(&object_id, index, &mask, component.as_ref());
                deltas.insert((object_id, index), payload);
            }
        }

        let Some(sender) = self.sender.as_mut() else {
            return;
        };

        // shuffle order of connections in order to avoid priority among users
        let mut user_keys: Vec<UserKey> = self.users.keys().collect();
        fastrand::shuffle(&mut user_keys);

        for user_key in user_keys {
            // tolerate a connection disappearing between computation and send
            let Some(user) = self.users.get_mut(&user_key) else {
                continue;
            };

            for (object_id, record) in self.objects.iter() {
                let observing = self.observers.is_observed_by(&object_id, &user_key);
                let known = user.in_scope.contains(&object_id);

                if observing && !known {
                    // first observation: spawn + full state, no masks
                    let owned = record.owner() == Some(user_key);
                    match build_spawn_packet(&self.protocol, &object_id, record, owned) {
                        Ok(payload) => {
                            sender.send(&user_key, ChannelKind::Reliable, &payload)
                        }
                        Err(error) => {
                            error!("failed to serialize spawn of {:?}: {}", object_id, error);
                            continue;
                        }
                    }
                    for (index, component) in record.components().iter().enumerate() {
                        let index = index as ComponentIndex;
                        match build_full_state_packet(
                            &self.protocol,
                            &object_id,
                            index,
                            component.as_ref(),
                        ) {
                            Ok(payload) => {
                                sender.send(&user_key, ChannelKind::Reliable, &payload)
                            }
                            Err(error) => error!(
                                "failed to serialize full state of {:?}: {}",
                                object_id, error
                            ),
                        }
                    }
                    user.in_scope.insert(object_id);
                } else if observing && known {
                    for index in 0..record.component_count() as ComponentIndex {
                        if let Some(payload) = deltas.get(&(object_id, index)) {
                            sender.send(&user_key, ChannelKind::Reliable, payload);
                        }
                    }
                } else if !observing && known {
                    let payload = build_despawn_packet(&object_id);
                    sender.send(&user_key, ChannelKind::Reliable, &payload);
                    user.in_scope.remove(&object_id);
                }
            }
        }
    }

    // Crate-public delegates used by the fluent Ref/Mut wrappers

    pub(crate) fn user_address(&self, user_key: &UserKey) -> Option<SocketAddr> {
        self.users.get(user_key).and_then(|user| user.address())
    }

    pub(crate) fn user_room_count(&self, user_key: &UserKey) -> usize {
        self.users.get(user_key).map_or(0, |user| user.room_count())
    }

    pub(crate) fn user_room_keys(&self, user_key: &UserKey) -> Iter<'_, RoomKey> {
        let Some(user) = self.users.get(user_key) else {
            panic!("No User exists for given Key!");
        };
        user.rooms.iter()
    }

    pub(crate) fn user_scope_has_object(&self, user_key: &UserKey, object_id: &ObjectId) -> bool {
        self.users
            .get(user_key)
            .is_some_and(|user| user.in_scope.contains(object_id))
    }

    pub(crate) fn set_user_representative(&mut self, user_key: &UserKey, object_id: &ObjectId) {
        let Some(user) = self.users.get_mut(user_key) else {
            return;
        };
        user.representative = Some(*object_id);
        // which objects this user can observe may change wholesale
        self.observers.request_rebuild_all();
    }

    pub(crate) fn room_add_user(&mut self, room_key: &RoomKey, user_key: &UserKey) {
        let Some(room) = self.rooms.get_mut(room_key) else {
            return;
        };
        let Some(user) = self.users.get_mut(user_key) else {
            return;
        };
        room.add_user(user_key);
        user.rooms.insert(*room_key);
        self.mark_room_objects(room_key);
    }

    pub(crate) fn room_remove_user(&mut self, room_key: &RoomKey, user_key: &UserKey) {
        let Some(room) = self.rooms.get_mut(room_key) else {
            return;
        };
        if room.remove_user(user_key) {
            if let Some(user) = self.users.get_mut(user_key) {
                user.rooms.remove(room_key);
            }
            self.mark_room_objects(room_key);
        }
    }

    pub(crate) fn room_add_object(&mut self, room_key: &RoomKey, object_id: &ObjectId) {
        let Some(room) = self.rooms.get_mut(room_key) else {
            return;
        };
        room.add_object(object_id);
        self.observers.request_rebuild(object_id);
    }

    pub(crate) fn room_remove_object(&mut self, room_key: &RoomKey, object_id: &ObjectId) {
        let Some(room) = self.rooms.get_mut(room_key) else {
            return;
        };
        if room.remove_object(object_id) {
            self.observers.request_rebuild(object_id);
        }
    }

    pub(crate) fn room_has_user(&self, room_key: &RoomKey, user_key: &UserKey) -> bool {
        self.rooms
            .get(room_key)
            .is_some_and(|room| room.has_user(user_key))
    }

    pub(crate) fn room_has_object(&self, room_key: &RoomKey, object_id: &ObjectId) -> bool {
        self.rooms
            .get(room_key)
            .is_some_and(|room| room.has_object(object_id))
    }

    pub(crate) fn room_users_count(&self, room_key: &RoomKey) -> usize {
        self.rooms.get(room_key).map_or(0, |room| room.users_count())
    }

    pub(crate) fn room_objects_count(&self, room_key: &RoomKey) -> usize {
        self.rooms
            .get(room_key)
            .map_or(0, |room| room.objects_count())
    }

    fn mark_room_objects(&mut self, room_key: &RoomKey) {
        let Some(room) = self.rooms.get(room_key) else {
            return;
        };
        let object_ids: Vec<ObjectId> = room.object_ids().copied().collect();
        for object_id in object_ids {
            self.observers.request_rebuild(&object_id);
        }
    }
}

fn is_protocol_violation(error: &ServerError) -> bool {
    match error {
        ServerError::Malformed(_)
        | ServerError::UnexpectedPacket(_)
        | ServerError::UnknownComponent { .. }
        | ServerError::NotServerBound(_) => true,
        ServerError::RemoteCall(remote_call_error) => matches!(
            remote_call_error,
            RemoteCallError::UnknownFuncId { .. } | RemoteCallError::Malformed(_)
        ),
        _ => false,
    }
}

// Packet builders. Shapes documented on PacketType.

fn build_spawn_packet(
    protocol: &Protocol,
    object_id: &ObjectId,
    record: &ObjectRecord,
    owned: bool,
) -> Result<Vec<u8>, ServerError> {
    let mut writer = ByteWriter::new();
    PacketType::Spawn.ser(&mut writer);
    object_id.ser(&mut writer);
    owned.ser(&mut writer);
    writer.write_u8(record.component_count() as u8);
    for component in record.components() {
        let net_id = protocol.component_kinds().kind_to_net_id(&component.kind())?;
        writer.write_u16(net_id);
    }
    Ok(writer.to_bytes())
}

fn build_despawn_packet(object_id: &ObjectId) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    PacketType::Despawn.ser(&mut writer);
    object_id.ser(&mut writer);
    writer.to_bytes()
}

fn build_full_state_packet(
    protocol: &Protocol,
    object_id: &ObjectId,
    component_index: ComponentIndex,
    component: &dyn Replicate,
) -> Result<Vec<u8>, ServerError> {
    let net_id = protocol.component_kinds().kind_to_net_id(&component.kind())?;
    let mut writer = ByteWriter::new();
    PacketType::FullState.ser(&mut writer);
    object_id.ser(&mut writer);
    writer.write_u8(component_index);
    writer.write_u16(net_id);
    component.write_full(&mut writer);
    Ok(writer.to_bytes())
}

fn build_delta_packet(
    object_id: &ObjectId,
    component_index: ComponentIndex,
    mask: &DiffMask,
    component: &dyn Replicate,
) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    PacketType::Delta.ser(&mut writer);
    object_id.ser(&mut writer);
    writer.write_u8(component_index);
    component.write_delta(mask, &mut writer);
    writer.to_bytes()
}

fn build_call_packet(
    object_id: &ObjectId,
    component_index: ComponentIndex,
    func_id: FuncId,
    args: &[u8],
) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    PacketType::Call.ser(&mut writer);
    object_id.ser(&mut writer);
    writer.write_u8(component_index);
    func_id.ser(&mut writer);
    writer.write_bytes(args);
    writer.to_bytes()
}
