use std::{
    collections::{hash_set::Iter, HashSet},
    net::SocketAddr,
};

use mimic_shared::{BigMapKey, ObjectId};

use crate::{room::RoomKey, server::Server};

// UserKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct UserKey(u64);

impl BigMapKey for UserKey {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        UserKey(value)
    }
}

/// One connected remote peer: the rooms it belongs to, the objects it has
/// authority over, and the objects currently introduced into its scope
pub struct User {
    address: Option<SocketAddr>,
    pub(crate) rooms: HashSet<RoomKey>,
    pub(crate) owned: HashSet<ObjectId>,
    pub(crate) representative: Option<ObjectId>,
    pub(crate) in_scope: HashSet<ObjectId>,
}

impl User {
    pub(crate) fn new(address: Option<SocketAddr>) -> Self {
        Self {
            address,
            rooms: HashSet::new(),
            owned: HashSet::new(),
            representative: None,
            in_scope: HashSet::new(),
        }
    }

    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    /// The object standing in for this connection in partition and
    /// proximity visibility checks
    pub fn representative(&self) -> Option<ObjectId> {
        self.representative
    }

    pub fn owns(&self, object_id: &ObjectId) -> bool {
        self.owned.contains(object_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

// UserRef

pub struct UserRef<'s> {
    server: &'s Server,
    key: UserKey,
}

impl<'s> UserRef<'s> {
    pub(crate) fn new(server: &'s Server, key: &UserKey) -> Self {
        Self { server, key: *key }
    }

    pub fn key(&self) -> UserKey {
        self.key
    }

    pub fn address(&self) -> Option<SocketAddr> {
        self.server.user_address(&self.key)
    }

    pub fn room_count(&self) -> usize {
        self.server.user_room_count(&self.key)
    }

    /// Returns an iterator of all the keys of the Rooms the User belongs to
    pub fn room_keys(&self) -> impl Iterator<Item = &RoomKey> {
        self.server.user_room_keys(&self.key)
    }
}

// UserMut

pub struct UserMut<'s> {
    server: &'s mut Server,
    key: UserKey,
}

impl<'s> UserMut<'s> {
    pub(crate) fn new(server: &'s mut Server, key: &UserKey) -> Self {
        Self { server, key: *key }
    }

    pub fn key(&self) -> UserKey {
        self.key
    }

    pub fn disconnect(&mut self) {
        self.server.disconnect_user(&self.key);
    }

    // Rooms

    pub fn enter_room(&mut self, room_key: &RoomKey) -> &mut Self {
        self.server.room_add_user(room_key, &self.key);

        self
    }

    pub fn leave_room(&mut self, room_key: &RoomKey) -> &mut Self {
        self.server.room_remove_user(room_key, &self.key);

        self
    }

    pub fn room_count(&self) -> usize {
        self.server.user_room_count(&self.key)
    }

    /// Returns an iterator of all the keys of the Rooms the User belongs to
    pub fn room_keys(&self) -> Iter<RoomKey> {
        self.server.user_room_keys(&self.key)
    }

    /// Nominates an owned object to stand in for this connection in
    /// partition and proximity visibility checks
    pub fn set_representative(&mut self, object_id: &ObjectId) -> &mut Self {
        self.server.set_user_representative(&self.key, object_id);

        self
    }
}
