use std::collections::HashSet;

use mimic_shared::{BigMapKey, ObjectId};

use crate::{server::Server, user::UserKey};

// RoomKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct RoomKey(u64);

impl BigMapKey for RoomKey {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        RoomKey(value)
    }
}

/// An opaque group: users and objects inside a room observe each other
/// exclusively under room visibility
pub struct Room {
    users: HashSet<UserKey>,
    objects: HashSet<ObjectId>,
}

impl Room {
    pub(crate) fn new() -> Self {
        Self {
            users: HashSet::new(),
            objects: HashSet::new(),
        }
    }

    pub fn has_user(&self, user_key: &UserKey) -> bool {
        self.users.contains(user_key)
    }

    pub fn has_object(&self, object_id: &ObjectId) -> bool {
        self.objects.contains(object_id)
    }

    pub fn user_keys(&self) -> impl Iterator<Item = &UserKey> {
        self.users.iter()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.iter()
    }

    pub fn users_count(&self) -> usize {
        self.users.len()
    }

    pub fn objects_count(&self) -> usize {
        self.objects.len()
    }

    pub(crate) fn add_user(&mut self, user_key: &UserKey) {
        self.users.insert(*user_key);
    }

    pub(crate) fn remove_user(&mut self, user_key: &UserKey) -> bool {
        self.users.remove(user_key)
    }

    pub(crate) fn add_object(&mut self, object_id: &ObjectId) {
        self.objects.insert(*object_id);
    }

    pub(crate) fn remove_object(&mut self, object_id: &ObjectId) -> bool {
        self.objects.remove(object_id)
    }
}

// RoomRef

pub struct RoomRef<'s> {
    server: &'s Server,
    key: RoomKey,
}

impl<'s> RoomRef<'s> {
    pub(crate) fn new(server: &'s Server, key: &RoomKey) -> Self {
        Self { server, key: *key }
    }

    pub fn key(&self) -> RoomKey {
        self.key
    }

    pub fn has_user(&self, user_key: &UserKey) -> bool {
        self.server.room_has_user(&self.key, user_key)
    }

    pub fn has_object(&self, object_id: &ObjectId) -> bool {
        self.server.room_has_object(&self.key, object_id)
    }

    pub fn users_count(&self) -> usize {
        self.server.room_users_count(&self.key)
    }

    pub fn objects_count(&self) -> usize {
        self.server.room_objects_count(&self.key)
    }
}

// RoomMut

pub struct RoomMut<'s> {
    server: &'s mut Server,
    key: RoomKey,
}

impl<'s> RoomMut<'s> {
    pub(crate) fn new(server: &'s mut Server, key: &RoomKey) -> Self {
        Self { server, key: *key }
    }

    pub fn key(&self) -> RoomKey {
        self.key
    }

    pub fn add_user(&mut self, user_key: &UserKey) -> &mut Self {
        self.server.room_add_user(&self.key, user_key);

        self
    }

    pub fn remove_user(&mut self, user_key: &UserKey) -> &mut Self {
        self.server.room_remove_user(&self.key, user_key);

        self
    }

    pub fn add_object(&mut self, object_id: &ObjectId) -> &mut Self {
        self.server.room_add_object(&self.key, object_id);

        self
    }

    pub fn remove_object(&mut self, object_id: &ObjectId) -> &mut Self {
        self.server.room_remove_object(&self.key, object_id);

        self
    }

    pub fn has_user(&self, user_key: &UserKey) -> bool {
        self.server.room_has_user(&self.key, user_key)
    }

    pub fn has_object(&self, object_id: &ObjectId) -> bool {
        self.server.room_has_object(&self.key, object_id)
    }
}
