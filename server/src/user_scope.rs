use mimic_shared::ObjectId;

use crate::{server::Server, user::UserKey};

/// Read-only view of which objects a connection has currently been
/// introduced to. The set itself is owned by the coordinator and driven by
/// interest management; hosts only ever query it.
pub struct UserScopeRef<'s> {
    server: &'s Server,
    key: UserKey,
}

impl<'s> UserScopeRef<'s> {
    pub(crate) fn new(server: &'s Server, key: &UserKey) -> Self {
        Self { server, key: *key }
    }

    /// Returns true if the User's scope contains the object
    pub fn has(&self, object_id: &ObjectId) -> bool {
        self.server.user_scope_has_object(&self.key, object_id)
    }
}
