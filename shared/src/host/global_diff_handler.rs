use std::collections::HashMap;

use log::info;

use crate::types::{ComponentIndex, ObjectId};

use super::{
    error::DiffHandlerError,
    mut_channel::{MutChannel, MutReceiver, MutSender},
};

/// Owns the dirty-mask channel of every replicated component on this host.
///
/// Registered when a component is attached to an object, deregistered when
/// the component or its object goes away. One registration per
/// `(object, component index)` slot; a second is a programming error
/// surfaced as [`DiffHandlerError::AlreadyRegistered`].
pub struct GlobalDiffHandler {
    receivers: HashMap<(ObjectId, ComponentIndex), MutReceiver>,
}

impl GlobalDiffHandler {
    pub fn new() -> Self {
        Self {
            receivers: HashMap::new(),
        }
    }

    pub fn register_component(
        &mut self,
        object_id: &ObjectId,
        component_index: ComponentIndex,
        component_name: &str,
    ) -> Result<MutSender, DiffHandlerError> {
        use crate::bigmap::BigMapKey;

        if self.receivers.contains_key(&(*object_id, component_index)) {
            return Err(DiffHandlerError::AlreadyRegistered {
                object_id: object_id.to_u64(),
                component_index,
            });
        }

        let (sender, receiver) = MutChannel::new_channel();

        info!(
            "registering dirty tracking for component {} of object {:?}",
            component_name, object_id
        );
        self.receivers.insert((*object_id, component_index), receiver);

        Ok(sender)
    }

    pub fn deregister_component(&mut self, object_id: &ObjectId, component_index: ComponentIndex) {
        self.receivers.remove(&(*object_id, component_index));
    }

    pub fn deregister_object(&mut self, object_id: &ObjectId) {
        self.receivers.retain(|(id, _), _| id != object_id);
    }

    pub fn receiver(
        &self,
        object_id: &ObjectId,
        component_index: ComponentIndex,
    ) -> Option<&MutReceiver> {
        self.receivers.get(&(*object_id, component_index))
    }
}

impl Default for GlobalDiffHandler {
    fn default() -> Self {
        Self::new()
    }
}
