use std::collections::{HashMap, HashSet};

use mimic_shared::ObjectId;

use crate::{
    user::UserKey,
    visibility::{Visibility, VisibilityCtx},
};

/// Maintains, per replicated object, the set of connections currently
/// allowed to receive its updates.
///
/// An object is Unobserved until `track_object` runs (at spawn), after which
/// it is Observed with a concrete, possibly empty, set. Sets are only
/// rewritten inside `rebuild_pending`; every visibility-relevant event marks
/// the object pending instead of mutating the set in place, so one tick sees
/// one consistent set.
pub struct ObserverManager {
    observers: HashMap<ObjectId, HashSet<UserKey>>,
    // pending rebuilds; the flag carries `initialize` from the spawn trigger
    pending: HashMap<ObjectId, bool>,
}

impl ObserverManager {
    pub fn new() -> Self {
        Self {
            observers: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// Transitions an object out of Unobserved at spawn, scheduling its
    /// initial rebuild
    pub fn track_object(&mut self, object_id: &ObjectId) {
        self.observers.insert(*object_id, HashSet::new());
        self.pending.insert(*object_id, true);
    }

    pub fn untrack_object(&mut self, object_id: &ObjectId) {
        self.observers.remove(object_id);
        self.pending.remove(object_id);
    }

    /// Schedules a rebuild for the next flush. No-op for untracked objects.
    pub fn request_rebuild(&mut self, object_id: &ObjectId) {
        if self.observers.contains_key(object_id) {
            self.pending.entry(*object_id).or_insert(false);
        }
    }

    pub fn request_rebuild_all(&mut self) {
        let object_ids: Vec<ObjectId> = self.observers.keys().copied().collect();
        for object_id in object_ids {
            self.pending.entry(object_id).or_insert(false);
        }
    }

    /// Removes a disconnecting user from every observer set, in the same
    /// tick as the disconnect
    pub fn remove_user(&mut self, user_key: &UserKey) {
        for set in self.observers.values_mut() {
            set.remove(user_key);
        }
    }

    pub fn observers(&self, object_id: &ObjectId) -> Option<&HashSet<UserKey>> {
        self.observers.get(object_id)
    }

    pub fn is_observed_by(&self, object_id: &ObjectId, user_key: &UserKey) -> bool {
        self.observers
            .get(object_id)
            .is_some_and(|set| set.contains(user_key))
    }

    /// Recomputes every pending observer set against the given strategy.
    ///
    /// The strategy's override hook runs first; when it claims the rebuild,
    /// the set it wrote is taken as-is and the default candidate scan is
    /// skipped.
    pub fn rebuild_pending(&mut self, ctx: &VisibilityCtx, strategy: &dyn Visibility) {
        let pending: Vec<(ObjectId, bool)> = self.pending.drain().collect();
        for (object_id, initialize) in pending {
            let Some(current) = self.observers.get_mut(&object_id) else {
                continue;
            };

            let mut next = HashSet::new();
            if !strategy.rebuild(ctx, object_id, initialize, &mut next) {
                for user_key in ctx.users.keys() {
                    if strategy.can_observe(ctx, object_id, user_key) {
                        next.insert(user_key);
                    }
                }
            }

            *current = next;
        }
    }
}

impl Default for ObserverManager {
    fn default() -> Self {
        Self::new()
    }
}
