use std::collections::HashSet;

use mimic_shared::{BigMap, ObjectId, Tick};

use crate::{
    object::ObjectRecord,
    room::{Room, RoomKey},
    user::{User, UserKey},
};

/// Read-only view of server state a visibility strategy evaluates against
pub struct VisibilityCtx<'c> {
    pub users: &'c BigMap<UserKey, User>,
    pub rooms: &'c BigMap<RoomKey, Room>,
    pub objects: &'c BigMap<ObjectId, ObjectRecord>,
}

/// Pluggable rule deciding which connections may observe a replicated
/// object. Observer sets are only ever produced by these rules; they are
/// recomputed on explicit triggers, never guessed.
pub trait Visibility {
    /// Interval, in ticks, at which every observer set should be recomputed
    /// regardless of events. `None` means event-driven rebuilds only.
    fn tick_interval(&self) -> Option<Tick> {
        None
    }

    /// Override hook: a strategy that writes `out` itself and returns true
    /// is fully responsible for the observer set, and the default
    /// per-connection scan must not also run.
    fn rebuild(
        &self,
        ctx: &VisibilityCtx,
        object_id: ObjectId,
        initialize: bool,
        out: &mut HashSet<UserKey>,
    ) -> bool {
        let _ = (ctx, object_id, initialize, out);
        false
    }

    /// Default predicate, evaluated against every candidate connection
    fn can_observe(&self, ctx: &VisibilityCtx, object_id: ObjectId, user_key: UserKey) -> bool;
}

/// Group/match membership: users and objects sharing a room observe each
/// other exclusively. An object moved between rooms leaves the old set and
/// enters the new one on the next rebuild of each.
pub struct RoomVisibility;

impl Visibility for RoomVisibility {
    fn can_observe(&self, ctx: &VisibilityCtx, object_id: ObjectId, user_key: UserKey) -> bool {
        ctx.rooms
            .iter()
            .any(|(_, room)| room.has_object(&object_id) && room.has_user(&user_key))
    }
}

/// Logical partition ("scene"): a connection observes an object only when
/// its own representative object sits in the same partition
pub struct PartitionVisibility;

impl Visibility for PartitionVisibility {
    fn can_observe(&self, ctx: &VisibilityCtx, object_id: ObjectId, user_key: UserKey) -> bool {
        let Some(record) = ctx.objects.get(&object_id) else {
            return false;
        };
        let Some(partition) = record.partition() else {
            return false;
        };
        let Some(user) = ctx.users.get(&user_key) else {
            return false;
        };
        let Some(representative) = user.representative() else {
            return false;
        };
        let Some(representative_record) = ctx.objects.get(&representative) else {
            return false;
        };
        representative_record.partition() == Some(partition)
    }
}

/// Euclidean proximity under a fixed radius, recomputed on a fixed tick
/// interval. Deliberately brute force: the predicate runs against the
/// connection count, not the object count.
pub struct ProximityVisibility {
    pub radius: f32,
    pub interval: Tick,
}

impl ProximityVisibility {
    pub fn new(radius: f32, interval: Tick) -> Self {
        Self { radius, interval }
    }
}

impl Visibility for ProximityVisibility {
    fn tick_interval(&self) -> Option<Tick> {
        Some(self.interval)
    }

    fn can_observe(&self, ctx: &VisibilityCtx, object_id: ObjectId, user_key: UserKey) -> bool {
        let Some(record) = ctx.objects.get(&object_id) else {
            return false;
        };
        let Some(position) = record.position() else {
            return false;
        };
        let Some(user) = ctx.users.get(&user_key) else {
            return false;
        };
        let Some(representative) = user.representative() else {
            return false;
        };
        let Some(representative_record) = ctx.objects.get(&representative) else {
            return false;
        };
        let Some(user_position) = representative_record.position() else {
            return false;
        };
        position.distance(user_position) <= self.radius
    }
}

/// Ownership-only: exactly the authoritative connection observes,
/// recomputed on ownership change
pub struct OwnerVisibility;

impl Visibility for OwnerVisibility {
    fn can_observe(&self, ctx: &VisibilityCtx, object_id: ObjectId, user_key: UserKey) -> bool {
        let Some(record) = ctx.objects.get(&object_id) else {
            return false;
        };
        record.owner() == Some(user_key)
    }
}
