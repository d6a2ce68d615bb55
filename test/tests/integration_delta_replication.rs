//! Dirty-bit change tracking and delta/full-state serialization, exercised
//! over the in-memory link: first-observation full state, sparse deltas,
//! mask clearing, zero-mask payloads, and owner state pushes.

use std::{cell::RefCell, rc::Rc};

use mimic_client::ClientEvent;
use mimic_server::{RoomKey, RoomVisibility, UserKey};
use mimic_shared::{
    ByteReader, ByteWriter, ChangeHook, ComponentKind, DiffMask, MutChannel, ObjectId, PacketType,
    PropertyMutator, Replicate, Serde,
};
use mimic_test::{protocol, Monster, Stats, TestPair};

fn stats_pair() -> (TestPair, UserKey, RoomKey, ObjectId) {
    let mut pair = TestPair::new(Box::new(RoomVisibility));
    let user = pair.connect_client();
    let object = pair.server.spawn_object();
    pair.server
        .insert_component(&object, Box::new(Stats::default()))
        .expect("insert stats");
    let room = pair.server.make_room().key();
    pair.server.room_mut(&room).add_user(&user).add_object(&object);
    (pair, user, room, object)
}

#[test]
fn first_observation_sends_spawn_and_full_state() {
    let (mut pair, user, _room, object) = stats_pair();
    {
        let stats = pair
            .server
            .component_mut::<Stats>(&object, 0)
            .expect("stats on server");
        stats.level.set(3);
        stats.label.set("imp".to_string());
    }
    pair.flush_server();

    let events = pair.client(&user).take_events();
    assert!(events.contains(&ClientEvent::Spawned(object)));

    let client = pair.client(&user);
    let stats = client.component::<Stats>(&object, 0).expect("stats replicated");
    assert_eq!(*stats.level, 3);
    assert_eq!(*stats.label, "imp");
    assert_eq!(*stats.mana, 0);
    assert!(!client.is_owned(&object));
}

#[test]
fn delta_carries_exactly_the_changed_fields() {
    let (mut pair, user, _room, object) = stats_pair();
    pair.flush_server();
    pair.client(&user).take_events();

    {
        let stats = pair
            .server
            .component_mut::<Stats>(&object, 0)
            .expect("stats on server");
        stats.mana.set(55);
        stats.alive.set(true);
        // writing the current value back is a no-op, no dirty bit
        stats.health.set(0);
    }
    pair.flush_server();

    let mut expected = DiffMask::new();
    expected.set_bit(2, true);
    expected.set_bit(5, true);
    let events = pair.client(&user).take_events();
    assert_eq!(events, vec![ClientEvent::Updated(object, 0, expected)]);

    let stats = pair
        .client(&user)
        .component::<Stats>(&object, 0)
        .expect("stats replicated");
    assert_eq!(*stats.mana, 55);
    assert!(*stats.alive);
    assert_eq!(*stats.level, 0);

    // the flush cleared the mask: a quiet tick produces no updates
    pair.flush_server();
    assert!(pair.client(&user).take_events().is_empty());
}

#[test]
fn delta_wire_shape_is_mask_then_set_fields() {
    let mut source = Stats::default();
    let (sender, receiver) = MutChannel::new_channel();
    source.set_mutator(&PropertyMutator::new(sender));

    source.mana.set(55);
    source.alive.set(true);

    let mask = receiver.take_mask();
    assert!(mask.bit(2));
    assert!(mask.bit(5));
    assert_eq!(mask.count_set(), 2);
    assert!(receiver.is_clear());

    let mut writer = ByteWriter::new();
    source.write_delta(&mask, &mut writer);
    let bytes = writer.to_bytes();
    // 8-byte mask first; bits 2 and 5 live in the low little-endian byte
    assert_eq!(bytes[0], 0b0010_0100);
    assert_eq!(&bytes[1..8], &[0u8; 7]);

    let mut target = Stats::default();
    let mut reader = ByteReader::new(&bytes);
    let applied = target.read_delta(&mut reader).expect("delta applies");
    assert_eq!(applied, mask);
    assert_eq!(reader.remaining(), 0);
    assert_eq!(*target.mana, 55);
    assert!(*target.alive);
    assert_eq!(*target.strength, 0);
}

#[test]
fn all_zero_delta_mask_is_no_change_not_an_error() {
    let (mut pair, user, _room, object) = stats_pair();
    pair.flush_server();
    pair.client(&user).take_events();

    let mut writer = ByteWriter::new();
    PacketType::Delta.ser(&mut writer);
    object.ser(&mut writer);
    writer.write_u8(0);
    DiffMask::new().ser(&mut writer);
    let payload = writer.to_bytes();
    // mask occupies its 8 bytes even when clear, and nothing follows
    assert_eq!(payload.len(), 1 + 8 + 1 + 8);

    let result = pair.client(&user).receive_packet(&payload);
    assert!(result.is_ok());
    assert!(pair.client(&user).take_events().is_empty());
}

#[test]
fn base_segment_fields_own_the_low_mask_bits() {
    let schema_protocol = protocol();
    let schema = schema_protocol
        .component_kinds()
        .schema(&ComponentKind::of::<Monster>())
        .expect("monster schema");
    assert_eq!(schema.field_count(), 3);
    assert_eq!(schema.field(0).map(|f| f.name), Some("health"));
    assert_eq!(schema.field(1).map(|f| f.name), Some("stamina"));
    assert_eq!(schema.field(2).map(|f| f.name), Some("rage"));

    let mut monster = Monster::default();
    let (sender, receiver) = MutChannel::new_channel();
    monster.set_mutator(&PropertyMutator::new(sender));

    monster.health.set(80);
    monster.rage.set(3);

    let mask = receiver.take_mask();
    assert!(mask.bit(0));
    assert!(!mask.bit(1));
    assert!(mask.bit(2));
}

#[test]
fn change_hook_fires_after_assignment_and_never_for_equal_values() {
    let (mut pair, user, _room, object) = stats_pair();
    pair.flush_server();
    pair.client(&user).take_events();

    let observed: Rc<RefCell<Vec<(u16, u16)>>> = Rc::new(RefCell::new(Vec::new()));
    let observed_inner = observed.clone();
    pair.client(&user)
        .component_mut::<Stats>(&object, 0)
        .expect("stats replicated")
        .mana
        .on_change(ChangeHook::new(move |old: &u16, new: &u16| {
            observed_inner.borrow_mut().push((*old, *new));
        }));

    pair.server
        .component_mut::<Stats>(&object, 0)
        .expect("stats on server")
        .mana
        .set(7);
    pair.flush_server();

    // the server writing the same value again produces no delta and no hook
    pair.server
        .component_mut::<Stats>(&object, 0)
        .expect("stats on server")
        .mana
        .set(7);
    pair.flush_server();

    assert_eq!(observed.borrow().as_slice(), &[(0, 7)]);
    let stats = pair
        .client(&user)
        .component::<Stats>(&object, 0)
        .expect("stats replicated");
    assert_eq!(*stats.mana, 7);
}

#[test]
fn owner_push_applies_on_server_and_relays_to_other_observers() {
    let mut pair = TestPair::new(Box::new(RoomVisibility));
    let owner = pair.connect_client();
    let other = pair.connect_client();
    let object = pair.server.spawn_object();
    pair.server
        .insert_component(&object, Box::new(Stats::default()))
        .expect("insert stats");
    pair.server.set_owner(&object, Some(owner)).expect("set owner");
    let room = pair.server.make_room().key();
    pair.server
        .room_mut(&room)
        .add_user(&owner)
        .add_user(&other)
        .add_object(&object);
    pair.flush_server();
    pair.client(&owner).take_events();
    pair.client(&other).take_events();

    pair.client(&owner)
        .component_mut::<Stats>(&object, 0)
        .expect("owned stats")
        .mana
        .set(99);
    pair.flush_client(&owner);

    let server_stats = pair
        .server
        .component::<Stats>(&object, 0)
        .expect("stats on server");
    assert_eq!(*server_stats.mana, 99);

    // the applied mask was merged back into dirty tracking, so the change
    // relays to the other observer on the next flush
    pair.flush_server();
    let other_stats = pair
        .client(&other)
        .component::<Stats>(&object, 0)
        .expect("stats replicated");
    assert_eq!(*other_stats.mana, 99);
}

#[test]
fn state_push_from_non_owner_is_dropped() {
    let mut pair = TestPair::new(Box::new(RoomVisibility));
    let owner = pair.connect_client();
    let other = pair.connect_client();
    let object = pair.server.spawn_object();
    pair.server
        .insert_component(&object, Box::new(Stats::default()))
        .expect("insert stats");
    pair.server.set_owner(&object, Some(owner)).expect("set owner");
    let room = pair.server.make_room().key();
    pair.server
        .room_mut(&room)
        .add_user(&owner)
        .add_user(&other)
        .add_object(&object);
    pair.flush_server();

    // hand-built push, since a non-owner client has no dirty tracking to flush
    let mut changed = Stats::default();
    changed.mana.set(13);
    let mut mask = DiffMask::new();
    mask.set_bit(2, true);
    let mut writer = ByteWriter::new();
    PacketType::Delta.ser(&mut writer);
    object.ser(&mut writer);
    writer.write_u8(0);
    changed.write_delta(&mask, &mut writer);

    let result = pair.server.receive_packet(&other, &writer.to_bytes());
    assert!(result.is_ok());
    // recovered locally: nothing applied, sender stays connected
    let server_stats = pair
        .server
        .component::<Stats>(&object, 0)
        .expect("stats on server");
    assert_eq!(*server_stats.mana, 0);
    assert!(pair.server.user_exists(&other));
}
