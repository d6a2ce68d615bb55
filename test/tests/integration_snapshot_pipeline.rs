//! The presentation path end to end: replicated transform updates feed a
//! snapshot buffer on the receiving side, render-time sampling interpolates
//! between them, and the time-free smoother handles owner motion.

use mimic_client::{ClientEvent, MotionSmoother, SnapshotBuffer};
use mimic_server::{RoomVisibility, UserKey};
use mimic_shared::{ObjectId, Pose, Quat, Vec3};
use mimic_test::{TestPair, Transform};

fn transform_pair() -> (TestPair, UserKey, ObjectId) {
    let mut pair = TestPair::new(Box::new(RoomVisibility));
    let user = pair.connect_client();
    let object = pair.server.spawn_object();
    pair.server
        .insert_component(&object, Box::new(Transform::default()))
        .expect("insert transform");
    let room = pair.server.make_room().key();
    pair.server.room_mut(&room).add_user(&user).add_object(&object);
    (pair, user, object)
}

fn replicated_pose(pair: &mut TestPair, user: &UserKey, object: &ObjectId) -> Pose {
    let transform = pair
        .client(user)
        .component::<Transform>(object, 0)
        .expect("transform replicated");
    Pose::new(*transform.position, *transform.rotation)
}

/// Moves the object on the server, flushes, and feeds the replicated pose
/// into the buffer the way a host loop would on an update event
fn replicate_sample(
    pair: &mut TestPair,
    user: &UserKey,
    object: &ObjectId,
    buffer: &mut SnapshotBuffer,
    position: Vec3,
    timestamp: f64,
) {
    pair.server
        .component_mut::<Transform>(object, 0)
        .expect("transform on server")
        .position
        .set(position);
    pair.flush_server();
    let saw_update = pair
        .client(user)
        .take_events()
        .iter()
        .any(|event| matches!(event, ClientEvent::Updated(id, 0, _) if id == object));
    assert!(saw_update);
    buffer.insert(replicated_pose(pair, user, object), timestamp);
}

#[test]
fn replicated_motion_interpolates_between_snapshots() {
    let (mut pair, user, object) = transform_pair();
    pair.flush_server();
    pair.client(&user).take_events();

    let mut buffer = SnapshotBuffer::new();
    buffer.insert(replicated_pose(&mut pair, &user, &object), 0.0);
    replicate_sample(&mut pair, &user, &object, &mut buffer, Vec3::new(10.0, 0.0, 0.0), 1.0);

    let midpoint = buffer.sample(0.5);
    assert_eq!(midpoint.position, Vec3::new(5.0, 0.0, 0.0));

    // out of range: newest sample unchanged, no extrapolation
    let late = buffer.sample(2.0);
    assert_eq!(late.position, Vec3::new(10.0, 0.0, 0.0));

    // trimming honors the configured retention floor
    let keep = pair.client(&user).config().interpolation.trim_keep;
    buffer.trim(10.0, keep);
    assert_eq!(buffer.len(), keep);
}

#[test]
fn smoother_chases_replicated_goals_at_estimated_speed() {
    let (mut pair, user, object) = transform_pair();
    pair.flush_server();
    pair.client(&user).take_events();

    let mut smoother = MotionSmoother::new();
    smoother.push_goal(replicated_pose(&mut pair, &user, &object), 0.0);

    pair.server
        .component_mut::<Transform>(&object, 0)
        .expect("transform on server")
        .position
        .set(Vec3::new(10.0, 0.0, 0.0));
    pair.flush_server();
    smoother.push_goal(replicated_pose(&mut pair, &user, &object), 1.0);

    // 10 units over 1 second; one 0.1s frame covers 1 unit
    let pose = smoother.update(1.1, 0.1);
    assert!((pose.position.x - 1.0).abs() < 1e-4);
}

#[test]
fn smoother_snaps_when_the_goal_goes_stale() {
    let mut smoother = MotionSmoother::new();
    smoother.push_goal(Pose::new(Vec3::ZERO, Quat::IDENTITY), 0.0);
    smoother.push_goal(Pose::new(Vec3::new(40.0, 0.0, 0.0), Quat::IDENTITY), 1.0);

    // inter-sample interval was 1s; 5.2s past the goal is a discontinuity
    let pose = smoother.update(6.2, 0.016);
    assert_eq!(pose.position, Vec3::new(40.0, 0.0, 0.0));
}
