use mimic_shared::Pose;

use crate::snapshot::Snapshot;

/// A goal older than this many inter-sample intervals is a discontinuity
/// (teleport, obstacle, lag spike): the smoother snaps instead of chasing it
const TELEPORT_INTERVAL_FACTOR: f64 = 5.0;

/// Time-free smoothing for owner-authoritative local movement.
///
/// Rather than interpolating against render time, estimates instantaneous
/// speed from the previous two received samples and moves the visible pose
/// toward the latest goal at that constant speed. Rotation closes toward the
/// goal by the same fraction the position does.
pub struct MotionSmoother {
    previous: Option<Snapshot>,
    goal: Option<Snapshot>,
    visible: Pose,
    speed: f32,
}

impl MotionSmoother {
    pub fn new() -> Self {
        Self {
            previous: None,
            goal: None,
            visible: Pose::default(),
            speed: 0.0,
        }
    }

    pub fn visible(&self) -> Pose {
        self.visible
    }

    /// Feeds the next received sample. The first sample snaps the visible
    /// pose; later ones update the speed estimate (Δposition / Δtime over
    /// the previous two samples) and become the new goal.
    pub fn push_goal(&mut self, pose: Pose, timestamp: f64) {
        let arriving = Snapshot { timestamp, pose };

        if self.goal.is_none() {
            self.visible = pose;
            self.goal = Some(arriving);
            return;
        }

        self.previous = self.goal.take();
        self.goal = Some(arriving);

        if let (Some(previous), Some(goal)) = (&self.previous, &self.goal) {
            let span = goal.timestamp - previous.timestamp;
            if span > f64::EPSILON {
                self.speed =
                    previous.pose.position.distance(goal.pose.position) / span as f32;
            }
        }
    }

    /// Advances the visible pose by one frame of `frame_delta` seconds.
    ///
    /// Teleport detection: when `now` has drifted more than five times the
    /// previous inter-sample interval past the goal's timestamp, the goal is
    /// stale enough that chasing it would drag the object through space it
    /// never occupied, so the visible pose snaps to the goal directly.
    pub fn update(&mut self, now: f64, frame_delta: f32) -> Pose {
        let Some(goal) = &self.goal else {
            return self.visible;
        };

        if let Some(previous) = &self.previous {
            let interval = goal.timestamp - previous.timestamp;
            if interval > f64::EPSILON
                && now - goal.timestamp > TELEPORT_INTERVAL_FACTOR * interval
            {
                self.visible = goal.pose;
                return self.visible;
            }
        }

        let remaining = self.visible.position.distance(goal.pose.position);
        let step = self.speed * frame_delta;
        if remaining <= step || remaining <= f32::EPSILON {
            self.visible = goal.pose;
            return self.visible;
        }

        let fraction = step / remaining;
        self.visible.position = self.visible.position.move_toward(goal.pose.position, step);
        self.visible.rotation = self.visible.rotation.slerp(goal.pose.rotation, fraction);
        self.visible
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.goal = None;
        self.speed = 0.0;
        self.visible = Pose::default();
    }
}

impl Default for MotionSmoother {
    fn default() -> Self {
        Self::new()
    }
}
