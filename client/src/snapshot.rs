use std::collections::VecDeque;

use log::warn;

use mimic_shared::Pose;

/// An immutable timestamped state sample received for one component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub timestamp: f64,
    pub pose: Pose,
}

/// Ordered ring of pose samples for one remotely-observed component,
/// sampled at render time to present remote motion smoothly.
///
/// Callers insert in non-decreasing timestamp order; ordering is assumed,
/// not enforced. Extrapolation is intentionally not performed: a render time
/// outside the buffered range returns the newest known sample unchanged.
pub struct SnapshotBuffer {
    samples: VecDeque<Snapshot>,
}

impl SnapshotBuffer {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, pose: Pose, timestamp: f64) {
        self.samples.push_back(Snapshot { timestamp, pose });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.samples.back()
    }

    /// Interpolated pose for the given render time.
    ///
    /// Finds the adjacent pair straddling `render_time` and interpolates
    /// (linear position, spherical rotation) by the clamped fraction between
    /// their timestamps. A render time outside the buffered range is an
    /// underrun: the nearest known pose comes back unchanged, with a
    /// recoverable warning logged.
    pub fn sample(&self, render_time: f64) -> Pose {
        let Some(newest) = self.samples.back() else {
            warn!("sampled an empty snapshot buffer, returning identity pose");
            return Pose::default();
        };

        for index in 0..self.samples.len().saturating_sub(1) {
            let from = &self.samples[index];
            let to = &self.samples[index + 1];
            if from.timestamp <= render_time && render_time <= to.timestamp {
                let span = to.timestamp - from.timestamp;
                if span <= f64::EPSILON {
                    return to.pose;
                }
                let fraction = ((render_time - from.timestamp) / span).clamp(0.0, 1.0);
                return from.pose.interpolate(to.pose, fraction as f32);
            }
        }

        warn!(
            "render time {} outside buffered range, returning newest sample",
            render_time
        );
        newest.pose
    }

    /// Drops samples older than `old_time`, always retaining at least
    /// `keep_count` trailing samples so a stall in new data does not empty
    /// the buffer
    pub fn trim(&mut self, old_time: f64, keep_count: usize) {
        while self.samples.len() > keep_count {
            let Some(front) = self.samples.front() else {
                break;
            };
            if front.timestamp >= old_time {
                break;
            }
            self.samples.pop_front();
        }
    }
}

impl Default for SnapshotBuffer {
    fn default() -> Self {
        Self::new()
    }
}
