use std::default::Default;

/// Contains Config properties which will be used by the Client
#[derive(Clone)]
pub struct ClientConfig {
    pub interpolation: InterpolationConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            interpolation: InterpolationConfig::default(),
        }
    }
}

/// Tuning for client-side presentation of remote motion
#[derive(Clone)]
pub struct InterpolationConfig {
    /// How far behind the newest snapshot render time should sit, in
    /// seconds. Larger values ride out more jitter at the cost of latency.
    pub buffer_delay: f64,
    /// Snapshots always retained when trimming, so a stall in new data
    /// cannot empty the buffer
    pub trim_keep: usize,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            buffer_delay: 0.1,
            trim_keep: 2,
        }
    }
}
