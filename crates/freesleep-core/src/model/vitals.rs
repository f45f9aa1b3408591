use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A measured value together with the time it describes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampled<T> {
    pub value: T,
    pub sampled_at: DateTime<Utc>,
}

/// Biometrics for one side, aggregated over the look-back window.
///
/// Every metric is stamped with the end of the most recent sleep record;
/// with no sleep record in the window there is nothing to stamp and all
/// metrics are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub avg_heart_rate: Option<Sampled<f64>>,
    pub min_heart_rate: Option<Sampled<f64>>,
    pub max_heart_rate: Option<Sampled<f64>>,
    pub avg_hrv: Option<Sampled<f64>>,
    pub avg_breathing_rate: Option<Sampled<f64>>,
    pub last_sleep_duration_secs: Option<Sampled<u64>>,
    pub times_exited_bed: Option<Sampled<u32>>,
}

impl Vitals {
    /// Most recent sample time across all metrics.
    pub fn latest_sample(&self) -> Option<DateTime<Utc>> {
        [
            self.avg_heart_rate.map(|s| s.sampled_at),
            self.min_heart_rate.map(|s| s.sampled_at),
            self.max_heart_rate.map(|s| s.sampled_at),
            self.avg_hrv.map(|s| s.sampled_at),
            self.avg_breathing_rate.map(|s| s.sampled_at),
            self.last_sleep_duration_secs.map(|s| s.sampled_at),
            self.times_exited_bed.map(|s| s.sampled_at),
        ]
        .into_iter()
        .flatten()
        .max()
    }

    pub fn is_empty(&self) -> bool {
        self.latest_sample().is_none()
    }
}
