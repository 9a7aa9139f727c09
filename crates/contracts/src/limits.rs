//! Limits - capacity/period pair declared by a processor

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// "At most `capacity` items per call, at most one call per `period`."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum item count per call
    pub capacity: u64,
    /// Minimum spacing between successive calls
    #[serde(with = "duration_ms")]
    pub period: Duration,
}

impl Limits {
    /// Create limits from a capacity and a period
    pub fn new(capacity: u64, period: Duration) -> Self {
        Self { capacity, period }
    }

    /// A zero period declares no pacing window at all
    pub fn is_unpaced(&self) -> bool {
        self.period.is_zero()
    }

    /// `min(capacity, len)`, saturating on narrow targets
    pub fn batch_size(&self, len: usize) -> usize {
        usize::try_from(self.capacity).unwrap_or(usize::MAX).min(len)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
