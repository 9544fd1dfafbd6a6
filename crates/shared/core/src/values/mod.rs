use chrono::{DateTime, Utc};

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Position of a point in the series (zero-based, shared by all channels)
pub type TickIndex = usize;
