use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a monitored channel
///
/// Wraps the zero-based position of the channel in the series layout.
/// Operators see the one-based ordinal (`1..=C`), which is also what
/// anomaly markers carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(usize);

impl ChannelId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Zero-based position
    pub const fn index(self) -> usize {
        self.0
    }

    /// One-based ordinal used in markers and logs
    pub const fn ordinal(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel#{}", self.ordinal())
    }
}

/// Static description of a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Display name (e.g. "PM10")
    pub name: String,
    /// Measurement unit, if known
    #[serde(default)]
    pub unit: Option<String>,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_is_one_based() {
        let id = ChannelId::new(2);
        assert_eq!(id.index(), 2);
        assert_eq!(id.ordinal(), 3);
        assert_eq!(id.to_string(), "channel#3");
    }
}
