use serde::{Deserialize, Serialize};

/// Job priority for queue ordering (higher values dispatch first)
///
/// Wraps a signed integer so callers can express arbitrary orderings;
/// negative values are valid and indicate lower-than-normal priority.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct JobPriority(pub i32);

// Dispatch ordering: pending entries sort by (priority descending, arrival
// ascending) - higher priority first, FIFO within the same priority.

impl JobPriority {
    /// Low priority jobs (processed last)
    pub const LOW: Self = Self(-10);

    /// Normal priority jobs (default)
    pub const NORMAL: Self = Self(0);

    /// High priority jobs (processed first)
    pub const HIGH: Self = Self(10);

    /// Critical priority jobs (processed before everything else)
    pub const CRITICAL: Self = Self(100);

    /// Create a priority from a raw value
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the numeric value for ordering
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Get a human-readable name for the named levels
    pub fn name(self) -> &'static str {
        match self {
            Self::LOW => "low",
            Self::NORMAL => "normal",
            Self::HIGH => "high",
            Self::CRITICAL => "critical",
            _ => "custom",
        }
    }
}

impl From<i32> for JobPriority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for JobPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::LOW),
            "normal" => Ok(Self::NORMAL),
            "high" => Ok(Self::HIGH),
            "critical" => Ok(Self::CRITICAL),
            other => other
                .parse::<i32>()
                .map(Self)
                .map_err(|_| format!("Invalid priority: {}", s)),
        }
    }
}
