use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One "I am alive" announcement, exactly one per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beacon {
    pub identity: String,
    pub timestamp: DateTime<Utc>,
}

impl Beacon {
    pub fn new(identity: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            timestamp,
        }
    }

    /// Beacon stamped with the current wall-clock time
    pub fn now(identity: impl Into<String>) -> Self {
        Self::new(identity, Utc::now())
    }
}
