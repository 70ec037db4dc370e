use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Represents the aggregated vote counts for a resource.
///
/// A resource nobody voted on has the default `{0, 0, 0}` counts; it is never an error.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VotesCount {
    pub likes: i64,
    pub dislikes: i64,
    pub total: i64,
}

impl VotesCount {
    /// Builds counts from likes and dislikes, deriving the total.
    pub fn new(likes: i64, dislikes: i64) -> Self {
        Self {
            likes,
            dislikes,
            total: likes + dislikes,
        }
    }

    /// Accounts for one more vote of the given polarity.
    pub fn record(&mut self, liked: bool) {
        if liked {
            self.likes += 1;
        } else {
            self.dislikes += 1;
        }
        self.total += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// How a store answers count queries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CountStrategy {
    /// Aggregate the vote rows on every read.
    #[default]
    Live,
    /// Read a counter table kept up to date in the same transaction as each vote write.
    Maintained,
}

impl FromStr for CountStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "maintained" => Ok(Self::Maintained),
            other => Err(format!("unknown count strategy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_updates_total() {
        let mut counts = VotesCount::default();
        counts.record(true);
        counts.record(true);
        counts.record(false);
        assert_eq!(counts, VotesCount::new(2, 1));
        assert_eq!(counts.total, 3);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(VotesCount::default().is_empty());
        assert!(!VotesCount::new(0, 1).is_empty());
    }

    #[test]
    fn test_count_strategy_from_str() {
        assert_eq!("live".parse::<CountStrategy>(), Ok(CountStrategy::Live));
        assert_eq!(" Maintained ".parse::<CountStrategy>(), Ok(CountStrategy::Maintained));
        assert!("cached".parse::<CountStrategy>().is_err());
    }
}
