//! Recency buckets for the chat history sidebar.
//!
//! # Invariants
//! - `Today` and `Yesterday` compare local calendar dates, not 24h windows.
//! - `LastWeek` means strictly after `now - 7 days` and not already
//!   `Today`/`Yesterday`.
//! - Grouping keeps source order inside each bucket and lists buckets in
//!   `RecencyBucket::ORDER`, omitting empty ones.

use crate::clock::Timestamp;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyBucket {
    Today,
    Yesterday,
    LastWeek,
    Older,
}

impl RecencyBucket {
    pub const ORDER: [RecencyBucket; 4] =
        [Self::Today, Self::Yesterday, Self::LastWeek, Self::Older];

    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::LastWeek => "Last Week",
            Self::Older => "Older",
        }
    }
}

/// Classifies `timestamp` relative to `now`.
pub fn bucket(timestamp: Timestamp, now: Timestamp) -> RecencyBucket {
    let day = timestamp.date_naive();
    let today = now.date_naive();
    if day == today {
        return RecencyBucket::Today;
    }
    if today.pred_opt() == Some(day) {
        return RecencyBucket::Yesterday;
    }
    if timestamp > now - TimeDelta::days(7) {
        return RecencyBucket::LastWeek;
    }
    RecencyBucket::Older
}

/// One non-empty bucket with its members in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketGroup<'a, T> {
    pub bucket: RecencyBucket,
    pub items: Vec<&'a T>,
}

/// Partitions `items` into recency buckets keyed by `timestamp_of`.
pub fn group_by_recency<'a, T, I, F>(
    items: I,
    now: Timestamp,
    timestamp_of: F,
) -> Vec<BucketGroup<'a, T>>
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Timestamp,
{
    let mut slots: [Vec<&'a T>; 4] = Default::default();
    for item in items {
        let slot = match bucket(timestamp_of(item), now) {
            RecencyBucket::Today => 0,
            RecencyBucket::Yesterday => 1,
            RecencyBucket::LastWeek => 2,
            RecencyBucket::Older => 3,
        };
        slots[slot].push(item);
    }

    RecencyBucket::ORDER
        .into_iter()
        .zip(slots)
        .filter(|(_, members)| !members.is_empty())
        .map(|(bucket, items)| BucketGroup { bucket, items })
        .collect()
}
