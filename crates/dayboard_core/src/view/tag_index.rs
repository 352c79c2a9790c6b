//! Distinct tag index across notes.

use crate::model::note::Note;
use std::collections::{BTreeMap, BTreeSet};

/// All distinct tags, case-sensitive lexicographic order.
pub fn all_tags<'a, I>(notes: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut unique = BTreeSet::new();
    for note in notes {
        for tag in &note.tags {
            unique.insert(tag.as_str());
        }
    }
    unique.into_iter().map(str::to_string).collect()
}

/// Number of notes carrying each tag, in the same order as [`all_tags`].
pub fn tag_counts<'a, I>(notes: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for note in notes {
        for tag in &note.tags {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }
    counts
}
