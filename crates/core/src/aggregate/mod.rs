//! Reductions over per-unit classifier output.
//!
//! The two media paths aggregate differently on purpose: the video path
//! collapses the time dimension into per-label counts, while the tone path
//! keeps the full ordered timeline. Downstream consumers expect a count
//! table for emotions and a timeline for tone, so the asymmetry stays.

use crate::emotion::EmotionLabel;
use std::collections::BTreeMap;

/// Occurrence count per label across all scanned units. The counts always
/// sum to the number of units scanned.
pub fn count_labels<I>(labels: I) -> BTreeMap<EmotionLabel, u64>
where
    I: IntoIterator<Item = EmotionLabel>,
{
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}
