//! Top/bottom extractor.

use serde::{Deserialize, Serialize};

use super::ranking::Rankable;

/// Best and worst groups of a ranked sequence.
///
/// `bottom[0]` is the single worst qualifying group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extremes<T> {
    pub top: Vec<T>,
    pub bottom: Vec<T>,
    /// Groups that met the sample-size threshold.
    pub qualifying: usize,
}

impl<T> Default for Extremes<T> {
    fn default() -> Self {
        Self {
            top: Vec::new(),
            bottom: Vec::new(),
            qualifying: 0,
        }
    }
}

/// Take the first `n_top` and last `n_bottom` groups with at least
/// `min_sample` records. Short populations return what qualifies.
pub fn extract_extremes<T: Rankable + Clone>(
    ranked: &[T],
    min_sample: u64,
    n_top: usize,
    n_bottom: usize,
) -> Extremes<T> {
    let qualifying: Vec<&T> = ranked
        .iter()
        .filter(|item| item.sample_size() >= min_sample)
        .collect();

    let top = qualifying.iter().take(n_top).map(|&t| t.clone()).collect();
    let bottom = qualifying
        .iter()
        .rev()
        .take(n_bottom)
        .map(|&t| t.clone())
        .collect();

    Extremes {
        top,
        bottom,
        qualifying: qualifying.len(),
    }
}
