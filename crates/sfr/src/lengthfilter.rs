use crate::records::ReachRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct LengthFilterResult {
    pub retained: Vec<ReachRecord>,
    pub removed: Vec<ReachRecord>,
}

/// Removes the reaches that are not longer than `reach_cutoff`, a reach at the cutoff is removed
pub fn filter_reaches(reaches: Vec<ReachRecord>, reach_cutoff: f64) -> LengthFilterResult {
    let (removed, retained): (Vec<_>, Vec<_>) = reaches.into_iter().partition(|reach| reach.length <= reach_cutoff);

    for reach in &removed {
        log::debug!(
            "segment: {}, cell: {}, length: {}",
            reach.segment_id,
            reach.cell_id,
            reach.length
        );
    }

    log::info!("removed {} reaches with lengths <= {reach_cutoff}", removed.len());
    LengthFilterResult { retained, removed }
}
