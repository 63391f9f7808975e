//! Removes flowlines without elevation data and flowlines removed by network thinning.

use std::collections::HashSet;

use crate::records::{FlowlineAttributes, ReachRecord, SegmentId, SegmentRecord};

/// `elevation_max` value of a flowline without elevation data
pub const NO_ELEVATION: f64 = 0.0;
/// `thinning_code` value of a flowline flagged as an artificial or duplicate path
pub const THINNED: f64 = -9.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemovalReason {
    NoElevation,
    Thinned,
    ParentSegmentRemoved,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemovalReason::NoElevation => write!(f, "no elevation data"),
            RemovalReason::Thinned => write!(f, "ThinnerCod=-9"),
            RemovalReason::ParentSegmentRemoved => write!(f, "parent segment removed"),
        }
    }
}

/// The sentinels are flag values, they are compared exactly. Absent attributes never match.
pub fn removal_reason(record: &impl FlowlineAttributes) -> Option<RemovalReason> {
    if record.elevation_max() == Some(NO_ELEVATION) {
        Some(RemovalReason::NoElevation)
    } else if record.thinning_code() == Some(THINNED) {
        Some(RemovalReason::Thinned)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemovalCounts {
    pub no_elevation: usize,
    pub thinned: usize,
    pub parent_segment_removed: usize,
}

impl RemovalCounts {
    fn add(&mut self, reason: RemovalReason) {
        match reason {
            RemovalReason::NoElevation => self.no_elevation += 1,
            RemovalReason::Thinned => self.thinned += 1,
            RemovalReason::ParentSegmentRemoved => self.parent_segment_removed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.no_elevation + self.thinned + self.parent_segment_removed
    }

    fn log(&self, kind: &str) {
        log::info!("removed {} {kind} without elevation data", self.no_elevation);
        log::info!("removed {} {kind} with ThinnerCod=-9", self.thinned);
        if self.parent_segment_removed > 0 {
            log::info!("removed {} {kind} of removed segments", self.parent_segment_removed);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeFilterResult<T> {
    /// The retained records, in input order
    pub retained: Vec<T>,
    pub removed: Vec<(T, RemovalReason)>,
}

impl<T> AttributeFilterResult<T> {
    pub fn counts(&self) -> RemovalCounts {
        let mut counts = RemovalCounts::default();
        for (_, reason) in &self.removed {
            counts.add(*reason);
        }

        counts
    }
}

impl AttributeFilterResult<SegmentRecord> {
    /// Ids of the removed segments that have no retained record left
    pub fn removed_segment_ids(&self) -> HashSet<SegmentId> {
        let retained: HashSet<&SegmentId> = self.retained.iter().map(|seg| &seg.segment_id).collect();
        self.removed
            .iter()
            .map(|(seg, _)| &seg.segment_id)
            .filter(|id| !retained.contains(id))
            .cloned()
            .collect()
    }
}

fn partition<T>(records: Vec<T>, reason: impl Fn(&T) -> Option<RemovalReason>) -> AttributeFilterResult<T> {
    let mut result = AttributeFilterResult {
        retained: Vec::with_capacity(records.len()),
        removed: Vec::new(),
    };

    for record in records {
        match reason(&record) {
            Some(reason) => result.removed.push((record, reason)),
            None => result.retained.push(record),
        }
    }

    result
}

pub fn filter_segments(segments: Vec<SegmentRecord>) -> AttributeFilterResult<SegmentRecord> {
    let result = partition(segments, removal_reason);
    for (seg, reason) in &result.removed {
        log::debug!("{} {reason}", seg.segment_id);
    }

    result.counts().log("segments");
    result
}

/// Applies the segment predicate to the attributes the reaches inherited and removes the reaches
/// of the segments in `removed_segments`
pub fn filter_reaches(
    reaches: Vec<ReachRecord>,
    removed_segments: &HashSet<SegmentId>,
) -> AttributeFilterResult<ReachRecord> {
    let result = partition(reaches, |reach| {
        removal_reason(reach).or_else(|| {
            removed_segments
                .contains(&reach.segment_id)
                .then_some(RemovalReason::ParentSegmentRemoved)
        })
    });

    for (reach, reason) in &result.removed {
        log::debug!("{} (cell {}) {reason}", reach.segment_id, reach.cell_id);
    }

    result.counts().log("reaches");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CellId;

    fn segment(id: i64, elevation_max: f64, thinning_code: f64) -> SegmentRecord {
        SegmentRecord {
            row: id as usize,
            segment_id: SegmentId::from(id),
            elevation_max,
            thinning_code,
        }
    }

    fn reach(segment: i64, cell: i64, elevation_max: Option<f64>, thinning_code: Option<f64>) -> ReachRecord {
        ReachRecord {
            row: 0,
            segment_id: SegmentId::from(segment),
            cell_id: CellId::from(cell),
            length: 100.0,
            elevation_max,
            thinning_code,
        }
    }

    #[test_log::test]
    fn sentinels_are_exact() {
        let result = filter_segments(vec![
            segment(1, 0.0001, 1.0),
            segment(2, 0.0, 1.0),
            segment(3, 250.0, -9.0),
            segment(4, 250.0, -9.0001),
            segment(5, -0.0, 0.0),
        ]);

        let retained: Vec<_> = result.retained.iter().map(|s| s.segment_id.to_string()).collect();
        assert_eq!(retained, ["1", "4"]);
        assert_eq!(
            result.counts(),
            RemovalCounts {
                no_elevation: 2,
                thinned: 1,
                parent_segment_removed: 0
            }
        );
    }

    #[test_log::test]
    fn thinned_segment_is_removed_regardless_of_elevation() {
        let result = filter_segments(vec![segment(7, 1200.5, -9.0)]);
        assert!(result.retained.is_empty());
        assert_eq!(result.removed[0].1, RemovalReason::Thinned);
    }

    #[test_log::test]
    fn elevation_takes_precedence() {
        let result = filter_segments(vec![segment(7, 0.0, -9.0)]);
        assert_eq!(result.removed[0].1, RemovalReason::NoElevation);
    }

    #[test_log::test]
    fn one_segment_without_elevation() {
        let result = filter_segments(vec![
            segment(1, 310.0, 1.0),
            segment(2, 0.0, 1.0),
            segment(3, 295.2, 2.0),
        ]);

        assert_eq!(result.retained.len(), 2);
        assert_eq!(result.counts().total(), 1);
        assert_eq!(result.counts().no_elevation, 1);
    }

    #[test_log::test]
    fn removed_segment_ids_skip_retained_duplicates() {
        let result = filter_segments(vec![segment(1, 0.0, 1.0), segment(2, 0.0, 1.0), segment(2, 10.0, 1.0)]);
        let removed = result.removed_segment_ids();
        assert_eq!(removed.len(), 1);
        assert!(removed.contains(&SegmentId::from(1_i64)));
    }

    #[test_log::test]
    fn reaches_with_missing_attributes_are_retained() {
        let removed_segments = HashSet::from([SegmentId::from(3_i64)]);
        let result = filter_reaches(
            vec![
                reach(1, 10, None, None),
                reach(2, 11, Some(0.0), None),
                reach(2, 12, None, Some(-9.0)),
                reach(3, 13, Some(200.0), Some(1.0)),
                reach(4, 14, Some(200.0), Some(1.0)),
            ],
            &removed_segments,
        );

        let retained: Vec<_> = result.retained.iter().map(|r| r.cell_id.to_string()).collect();
        assert_eq!(retained, ["10", "14"]);
        assert_eq!(
            result.counts(),
            RemovalCounts {
                no_elevation: 1,
                thinned: 1,
                parent_segment_removed: 1
            }
        );
    }
}
