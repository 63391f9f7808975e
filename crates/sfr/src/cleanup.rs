//! The reach cleanup pass: attribute filter, length filter and connectivity repair, in that order.

use std::collections::HashSet;

use crate::attributefilter::{self, RemovalCounts};
use crate::config::CleanupConfig;
use crate::connectivity;
use crate::lengthfilter;
use crate::records::{CellId, CellRecord, MalformedRecord, ReachRecord, SegmentRecord};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupInput {
    /// The flowline segments, without segments only the attributes inherited by the reaches are checked
    pub segments: Option<Vec<SegmentRecord>>,
    pub reaches: Vec<ReachRecord>,
    pub cells: Vec<CellRecord>,
    /// Records that were left out while reading the tables
    pub malformed: Vec<MalformedRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CleanupWarning {
    AllReachesRemoved,
    AllCellsRemoved,
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleanupWarning::AllReachesRemoved => write!(
                f,
                "All reaches were removed, check the reach cutoff and the extent of the grid and the flowlines"
            ),
            CleanupWarning::AllCellsRemoved => write!(
                f,
                "All river cells were removed, check the reach cutoff and the extent of the grid and the flowlines"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CleanupReport {
    pub segments_removed: RemovalCounts,
    pub reaches_removed_by_attributes: RemovalCounts,
    pub reaches_removed_by_length: usize,
    pub cells_removed: usize,
    pub disconnected_reaches_removed: usize,
    pub orphan_reaches_removed: usize,
    pub malformed: Vec<MalformedRecord>,
    pub warnings: Vec<CleanupWarning>,
}

impl CleanupReport {
    pub fn reaches_removed(&self) -> usize {
        self.reaches_removed_by_attributes.total()
            + self.reaches_removed_by_length
            + self.disconnected_reaches_removed
            + self.orphan_reaches_removed
    }

    pub fn has_removals(&self) -> bool {
        self.segments_removed.total() > 0 || self.reaches_removed() > 0 || self.cells_removed > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanupOutput {
    pub segments: Option<Vec<SegmentRecord>>,
    pub reaches: Vec<ReachRecord>,
    pub cells: Vec<CellRecord>,
    pub report: CleanupReport,
}

impl CleanupOutput {
    /// The retained records as input for another pass
    pub fn to_input(&self) -> CleanupInput {
        CleanupInput {
            segments: self.segments.clone(),
            reaches: self.reaches.clone(),
            cells: self.cells.clone(),
            malformed: Vec::new(),
        }
    }
}

pub struct ReachCleanup {
    config: CleanupConfig,
}

impl ReachCleanup {
    pub fn new(config: CleanupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanupConfig {
        &self.config
    }

    pub fn run(&self, input: CleanupInput) -> Result<CleanupOutput> {
        check_unique_cells(&input.cells)?;

        let mut report = CleanupReport {
            malformed: input.malformed,
            ..Default::default()
        };

        let (segments, removed_segments) = match input.segments {
            Some(segments) => {
                let result = attributefilter::filter_segments(segments);
                report.segments_removed = result.counts();
                let removed = result.removed_segment_ids();
                (Some(result.retained), removed)
            }
            None => (None, HashSet::new()),
        };

        let reaches = attributefilter::filter_reaches(input.reaches, &removed_segments);
        report.reaches_removed_by_attributes = reaches.counts();

        let reaches = lengthfilter::filter_reaches(reaches.retained, self.config.reach_cutoff());
        report.reaches_removed_by_length = reaches.removed.len();

        let repaired = connectivity::repair(input.cells, reaches.retained, self.config.connectivity_check);
        report.cells_removed = repaired.removed_cells.len();
        report.disconnected_reaches_removed = repaired.disconnected_reaches.len();
        report.orphan_reaches_removed = repaired.orphan_reaches.len();

        if repaired.reaches.is_empty() {
            report.warnings.push(CleanupWarning::AllReachesRemoved);
        }

        if repaired.cells.is_empty() {
            report.warnings.push(CleanupWarning::AllCellsRemoved);
        }

        for warning in &report.warnings {
            log::warn!("{warning}");
        }

        Ok(CleanupOutput {
            segments,
            reaches: repaired.reaches,
            cells: repaired.cells,
            report,
        })
    }
}

fn check_unique_cells(cells: &[CellRecord]) -> Result {
    let mut seen: HashSet<&CellId> = HashSet::with_capacity(cells.len());
    for cell in cells {
        if !seen.insert(&cell.cell_id) {
            return Err(Error::Configuration(format!(
                "Cell {} occurs more than once in the cell table (row {})",
                cell.cell_id, cell.row
            )));
        }
    }

    Ok(())
}
