//! Removes the river cells that lost their reaches and the reaches that no longer belong to a cell.
//!
//! The cells to drop are determined once, up front. Cells are removed first, then all reaches
//! that reference a dropped cell or a cell that is not in the cell table.

use std::collections::{HashMap, HashSet};

use crate::config::ConnectivityCheck;
use crate::records::{CellId, CellRecord, ReachRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityResult {
    pub cells: Vec<CellRecord>,
    pub reaches: Vec<ReachRecord>,
    pub removed_cells: Vec<CellRecord>,
    /// Reaches of dropped cells
    pub disconnected_reaches: Vec<ReachRecord>,
    /// Reaches whose cell is not part of the cell table
    pub orphan_reaches: Vec<ReachRecord>,
}

/// The elevation of every cell, obtained by joining the reaches on the cell id.
/// `None` when no reach of the cell carries an elevation.
pub fn cell_elevations<'a>(
    cells: &'a [CellRecord],
    reaches: &[ReachRecord],
) -> HashMap<&'a CellId, Option<f64>> {
    let mut elevations: HashMap<&CellId, Option<f64>> = cells.iter().map(|cell| (&cell.cell_id, None)).collect();

    for reach in reaches {
        let Some(elevation) = reach.elevation_max else {
            continue;
        };

        if let Some(cell_elevation) = elevations.get_mut(&reach.cell_id) {
            *cell_elevation = Some(cell_elevation.map_or(elevation, |current| current.max(elevation)));
        }
    }

    elevations
}

/// Determines the cells that are no longer connected to the river network
pub fn cells_to_drop(cells: &[CellRecord], reaches: &[ReachRecord], check: ConnectivityCheck) -> HashSet<CellId> {
    match check {
        ConnectivityCheck::ElevationProxy => cell_elevations(cells, reaches)
            .into_iter()
            .filter(|(_, elevation)| elevation.is_none())
            .map(|(cell_id, _)| cell_id.clone())
            .collect(),
        ConnectivityCheck::ReachCount => {
            let referenced: HashSet<&CellId> = reaches.iter().map(|reach| &reach.cell_id).collect();
            cells
                .iter()
                .filter(|cell| !referenced.contains(&cell.cell_id))
                .map(|cell| cell.cell_id.clone())
                .collect()
        }
    }
}

pub fn repair(cells: Vec<CellRecord>, reaches: Vec<ReachRecord>, check: ConnectivityCheck) -> ConnectivityResult {
    let drop = cells_to_drop(&cells, &reaches, check);
    let known_cells: HashSet<CellId> = cells.iter().map(|cell| cell.cell_id.clone()).collect();

    let (removed_cells, cells): (Vec<_>, Vec<_>) = cells.into_iter().partition(|cell| drop.contains(&cell.cell_id));
    for cell in &removed_cells {
        log::debug!("removed cell {}", cell.cell_id);
    }
    log::info!("removed {} cells", removed_cells.len());

    let mut result = ConnectivityResult {
        cells,
        reaches: Vec::with_capacity(reaches.len()),
        removed_cells,
        disconnected_reaches: Vec::new(),
        orphan_reaches: Vec::new(),
    };

    for reach in reaches {
        if !known_cells.contains(&reach.cell_id) {
            log::debug!("segment {}: cell {} is not a river cell", reach.segment_id, reach.cell_id);
            result.orphan_reaches.push(reach);
        } else if drop.contains(&reach.cell_id) {
            log::debug!("segment {}: removed reach in cell {}", reach.segment_id, reach.cell_id);
            result.disconnected_reaches.push(reach);
        } else {
            result.reaches.push(reach);
        }
    }

    if result.disconnected_reaches.is_empty() {
        log::info!("no disconnected reaches found");
    } else {
        log::info!("removed {} disconnected reaches", result.disconnected_reaches.len());
    }

    if !result.orphan_reaches.is_empty() {
        log::warn!("removed {} reaches outside of the river cells", result.orphan_reaches.len());
    }

    result
}
