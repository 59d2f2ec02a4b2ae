//! Spring-and-repulsion layout with a fixed step budget.

use mm_core::{Graph, LayoutSettings};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::Restriction;

pub const FORCE_ITERATIONS: usize = 50;
const REPULSION: f64 = 5000.0;
const ATTRACTION: f64 = 0.01;
const DAMPING: f64 = 0.9;

/// Grid start for `count` nodes in node order.
fn grid_positions(count: usize, settings: &LayoutSettings) -> Vec<(f64, f64)> {
    let cols = ((count as f64).sqrt().floor() as usize).max(1);
    let cell_width = settings.node_width + settings.horizontal_gap;
    let cell_height = settings.node_min_height + settings.vertical_gap;
    (0..count)
        .map(|i| ((i % cols) as f64 * cell_width, (i / cols) as f64 * cell_height))
        .collect()
}

/// Net force on each positioned node for one step.
fn compute_forces(positions: &[(f64, f64)], springs: &[(usize, usize)]) -> Vec<(f64, f64)> {
    let n = positions.len();
    let mut forces = vec![(0.0, 0.0); n];

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = positions[i].0 - positions[j].0;
            let dy = positions[i].1 - positions[j].1;
            let dist_sq = dx * dx + dy * dy + 1.0;
            let dist = dist_sq.sqrt();
            let force = REPULSION / dist_sq;
            let fx = force * dx / dist;
            let fy = force * dy / dist;
            forces[i].0 += fx;
            forces[i].1 += fy;
            forces[j].0 -= fx;
            forces[j].1 -= fy;
        }
    }

    for &(source, target) in springs {
        let dx = positions[target].0 - positions[source].0;
        let dy = positions[target].1 - positions[source].1;
        let dist = (dx * dx + dy * dy).sqrt() + 1.0;
        let force = ATTRACTION * dist;
        let fx = force * dx / dist;
        let fy = force * dy / dist;
        forces[source].0 += fx;
        forces[source].1 += fy;
        forces[target].0 -= fx;
        forces[target].1 -= fy;
    }

    forces
}

/// Shift so the smallest x and y become zero.
fn normalize_positions(positions: &mut [(f64, f64)]) {
    if positions.is_empty() {
        return;
    }
    let min_x = positions.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let min_y = positions.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    for pos in positions.iter_mut() {
        pos.0 -= min_x;
        pos.1 -= min_y;
    }
}

/// Returns the number of nodes whose coordinates were written.
///
/// Nodes outside the restriction neither move nor exert force, and the final
/// translation to the origin only considers the moved subset.
pub(crate) fn layout_force(
    graph: &mut Graph,
    settings: &LayoutSettings,
    restriction: &Restriction<'_>,
) -> usize {
    let slots: Vec<usize> = graph
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| restriction.allows(node.id()))
        .map(|(slot, _)| slot)
        .collect();
    if slots.is_empty() {
        return 0;
    }

    let local: FxHashMap<&str, usize> = slots
        .iter()
        .enumerate()
        .map(|(local, slot)| (graph.nodes()[*slot].id(), local))
        .collect();
    let springs: Vec<(usize, usize)> = graph
        .edges()
        .iter()
        .filter_map(|edge| {
            Some((
                *local.get(edge.source.as_str())?,
                *local.get(edge.target.as_str())?,
            ))
        })
        .collect();

    let mut positions = grid_positions(slots.len(), settings);
    let mut velocities = vec![(0.0, 0.0); slots.len()];

    for _ in 0..FORCE_ITERATIONS {
        let forces = compute_forces(&positions, &springs);
        for ((position, velocity), force) in positions.iter_mut().zip(&mut velocities).zip(&forces)
        {
            velocity.0 = (velocity.0 + force.0) * DAMPING;
            velocity.1 = (velocity.1 + force.1) * DAMPING;
            position.0 += velocity.0;
            position.1 += velocity.1;
        }
    }

    normalize_positions(&mut positions);

    let nodes = graph.nodes_mut();
    for (slot, (x, y)) in slots.iter().zip(positions) {
        let node = &mut nodes[*slot];
        node.x = x;
        node.y = y;
        trace!(id = node.id(), x, y, "force placed node");
    }
    slots.len()
}
