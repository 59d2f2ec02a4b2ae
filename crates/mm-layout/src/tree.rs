//! Left-to-right hierarchical layout.
//!
//! Every subtree gets a vertical band as tall as its content; a node sits
//! vertically centered in its band and its children share the band top to
//! bottom in id order.

use mm_core::{Graph, LayoutSettings};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::Restriction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    Visiting,
    Done,
}

/// Child indices per node, each list sorted by child id.
fn children_by_id(graph: &Graph) -> Vec<Vec<usize>> {
    let nodes = graph.nodes();
    let slots: FxHashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(slot, node)| (node.id(), slot))
        .collect();

    let mut children = vec![Vec::new(); nodes.len()];
    for (slot, node) in nodes.iter().enumerate() {
        if let Some(parent) = node.parent_id.as_deref().and_then(|id| slots.get(id)) {
            children[*parent].push(slot);
        }
    }
    for list in &mut children {
        list.sort_by(|left, right| nodes[*left].id().cmp(nodes[*right].id()));
    }
    children
}

/// Post-order subtree heights without recursion. A parent cycle is cut where
/// it is first re-entered.
fn subtree_heights(graph: &Graph, children: &[Vec<usize>], settings: &LayoutSettings) -> Vec<f64> {
    let nodes = graph.nodes();
    let mut heights: Vec<f64> = nodes
        .iter()
        .map(|node| node.effective_height(settings.node_min_height))
        .collect();
    let mut visit = vec![Visit::Unvisited; nodes.len()];

    for start in 0..nodes.len() {
        if visit[start] != Visit::Unvisited {
            continue;
        }
        let mut stack = vec![(start, false)];
        while let Some((slot, expanded)) = stack.pop() {
            if expanded {
                let kids: Vec<usize> = children[slot]
                    .iter()
                    .copied()
                    .filter(|kid| visit[*kid] == Visit::Done)
                    .collect();
                if !kids.is_empty() {
                    let stacked: f64 = kids.iter().map(|kid| heights[*kid]).sum::<f64>()
                        + settings.vertical_gap * (kids.len() - 1) as f64;
                    heights[slot] = heights[slot].max(stacked);
                }
                visit[slot] = Visit::Done;
                continue;
            }
            if visit[slot] != Visit::Unvisited {
                continue;
            }
            visit[slot] = Visit::Visiting;
            stack.push((slot, true));
            for kid in &children[slot] {
                if visit[*kid] == Visit::Unvisited {
                    stack.push((*kid, false));
                }
            }
        }
    }
    heights
}

/// Returns the number of nodes whose coordinates were written.
pub(crate) fn layout_tree(
    graph: &mut Graph,
    settings: &LayoutSettings,
    restriction: &Restriction<'_>,
) -> usize {
    let children = children_by_id(graph);
    let heights = subtree_heights(graph, &children, settings);

    let nodes = graph.nodes();
    let mut roots: Vec<usize> = (0..nodes.len())
        .filter(|slot| nodes[*slot].parent_id.is_none())
        .collect();
    roots.sort_by(|left, right| nodes[*left].id().cmp(nodes[*right].id()));

    let mut placements: Vec<(usize, f64, f64)> = Vec::new();
    let mut placed = vec![false; nodes.len()];
    let mut band_top = 0.0;

    for root in roots {
        let mut stack = vec![(root, 0.0, band_top)];
        while let Some((slot, x, top)) = stack.pop() {
            if placed[slot] {
                continue;
            }
            placed[slot] = true;

            let node = &nodes[slot];
            let own_height = node.effective_height(settings.node_min_height);
            if restriction.allows(node.id()) {
                placements.push((slot, x, top + (heights[slot] - own_height) / 2.0));
            }

            let child_x = x + node.effective_width(settings.node_width) + settings.horizontal_gap;
            let mut child_top = top;
            let mut pending = Vec::with_capacity(children[slot].len());
            for kid in &children[slot] {
                pending.push((*kid, child_x, child_top));
                child_top += heights[*kid] + settings.vertical_gap;
            }
            // Reversed so the first child by id is placed first.
            stack.extend(pending.into_iter().rev());
        }
        band_top += heights[root] + settings.vertical_gap * 2.0;
    }

    let nodes = graph.nodes_mut();
    for &(slot, x, y) in &placements {
        let node = &mut nodes[slot];
        node.x = x;
        node.y = y;
        trace!(id = node.id(), x, y, "tree placed node");
    }
    placements.len()
}
