#![forbid(unsafe_code)]

//! Layout strategies for mind-map graphs.
//!
//! Layout only ever writes `x`/`y`. Widths and heights must be estimated
//! beforehand; unsized nodes fall back to the configured defaults.

mod force;
mod tree;

pub use mm_core::LayoutAlgorithm;

use mm_core::{Graph, LayoutSettings};
use rustc_hash::FxHashSet;
use tracing::debug;

pub use force::FORCE_ITERATIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutStats {
    pub algorithm: LayoutAlgorithm,
    /// Nodes whose coordinates were written.
    pub positioned_nodes: usize,
    /// Simulation steps run; zero outside the force strategy.
    pub iterations: usize,
}

/// Which nodes a strategy may move.
#[derive(Debug, Clone)]
pub(crate) enum Restriction<'a> {
    All,
    Only(FxHashSet<&'a str>),
}

impl Restriction<'_> {
    pub(crate) fn allows(&self, id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(ids) => ids.contains(id),
        }
    }
}

/// Position nodes with the strategy named in `settings.auto_layout`.
///
/// With `restrict_to`, only the listed ids move and every other node keeps
/// its coordinates. An empty list makes the call a no-op.
pub fn apply_layout(
    graph: &mut Graph,
    settings: &LayoutSettings,
    restrict_to: Option<&[String]>,
) -> LayoutStats {
    let algorithm = settings.auto_layout;
    let idle = LayoutStats {
        algorithm,
        positioned_nodes: 0,
        iterations: 0,
    };

    let restriction = match restrict_to {
        None => Restriction::All,
        Some([]) => {
            debug!("no nodes need positioning; layout skipped");
            return idle;
        }
        Some(ids) => Restriction::Only(ids.iter().map(String::as_str).collect()),
    };

    let stats = match algorithm {
        LayoutAlgorithm::Tree => LayoutStats {
            positioned_nodes: tree::layout_tree(graph, settings, &restriction),
            ..idle
        },
        LayoutAlgorithm::Force => {
            let positioned_nodes = force::layout_force(graph, settings, &restriction);
            LayoutStats {
                positioned_nodes,
                iterations: if positioned_nodes == 0 { 0 } else { FORCE_ITERATIONS },
                ..idle
            }
        }
        LayoutAlgorithm::None => idle,
    };

    debug!(
        algorithm = algorithm.as_str(),
        positioned = stats.positioned_nodes,
        iterations = stats.iterations,
        "layout applied"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::{LayoutAlgorithm, apply_layout};
    use mm_core::{Graph, LayoutSettings, Node};

    fn settings(algorithm: LayoutAlgorithm) -> LayoutSettings {
        LayoutSettings {
            auto_layout: algorithm,
            ..LayoutSettings::default()
        }
    }

    fn scattered_graph() -> Graph {
        let mut graph = Graph::new("t.md");
        for (index, id) in ["c-a", "c-b", "c-c"].into_iter().enumerate() {
            let mut node = Node::new(id, id, 2);
            node.x = 7.0 * index as f64 + 3.0;
            node.y = -11.0 * index as f64;
            graph.add_node(node).unwrap();
        }
        graph
    }

    fn coordinates(graph: &Graph) -> Vec<(f64, f64)> {
        graph.nodes().iter().map(|node| (node.x, node.y)).collect()
    }

    #[test]
    fn empty_restriction_is_a_no_op_for_every_strategy() {
        for algorithm in [
            LayoutAlgorithm::Tree,
            LayoutAlgorithm::Force,
            LayoutAlgorithm::None,
        ] {
            let mut graph = scattered_graph();
            let before = coordinates(&graph);
            let stats = apply_layout(&mut graph, &settings(algorithm), Some(&[]));
            assert_eq!(coordinates(&graph), before, "{}", algorithm.as_str());
            assert_eq!(stats.positioned_nodes, 0);
            assert_eq!(stats.iterations, 0);
        }
    }

    #[test]
    fn none_strategy_never_moves_nodes() {
        let mut graph = scattered_graph();
        let before = coordinates(&graph);
        let stats = apply_layout(&mut graph, &settings(LayoutAlgorithm::None), None);
        assert_eq!(coordinates(&graph), before);
        assert_eq!(stats.algorithm, LayoutAlgorithm::None);
        assert_eq!(stats.positioned_nodes, 0);
    }

    #[test]
    fn stats_report_strategy_and_counts() {
        let mut graph = scattered_graph();
        let stats = apply_layout(&mut graph, &settings(LayoutAlgorithm::Force), None);
        assert_eq!(stats.algorithm, LayoutAlgorithm::Force);
        assert_eq!(stats.positioned_nodes, 3);
        assert_eq!(stats.iterations, 50);

        let only_b = vec!["c-b".to_string(), "c-unknown".to_string()];
        let stats = apply_layout(&mut graph, &settings(LayoutAlgorithm::Tree), Some(&only_b));
        assert_eq!(stats.positioned_nodes, 1);
        assert_eq!(stats.iterations, 0);
    }

    #[test]
    fn empty_graph_lays_out_nothing() {
        let mut graph = Graph::new("empty.md");
        for algorithm in [LayoutAlgorithm::Tree, LayoutAlgorithm::Force] {
            let stats = apply_layout(&mut graph, &settings(algorithm), None);
            assert_eq!(stats.positioned_nodes, 0);
            assert_eq!(stats.iterations, 0);
        }
    }
}
