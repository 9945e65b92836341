//! Connectivity of beams through links.
//!
//! Beams are nodes and links are edges of an undirected graph. A connected
//! group of beams without any pinned or clamped support can drift freely, so
//! the solver reports it at construction.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::link::Link;
use crate::support::Support;

/// Beams as nodes, links as edges.
#[derive(Clone, Debug)]
pub struct Assembly {
    /// One node per beam, weighted by the beam index, one edge per link.
    graph: UnGraph<usize, ()>,
    /// Whether a pinned or clamped support acts on each beam.
    supported: Vec<bool>,
}

impl Assembly {
    /// Build the graph of `beams` beams joined by `links`.
    #[must_use]
    pub fn new(beams: usize, supports: &[Support], links: &[Link]) -> Self {
        let mut graph = UnGraph::with_capacity(beams, links.len());
        for beam in 0..beams {
            graph.add_node(beam);
        }
        for link in links {
            let (a, b) = (link.a().beam, link.b().beam);
            if a < beams && b < beams {
                graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
            }
        }
        let mut supported = vec![false; beams];
        for support in supports.iter().filter(|support| support.is_active()) {
            if let Some(flag) = supported.get_mut(support.beam()) {
                *flag = true;
            }
        }
        Self { graph, supported }
    }

    /// Number of beams.
    #[must_use]
    pub fn beam_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Groups of beams connected through links, each sorted by beam index.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut components: Vec<Vec<usize>> = kosaraju_scc(&self.graph)
            .into_iter()
            .map(|nodes| {
                let mut beams: Vec<usize> = nodes.iter().map(|node| self.graph[*node]).collect();
                beams.sort_unstable();
                beams
            })
            .collect();
        components.sort();
        components
    }

    /// Connected groups carrying no pinned or clamped support.
    #[must_use]
    pub fn unsupported_components(&self) -> Vec<Vec<usize>> {
        self.components()
            .into_iter()
            .filter(|beams| !beams.iter().any(|&beam| self.supported[beam]))
            .collect()
    }
}
