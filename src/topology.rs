//! Vertex and edge bookkeeping for a discretized rod.
//!
//! Every segment between two user-supplied sections ("handles") is split by a
//! ghost vertex, so handles sit on even vertex indices and ghosts on odd ones.

/// Counts and index maps of a rod's vertices and edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RodTopology {
    /// Number of handle vertices.
    handles: usize,
    /// Whether the last handle connects back to the first.
    closed: bool,
}

impl RodTopology {
    /// Topology of an open rod with `handles` sections.
    #[must_use]
    pub const fn open(handles: usize) -> Self {
        Self {
            handles,
            closed: false,
        }
    }

    /// Topology of a closed rod with `handles` sections.
    #[must_use]
    pub const fn closed(handles: usize) -> Self {
        Self {
            handles,
            closed: true,
        }
    }

    /// Whether the rod is a ring.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of handle vertices, `nv_h`.
    #[must_use]
    pub const fn handle_count(&self) -> usize {
        self.handles
    }

    /// Number of ghost vertices, `nv_g`.
    #[must_use]
    pub const fn ghost_count(&self) -> usize {
        self.segment_count()
    }

    /// Number of user-level segments between handles.
    #[must_use]
    pub const fn segment_count(&self) -> usize {
        if self.closed {
            self.handles
        } else {
            self.handles.saturating_sub(1)
        }
    }

    /// Number of vertices, `nv = nv_h + nv_g`.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.handles + self.ghost_count()
    }

    /// Number of edges, `ne = 2·(nv_h − 1)` open or `2·nv_h` closed.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        2 * self.segment_count()
    }

    /// Vertex index of handle `k`.
    ///
    /// # Examples
    /// ```
    /// use rodrelax::RodTopology;
    ///
    /// let topology = RodTopology::open(4);
    /// assert_eq!(topology.handle_to_vertex(3), 6);
    /// assert_eq!(topology.vertex_to_handle(6), Some(3));
    /// assert_eq!(topology.vertex_to_handle(5), None);
    /// ```
    #[must_use]
    pub const fn handle_to_vertex(&self, k: usize) -> usize {
        2 * k
    }

    /// Handle index of vertex `i`, or `None` for a ghost vertex.
    #[must_use]
    pub const fn vertex_to_handle(&self, i: usize) -> Option<usize> {
        if i % 2 == 0 && i < self.vertex_count() {
            Some(i / 2)
        } else {
            None
        }
    }

    /// Whether vertex `i` is a handle.
    #[must_use]
    pub const fn is_handle(&self, i: usize) -> bool {
        i % 2 == 0
    }

    /// The two edges making up segment `s`.
    #[must_use]
    pub const fn segment_edges(&self, s: usize) -> [usize; 2] {
        [2 * s, 2 * s + 1]
    }

    /// Segment that contains edge `e`.
    #[must_use]
    pub const fn edge_segment(&self, e: usize) -> usize {
        e / 2
    }

    /// End vertices of edge `e`.
    #[must_use]
    pub const fn edge_vertices(&self, e: usize) -> (usize, usize) {
        (e, (e + 1) % self.vertex_count())
    }

    /// Edge before vertex `i`, absent at the start of an open rod.
    #[must_use]
    pub const fn left_edge(&self, i: usize) -> Option<usize> {
        if i > 0 {
            Some(i - 1)
        } else if self.closed {
            Some(self.edge_count() - 1)
        } else {
            None
        }
    }

    /// Edge after vertex `i`, absent at the end of an open rod.
    #[must_use]
    pub const fn right_edge(&self, i: usize) -> Option<usize> {
        if i < self.edge_count() {
            Some(i)
        } else {
            None
        }
    }

    /// Vertex before `i`.
    #[must_use]
    pub const fn prev_vertex(&self, i: usize) -> Option<usize> {
        match self.left_edge(i) {
            Some(e) => Some(e),
            None => None,
        }
    }

    /// Vertex after `i`.
    #[must_use]
    pub const fn next_vertex(&self, i: usize) -> Option<usize> {
        match self.right_edge(i) {
            Some(e) => Some(self.edge_vertices(e).1),
            None => None,
        }
    }

    /// Whether vertex `i` is the first or last vertex of an open rod.
    #[must_use]
    pub const fn is_end(&self, i: usize) -> bool {
        !self.closed && (i == 0 || i + 1 == self.vertex_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_counts_follow_the_ghost_scheme() {
        let topology = RodTopology::open(5);
        assert_eq!(topology.vertex_count(), 9);
        assert_eq!(topology.ghost_count(), 4);
        assert_eq!(topology.edge_count(), 2 * (5 - 1));
        assert!(topology.is_handle(0));
        assert!(topology.is_handle(8));
        assert_eq!(topology.left_edge(0), None);
        assert_eq!(topology.right_edge(8), None);
        assert!(topology.is_end(8));
    }

    #[test]
    fn closed_counts_wrap_around() {
        let topology = RodTopology::closed(3);
        assert_eq!(topology.vertex_count(), 6);
        assert_eq!(topology.edge_count(), 6);
        assert_eq!(topology.left_edge(0), Some(5));
        assert_eq!(topology.prev_vertex(0), Some(5));
        assert_eq!(topology.next_vertex(5), Some(0));
        assert_eq!(topology.edge_vertices(5), (5, 0));
        assert!(!topology.is_end(0));
    }

    #[test]
    fn handle_indices_roundtrip() {
        for topology in [RodTopology::open(7), RodTopology::closed(7)] {
            for k in 0..topology.handle_count() {
                let vertex = topology.handle_to_vertex(k);
                assert!(vertex < topology.vertex_count());
                assert_eq!(topology.vertex_to_handle(vertex), Some(k));
            }
            let ghosts = (0..topology.vertex_count())
                .filter(|&i| topology.vertex_to_handle(i).is_none())
                .count();
            assert_eq!(ghosts, topology.ghost_count());
        }
    }
}
