use std::collections::VecDeque;

use slotmap::{Key, SecondaryMap};
use smallvec::SmallVec;

///Returned if inserting an edge would close a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WouldCycle;

///Directed acyclic graph over externally owned vertices.
///
/// The vertices themselves live in a [slotmap](slotmap::SlotMap) owned by the
/// builder, the dag only keeps adjacency per key. Cycles are rejected at
/// edge-insertion time via a reachability walk, so the graph is acyclic at
/// every point of its life.
pub(crate) struct Dag<K: Key> {
    ///All registered vertices in registration order. Drives deterministic
    /// iteration and topological sorting.
    nodes: Vec<K>,
    edges_out: SecondaryMap<K, SmallVec<[K; 4]>>,
    edges_in: SecondaryMap<K, SmallVec<[K; 4]>>,
}

impl<K: Key> Default for Dag<K> {
    fn default() -> Self {
        Dag {
            nodes: Vec::new(),
            edges_out: SecondaryMap::new(),
            edges_in: SecondaryMap::new(),
        }
    }
}

impl<K: Key> Dag<K> {
    pub fn add_node(&mut self, node: K) {
        debug_assert!(!self.contains(node), "node registered twice");
        self.nodes.push(node);
        self.edges_out.insert(node, SmallVec::new());
        self.edges_in.insert(node, SmallVec::new());
    }

    pub fn contains(&self, node: K) -> bool {
        self.edges_out.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = K> + '_ {
        self.nodes.iter().copied()
    }

    pub fn outgoing(&self, node: K) -> &[K] {
        &self.edges_out[node]
    }

    pub fn incoming(&self, node: K) -> &[K] {
        &self.edges_in[node]
    }

    pub fn out_degree(&self, node: K) -> usize {
        self.edges_out[node].len()
    }

    pub fn in_degree(&self, node: K) -> usize {
        self.edges_in[node].len()
    }

    pub fn degree(&self, node: K) -> usize {
        self.in_degree(node) + self.out_degree(node)
    }

    ///True if `to` is reachable from `from` by following edges forward.
    pub fn reaches(&self, from: K, to: K) -> bool {
        if from == to {
            return true;
        }

        let mut visited: SecondaryMap<K, ()> = SecondaryMap::new();
        let mut stack: SmallVec<[K; 16]> = SmallVec::new();
        stack.push(from);

        while let Some(next) = stack.pop() {
            if visited.insert(next, ()).is_some() {
                continue;
            }
            for succ in self.outgoing(next) {
                if *succ == to {
                    return true;
                }
                stack.push(*succ);
            }
        }

        false
    }

    ///True if inserting `from -> to` would close a cycle.
    pub fn would_cycle(&self, from: K, to: K) -> bool {
        from == to || self.reaches(to, from)
    }

    ///Inserts the edge `from -> to`. Inserting an already present edge is a
    /// no-op, inserting a cycle-closing edge fails and leaves the graph
    /// untouched.
    pub fn try_connect(&mut self, from: K, to: K) -> Result<(), WouldCycle> {
        debug_assert!(self.contains(from) && self.contains(to));

        if self.edges_out[from].contains(&to) {
            return Ok(());
        }
        if self.would_cycle(from, to) {
            return Err(WouldCycle);
        }

        self.edges_out[from].push(to);
        self.edges_in[to].push(from);
        Ok(())
    }

    ///Kahn style topological sort. Vertices without unprocessed predecessors
    /// are emitted in registration order, which keeps the result stable for
    /// identical declaration sequences.
    pub fn topological_order(&self) -> Vec<K> {
        let mut in_count: SecondaryMap<K, usize> = SecondaryMap::new();
        let mut queue = VecDeque::new();

        for node in &self.nodes {
            let deg = self.in_degree(*node);
            in_count.insert(*node, deg);
            if deg == 0 {
                queue.push_back(*node);
            }
        }

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(next) = queue.pop_front() {
            order.push(next);
            for succ in self.outgoing(next) {
                let count = &mut in_count[*succ];
                *count -= 1;
                if *count == 0 {
                    queue.push_back(*succ);
                }
            }
        }

        //Edges are cycle-checked on insertion, a partial order here would be
        // a bug in `try_connect`.
        assert!(
            order.len() == self.nodes.len(),
            "dag contained a cycle, edge insertion check is broken"
        );

        order
    }
}
