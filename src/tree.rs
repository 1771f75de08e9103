//! Search tree stored in a preallocated arena of atomic nodes.
//!
//! Nodes are addressed by `u32` indices that stay valid for the lifetime of
//! a search. The children of a node occupy a contiguous block of the arena
//! that is allocated once, when the node is expanded. A per-node state flag
//! makes sure that only one thread expands a node; other threads treat the
//! node as a leaf until the expansion is published.
//!
//! Counts are incremented on the way down (virtual loss) and values are
//! added on the way up, so concurrent threads spread over the tree.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, AtomicUsize, Ordering};

use tracing::info;

use crate::catalog::Move;
use crate::prior::ChildInit;

pub type NodeIdx = u32;

const UNEXPANDED: u8 = 0;
const EXPANDING: u8 = 1;
const EXPANDED: u8 = 2;

/// A node of the search tree. All statistics are from the point of view of
/// the color that played the node's move.
pub struct Node {
    mv: AtomicU32,
    count: AtomicU32,
    visits: AtomicU32,
    value_sum: AtomicU64,
    first_child: AtomicU32,
    nu_children: AtomicU32,
    state: AtomicU8,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            mv: AtomicU32::new(u32::MAX),
            count: AtomicU32::new(0),
            visits: AtomicU32::new(0),
            value_sum: AtomicU64::new(0f64.to_bits()),
            first_child: AtomicU32::new(0),
            nu_children: AtomicU32::new(0),
            state: AtomicU8::new(UNEXPANDED),
        }
    }
}

impl Node {
    fn init(&self, mv: Move, value: f32, count: u32) {
        self.mv.store(mv_to_u32(mv), Ordering::Relaxed);
        self.count.store(count, Ordering::Relaxed);
        self.visits.store(0, Ordering::Relaxed);
        self.value_sum
            .store((value as f64 * count as f64).to_bits(), Ordering::Relaxed);
        self.first_child.store(0, Ordering::Relaxed);
        self.nu_children.store(0, Ordering::Relaxed);
        self.state.store(UNEXPANDED, Ordering::Relaxed);
    }

    fn copy_stats(&self, other: &Node) {
        self.mv.store(other.mv.load(Ordering::Relaxed), Ordering::Relaxed);
        self.count.store(other.count.load(Ordering::Relaxed), Ordering::Relaxed);
        self.visits.store(other.visits.load(Ordering::Relaxed), Ordering::Relaxed);
        self.value_sum
            .store(other.value_sum.load(Ordering::Relaxed), Ordering::Relaxed);
        self.first_child.store(0, Ordering::Relaxed);
        self.nu_children.store(0, Ordering::Relaxed);
        self.state.store(UNEXPANDED, Ordering::Relaxed);
    }

    #[inline]
    pub fn mv(&self) -> Move {
        let v = self.mv.load(Ordering::Relaxed);
        if v == u32::MAX { Move::PASS } else { Move::new(v as usize) }
    }

    /// Visit count including the virtual count from prior knowledge and the
    /// visits of simulations in flight.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Real visits.
    #[inline]
    pub fn visits(&self) -> u32 {
        self.visits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn value_sum(&self) -> f64 {
        f64::from_bits(self.value_sum.load(Ordering::Relaxed))
    }

    /// Mean value, or `None` for a node without count.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        let count = self.count();
        (count > 0).then(|| self.value_sum() / count as f64)
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.state.load(Ordering::Acquire) == EXPANDED
    }

    #[inline]
    fn add_visit(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.visits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn add_value(&self, v: f64) {
        let _ = self
            .value_sum
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                Some((f64::from_bits(bits) + v).to_bits())
            });
    }
}

#[inline]
fn mv_to_u32(mv: Move) -> u32 {
    if mv.is_pass() { u32::MAX } else { mv.index() as u32 }
}

/// Arena of nodes. Node 0 is the root.
pub struct Tree {
    nodes: Box<[Node]>,
    next: AtomicUsize,
    is_full: AtomicBool,
}

impl Tree {
    pub const ROOT: NodeIdx = 0;

    pub fn with_capacity(max_nodes: usize) -> Self {
        let max_nodes = max_nodes.clamp(1, u32::MAX as usize);
        let nodes = (0..max_nodes).map(|_| Node::default()).collect();
        let tree = Self {
            nodes,
            next: AtomicUsize::new(1),
            is_full: AtomicBool::new(false),
        };
        tree.nodes[0].init(Move::PASS, 0.0, 0);
        tree
    }

    /// Number of nodes that fit in `memory` bytes.
    pub fn capacity_for_memory(memory: usize) -> usize {
        (memory / std::mem::size_of::<Node>()).max(1)
    }

    /// Remove all nodes but an empty root.
    pub fn clear(&mut self) {
        self.next.store(1, Ordering::Relaxed);
        self.is_full.store(false, Ordering::Relaxed);
        self.nodes[0].init(Move::PASS, 0.0, 0);
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn nu_nodes(&self) -> usize {
        self.next.load(Ordering::Relaxed).min(self.nodes.len())
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.is_full.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx as usize]
    }

    #[inline]
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Children of an expanded node; empty for other nodes.
    #[inline]
    pub fn children(&self, idx: NodeIdx) -> Range<NodeIdx> {
        let node = self.node(idx);
        if !node.is_expanded() {
            return 0..0;
        }
        let first = node.first_child.load(Ordering::Relaxed);
        first..first + node.nu_children.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn add_visit(&self, idx: NodeIdx) {
        self.node(idx).add_visit();
    }

    #[inline]
    pub fn add_value(&self, idx: NodeIdx, v: f64) {
        self.node(idx).add_value(v);
    }

    fn alloc(&self, n: usize) -> Option<usize> {
        let cap = self.nodes.len();
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                (cur + n <= cap).then_some(cur + n)
            })
            .ok()
    }

    /// Try to create the children of `idx`. Returns `false` if another thread
    /// is expanding or has expanded the node, or if the arena is full.
    pub fn try_expand(&self, idx: NodeIdx, children: &[ChildInit]) -> bool {
        let node = self.node(idx);
        if children.is_empty()
            || node
                .state
                .compare_exchange(UNEXPANDED, EXPANDING, Ordering::Acquire, Ordering::Relaxed)
                .is_err()
        {
            return false;
        }
        let Some(first) = self.alloc(children.len()) else {
            if !self.is_full.swap(true, Ordering::Relaxed) {
                info!(nodes = self.nodes.len(), "search tree is full");
            }
            node.state.store(UNEXPANDED, Ordering::Release);
            return false;
        };
        for (i, child) in children.iter().enumerate() {
            self.nodes[first + i].init(child.mv, child.value, child.count);
        }
        node.first_child.store(first as u32, Ordering::Relaxed);
        node.nu_children
            .store(children.len() as u32, Ordering::Relaxed);
        node.state.store(EXPANDED, Ordering::Release);
        true
    }

    /// Child of `idx` with move `mv`.
    pub fn find_child(&self, idx: NodeIdx, mv: Move) -> Option<NodeIdx> {
        self.children(idx).find(|&i| self.node(i).mv() == mv)
    }

    /// Replace the content of this tree by a copy of the subtree of `src`
    /// rooted at `src_root`. Copies breadth-first until the arena is full.
    ///
    /// The new root starts without statistics. The children keep theirs.
    pub fn copy_subtree(&mut self, src: &Tree, src_root: NodeIdx) {
        self.clear();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((src_root, Tree::ROOT));
        while let Some((s, d)) = queue.pop_front() {
            let range = src.children(s);
            if range.is_empty() {
                continue;
            }
            let Some(first) = self.alloc(range.len()) else {
                break;
            };
            for (i, sc) in range.enumerate() {
                let dc = first + i;
                self.nodes[dc].copy_stats(src.node(sc));
                queue.push_back((sc, dc as NodeIdx));
            }
            let dst = &self.nodes[d as usize];
            dst.first_child.store(first as u32, Ordering::Relaxed);
            dst.nu_children
                .store(src.node(s).nu_children.load(Ordering::Relaxed), Ordering::Relaxed);
            dst.state.store(EXPANDED, Ordering::Release);
        }
    }
}
