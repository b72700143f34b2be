//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree owns the triangle buffer and physically reorders it during
//! construction so that every leaf covers a contiguous range. Nodes live in
//! a flat arena (`Vec<BvhNode>`) and refer to their children by index; the
//! root is always node 0.
//!
//! Two split strategies share the same node layout and traversal:
//! - **Median**: sort by centroid along the longest axis of the node box
//!   and split at the median count
//! - **SAH**: evaluate every split position on all three axes with the
//!   surface-area heuristic and keep the cheapest

use std::time::Instant;

use ember_core::{BuildStrategy, BvhSettings};
use ember_math::{Aabb, Ray, EPSILON};

use crate::hit::{closest, HitResult};
use crate::triangle::Triangle;

/// BVH build parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhConfig {
    /// Ranges this small or smaller become leaves
    pub max_leaf_size: usize,
    /// Nodes at this depth become leaves regardless of size
    pub max_depth: u32,
    pub strategy: BuildStrategy,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 4,
            max_depth: 32,
            strategy: BuildStrategy::Median,
        }
    }
}

impl From<&BvhSettings> for BvhConfig {
    fn from(settings: &BvhSettings) -> Self {
        Self {
            max_leaf_size: settings.max_leaf_size,
            max_depth: settings.max_depth,
            strategy: settings.strategy,
        }
    }
}

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Never built (the root of a tree over zero triangles)
    Unbuilt,
    /// Covers `triangles[offset..offset + size]`
    Leaf { offset: u32, size: u32 },
    /// Arena indices of the two children
    Internal { left: u32, right: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    pub aabb: Aabb,
    pub kind: NodeKind,
}

impl BvhNode {
    const UNBUILT: BvhNode = BvhNode {
        aabb: Aabb::EMPTY,
        kind: NodeKind::Unbuilt,
    };

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}

/// A leaf whose box a ray passes through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafHit {
    pub offset: usize,
    pub size: usize,
    /// Box entry time, or exit time when the ray starts inside the box
    pub time: f32,
}

/// The cheapest SAH split of a range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SahSplit {
    pub axis: usize,
    /// Split position relative to the start of the range
    pub index: usize,
    pub cost: f32,
}

/// Shape summary of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    /// Depth of the deepest node (root = 0)
    pub depth: u32,
    pub largest_leaf: usize,
}

/// Triangle BVH.
#[derive(Debug, Clone)]
pub struct Bvh {
    triangles: Vec<Triangle>,
    nodes: Vec<BvhNode>,
    config: BvhConfig,
}

impl Bvh {
    /// Build a tree over `triangles`.
    ///
    /// An empty list yields a tree whose root stays unbuilt; traversing it
    /// finds nothing.
    pub fn build(triangles: Vec<Triangle>, config: BvhConfig) -> Self {
        let mut bvh = Self {
            triangles,
            nodes: Vec::new(),
            config,
        };
        bvh.rebuild(config.strategy);
        bvh
    }

    /// Rebuild the whole tree over the owned triangles.
    pub fn rebuild(&mut self, strategy: BuildStrategy) {
        self.config.strategy = strategy;
        self.nodes.clear();

        if self.triangles.is_empty() {
            self.nodes.push(BvhNode::UNBUILT);
            log::debug!("BVH build skipped: no triangles");
            return;
        }

        let start = Instant::now();
        let count = self.triangles.len();
        let mut builder = Builder {
            triangles: &mut self.triangles,
            nodes: Vec::with_capacity(2 * count / self.config.max_leaf_size.max(1)),
            config: self.config,
        };
        builder.build(0, count, 0);
        self.nodes = builder.nodes;

        let stats = self.stats();
        log::info!(
            "BVH ({:?}) built over {} triangles: {} nodes, {} leaves, depth {} in {:.2?}",
            strategy,
            self.triangles.len(),
            stats.nodes,
            stats.leaves,
            stats.depth,
            start.elapsed()
        );
    }

    /// Every leaf whose box the ray hits.
    ///
    /// Both children of a hit internal node are visited; the result is not
    /// ordered and may include leaves behind the nearest surface. Finding
    /// the nearest triangle is up to the caller (see [`Bvh::intersect`]).
    pub fn hit(&self, ray: &Ray) -> Vec<LeafHit> {
        let mut leaves = Vec::new();
        self.collect_leaves(0, ray, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, index: usize, ray: &Ray, out: &mut Vec<LeafHit>) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        if matches!(node.kind, NodeKind::Unbuilt) {
            return;
        }
        let Some(time) = node.aabb.hit(ray) else {
            return;
        };

        match node.kind {
            NodeKind::Leaf { offset, size } => out.push(LeafHit {
                offset: offset as usize,
                size: size as usize,
                time,
            }),
            NodeKind::Internal { left, right } => {
                self.collect_leaves(left as usize, ray, out);
                self.collect_leaves(right as usize, ray, out);
            }
            NodeKind::Unbuilt => {}
        }
    }

    /// Nearest triangle hit, testing only triangles in leaves the ray reaches.
    pub fn intersect(&self, ray: &Ray) -> Option<HitResult> {
        self.hit(ray).into_iter().fold(None, |best, leaf| {
            self.triangles[leaf.offset..leaf.offset + leaf.size]
                .iter()
                .fold(best, |best, triangle| closest(best, triangle.hit(ray)))
        })
    }

    /// Nearest triangle hit by testing every triangle.
    pub fn intersect_brute_force(&self, ray: &Ray) -> Option<HitResult> {
        self.triangles
            .iter()
            .fold(None, |best, triangle| closest(best, triangle.hit(ray)))
    }

    /// `(offset, size)` of every leaf, in depth-first order.
    pub fn leaf_ranges(&self) -> Vec<(usize, usize)> {
        self.nodes
            .iter()
            .filter_map(|node| match node.kind {
                NodeKind::Leaf { offset, size } => Some((offset as usize, size as usize)),
                _ => None,
            })
            .collect()
    }

    /// Boxes of the nodes at `depth`, plus leaves that end above it.
    ///
    /// Gives a complete cover of the scene at any level, for inspecting
    /// how a strategy carves space.
    pub fn boxes_at_depth(&self, depth: u32) -> Vec<Aabb> {
        let mut boxes = Vec::new();
        self.collect_boxes(0, 0, depth, &mut boxes);
        boxes
    }

    fn collect_boxes(&self, index: usize, current: u32, target: u32, out: &mut Vec<Aabb>) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        match node.kind {
            NodeKind::Unbuilt => {}
            NodeKind::Leaf { .. } => out.push(node.aabb),
            NodeKind::Internal { .. } if current == target => out.push(node.aabb),
            NodeKind::Internal { left, right } => {
                self.collect_boxes(left as usize, current + 1, target, out);
                self.collect_boxes(right as usize, current + 1, target, out);
            }
        }
    }

    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        self.collect_stats(0, 0, &mut stats);
        stats
    }

    fn collect_stats(&self, index: usize, depth: u32, stats: &mut BvhStats) {
        let Some(node) = self.nodes.get(index) else {
            return;
        };
        if matches!(node.kind, NodeKind::Unbuilt) {
            return;
        }

        stats.nodes += 1;
        stats.depth = stats.depth.max(depth);
        match node.kind {
            NodeKind::Leaf { size, .. } => {
                stats.leaves += 1;
                stats.largest_leaf = stats.largest_leaf.max(size as usize);
            }
            NodeKind::Internal { left, right } => {
                self.collect_stats(left as usize, depth + 1, stats);
                self.collect_stats(right as usize, depth + 1, stats);
            }
            NodeKind::Unbuilt => {}
        }
    }

    /// Triangles in BVH order.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    pub fn is_built(&self) -> bool {
        self.nodes
            .first()
            .is_some_and(|root| !matches!(root.kind, NodeKind::Unbuilt))
    }

    /// Bounds of the whole tree (empty when unbuilt).
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |root| root.aabb)
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

struct Builder<'a> {
    triangles: &'a mut [Triangle],
    nodes: Vec<BvhNode>,
    config: BvhConfig,
}

impl Builder<'_> {
    /// Build the node for `[begin, end)` and return its arena index.
    fn build(&mut self, begin: usize, end: usize, depth: u32) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(BvhNode::UNBUILT);

        let range = &mut self.triangles[begin..end];
        let aabb = node_bounds(range);
        let count = range.len();

        if count <= self.config.max_leaf_size || depth >= self.config.max_depth || count < 2 {
            self.nodes[index as usize] = BvhNode {
                aabb,
                kind: NodeKind::Leaf {
                    offset: begin as u32,
                    size: count as u32,
                },
            };
            return index;
        }

        let split = match self.config.strategy {
            BuildStrategy::Median => median_partition(range),
            BuildStrategy::Sah => match sah_split(range) {
                Some(split) => split.index,
                None => median_partition(range),
            },
        };
        let mid = begin + split;

        let left = self.build(begin, mid, depth + 1);
        let right = self.build(mid, end, depth + 1);

        self.nodes[index as usize] = BvhNode {
            aabb,
            kind: NodeKind::Internal { left, right },
        };
        index
    }
}

/// Union of the triangle boxes, each padded by `EPSILON`.
fn node_bounds(triangles: &[Triangle]) -> Aabb {
    triangles.iter().fold(Aabb::EMPTY, |acc, triangle| {
        Aabb::surrounding(&acc, &triangle.aabb.padded(EPSILON))
    })
}

/// Sort by centroid along the longest axis of the node box and return the
/// median index. Ties keep their relative order.
fn median_partition(triangles: &mut [Triangle]) -> usize {
    let axis = node_bounds(triangles).longest_axis();
    triangles.sort_by(Triangle::cmp_centroid(axis));
    triangles.len() / 2
}

/// `SA(left) * n_left + SA(right) * n_right` for splitting at `index`.
fn split_cost(left: &Aabb, left_count: usize, right: &Aabb, right_count: usize) -> f32 {
    left.surface_area() * left_count as f32 + right.surface_area() * right_count as f32
}

/// SAH cost of the median split [`Bvh::build`] would choose.
///
/// Sorts `triangles` the same way the median strategy does.
pub fn median_split_cost(triangles: &mut [Triangle]) -> f32 {
    if triangles.len() < 2 {
        return 0.0;
    }
    let mid = median_partition(triangles);
    let (left, right) = triangles.split_at(mid);
    split_cost(&node_bounds(left), left.len(), &node_bounds(right), right.len())
}

/// Find the cheapest SAH split over all axes and candidate positions.
///
/// Each axis is sorted from the incoming order, so equal centroids keep the
/// same relative order the median strategy would give them. On return the
/// range is sorted along the winning axis. Ranges of fewer than two
/// triangles have no split.
pub fn sah_split(triangles: &mut [Triangle]) -> Option<SahSplit> {
    let count = triangles.len();
    if count < 2 {
        return None;
    }

    let mut best: Option<SahSplit> = None;
    let mut prefix = vec![Aabb::EMPTY; count];
    let mut suffix = vec![Aabb::EMPTY; count];

    for axis in 0..3 {
        let compare = Triangle::cmp_centroid(axis);
        let mut order: Vec<usize> = (0..count).collect();
        order.sort_by(|&a, &b| compare(&triangles[a], &triangles[b]));

        // prefix[i] bounds order[..=i], suffix[i] bounds order[i..]
        let mut running = Aabb::EMPTY;
        for (i, &t) in order.iter().enumerate() {
            running = Aabb::surrounding(&running, &triangles[t].aabb.padded(EPSILON));
            prefix[i] = running;
        }
        running = Aabb::EMPTY;
        for (i, &t) in order.iter().enumerate().rev() {
            running = Aabb::surrounding(&running, &triangles[t].aabb.padded(EPSILON));
            suffix[i] = running;
        }

        for i in 1..count {
            let cost = split_cost(&prefix[i - 1], i, &suffix[i], count - i);
            if best.map_or(true, |split| cost < split.cost) {
                best = Some(SahSplit { axis, index: i, cost });
            }
        }
    }

    // Stable sort from the incoming order reproduces the winning axis order
    let split = best?;
    triangles.sort_by(Triangle::cmp_centroid(split.axis));
    Some(split)
}
