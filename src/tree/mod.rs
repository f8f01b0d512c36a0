//! Relationship-graph to tree construction.
//!
//! Individuals arrive as a flat list and relationships as typed directed
//! edges. Only `child` edges shape the tree: an edge `{source: A, target: B,
//! type: child}` makes B a child of A. The root is the first individual (in
//! store order) that is nobody's child.
//!
//! Construction is pure and synchronous. It runs on a [`TreeSnapshot`] that
//! was fetched up front, so a failed fetch aborts before anything is built.

mod expansion;
mod logger;
mod render;
mod view;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{Individual, RelationshipEdge, RelationshipType};

pub use expansion::ExpansionState;
pub use logger::{LogEntry, LogLevel, MemoryLogger, TracingLogger, TreeLogger};
pub use render::{render_tree, render_view};
pub use view::{AddChildHandler, TreeView, ViewStatus};

/// One individual's position in the built hierarchy.
///
/// `parent_id` is a non-owning back-reference: the individual id of the node
/// that owns this one, `None` at the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub individual: Individual,
    pub children: Vec<TreeNode>,
    pub depth: usize,
    pub is_expanded: bool,
    pub parent_id: Option<i64>,
}

impl TreeNode {
    pub fn id(&self) -> i64 {
        self.individual.id
    }

    pub fn child_ids(&self) -> Vec<i64> {
        self.children.iter().map(TreeNode::id).collect()
    }

    /// First node with the given individual id, depth-first.
    pub fn find(&self, id: i64) -> Option<&TreeNode> {
        if self.id() == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Generations below the root that are built. Child edges of a node at this
/// depth are not followed. Keeps the serialized tree within serde_json's
/// default nesting limit of 128.
pub const MAX_DEPTH: usize = 60;

/// A `child` edge that was not followed while building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEdge {
    pub source: i64,
    pub target: i64,
}

/// The result of building a tree from a root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltTree {
    pub root: TreeNode,
    /// Edges whose target is already an ancestor on the current path.
    pub cycles: Vec<SkippedEdge>,
    /// Edges leaving a node at [`MAX_DEPTH`].
    pub truncated: Vec<SkippedEdge>,
}

/// All data a tree build needs, fetched together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub individuals: Vec<Individual>,
    pub edges: Vec<RelationshipEdge>,
}

impl TreeSnapshot {
    pub fn new(individuals: Vec<Individual>, edges: Vec<RelationshipEdge>) -> Self {
        Self { individuals, edges }
    }

    pub fn find_root(&self) -> Option<&Individual> {
        find_root(&self.individuals, &self.edges)
    }

    /// Infer the root and build from it. `None` for an empty dataset.
    pub fn build(&self, logger: &dyn TreeLogger) -> Option<BuiltTree> {
        let root = self.find_root()?;
        Some(build_tree_with_logger(
            root,
            &self.individuals,
            &self.edges,
            logger,
        ))
    }
}

/// Where tree data comes from.
pub trait TreeSource {
    /// Every individual, in a stable order.
    fn fetch_all_individuals(&self) -> anyhow::Result<Vec<Individual>>;

    /// Every edge of every type.
    fn fetch_all_edges(&self) -> anyhow::Result<Vec<RelationshipEdge>>;

    fn fetch_snapshot(&self) -> anyhow::Result<TreeSnapshot> {
        Ok(TreeSnapshot::new(
            self.fetch_all_individuals()?,
            self.fetch_all_edges()?,
        ))
    }
}

/// Parent/child lookups derived from `child` edges.
///
/// Root inference and construction both go through this index so they agree
/// on what "is a child of" means. Children keep edge order.
#[derive(Debug, Clone, Default)]
pub struct EdgeIndex {
    children: HashMap<i64, Vec<i64>>,
    has_parent: HashSet<i64>,
}

impl EdgeIndex {
    pub fn new(edges: &[RelationshipEdge]) -> Self {
        let mut index = Self::default();
        for edge in edges.iter().filter(|e| e.kind == RelationshipType::Child) {
            index
                .children
                .entry(edge.source)
                .or_default()
                .push(edge.target);
            index.has_parent.insert(edge.target);
        }
        index
    }

    pub fn children_of(&self, id: i64) -> &[i64] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_child(&self, id: i64) -> bool {
        self.has_parent.contains(&id)
    }
}

/// Pick the individual to draw at the top of the tree.
///
/// Returns the first individual that is not the target of any `child` edge.
/// When everyone has a parent (a cyclic dataset), falls back to the first
/// individual. `None` only when `individuals` is empty.
pub fn find_root<'a>(
    individuals: &'a [Individual],
    edges: &[RelationshipEdge],
) -> Option<&'a Individual> {
    let index = EdgeIndex::new(edges);
    individuals
        .iter()
        .find(|individual| !index.is_child(individual.id))
        .or_else(|| individuals.first())
}

/// Build the tree below `root`, logging through `tracing`.
pub fn build_tree(
    root: &Individual,
    individuals: &[Individual],
    edges: &[RelationshipEdge],
) -> BuiltTree {
    build_tree_with_logger(root, individuals, edges, &TracingLogger)
}

/// Build the tree below `root`.
///
/// Edges whose target is missing from `individuals` are skipped. Edges that
/// lead back to an ancestor are skipped and reported in
/// [`BuiltTree::cycles`]. Nothing below [`MAX_DEPTH`] is built; the edges cut
/// there are reported in [`BuiltTree::truncated`]. Every node starts expanded.
pub fn build_tree_with_logger(
    root: &Individual,
    individuals: &[Individual],
    edges: &[RelationshipEdge],
    logger: &dyn TreeLogger,
) -> BuiltTree {
    let mut lookup: HashMap<i64, &Individual> = HashMap::with_capacity(individuals.len());
    for individual in individuals {
        lookup.entry(individual.id).or_insert(individual);
    }

    let builder = Builder {
        lookup,
        index: EdgeIndex::new(edges),
        logger,
    };

    let mut path = HashSet::new();
    let mut skipped = Skipped::default();
    let root = builder.node(root, 0, None, &mut path, &mut skipped);

    logger.debug(&format!(
        "Built tree rooted at {} with {} nodes",
        root.id(),
        root.size()
    ));

    BuiltTree {
        root,
        cycles: skipped.cycles,
        truncated: skipped.truncated,
    }
}

#[derive(Default)]
struct Skipped {
    cycles: Vec<SkippedEdge>,
    truncated: Vec<SkippedEdge>,
}

struct Builder<'a> {
    lookup: HashMap<i64, &'a Individual>,
    index: EdgeIndex,
    logger: &'a dyn TreeLogger,
}

impl Builder<'_> {
    fn node(
        &self,
        individual: &Individual,
        depth: usize,
        parent_id: Option<i64>,
        path: &mut HashSet<i64>,
        skipped: &mut Skipped,
    ) -> TreeNode {
        path.insert(individual.id);

        let mut children = Vec::new();
        for &target in self.index.children_of(individual.id) {
            if path.contains(&target) {
                self.logger.warn(&format!(
                    "Cycle in child relationships: {} -> {} not followed",
                    individual.id, target
                ));
                skipped.cycles.push(SkippedEdge {
                    source: individual.id,
                    target,
                });
                continue;
            }

            let Some(child) = self.lookup.get(&target) else {
                self.logger.debug(&format!(
                    "Skipping child edge {} -> {}: individual not found",
                    individual.id, target
                ));
                continue;
            };

            if depth >= MAX_DEPTH {
                self.logger.warn(&format!(
                    "Tree depth limit {} reached: {} -> {} not followed",
                    MAX_DEPTH, individual.id, target
                ));
                skipped.truncated.push(SkippedEdge {
                    source: individual.id,
                    target,
                });
                continue;
            }

            children.push(self.node(child, depth + 1, Some(individual.id), path, skipped));
        }

        path.remove(&individual.id);

        TreeNode {
            individual: individual.clone(),
            children,
            depth,
            is_expanded: true,
            parent_id,
        }
    }
}
