// src/graph.rs

use crate::model::CommitRecord;

/// Index into [`DependencyGraph::nodes`]
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub hash: String,
    pub short_hash: String,
    pub label: String,
}

/// A directed edge from an older commit to a newer one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

/// The commits touching a file, chained oldest to newest.
///
/// This is a path, not real ancestry: merges and multiple parents are
/// ignored and every commit simply follows the one listed after it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl DependencyGraph {
    /// Builds the chain for commits given newest first. Node `i` is
    /// `commits[i]`, and each `commits[i + 1]` gets an edge to `commits[i]`.
    pub fn chain(commits: &[CommitRecord]) -> Self {
        let nodes = commits
            .iter()
            .map(|commit| Node {
                hash: commit.hash.clone(),
                short_hash: commit.short_hash().to_string(),
                label: commit.message.clone(),
            })
            .collect();

        let edges = (1..commits.len())
            .map(|i| Edge { from: i, to: i - 1 })
            .collect();

        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Neighbours of every node, ignoring edge direction
    pub fn adjacency(&self) -> Vec<Vec<NodeId>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            adjacency[edge.from].push(edge.to);
            adjacency[edge.to].push(edge.from);
        }
        adjacency
    }
}
