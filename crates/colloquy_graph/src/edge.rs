//! Edges between dialogue nodes.
//!
//! Adjacency itself lives on the nodes (parent and child index lists); an
//! [`Edge`] is the first-class record of one parent → child connection,
//! looked up from the parent by child.

use crate::node::NodeId;
use core::fmt;
use std::sync::Arc;

/// Unique identifier for an edge in the graph.
///
/// Edge IDs are generated using nanoid, so edges created in different graphs
/// never collide. Internally uses `Arc<str>` for cheap cloning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeId(Arc<str>);

impl EdgeId {
    /// Creates a new edge ID with a unique nanoid.
    #[must_use]
    pub fn new() -> Self {
        Self(nanoid::nanoid!().into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge_{}", self.0)
    }
}

/// A directed connection from a parent node to one of its children.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Unique identifier for this edge.
    pub id: EdgeId,
    /// The node the edge leaves.
    pub parent: NodeId,
    /// The node the edge enters.
    pub child: NodeId,
}

impl Edge {
    /// Creates a new edge with a fresh ID.
    #[must_use]
    pub fn new(parent: NodeId, child: NodeId) -> Self {
        Self {
            id: EdgeId::new(),
            parent,
            child,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.parent, self.child)
    }
}
