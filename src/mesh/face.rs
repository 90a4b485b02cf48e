// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face records and the staging buffer used to assemble new faces

use super::halfedge::{EdgeId, MeshId, VertexId};
use crate::error::{KernelError, KernelResult};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Closed loop of half-edges belonging to one mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Any half-edge of the loop; traversal starts here
    pub edge: EdgeId,
    /// Loop length
    pub n_edges: usize,
    /// Owning mesh
    pub mesh: MeshId,
    /// Unit normal (zero for degenerate loops)
    pub normal: Vector3<f64>,
    pub(crate) removed: bool,
}

impl Face {
    pub(crate) fn new(edge: EdgeId, n_edges: usize, mesh: MeshId) -> Self {
        Self {
            edge,
            n_edges,
            mesh,
            normal: Vector3::zeros(),
            removed: false,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// Newell's method normal of a polygon, normalized; zero if the polygon has
/// no area
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut n = Vector3::zeros();
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct StagedEdge {
    pub vert: VertexId,
    pub next: usize,
    pub prev: usize,
    pub twin: Option<EdgeId>,
}

const UNLINKED: usize = usize::MAX;

/// Staging buffer for a face that is not yet part of any mesh
///
/// Half-edges are addressed by their position in the buffer. Nothing touches
/// the mesh arenas until [`crate::mesh::MeshSet::commit_face`] accepts the
/// validated loop; a rejected builder is simply dropped.
#[derive(Debug, Clone, Default)]
pub struct FaceBuilder {
    pub(crate) edges: Vec<StagedEdge>,
}

impl FaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            edges: Vec::with_capacity(capacity),
        }
    }

    /// Stage a half-edge starting at `vert`, optionally twinned with an
    /// existing (open) half-edge of the mesh
    pub fn push(&mut self, vert: VertexId, twin: Option<EdgeId>) -> usize {
        self.edges.push(StagedEdge {
            vert,
            next: UNLINKED,
            prev: UNLINKED,
            twin,
        });
        self.edges.len() - 1
    }

    /// Make `to` follow `from` around the face
    pub fn link(&mut self, from: usize, to: usize) {
        self.edges[from].next = to;
        self.edges[to].prev = from;
    }

    /// Link the staged edges in push order into a single cycle
    pub fn link_in_order(&mut self) {
        let n = self.edges.len();
        for i in 0..n {
            self.link(i, (i + 1) % n);
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Walk `next` from `start` and check the loop closes after exactly
    /// `expected` steps with consistent `prev` links, covering every staged
    /// edge
    pub fn validate(&self, start: usize, expected: usize) -> KernelResult<()> {
        let walked = self.walk(start);
        if walked != Some(expected) || expected != self.edges.len() {
            return Err(KernelError::EdgeLoopMismatch {
                expected,
                actual: walked.unwrap_or(0),
            });
        }
        Ok(())
    }

    /// Loop length from `start`, or `None` if the walk never returns
    fn walk(&self, start: usize) -> Option<usize> {
        let mut cur = start;
        let mut count = 0;
        loop {
            let next = self.edges.get(cur)?.next;
            count += 1;
            if self.edges.get(next)?.prev != cur {
                return None;
            }
            if next == start {
                return Some(count);
            }
            if count >= self.edges.len() {
                return None;
            }
            cur = next;
        }
    }
}
