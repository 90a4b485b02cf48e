// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structural checks over a mesh set

use super::halfedge::{EdgeId, FaceId, MeshId};
use super::mesh_set::MeshSet;
use serde::{Deserialize, Serialize};

/// Result of [`validate_mesh_set`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshSetReport {
    pub mesh_count: usize,
    pub face_count: usize,
    pub half_edge_count: usize,
    pub vertex_count: usize,
    /// Half-edges whose twin does not point back or has the wrong endpoints
    pub asymmetric_twins: Vec<EdgeId>,
    /// Faces whose `next` walk does not return after `n_edges` steps or has
    /// inconsistent `prev` links
    pub broken_loops: Vec<FaceId>,
    /// Faces or half-edges whose owner reference disagrees with the mesh
    /// that lists them
    pub bad_back_references: usize,
    /// Meshes whose cached edge lists no longer match the topology
    pub stale_meshes: Vec<MeshId>,
    pub open_edges: usize,
    pub negative_meshes: Vec<MeshId>,
}

impl MeshSetReport {
    /// Topology is consistent (open boundaries and inward winding allowed)
    pub fn is_valid(&self) -> bool {
        self.asymmetric_twins.is_empty()
            && self.broken_loops.is_empty()
            && self.bad_back_references == 0
            && self.stale_meshes.is_empty()
    }

    /// Valid with no open edges
    pub fn is_closed(&self) -> bool {
        self.is_valid() && self.open_edges == 0
    }
}

/// Check twin symmetry, face loops, ownership and cached edge lists
pub fn validate_mesh_set(set: &MeshSet) -> MeshSetReport {
    let mut report = MeshSetReport {
        mesh_count: set.meshes().len(),
        face_count: set.face_count(),
        half_edge_count: set.half_edge_count(),
        vertex_count: set.vertex_count(),
        ..MeshSetReport::default()
    };

    for (idx, mesh) in set.meshes().iter().enumerate() {
        let mesh_id = MeshId(idx);
        let mut open = Vec::new();
        let mut closed = Vec::new();

        for &face in &mesh.faces {
            let f = set.face(face);
            if f.is_removed() || f.mesh != mesh_id {
                report.bad_back_references += 1;
                continue;
            }
            if !loop_is_closed(set, face) {
                report.broken_loops.push(face);
                continue;
            }

            for e in set.face_edges(face) {
                if set.edge(e).face != face || set.edge(e).is_removed() {
                    report.bad_back_references += 1;
                }
                match set.rev(e) {
                    None => open.push(e),
                    Some(r) => {
                        let twin = set.edge(r);
                        let symmetric = !twin.is_removed()
                            && twin.rev == Some(e)
                            && set.v1(r) == set.v2(e)
                            && set.v2(r) == set.v1(e);
                        if !symmetric {
                            report.asymmetric_twins.push(e);
                        }
                        if e < r {
                            closed.push(e);
                        }
                    }
                }
            }
        }

        if mesh.is_dirty() || open != mesh.open_edges || closed != mesh.closed_edges {
            report.stale_meshes.push(mesh_id);
        }
        report.open_edges += open.len();
        if mesh.is_negative {
            report.negative_meshes.push(mesh_id);
        }
    }
    report
}

fn loop_is_closed(set: &MeshSet, face: FaceId) -> bool {
    let f = set.face(face);
    let mut e = f.edge;
    for _ in 0..f.n_edges {
        let next = set.next(e);
        if set.prev(next) != e || set.edge(e).face != face {
            return false;
        }
        e = next;
    }
    e == f.edge
}
